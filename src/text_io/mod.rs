use anyhow::{anyhow, Result};
use arboard::Clipboard;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};
use which::which;

/// Copy text to the system clipboard, falling back to wl-copy/xclip/xsel
/// when no native backend is available.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    info!("Copying {} chars to clipboard", text.len());

    match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!(
                "System clipboard backend unavailable ({}); trying clipboard tools",
                err
            );
            copy_with_system_backends(text)
        }
    }
}

fn copy_with_system_backends(text: &str) -> Result<()> {
    for backend in CLIPBOARD_BACKENDS {
        if which(backend.copy_cmd).is_err() {
            continue;
        }

        let mut cmd = Command::new(backend.copy_cmd);
        cmd.args(backend.copy_args).stdin(Stdio::piped());

        if let Ok(mut child) = cmd.spawn() {
            if let Some(stdin) = child.stdin.as_mut() {
                if stdin.write_all(text.as_bytes()).is_err() {
                    continue;
                }
            }
            // Close stdin so the tool sees EOF.
            drop(child.stdin.take());

            if let Ok(status) = child.wait() {
                if status.success() {
                    debug!("Text copied to clipboard with {}", backend.name);
                    return Ok(());
                }
            }
        }
    }

    Err(anyhow!(
        "No clipboard tool (wl-copy/xclip/xsel) available for fallback"
    ))
}

struct ClipboardBackend {
    name: &'static str,
    copy_cmd: &'static str,
    copy_args: &'static [&'static str],
}

const CLIPBOARD_BACKENDS: &[ClipboardBackend] = &[
    ClipboardBackend {
        name: "wl-copy",
        copy_cmd: "wl-copy",
        copy_args: &[],
    },
    ClipboardBackend {
        name: "xclip",
        copy_cmd: "xclip",
        copy_args: &["-selection", "clipboard"],
    },
    ClipboardBackend {
        name: "xsel",
        copy_cmd: "xsel",
        copy_args: &["--clipboard", "--input"],
    },
];
