//! Rendering capabilities the job lifecycle drives.
//!
//! The lifecycle never draws anything itself; it calls into a `Presentation`
//! implementation. `TerminalSurface` is the one the CLI uses.

use serde::{Deserialize, Serialize};

use crate::jobs::ResultSet;
use crate::lifecycle::SelectedFile;

pub mod terminal;

pub use terminal::TerminalSurface;

/// Number of processing steps the backend reports.
pub const STEP_COUNT: u8 = 4;

/// Which top-level view is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Upload,
    Processing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Transcript,
    Summary,
    Insights,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Transcript, Tab::Summary, Tab::Insights];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcript => "transcript",
            Self::Summary => "summary",
            Self::Insights => "insights",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Transcript => "Transcript",
            Self::Summary => "Summary",
            Self::Insights => "Key Insights",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// Label shown next to each processing step.
pub fn step_label(step: u8) -> &'static str {
    match step {
        1 => "Uploading audio",
        2 => "Transcribing",
        3 => "Summarizing",
        4 => "Generating insights",
        _ => "",
    }
}

/// Capabilities a rendering surface offers to the job lifecycle.
pub trait Presentation: Send + Sync {
    fn show_section(&self, section: Section);

    /// Activate steps `1..=step`; anything above is inactive.
    fn set_step(&self, step: u8);

    fn set_tab(&self, tab: Tab);

    fn notify(&self, message: &str, kind: ToastKind);

    fn display_results(&self, _results: &ResultSet) {}

    /// Called with the newly staged file, or `None` when the selection is cleared.
    fn file_staged(&self, _file: Option<&SelectedFile>) {}
}
