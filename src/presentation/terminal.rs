use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

use super::{step_label, Presentation, Section, Tab, ToastKind, STEP_COUNT};
use crate::export::{tab_text, MarkdownRenderer};
use crate::jobs::ResultSet;
use crate::lifecycle::SelectedFile;

/// What `display_results` prints to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsView {
    Tab(Tab),
    All,
}

/// Presentation for the CLI: progress bar and toasts on stderr, results on stdout.
pub struct TerminalSurface {
    show_progress: bool,
    ansi: bool,
    progress: Mutex<Option<ProgressBar>>,
    view: Mutex<ResultsView>,
    markdown: MarkdownRenderer,
}

impl TerminalSurface {
    pub fn new(show_progress: bool, view: ResultsView) -> Result<Self> {
        Ok(Self {
            show_progress,
            ansi: std::io::stdout().is_terminal(),
            progress: Mutex::new(None),
            view: Mutex::new(view),
            markdown: MarkdownRenderer::new()?,
        })
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    pub fn view(&self) -> ResultsView {
        self.view
            .lock()
            .map(|view| *view)
            .unwrap_or(ResultsView::All)
    }

    /// Text `display_results` writes for the current view.
    pub fn render_results(&self, results: &ResultSet) -> String {
        match self.view() {
            ResultsView::Tab(tab) => self.markdown.render(tab_text(results, tab), self.ansi),
            ResultsView::All => Tab::ALL
                .iter()
                .map(|tab| {
                    format!(
                        "== {} ==\n{}\n",
                        tab.title(),
                        self.markdown.render(tab_text(results, *tab).trim(), self.ansi)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn print_line(&self, line: &str) {
        if let Ok(guard) = self.progress.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.println(line);
                return;
            }
        }
        eprintln!("{}", line);
    }

    fn take_progress(&self) -> Option<ProgressBar> {
        self.progress.lock().ok().and_then(|mut guard| guard.take())
    }
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(STEP_COUNT as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:20.cyan/blue}] step {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

impl Presentation for TerminalSurface {
    fn show_section(&self, section: Section) {
        match section {
            Section::Processing => {
                let pb = self.show_progress.then(create_progress_bar);
                if let Ok(mut guard) = self.progress.lock() {
                    if let Some(previous) = std::mem::replace(&mut *guard, pb) {
                        previous.finish_and_clear();
                    }
                }
            }
            Section::Upload => {
                if let Some(pb) = self.take_progress() {
                    pb.finish_and_clear();
                }
            }
            Section::Results => {
                if let Some(pb) = self.take_progress() {
                    pb.finish_with_message("Complete");
                }
            }
        }
    }

    fn set_step(&self, step: u8) {
        if let Ok(guard) = self.progress.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(step.min(STEP_COUNT) as u64);
                pb.set_message(step_label(step));
            }
        }
    }

    fn set_tab(&self, tab: Tab) {
        if let Ok(mut view) = self.view.lock() {
            *view = ResultsView::Tab(tab);
        }
    }

    fn notify(&self, message: &str, kind: ToastKind) {
        let icon = match kind {
            ToastKind::Success => "✔",
            ToastKind::Error => "✖",
            ToastKind::Info => "ℹ",
        };
        self.print_line(&format!("{} {}", icon, message));
    }

    fn display_results(&self, results: &ResultSet) {
        println!("{}", self.render_results(results));
        eprintln!(
            "Models used: {} (Transcription), {} (Summary)",
            results.models_used.transcription, results.models_used.summary
        );
    }

    fn file_staged(&self, file: Option<&SelectedFile>) {
        if let Some(file) = file {
            self.print_line(&format!("Selected {} ({})", file.name, file.display_size()));
        }
    }
}
