//! Client-side exports of a finished analysis: the text download, the share
//! payload, per-tab copy text and terminal markdown rendering.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::jobs::ResultSet;
use crate::presentation::Tab;

pub const SHARE_TITLE: &str = "MeetWrap Analysis Results";
const SHARE_SUMMARY_CHARS: usize = 200;

/// Text of one results tab.
pub fn tab_text(results: &ResultSet, tab: Tab) -> &str {
    match tab {
        Tab::Transcript => &results.transcript,
        Tab::Summary => &results.summary,
        Tab::Insights => &results.insights,
    }
}

/// Plain-text bundle of a finished analysis.
pub fn download_text<Tz: TimeZone>(results: &ResultSet, generated_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "MEETWRAP ANALYSIS RESULTS\n\
         ========================\n\
         \n\
         TRANSCRIPT:\n\
         {transcript}\n\
         \n\
         SUMMARY:\n\
         {summary}\n\
         \n\
         KEY INSIGHTS:\n\
         {insights}\n\
         \n\
         Generated on: {generated}\n\
         Models used: {transcription_model} (Transcription), {summary_model} (Summary)\n",
        transcript = results.transcript,
        summary = results.summary,
        insights = results.insights,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
        transcription_model = results.models_used.transcription,
        summary_model = results.models_used.summary,
    )
}

pub fn download_file_name(date: NaiveDate) -> String {
    format!("meetwrap-analysis-{}.txt", date.format("%Y-%m-%d"))
}

/// Write the download bundle to `path`.
pub fn write_download(results: &ResultSet, path: &Path) -> Result<()> {
    let content = download_text(results, &Local::now());
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    info!("Results written to {:?}", path);
    Ok(())
}

/// Write the download bundle into `dir` under today's default file name.
pub fn save_download(results: &ResultSet, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(download_file_name(Local::now().date_naive()));
    write_download(results, &path)?;
    Ok(path)
}

/// What a share target receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn new(results: &ResultSet, url: &str) -> Self {
        let excerpt: String = results.summary.chars().take(SHARE_SUMMARY_CHARS).collect();

        Self {
            title: SHARE_TITLE.to_string(),
            text: format!(
                "Check out my meeting analysis from MeetWrap!\n\nSummary: {}...",
                excerpt
            ),
            url: url.to_string(),
        }
    }
}

/// Renders the `**bold**` / `*italic*` markup the backend emits.
pub struct MarkdownRenderer {
    bold: Regex,
    italic: Regex,
}

impl MarkdownRenderer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            bold: Regex::new(r"\*\*(.*?)\*\*")?,
            italic: Regex::new(r"\*(.*?)\*")?,
        })
    }

    /// ANSI styling when `ansi` is set, otherwise the markers are stripped.
    pub fn render(&self, text: &str, ansi: bool) -> String {
        let (bold, italic) = if ansi {
            ("\x1b[1m${1}\x1b[0m", "\x1b[3m${1}\x1b[0m")
        } else {
            ("${1}", "${1}")
        };
        let text = self.bold.replace_all(text, bold);
        self.italic.replace_all(&text, italic).into_owned()
    }
}
