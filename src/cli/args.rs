use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::presentation::Tab;

#[derive(Parser, Debug)]
#[command(name = "meetwrap")]
#[command(about = "Meeting transcripts, summaries and insights from audio files", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Upload an audio file and wait for its analysis
    Analyze(AnalyzeCliArgs),
    /// Check that the backend is reachable
    Health(HealthCliArgs),
    /// Show the config file location and contents
    Config,
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct AnalyzeCliArgs {
    /// Audio file (mp3, wav, m4a, flac, ogg, wma; at most 100MB)
    pub file: PathBuf,

    /// Jobs API base URL (default from config)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Transcription model requested from the backend
    #[arg(long)]
    pub transcription_model: Option<String>,

    /// Summary model requested from the backend (e.g. bart, samsum)
    #[arg(long)]
    pub summary_model: Option<String>,

    /// Print only this result instead of all of them
    #[arg(long, value_enum)]
    pub tab: Option<Tab>,

    /// Write the text export to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the text export to meetwrap-analysis-<date>.txt in the current directory
    #[arg(long)]
    pub save: bool,

    /// Copy one result to the clipboard
    #[arg(long, value_enum)]
    pub copy: Option<Tab>,

    /// Copy a share message with a summary excerpt to the clipboard
    #[arg(long)]
    pub share: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Skip the backend health check before uploading
    #[arg(long)]
    pub no_health_check: bool,
}

#[derive(ClapArgs, Debug)]
pub struct HealthCliArgs {
    /// Jobs API base URL (default from config)
    #[arg(long)]
    pub api_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::try_parse_from([
            "meetwrap",
            "-v",
            "analyze",
            "standup.mp3",
            "--summary-model",
            "samsum",
            "--tab",
            "insights",
            "--copy",
            "transcript",
            "--save",
        ])
        .unwrap();

        assert!(cli.verbose);
        let CliCommand::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.file, PathBuf::from("standup.mp3"));
        assert_eq!(args.summary_model.as_deref(), Some("samsum"));
        assert_eq!(args.tab, Some(Tab::Insights));
        assert_eq!(args.copy, Some(Tab::Transcript));
        assert!(args.save);
        assert!(!args.share);
    }

    #[test]
    fn test_unknown_tab_rejected() {
        let parsed = Cli::try_parse_from(["meetwrap", "analyze", "a.wav", "--tab", "notes"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["meetwrap"]).is_err());
    }
}
