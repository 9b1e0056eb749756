//! CLI handler for analyzing an audio file.
//!
//! Stages the file, submits it to the jobs API, follows the job until it
//! settles, then prints and exports the results.

use anyhow::{bail, Context, Result};
use std::future::Future;
use std::path::Path;

use crate::cli::args::AnalyzeCliArgs;
use crate::config::Config;
use crate::export::{save_download, tab_text, write_download, SharePayload};
use crate::jobs::{JobsClient, ModelSelection, ResultSet};
use crate::lifecycle::{AudioFile, LifecycleClient, Phase};
use crate::presentation::terminal::ResultsView;
use crate::presentation::TerminalSurface;
use crate::text_io::copy_to_clipboard;

/// Handle the analyze CLI command.
pub async fn handle_analyze_command(args: AnalyzeCliArgs) -> Result<()> {
    // 1. Make sure the file exists before touching config or network
    let audio = AudioFile::open(&args.file).await?;

    // 2. Resolve API URL and models
    let config = Config::load()?;
    let base_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| config.api.base_url.clone());
    let models = ModelSelection {
        transcription: args
            .transcription_model
            .clone()
            .unwrap_or_else(|| config.models.transcription.clone()),
        summary: args
            .summary_model
            .clone()
            .unwrap_or_else(|| config.models.summary.clone()),
    };

    let surface = TerminalSurface::new(!args.no_progress, ResultsView::All)?;
    let client = LifecycleClient::new(
        Box::new(JobsClient::new(&base_url)),
        Box::new(surface),
        config.polling.interval(),
    );

    // 3. Stage the file (type and size checks)
    client.select_file(audio).await?;

    if !args.no_health_check {
        client.check_health().await;
    }
    if let Some(tab) = args.tab {
        client.switch_tab(tab);
    }

    // 4. Upload and follow the job
    let phase = run_job(&client, &models, async {
        // Without a signal handler, wait for the job alone.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await?;

    match phase {
        Phase::Completed => {}
        Phase::Failed(err) => return Err(err.into()),
        other => bail!("Analysis stopped while {}", other.as_str()),
    }

    let results = client
        .results()
        .await
        .context("Analysis finished without results")?;

    // 5. Exports
    export_results(&results, &args, &config.api.share_url)
}

/// Upload the staged file and wait for the job to settle. If `interrupt`
/// resolves first, during the upload or while polling, the session is reset
/// and the analysis abandoned.
async fn run_job(
    client: &LifecycleClient,
    models: &ModelSelection,
    interrupt: impl Future<Output = ()>,
) -> Result<Phase> {
    tokio::pin!(interrupt);

    tokio::select! {
        submitted = client.submit(models) => { submitted?; }
        _ = &mut interrupt => {
            client.reset().await;
            bail!("Interrupted, analysis abandoned");
        }
    }

    tokio::select! {
        phase = client.wait_until_settled() => Ok(phase),
        _ = &mut interrupt => {
            client.reset().await;
            bail!("Interrupted, analysis abandoned");
        }
    }
}

fn export_results(results: &ResultSet, args: &AnalyzeCliArgs, share_url: &str) -> Result<()> {
    if let Some(output_path) = &args.output {
        write_download(results, output_path)?;
        eprintln!("Results saved to: {}", output_path.display());
    }

    if args.save {
        let path = save_download(results, Path::new("."))?;
        eprintln!("Results saved to: {}", path.display());
    }

    if let Some(tab) = args.copy {
        copy_to_clipboard(tab_text(results, tab))?;
        eprintln!("Copied {} to clipboard!", tab.as_str());
    }

    if args.share {
        let payload = SharePayload::new(results, share_url);
        copy_to_clipboard(&payload.text)?;
        eprintln!("{} ({})", payload.title, payload.url);
        eprintln!("Share text copied to clipboard!");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{Health, JobApi, JobStatus};
    use crate::lifecycle::SelectedFile;
    use crate::presentation::{Presentation, Section, Tab, ToastKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    /// Backend whose upload takes `upload_delay` and whose jobs never finish.
    struct SlowApi {
        upload_delay: Duration,
        status_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobApi for SlowApi {
        async fn health(&self) -> Result<Health> {
            Ok(Health::Healthy)
        }

        async fn upload(&self, _file: &SelectedFile, _models: &ModelSelection) -> Result<String> {
            sleep(self.upload_delay).await;
            Ok("job-1".to_string())
        }

        async fn status(&self, _job_id: &str) -> Result<JobStatus> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(JobStatus {
                status: "transcribing".to_string(),
                step: Some(2),
                error: None,
            })
        }

        async fn results(&self, _job_id: &str) -> Result<ResultSet> {
            bail!("job never completes")
        }
    }

    struct Quiet;

    impl Presentation for Quiet {
        fn show_section(&self, _section: Section) {}
        fn set_step(&self, _step: u8) {}
        fn set_tab(&self, _tab: Tab) {}
        fn notify(&self, _message: &str, _kind: ToastKind) {}
    }

    async fn staged_client(upload_delay: Duration) -> (LifecycleClient, Arc<AtomicUsize>) {
        let status_calls = Arc::new(AtomicUsize::new(0));
        let client = LifecycleClient::new(
            Box::new(SlowApi {
                upload_delay,
                status_calls: status_calls.clone(),
            }),
            Box::new(Quiet),
            Duration::from_millis(2000),
        );
        client
            .select_file(AudioFile::new("/tmp/standup.wav", 4096))
            .await
            .unwrap();
        (client, status_calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_upload_resets_session() {
        let (client, status_calls) = staged_client(Duration::from_secs(60)).await;

        let err = run_job(
            &client,
            &ModelSelection::default(),
            sleep(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Interrupted"));
        assert_eq!(client.phase(), Phase::Idle);
        assert!(client.selected_file().await.is_none());

        sleep(Duration::from_secs(120)).await;
        assert!(client.job_id().await.is_none());
        assert_eq!(status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_while_polling_stops_polls() {
        let (client, status_calls) = staged_client(Duration::from_millis(10)).await;

        let err = run_job(
            &client,
            &ModelSelection::default(),
            sleep(Duration::from_millis(5000)),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Interrupted"));
        assert_eq!(client.phase(), Phase::Idle);
        let polled = status_calls.load(Ordering::SeqCst);
        assert!(polled >= 2);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(status_calls.load(Ordering::SeqCst), polled);
    }
}
