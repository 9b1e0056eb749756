//! Job lifecycle orchestrator.
//!
//! Drives one analysis at a time:
//! select file → upload → poll status → fetch results
//!
//! The backend and the rendering surface are injected. Every analysis runs in
//! a session stamped with an epoch; `reset()` bumps the epoch and cancels the
//! poll task, and any continuation that wakes up under an older epoch drops
//! its result without touching state or the surface.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::jobs::{Health, JobApi, ModelSelection, ResultSet};
use crate::presentation::{Presentation, Section, Tab, ToastKind};

pub mod error;
pub mod selected_file;

pub use error::LifecycleError;
pub use selected_file::{format_file_size, AudioFile, SelectedFile};

/// Delay between status requests unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Where the client is in the upload → poll → results sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    FileSelected,
    Uploading,
    Polling,
    Completed,
    /// Back on the upload surface with the failure that caused it.
    Failed(LifecycleError),
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FileSelected => "file_selected",
            Self::Uploading => "uploading",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
        }
    }

    /// A job is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Uploading | Self::Polling)
    }
}

struct Session {
    epoch: u64,
    phase: Phase,
    selected: Option<SelectedFile>,
    job_id: Option<String>,
    results: Option<ResultSet>,
    poll_cancel: Option<CancellationToken>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            epoch: 0,
            phase: Phase::Idle,
            selected: None,
            job_id: None,
            results: None,
            poll_cancel: None,
        }
    }
}

struct Inner {
    api: Box<dyn JobApi>,
    surface: Box<dyn Presentation>,
    poll_interval: Duration,
    session: Mutex<Session>,
    phase_tx: watch::Sender<Phase>,
}

/// Cloneable handle to the single job lifecycle.
#[derive(Clone)]
pub struct LifecycleClient {
    inner: Arc<Inner>,
}

impl LifecycleClient {
    pub fn new(
        api: Box<dyn JobApi>,
        surface: Box<dyn Presentation>,
        poll_interval: Duration,
    ) -> Self {
        let (phase_tx, _) = watch::channel(Phase::Idle);
        Self {
            inner: Arc::new(Inner {
                api,
                surface,
                poll_interval,
                session: Mutex::new(Session::default()),
                phase_tx,
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase_tx.borrow().clone()
    }

    /// Receiver that observes every phase transition.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.inner.phase_tx.subscribe()
    }

    pub async fn selected_file(&self) -> Option<SelectedFile> {
        self.inner.session.lock().await.selected.clone()
    }

    pub async fn job_id(&self) -> Option<String> {
        self.inner.session.lock().await.job_id.clone()
    }

    pub async fn results(&self) -> Option<ResultSet> {
        self.inner.session.lock().await.results.clone()
    }

    /// Ping the backend and report reachability as a toast.
    pub async fn check_health(&self) -> bool {
        let surface = &self.inner.surface;
        match self.inner.api.health().await {
            Ok(Health::Healthy) => {
                surface.notify("Backend connected successfully!", ToastKind::Success);
                true
            }
            Ok(Health::Unhealthy) => {
                surface.notify("Backend connection failed", ToastKind::Error);
                false
            }
            Err(e) => {
                warn!("Health check failed: {:#}", e);
                surface.notify(
                    "Backend is not running. Please start the server.",
                    ToastKind::Error,
                );
                false
            }
        }
    }

    /// Validate and stage a file for the next analysis.
    pub async fn select_file(&self, file: AudioFile) -> Result<SelectedFile, LifecycleError> {
        let mut session = self.inner.session.lock().await;
        if session.phase.is_active() {
            return Err(self.reject(LifecycleError::JobInProgress));
        }

        match SelectedFile::validate(file) {
            Ok(selected) => {
                info!(
                    "Selected {} ({})",
                    selected.name,
                    selected.display_size()
                );
                session.selected = Some(selected.clone());
                self.inner.surface.file_staged(Some(&selected));
                self.transition(&mut session, Phase::FileSelected);
                Ok(selected)
            }
            Err(err) => {
                session.selected = None;
                self.inner.surface.file_staged(None);
                if session.phase == Phase::FileSelected {
                    self.transition(&mut session, Phase::Idle);
                }
                Err(self.reject(err))
            }
        }
    }

    /// Drop the staged file.
    pub async fn clear_file(&self) -> Result<(), LifecycleError> {
        let mut session = self.inner.session.lock().await;
        if session.phase.is_active() {
            return Err(self.reject(LifecycleError::JobInProgress));
        }

        session.selected = None;
        self.inner.surface.file_staged(None);
        if session.phase == Phase::FileSelected {
            self.transition(&mut session, Phase::Idle);
        }
        Ok(())
    }

    /// Upload the staged file and start polling. Returns the job ID once the
    /// backend accepts the upload; polling continues in the background.
    pub async fn submit(&self, models: &ModelSelection) -> Result<String, LifecycleError> {
        let (epoch, file) = {
            let mut session = self.inner.session.lock().await;
            if session.phase.is_active() {
                return Err(self.reject(LifecycleError::JobInProgress));
            }
            let Some(file) = session.selected.clone() else {
                return Err(self.reject(LifecycleError::NoFileSelected));
            };

            session.job_id = None;
            session.results = None;
            self.inner.surface.show_section(Section::Processing);
            self.inner.surface.set_step(1);
            self.transition(&mut session, Phase::Uploading);
            (session.epoch, file)
        };

        info!(
            "Uploading {} (transcription: {}, summary: {})",
            file.name, models.transcription, models.summary
        );
        let upload = self.inner.api.upload(&file, models).await;

        let mut session = self.inner.session.lock().await;
        if session.epoch != epoch {
            debug!("Session reset during upload; discarding response");
            return Err(LifecycleError::Superseded);
        }

        let job_id = match upload {
            Ok(job_id) => job_id,
            Err(e) => {
                let err = LifecycleError::UploadFailed(format!("{:#}", e));
                self.fail(&mut session, err.clone());
                return Err(err);
            }
        };

        info!("Job submitted: {}", job_id);
        let cancel = CancellationToken::new();
        session.job_id = Some(job_id.clone());
        session.poll_cancel = Some(cancel.clone());
        self.inner
            .surface
            .notify("File uploaded successfully!", ToastKind::Success);
        self.transition(&mut session, Phase::Polling);
        drop(session);

        let client = self.clone();
        let poll_job = job_id.clone();
        tokio::spawn(async move { client.poll(epoch, poll_job, cancel).await });

        Ok(job_id)
    }

    /// Forget the file, job and results and return to `Idle`, cancelling any
    /// pending poll.
    pub async fn reset(&self) {
        let mut session = self.inner.session.lock().await;
        if let Some(cancel) = session.poll_cancel.take() {
            cancel.cancel();
        }

        let epoch = session.epoch + 1;
        *session = Session {
            epoch,
            ..Session::default()
        };

        self.inner.surface.file_staged(None);
        self.inner.surface.show_section(Section::Upload);
        self.inner
            .surface
            .notify("Ready for new analysis!", ToastKind::Info);
        self.transition(&mut session, Phase::Idle);
        info!("Session reset (epoch {})", epoch);
    }

    pub fn switch_tab(&self, tab: Tab) {
        self.inner.surface.set_tab(tab);
    }

    /// Wait until no job is in flight and return the phase it settled in.
    pub async fn wait_until_settled(&self) -> Phase {
        let mut rx = self.subscribe();
        loop {
            let phase = rx.borrow_and_update().clone();
            if !phase.is_active() {
                return phase;
            }
            if rx.changed().await.is_err() {
                return self.phase();
            }
        }
    }

    /// Status loop for one job. Exits on a terminal status, a failure,
    /// cancellation, or when its session is no longer current.
    async fn poll(&self, epoch: u64, job_id: String, cancel: CancellationToken) {
        let mut last_status = String::new();

        loop {
            let status = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Polling for job {} cancelled", job_id);
                    return;
                }
                status = self.inner.api.status(&job_id) => status,
            };

            let Some(mut session) = self.current(epoch).await else {
                debug!("Dropping status for superseded job {}", job_id);
                return;
            };

            let status = match status {
                Ok(status) => status,
                Err(e) => {
                    self.fail(
                        &mut session,
                        LifecycleError::StatusUnavailable(format!("{:#}", e)),
                    );
                    return;
                }
            };

            if status.status != last_status {
                info!(
                    "Job {} status: {} (step {})",
                    job_id,
                    status.status,
                    status.step.map_or_else(|| "-".to_string(), |s| s.to_string())
                );
                last_status = status.status.clone();
            }

            if let Some(step) = status.step {
                self.inner.surface.set_step(step);
            }

            if status.is_completed() {
                drop(session);
                self.fetch_results(epoch, &job_id, &cancel).await;
                return;
            }

            if status.is_error() {
                self.fail(
                    &mut session,
                    LifecycleError::ProcessingFailed(status.error_message()),
                );
                return;
            }
            drop(session);

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Polling for job {} cancelled", job_id);
                    return;
                }
                _ = sleep(self.inner.poll_interval) => {}
            }
        }
    }

    async fn fetch_results(&self, epoch: u64, job_id: &str, cancel: &CancellationToken) {
        let results = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Results fetch for job {} cancelled", job_id);
                return;
            }
            results = self.inner.api.results(job_id) => results,
        };

        let Some(mut session) = self.current(epoch).await else {
            debug!("Dropping results for superseded job {}", job_id);
            return;
        };

        match results {
            Ok(results) => {
                info!(
                    "Analysis complete: {} transcript chars",
                    results.transcript.len()
                );
                session.poll_cancel = None;
                self.inner.surface.display_results(&results);
                self.inner.surface.show_section(Section::Results);
                self.inner
                    .surface
                    .notify("Analysis completed successfully!", ToastKind::Success);
                session.results = Some(results);
                self.transition(&mut session, Phase::Completed);
            }
            Err(e) => {
                self.fail(
                    &mut session,
                    LifecycleError::ResultsUnavailable(format!("{:#}", e)),
                );
            }
        }
    }

    /// Lock the session only if `epoch` is still the active one.
    async fn current(&self, epoch: u64) -> Option<MutexGuard<'_, Session>> {
        let session = self.inner.session.lock().await;
        (session.epoch == epoch).then_some(session)
    }

    fn transition(&self, session: &mut Session, phase: Phase) {
        debug!("Phase {} -> {}", session.phase.as_str(), phase.as_str());
        session.phase = phase.clone();
        self.inner.phase_tx.send_replace(phase);
    }

    /// Report a failure that leaves the current state untouched.
    fn reject(&self, err: LifecycleError) -> LifecycleError {
        warn!("{}", err);
        self.inner.surface.notify(&err.to_string(), ToastKind::Error);
        err
    }

    /// Report a failure of the running analysis and fall back to the upload surface.
    fn fail(&self, session: &mut Session, err: LifecycleError) {
        warn!("{}", err);
        session.poll_cancel = None;
        self.inner.surface.notify(&err.to_string(), ToastKind::Error);
        self.inner.surface.show_section(Section::Upload);
        self.transition(session, Phase::Failed(err));
    }
}
