//! `JobsClient` against an in-process backend speaking the MeetWrap jobs API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use meetwrap::jobs::{Health, JobApi, JobsClient, ModelSelection};
use meetwrap::lifecycle::{AudioFile, LifecycleClient, Phase, SelectedFile};
use meetwrap::presentation::{Presentation, Section, Tab, ToastKind};

const JOB_ID: &str = "8f14e45f-ceea-467f-a8f8-0c1b2f3d4e5f";

#[derive(Debug, Clone, Default)]
struct UploadedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

#[derive(Clone, Default)]
struct Backend {
    uploads: Arc<Mutex<Vec<UploadedPart>>>,
    polls: Arc<Mutex<u32>>,
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "models_loaded": 3, "active_jobs": 0}))
}

async fn upload(
    State(backend): State<Backend>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(UploadedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    let summary_model = parts
        .iter()
        .find(|p| p.name == "summary_model")
        .map(|p| String::from_utf8_lossy(&p.data).into_owned());
    if summary_model.as_deref() == Some("missing-model") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Unknown summary model"})),
        );
    }

    backend.uploads.lock().unwrap().extend(parts);
    (
        StatusCode::OK,
        Json(json!({
            "job_id": JOB_ID,
            "message": "File uploaded successfully, processing started"
        })),
    )
}

async fn status(
    State(backend): State<Backend>,
    Path(job_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    if job_id != JOB_ID {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Job not found"})));
    }

    let mut polls = backend.polls.lock().unwrap();
    *polls += 1;
    let body = match *polls {
        1 => json!({"status": "transcribing", "step": 2, "filename": "standup.wav"}),
        2 => json!({"status": "summarizing", "step": 3, "filename": "standup.wav"}),
        _ => json!({"status": "completed", "step": 4, "filename": "standup.wav"}),
    };
    (StatusCode::OK, Json(body))
}

async fn results(Path(job_id): Path<String>) -> (StatusCode, Json<Value>) {
    if job_id != JOB_ID {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Job not found"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "transcript": "Welcome everyone to today's quarterly review meeting.",
            "summary": "**Meeting Summary:**\n- Exceeded Q3 targets by 15%",
            "insights": "**Key Insights & Action Items:**\n\n• Exceeded Q3 targets by 15%\n",
            "models_used": {"transcription": "whisper", "summary": "samsum"}
        })),
    )
}

async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/status/:job_id", get(status))
        .route("/api/results/:job_id", get(results))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), backend)
}

async fn staged_wav(dir: &tempfile::TempDir) -> SelectedFile {
    let path = dir.path().join("standup.wav");
    std::fs::write(&path, b"RIFF\x24\x00\x00\x00WAVEfmt ").unwrap();
    SelectedFile::validate(AudioFile::open(&path).await.unwrap()).unwrap()
}

struct SilentSurface;

impl Presentation for SilentSurface {
    fn show_section(&self, _section: Section) {}
    fn set_step(&self, _step: u8) {}
    fn set_tab(&self, _tab: Tab) {}
    fn notify(&self, _message: &str, _kind: ToastKind) {}
}

#[tokio::test]
async fn test_health() {
    let (base_url, _) = spawn_backend().await;

    let client = JobsClient::new(&base_url);
    assert_eq!(client.health().await.unwrap(), Health::Healthy);

    let wrong_prefix = JobsClient::new(&format!("{}/v2", base_url));
    assert_eq!(wrong_prefix.health().await.unwrap(), Health::Unhealthy);
}

#[tokio::test]
async fn test_health_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = JobsClient::new(&format!("http://{}/api", addr));
    assert!(client.health().await.is_err());
}

#[tokio::test]
async fn test_upload_sends_audio_and_models() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let file = staged_wav(&dir).await;

    let models = ModelSelection {
        transcription: "whisper".to_string(),
        summary: "samsum".to_string(),
    };
    let job_id = JobsClient::new(&base_url)
        .upload(&file, &models)
        .await
        .unwrap();
    assert_eq!(job_id, JOB_ID);

    let uploads = backend.uploads.lock().unwrap().clone();
    let audio = uploads.iter().find(|p| p.name == "audio").unwrap();
    assert_eq!(audio.file_name.as_deref(), Some("standup.wav"));
    assert_eq!(audio.content_type.as_deref(), Some("audio/wav"));
    assert_eq!(audio.data, b"RIFF\x24\x00\x00\x00WAVEfmt ");

    let field = |name: &str| {
        uploads
            .iter()
            .find(|p| p.name == name)
            .map(|p| String::from_utf8_lossy(&p.data).into_owned())
    };
    assert_eq!(field("transcription_model").as_deref(), Some("whisper"));
    assert_eq!(field("summary_model").as_deref(), Some("samsum"));
}

#[tokio::test]
async fn test_upload_rejected_by_server() {
    let (base_url, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let file = staged_wav(&dir).await;

    let models = ModelSelection {
        transcription: "whisper".to_string(),
        summary: "missing-model".to_string(),
    };
    let err = JobsClient::new(&base_url)
        .upload(&file, &models)
        .await
        .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("400"), "{message}");
    assert!(message.contains("Unknown summary model"), "{message}");
}

#[tokio::test]
async fn test_status_and_results() {
    let (base_url, _) = spawn_backend().await;
    let client = JobsClient::new(&base_url);

    let first = client.status(JOB_ID).await.unwrap();
    assert_eq!(first.status, "transcribing");
    assert_eq!(first.step, Some(2));
    assert!(!first.is_completed());

    let results = client.results(JOB_ID).await.unwrap();
    assert!(results.transcript.starts_with("Welcome everyone"));
    assert_eq!(results.models_used.summary, "samsum");
}

#[tokio::test]
async fn test_unknown_job() {
    let (base_url, _) = spawn_backend().await;
    let client = JobsClient::new(&base_url);

    let err = client.status("nope").await.unwrap_err();
    assert!(format!("{:#}", err).contains("404"));

    let err = client.results("nope").await.unwrap_err();
    assert!(format!("{:#}", err).contains("Job not found"));
}

#[tokio::test]
async fn test_full_analysis_over_http() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("standup.wav");
    std::fs::write(&path, b"RIFF").unwrap();

    let client = LifecycleClient::new(
        Box::new(JobsClient::new(&base_url)),
        Box::new(SilentSurface),
        Duration::from_millis(10),
    );

    assert!(client.check_health().await);
    client
        .select_file(AudioFile::open(&path).await.unwrap())
        .await
        .unwrap();
    let job_id = client.submit(&ModelSelection::default()).await.unwrap();
    assert_eq!(job_id, JOB_ID);

    let phase = tokio::time::timeout(Duration::from_secs(10), client.wait_until_settled())
        .await
        .unwrap();
    assert_eq!(phase, Phase::Completed);
    assert_eq!(*backend.polls.lock().unwrap(), 3);

    let results = client.results().await.unwrap();
    assert_eq!(results.models_used.transcription, "whisper");
}
