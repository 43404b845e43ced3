use crate::archive::{zip_directory, ARCHIVE_FILENAME};
use crate::autofix::{suggest_fix, FixOutput};
use crate::completion::{CompletionClient, CompletionOptions, HttpCompletionClient};
use crate::error::blocking;
use crate::generate::{generate_project, GenerationOutput, ProjectOptions};
use crate::prelude::{eprintln, *};
use crate::store::{FsProjectStore, ProjectStore};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use promptforge_core::paths::content_type_for;
use promptforge_core::prompt::{preview, FixRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, clap::Parser)]
#[command(name = "serve")]
#[command(about = "Start the HTTP API")]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "PROMPTFORGE_PORT", default_value = "8000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "PROMPTFORGE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[clap(flatten)]
    pub project: ProjectOptions,

    #[clap(flatten)]
    pub completion: CompletionOptions,
}

/// Shared, read-only state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn CompletionClient>,
    pub store: Arc<dyn ProjectStore>,
    pub max_retries: usize,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFileRequest {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AutoFixRequest {
    pub error_message: String,
    pub stack_trace: String,
    #[serde(default)]
    pub file_content: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileContent {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let client = HttpCompletionClient::new(&options.completion)
        .context("Failed to create completion client")?;
    let store = FsProjectStore::setup(&options.project.projects_dir)
        .context("Failed to set up project directory")?;

    let state = AppState {
        client: Arc::new(client),
        store: Arc::new(store),
        max_retries: options.project.max_retries,
    };

    let addr = format!("{}:{}", options.host, options.port);

    if global.verbose {
        eprintln!("promptforge listening on http://{}", addr);
        eprintln!("Model: {}", options.completion.model);
        eprintln!("Projects dir: {}", options.project.projects_dir.display());
    }
    log::info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    axum::serve(listener, router(state))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate", post(generate_handler))
        .route("/files", get(files_handler))
        .route("/file", get(file_handler))
        .route("/update_file", post(update_file_handler))
        .route("/preview/{*filename}", get(preview_handler))
        .route("/auto-fix-error", post(auto_fix_handler))
        .route("/download", get(download_handler))
        .layer(cors)
        .with_state(state)
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<GenerationOutput>, Error> {
    if request.prompt.trim().is_empty() {
        return Err(Error::BadRequest("prompt must not be empty".to_string()));
    }

    log::info!(
        "Received generation request with prompt: {}",
        preview(&request.prompt, 100)
    );

    let output = generate_project(
        state.client.as_ref(),
        Arc::clone(&state.store),
        &request.prompt,
        state.max_retries,
    )
    .await?;

    Ok(Json(output))
}

async fn files_handler(State(state): State<AppState>) -> Result<Json<FileList>, Error> {
    let files = blocking(move || Ok(state.store.list_all()?)).await?;
    Ok(Json(FileList { files }))
}

async fn file_handler(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Json<FileContent>, Error> {
    let name = query.name.clone();
    let content = blocking(move || Ok(state.store.read_logical(&name)?)).await?;

    Ok(Json(FileContent {
        filename: query.name,
        content,
    }))
}

async fn update_file_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateFileRequest>,
) -> Result<Json<Message>, Error> {
    blocking(move || {
        state
            .store
            .write_update(&request.filename, &request.content)?;
        Ok(())
    })
    .await?;

    Ok(Json(Message {
        message: "File updated".to_string(),
    }))
}

async fn preview_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, Error> {
    let content_type = content_type_for(&filename);
    let bytes = blocking(move || {
        let routed = state.store.locate(&filename)?;
        Ok(state.store.read_bytes(routed.subtree, &routed.relative)?)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn auto_fix_handler(
    State(state): State<AppState>,
    Json(request): Json<AutoFixRequest>,
) -> Json<FixOutput> {
    let request = FixRequest {
        error_message: request.error_message,
        stack_trace: request.stack_trace,
        file_content: request.file_content,
        filename: request.filename,
    };

    Json(suggest_fix(state.client.as_ref(), &request).await)
}

async fn download_handler(State(state): State<AppState>) -> Result<Response, Error> {
    let root = state.store.root().to_path_buf();
    let bytes = blocking(move || Ok(zip_directory(&root)?)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
