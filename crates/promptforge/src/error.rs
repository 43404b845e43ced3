use crate::archive::ArchiveError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use promptforge_core::session::GenerationError;

/// Failures surfaced at the HTTP boundary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A generated file could not be written. Files written before it stay on
    /// disk.
    #[error("Error saving file {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Store(StoreError::NotFound(_)) | Error::Archive(ArchiveError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Error::Store(StoreError::InvalidPath(_)) | Error::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Run filesystem work off the async worker threads.
pub async fn blocking<T, F>(work: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Internal(format!("Blocking task failed: {e}")))?
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
