//! Axum server and routes: the process listing, per-process documentation and
//! submission, and the `/job/<id>` resources.

use crate::error::ApiError;
use crate::response;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use job_handlers::{HandlerError, ProcessHandler, Submission, WorkingDir};
use job_media::choose;
use job_types::{JobRegistry, ProcessListing, APPLICATION_JSON, TEXT_PLAIN};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const ALLOCATE_ATTEMPTS: usize = 8;

/// Process label to handler, fixed at startup.
pub type ProcessCatalog = BTreeMap<String, Arc<dyn ProcessHandler>>;

pub struct AppState {
    pub processes: ProcessCatalog,
    pub registry: Arc<dyn JobRegistry>,
    /// Parent of every job working directory.
    pub base_dir: PathBuf,
    /// Prefix for `Location` headers; relative when `None`.
    pub public_url: Option<String>,
    /// Largest accepted submission body in bytes.
    pub max_body: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    let max_body = state.max_body;
    Router::new()
        .route("/", any(handle_root))
        .route("/job/*rest", any(handle_job))
        .route("/:process", any(handle_process))
        .route("/:process/", any(handle_process))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn accept(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    headers
        .get(header::ACCEPT)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| ApiError::BadRequest("Bad Accept header.\n".to_string()))
}

async fn handle_not_found() -> ApiError {
    ApiError::NotFound
}

async fn handle_root(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed { allow: "GET" });
    }
    let media_type = choose(accept(&headers)?, &[TEXT_PLAIN, APPLICATION_JSON])?;
    let listing = ProcessListing(
        state
            .processes
            .iter()
            .map(|(label, handler)| (format!("/{}", label), handler.description().to_string()))
            .collect(),
    );
    Ok(response::representation(listing.render(media_type)))
}

async fn handle_process(
    State(state): State<Arc<AppState>>,
    Path(process): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let handler = state
        .processes
        .get(&process)
        .cloned()
        .ok_or(ApiError::NotFound)?;
    match method {
        Method::GET => Ok(response::representation(
            handler.document(accept(&headers)?)?,
        )),
        Method::POST => {
            let body = body.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::PayloadTooLarge
                } else {
                    ApiError::BadRequest("Bad request body.\n".to_string())
                }
            })?;
            submit(state, process, handler, &headers, body).await
        }
        _ => Err(ApiError::MethodNotAllowed {
            allow: "GET, POST",
        }),
    }
}

/// Read the declared length and content type, then trim the body to that length.
fn submission(headers: &HeaderMap, body: Bytes) -> Result<Submission, ApiError> {
    let bad_length = || ApiError::BadRequest("Bad content-length.\n".to_string());
    let length: usize = headers
        .get(header::CONTENT_LENGTH)
        .ok_or(ApiError::LengthRequired)?
        .to_str()
        .map_err(|_| bad_length())?
        .trim()
        .parse()
        .map_err(|_| bad_length())?;
    if body.len() < length {
        return Err(bad_length());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .ok_or_else(|| ApiError::BadRequest("No content-type.\n".to_string()))?
        .to_str()
        .map_err(|_| ApiError::BadRequest("Bad content-type.\n".to_string()))?
        .trim()
        .to_string();
    Ok(Submission {
        data: body[..length].to_vec(),
        content_type,
    })
}

async fn submit(
    state: Arc<AppState>,
    process: String,
    handler: Arc<dyn ProcessHandler>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let submission = submission(headers, body)?;
    let prefix = state
        .public_url
        .as_deref()
        .unwrap_or("")
        .trim_end_matches('/')
        .to_string();

    // Runs detached so that a dropped request cannot stop it between launch and
    // registration or skip the rollback.
    let task = tokio::spawn(async move {
        register(&state, &process, handler.as_ref(), &submission).await
    });
    let id = task
        .await
        .map_err(|e| ApiError::Internal(format!("submission task: {}", e)))??;
    Ok(response::created(&format!("{}/job/{}", prefix, id)))
}

/// Allocate, stage, validate, launch and register one job. Any failure removes the
/// working directory; a failure after launch also cancels the launched work.
async fn register(
    state: &AppState,
    process: &str,
    handler: &dyn ProcessHandler,
    submission: &Submission,
) -> Result<String, ApiError> {
    let dir = allocate_unclaimed(state).await?;

    if let Err(e) = stage_and_launch(handler, &dir, submission).await {
        tracing::info!(job_id = %dir.id(), process = %process, error = %e, "submission not started");
        discard(&dir).await;
        return Err(e.into());
    }

    if let Err(e) = state.registry.insert(dir.id(), process).await {
        tracing::error!(job_id = %dir.id(), process = %process, error = %e, "registry insert failed; cancelling job");
        if let Err(e) = handler.delete(&dir).await {
            tracing::warn!(job_id = %dir.id(), error = %e, "cancel after failed insert");
        }
        discard(&dir).await;
        return Err(e.into());
    }

    tracing::info!(job_id = %dir.id(), process = %process, "job submitted");
    Ok(dir.id().to_string())
}

/// A fresh directory whose name no registry row uses. Deleted jobs keep their row
/// after their directory is gone, so the filesystem alone cannot rule out reuse.
async fn allocate_unclaimed(state: &AppState) -> Result<WorkingDir, ApiError> {
    for _ in 0..ALLOCATE_ATTEMPTS {
        let dir = WorkingDir::allocate(&state.base_dir).await?;
        match state.registry.get(dir.id()).await {
            Ok(None) => return Ok(dir),
            Ok(Some(_)) => {
                tracing::debug!(job_id = %dir.id(), "id of a deleted job drawn again");
                discard(&dir).await;
            }
            Err(e) => {
                discard(&dir).await;
                return Err(e.into());
            }
        }
    }
    Err(ApiError::Internal(
        "no unused job id after repeated allocation".to_string(),
    ))
}

async fn stage_and_launch(
    handler: &dyn ProcessHandler,
    dir: &WorkingDir,
    submission: &Submission,
) -> Result<(), HandlerError> {
    dir.stage(submission).await?;
    handler.validate(dir, submission).await?;
    handler.launch(dir).await
}

async fn discard(dir: &WorkingDir) {
    if let Err(e) = dir.remove().await {
        tracing::warn!(job_id = %dir.id(), error = %e, "could not remove working directory");
    }
}

async fn handle_job(
    State(state): State<Arc<AppState>>,
    Path(rest): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let rest = rest.trim_start_matches('/');
    let (id, name) = rest.split_once('/').unwrap_or((rest, ""));
    if id.is_empty() {
        return Err(ApiError::NotFound);
    }

    let record = state.registry.get(id).await?.ok_or(ApiError::NotFound)?;
    if record.deleted {
        return Err(ApiError::Gone);
    }
    let handler = state.processes.get(&record.process).cloned().ok_or_else(|| {
        ApiError::Internal(format!(
            "job {} belongs to unconfigured process {:?}",
            id, record.process
        ))
    })?;
    let dir = WorkingDir::open(&state.base_dir, id);

    if name.is_empty() {
        match method {
            Method::GET => {
                let info = handler.info(accept(&headers)?, &dir).await;
                Ok(response::representation(settle(&state, id, info).await?))
            }
            Method::DELETE => delete_job(&state, id, handler.as_ref(), &dir).await,
            _ => Err(ApiError::MethodNotAllowed {
                allow: "GET, DELETE",
            }),
        }
    } else if method == Method::GET {
        let part = handler.subpart(accept(&headers)?, &dir, name).await;
        Ok(response::representation(settle(&state, id, part).await?))
    } else {
        let part = handler.subpart(None, &dir, name).await;
        settle(&state, id, part).await?;
        Err(ApiError::MethodNotAllowed { allow: "GET" })
    }
}

/// Map a handler result. A file that vanished while the job was being read means
/// a concurrent delete won the race when the registry now says so.
async fn settle<T>(
    state: &AppState,
    id: &str,
    result: Result<T, HandlerError>,
) -> Result<T, ApiError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_missing_file() => match state.registry.get(id).await? {
            Some(record) if record.deleted => Err(ApiError::Gone),
            _ => Err(e.into()),
        },
        Err(e) => Err(e.into()),
    }
}

async fn delete_job(
    state: &AppState,
    id: &str,
    handler: &dyn ProcessHandler,
    dir: &WorkingDir,
) -> Result<Response, ApiError> {
    if !state.registry.mark_deleted(id).await? {
        return Err(ApiError::Gone);
    }
    if let Err(e) = handler.delete(dir).await {
        tracing::warn!(job_id = %id, error = %e, "handler cleanup failed");
    }
    if let Err(e) = dir.remove().await {
        tracing::error!(job_id = %id, error = %e, "working directory left behind");
    }
    tracing::info!(job_id = %id, "job deleted");
    Ok(response::no_content())
}
