//! Request handlers: one per engine operation.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::db::JobStore;
use crate::engine::Engine;
use crate::error::Error;
use crate::model::duration::parse_optional;
use crate::model::{JobId, NewJob};

/// Body of `POST /{queue}`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PutRequest {
    pub priority: i64,
    /// e.g. `"10s"`; absent or empty means no delay.
    pub delay: Option<String>,
    /// e.g. `"2m"`; absent, empty or zero means the server default.
    pub ttr: Option<String>,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub id: JobId,
}

pub async fn put<S: JobStore>(
    State(engine): State<Arc<Engine<S>>>,
    Path(queue): Path<String>,
    payload: Bytes,
) -> Result<(StatusCode, Json<PutResponse>), ApiError> {
    // Parsed by hand so clients need not send a JSON content type.
    let request: PutRequest = serde_json::from_slice(&payload)
        .map_err(|e| ApiError::invalid_json(format!("invalid JSON body: {e}")))?;

    let mut new = NewJob::new(queue, request.body).priority(request.priority);
    if let Some(delay) = parse_optional("delay", request.delay.as_deref())? {
        new = new.delay(delay);
    }
    if let Some(ttr) = parse_optional("ttr", request.ttr.as_deref())? {
        new = new.ttr(ttr);
    }

    let id = engine.enqueue(new).await?;
    Ok((StatusCode::CREATED, Json(PutResponse { id })))
}

/// `200` with the job, or `204` when nothing in the queue is eligible.
pub async fn reserve<S: JobStore>(
    State(engine): State<Arc<Engine<S>>>,
    Path(queue): Path<String>,
) -> Result<Response, ApiError> {
    match engine.reserve(&queue).await? {
        Some(job) => Ok(Json(job).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Always `204` on success, whether or not the job existed.
pub async fn delete<S: JobStore>(
    State(engine): State<Arc<Engine<S>>>,
    Path((queue, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id: JobId = id
        .parse()
        .map_err(|_| Error::Validation {
            field: "id",
            reason: format!("{id:?} is not a job id"),
        })?;

    engine.delete(&queue, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health<S: JobStore>(
    State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    engine.health_check().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_request_fields_default() {
        let request: PutRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.priority, 0);
        assert!(request.delay.is_none());
        assert!(request.body.is_empty());

        let request: PutRequest =
            serde_json::from_str(r#"{"priority": -3, "delay": "5s", "body": "x"}"#).unwrap();
        assert_eq!(request.priority, -3);
        assert_eq!(request.delay.as_deref(), Some("5s"));
    }
}
