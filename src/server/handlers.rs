//! Request handlers for the two network-facing operations

use super::envelope::Envelope;
use super::AppState;
use crate::{Error, Result, Vault};
use axum::{body::Bytes, extract::State};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct GetDataRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetDataRequest {
    pub username: String,
    pub password: String,
    /// Base64-encoded payload
    pub content: Option<String>,
}

/// `POST /getData`: verify, then return the payload as base64
pub async fn get_data(State(state): State<AppState>, body: Bytes) -> Envelope {
    let req: GetDataRequest = match decode(&body) {
        Ok(req) => req,
        Err(e) => return reply("getData", Err(e)),
    };
    tracing::debug!(username = %req.username, "fetch requested");

    let result = run_blocking(&state.vault, move |vault| {
        vault.verified_read(&req.username, &req.password)
    })
    .await;

    reply("getData", result.map(|payload| Some(STANDARD.encode(payload))))
}

/// `POST /setData`: decode the base64 payload, verify, then replace
pub async fn set_data(State(state): State<AppState>, body: Bytes) -> Envelope {
    let req: SetDataRequest = match decode(&body) {
        Ok(req) => req,
        Err(e) => return reply("setData", Err(e)),
    };

    let payload = match req.content.as_deref().map(|c| STANDARD.decode(c)) {
        Some(Ok(bytes)) => bytes,
        Some(Err(e)) => {
            tracing::debug!(error = %e, "content is not base64");
            return reply(
                "setData",
                Err(Error::Validation("base64 decode error!".into())),
            );
        }
        None => {
            return reply("setData", Err(Error::Validation("content is required".into())));
        }
    };

    let result = run_blocking(&state.vault, move |vault| {
        vault.verified_write(&req.username, &req.password, &payload)
    })
    .await;

    reply("setData", result.map(|()| None))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "undecodable request body");
        Error::Validation("malformed request body".into())
    })
}

/// Vault calls hash with bcrypt and block on SQLite, so keep them off the
/// async workers.
async fn run_blocking<T, F>(vault: &Arc<Vault>, f: F) -> Result<T>
where
    F: FnOnce(&Vault) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let vault = Arc::clone(vault);
    tokio::task::spawn_blocking(move || f(&vault))
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}

fn reply(op: &str, result: Result<Option<String>>) -> Envelope {
    match result {
        Ok(data) => Envelope::ok(data),
        Err(e) if e.is_soft() => Envelope::from_error(&e),
        Err(e) => {
            tracing::error!(op, error = %e, "request failed");
            Envelope::from_error(&e)
        }
    }
}
