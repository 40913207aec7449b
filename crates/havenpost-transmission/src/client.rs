//! Transmission RPC client.
//!
//! Speaks the JSON RPC dialect Transmission exposes at a single endpoint:
//! every call is a POST carrying `{"method", "arguments"}`, and the daemon
//! issues a CSRF session id via a 409 handshake that must be echoed back in
//! the `X-Transmission-Session-Id` header on subsequent requests.

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use havenpost_torrent_core::{TorrentClient, TorrentError, TorrentResult, TorrentSnapshot};

use crate::error::{Result, TransmissionError};
use crate::models::{RpcResponse, TORRENT_FIELDS, TorrentGetArguments};

const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Optional basic-auth credentials for the RPC endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// HTTP client for a single Transmission daemon.
pub struct TransmissionClient {
    http: reqwest::Client,
    url: String,
    credentials: Option<Credentials>,
    session_id: Mutex<Option<String>>,
}

impl TransmissionClient {
    /// Construct a client against the given RPC URL.
    #[must_use]
    pub fn new(url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            credentials,
            session_id: Mutex::new(None),
        }
    }

    /// Issue one RPC call, performing the 409 session-id handshake at most
    /// once per call.
    async fn rpc(&self, method: &str, arguments: serde_json::Value) -> Result<serde_json::Value> {
        let body = json!({ "method": method, "arguments": arguments });

        let response = self.post(&body).await?;
        let response = if response.status().as_u16() == 409 {
            let session_id = response
                .headers()
                .get(SESSION_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            debug!(method, "negotiated transmission session id");
            *self.session_id.lock().await = session_id;
            self.post(&body).await?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransmissionError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let envelope: RpcResponse<serde_json::Value> = response.json().await?;
        if envelope.result != "success" {
            return Err(TransmissionError::Rpc {
                result: envelope.result,
            });
        }
        Ok(envelope.arguments.unwrap_or_default())
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let mut request = self.http.post(&self.url).json(body);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(session_id) = self.session_id.lock().await.as_deref() {
            request = request.header(SESSION_ID_HEADER, session_id);
        }
        Ok(request.send().await?)
    }
}

#[async_trait]
impl TorrentClient for TransmissionClient {
    async fn list_torrents(&self) -> TorrentResult<Vec<TorrentSnapshot>> {
        let arguments = self
            .rpc("torrent-get", json!({ "fields": TORRENT_FIELDS }))
            .await
            .map_err(|error| TorrentError::operation_failed("torrent_get", None, error))?;
        let arguments: TorrentGetArguments = serde_json::from_value(arguments)
            .map_err(|error| TorrentError::operation_failed("torrent_get", None, error))?;
        Ok(arguments
            .torrents
            .into_iter()
            .map(crate::models::TorrentFields::into_snapshot)
            .collect())
    }

    async fn remove_torrent(&self, id: i64) -> TorrentResult<()> {
        // Local data stays in place; cleanup is the pruner's responsibility.
        self.rpc(
            "torrent-remove",
            json!({ "ids": [id], "delete-local-data": false }),
        )
        .await
        .map_err(|error| TorrentError::operation_failed("torrent_remove", Some(id), error))?;
        Ok(())
    }
}
