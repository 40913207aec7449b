//! Client for waking the playback device through the home-automation host.

use tracing::info;

use crate::error::{AppError, AppResult};

/// Service path that turns a switch entity on.
const TURN_ON_PATH: &str = "/api/services/switch/turn_on";

/// Turns on the switch entity that powers the playback device.
pub struct WakeSwitch {
    http: reqwest::Client,
    base_url: String,
    entity: String,
    token: String,
}

impl WakeSwitch {
    /// Construct a client for the automation host at `base_url`.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        entity: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            entity: entity.into(),
            token: token.into(),
        }
    }

    /// Entity name, for logs and events.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Ask the automation host to turn the switch on.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be delivered or the host
    /// answers with a non-success status.
    pub async fn turn_on(&self) -> AppResult<()> {
        let url = format!("{}{TURN_ON_PATH}", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({ "entity_id": format!("switch.{}", self.entity) });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|source| AppError::http("wake_device", url.clone(), source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_status("wake_device", url, status.as_u16()));
        }
        info!(entity = %self.entity, "wake request delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn posts_switch_entity_with_bearer_token() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/services/switch/turn_on")
                .header("authorization", "Bearer secret")
                .json_body(json!({"entity_id": "switch.media_station"}));
            then.status(200).json_body(json!([]));
        });

        let switch = WakeSwitch::new(server.base_url(), "media_station", "secret");
        switch.turn_on().await?;

        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/services/switch/turn_on");
            then.status(200).json_body(json!([]));
        });

        let switch = WakeSwitch::new(format!("{}/", server.base_url()), "media_station", "secret");
        switch.turn_on().await?;

        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn error_status_surfaces_as_http_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/services/switch/turn_on");
            then.status(401);
        });

        let switch = WakeSwitch::new(server.base_url(), "media_station", "bad-token");
        let error = switch.turn_on().await.expect_err("expected status failure");
        assert!(matches!(
            error,
            AppError::HttpStatus {
                operation: "wake_device",
                status: 401,
                ..
            }
        ));
    }
}
