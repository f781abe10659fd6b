//! Board REST API client.
//!
//! Thin HTTP wrapper over `/boards/{id}` and `/stickers`. Status mapping and
//! body parsing are pure functions for testability.

use std::time::Duration;

use serde::Serialize;

use super::{BoardSnapshot, GatewayError, SyncGateway};
use crate::config::{Config, Timeouts};
use crate::doc::{Sticker, StickerRecord};

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeouts: Timeouts) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| GatewayError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, token })
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(config.api_url.clone(), config.token.clone(), config.timeouts)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, GatewayError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        check_status(status, text)
    }
}

#[async_trait::async_trait]
impl SyncGateway for HttpGateway {
    async fn fetch_board(&self, board_id: &str) -> Result<BoardSnapshot, GatewayError> {
        let body = self
            .send(self.http.get(self.url(&format!("/boards/{board_id}"))))
            .await?;
        parse_board(&body)
    }

    async fn persist_sticker(&self, sticker: &Sticker) -> Result<Sticker, GatewayError> {
        let request = match sticker.id.as_permanent() {
            None => self
                .http
                .post(self.url("/stickers"))
                .json(&CreateRequest::from_sticker(sticker)),
            Some(id) => self
                .http
                .put(self.url(&format!("/stickers/{id}")))
                .json(&UpdateRequest::from_sticker(sticker)),
        };
        let body = self.send(request).await?;
        parse_sticker(&body).map(Sticker::from)
    }

    async fn delete_sticker(&self, id: &str) -> Result<(), GatewayError> {
        self.send(self.http.delete(self.url(&format!("/stickers/{id}"))))
            .await?;
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    dashboard_id: &'a str,
    x: f64,
    y: f64,
    text: &'a str,
    width: f64,
    height: f64,
    color: &'a str,
}

impl<'a> CreateRequest<'a> {
    fn from_sticker(sticker: &'a Sticker) -> Self {
        Self {
            dashboard_id: &sticker.board_id,
            x: sticker.x,
            y: sticker.y,
            text: &sticker.text,
            width: sticker.width,
            height: sticker.height,
            color: &sticker.color,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    x: f64,
    y: f64,
    text: &'a str,
    width: f64,
    height: f64,
    color: &'a str,
}

impl<'a> UpdateRequest<'a> {
    fn from_sticker(sticker: &'a Sticker) -> Self {
        Self {
            x: sticker.x,
            y: sticker.y,
            text: &sticker.text,
            width: sticker.width,
            height: sticker.height,
            color: &sticker.color,
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn check_status(status: u16, body: String) -> Result<String, GatewayError> {
    match status {
        200..=299 => Ok(body),
        401 => Err(GatewayError::Unauthorized),
        403 => Err(GatewayError::Forbidden),
        404 => Err(GatewayError::NotFound),
        _ => Err(GatewayError::Response { status, body }),
    }
}

fn parse_board(json: &str) -> Result<BoardSnapshot, GatewayError> {
    serde_json::from_str(json).map_err(|e| GatewayError::Parse(e.to_string()))
}

fn parse_sticker(json: &str) -> Result<StickerRecord, GatewayError> {
    serde_json::from_str(json).map_err(|e| GatewayError::Parse(e.to_string()))
}
