//! # Shipment Backend

//! The remote data store the board reads from and writes reschedules to. The `ShipmentBackend` trait is
//! the seam; `HttpShipmentBackend` talks to the REST API with `reqwest`.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;
use crate::config::BackendSettings;
use crate::errors::{BoardError, BoardResult};
use crate::models::{Shipment, ShipmentId};

/// Body of the reschedule call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub id: ShipmentId,
    /// ISO-8601 timestamp.
    pub delivery_date: String,
}

/// Remote source of truth for shipments.
#[async_trait]
pub trait ShipmentBackend: Send + Sync {
    /// Fetches the full shipment collection.
    async fn fetch_shipments(&self) -> BoardResult<Vec<Shipment>>;

    /// Persists a new delivery date. Any `Ok` means the server accepted it.
    async fn update_delivery_date(&self, request: &RescheduleRequest) -> BoardResult<()>;
}

/// `ShipmentBackend` over the dashboard REST API.
#[derive(Debug, Clone)]
pub struct HttpShipmentBackend {
    client: Client,
    shipments_url: Url,
    reschedule_url: Url,
    token: Option<Secret<String>>,
}

impl HttpShipmentBackend {
    /// Builds a client from backend settings.
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` when the base URL and paths form valid URLs
    /// * `Err(BoardError)` if a URL is invalid or the HTTP client cannot be built
    pub fn new(settings: &BackendSettings) -> BoardResult<Self> {
        let base = Url::parse(&settings.base_url)?;
        let mut builder = Client::builder();
        if let Some(ms) = settings.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build()?;
        info!("Shipment backend configured at {}", base);
        Ok(Self {
            client,
            shipments_url: endpoint(&base, &settings.shipments_path)?,
            reschedule_url: endpoint(&base, &settings.reschedule_path)?,
            token: settings.api_token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

#[async_trait]
impl ShipmentBackend for HttpShipmentBackend {
    async fn fetch_shipments(&self) -> BoardResult<Vec<Shipment>> {
        debug!("GET {}", self.shipments_url);
        let response = self.authorize(self.client.get(self.shipments_url.clone()))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        parse_shipments(&body)
    }

    async fn update_delivery_date(&self, request: &RescheduleRequest) -> BoardResult<()> {
        debug!("POST {} {:?}", self.reschedule_url, request);
        let response = self.authorize(self.client.post(self.reschedule_url.clone()))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        // The body carries nothing the board needs, but it must at least be JSON when present.
        if !body.trim().is_empty() {
            serde_json::from_str::<Value>(&body)
                .map_err(|e| BoardError::MalformedResponse(e.to_string()))?;
        }
        Ok(())
    }
}

/// Resolves an API path below the base URL, keeping any path prefix the base carries.
pub fn endpoint(base: &Url, path: &str) -> BoardResult<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Decodes the shipments collection, which may be a bare array or wrapped in `shipments` / `data`.
pub fn parse_shipments(body: &str) -> BoardResult<Vec<Shipment>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BoardError::MalformedResponse(e.to_string()))?;
    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove("shipments").or_else(|| map.remove("data")) {
            Some(list @ Value::Array(_)) => list,
            _ => {
                warn!("Shipments response carried no shipment list");
                Value::Array(Vec::new())
            }
        },
        other => {
            return Err(BoardError::MalformedResponse(format!("unexpected shipments payload: {}", other)))
        }
    };
    serde_json::from_value(list).map_err(|e| BoardError::MalformedResponse(e.to_string()))
}

/// Turns a non-2xx response into `ServerRejected`, preferring the server's `message` field.
fn rejection(status: StatusCode, body: &str) -> BoardError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("Server error {}", status.as_u16()));
    BoardError::ServerRejected { status: status.as_u16(), message }
}
