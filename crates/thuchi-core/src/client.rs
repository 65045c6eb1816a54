//! Remote store client for the AppSheet table
//!
//! Three verbs (Find, Edit, Delete) are POSTed to a single action endpoint.
//! Each verb is attempted exactly once; failures come back as `CoreError`
//! values with a localized message and never panic. No verb touches the
//! local collection; callers re-fetch after a mutation.

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client, Method, Request};
use hyper_rustls::HttpsConnector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thuchi_config::RemoteConfig;

use crate::error::{CoreError, CoreResult, RemoteError};
use crate::models::Transaction;
use crate::raw::RawRow;
use crate::reconcile::reconcile;
use crate::time::format_date;

/// Header carrying the application access key
pub const ACCESS_KEY_HEADER: &str = "applicationAccessKey";

// ==================== Wire Types ====================

/// Action verb understood by the remote table API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Find,
    Edit,
    Delete,
}

/// Request properties; only the locale is ever sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(rename = "Locale", default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Body of every call to the action endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(rename = "Action")]
    pub action: Action,
    #[serde(rename = "Properties")]
    pub properties: Properties,
    #[serde(rename = "Rows")]
    pub rows: Vec<RawRow>,
}

/// Raw HTTP outcome
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

// ==================== Transport ====================

/// Transport reference type
pub type TransportRef = Arc<dyn Transport>;

/// Sends one action request and returns the raw response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &ActionRequest) -> Result<TransportResponse, RemoteError>;
}

/// HTTPS transport backed by hyper
pub struct HttpTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    endpoint: String,
    access_key: String,
}

impl HttpTransport {
    pub fn new(remote: &RemoteConfig) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        Self {
            client: Client::builder().build(https),
            endpoint: remote.endpoint(),
            access_key: remote.access_key.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &ActionRequest) -> Result<TransportResponse, RemoteError> {
        let payload = serde_json::to_vec(request).map_err(|e| RemoteError::Transport {
            message: e.to_string(),
        })?;

        let http_request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header(ACCESS_KEY_HEADER, self.access_key.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .map_err(|e| RemoteError::Transport { message: e.to_string() })?;

        let response = self
            .client
            .request(http_request)
            .await
            .map_err(|e| RemoteError::Transport { message: e.to_string() })?;

        let status = response.status().as_u16();
        let body = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| RemoteError::Transport { message: e.to_string() })?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

// ==================== Client ====================

/// Find/Edit/Delete against the transaction table
pub struct RemoteStoreClient {
    transport: TransportRef,
    locale: String,
}

impl RemoteStoreClient {
    pub fn new(transport: TransportRef, locale: impl Into<String>) -> Self {
        Self {
            transport,
            locale: locale.into(),
        }
    }

    /// Fetch every row and reconcile it into the canonical collection
    pub async fn fetch_all(&self) -> CoreResult<Vec<Transaction>> {
        let request = ActionRequest {
            action: Action::Find,
            properties: self.locale_properties(),
            rows: vec![],
        };

        let body = self
            .call(&request)
            .await
            .map_err(|source| CoreError::FetchFailed { source })?;
        let rows = rows_from_body(body).map_err(|source| CoreError::FetchFailed { source })?;

        log::debug!("Fetched {} raw rows", rows.len());
        Ok(reconcile(rows))
    }

    /// Write one record back to its row
    pub async fn update(&self, tx: &Transaction) -> CoreResult<()> {
        let request = ActionRequest {
            action: Action::Edit,
            properties: Properties::default(),
            rows: vec![to_edit_row(tx)],
        };

        self.call(&request)
            .await
            .map_err(|source| CoreError::UpdateFailed { source })?;

        log::info!("Updated row {}", tx.remote_key());
        Ok(())
    }

    /// Delete one row, keyed by `remote_id` when present, else `id`
    pub async fn remove(&self, id: &str, remote_id: Option<&str>) -> CoreResult<()> {
        let key = remote_id.filter(|k| !k.is_empty()).unwrap_or(id);
        let request = ActionRequest {
            action: Action::Delete,
            properties: self.locale_properties(),
            rows: vec![RawRow {
                id: Some(key.to_string()),
                ..Default::default()
            }],
        };

        self.call(&request)
            .await
            .map_err(|source| CoreError::DeleteFailed { source })?;

        log::info!("Deleted row {}", key);
        Ok(())
    }

    fn locale_properties(&self) -> Properties {
        Properties {
            locale: Some(self.locale.clone()),
        }
    }

    /// Send one request; non-2xx and rejected bodies become errors
    async fn call(&self, request: &ActionRequest) -> Result<serde_json::Value, RemoteError> {
        let response = self.transport.post(request).await?;

        if !(200..300).contains(&response.status) {
            return Err(RemoteError::Status { status: response.status });
        }

        let body = if response.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&response.body).map_err(|e| RemoteError::Decode {
                message: e.to_string(),
            })?
        };

        if let Some(rejection) = rejection(&body) {
            return Err(rejection);
        }

        Ok(body)
    }
}

/// Serialize a record into the row shape expected by Edit
fn to_edit_row(tx: &Transaction) -> RawRow {
    RawRow {
        row_number: None,
        id: Some(tx.remote_key().to_string()),
        ngay: Some(format_date(tx.ngay)),
        nguoi_cap_nhat: Some(tx.nguoi_cap_nhat.clone()),
        loai_thu_chi: Some(tx.loai_thu_chi.as_str().to_string()),
        noi_dung: Some(tx.noi_dung.clone()),
        doi_tuong_thu_chi: Some(tx.doi_tuong_thu_chi.clone()),
        so_tien: Some(tx.so_tien.to_string()),
        ghi_chu: Some(tx.ghi_chu.clone()),
    }
}

/// Detect a 2xx body that nevertheless reports failure
fn rejection(body: &serde_json::Value) -> Option<RemoteError> {
    let object = body.as_object()?;

    let explicit_failure = matches!(
        object.get("Success").or_else(|| object.get("success")),
        Some(serde_json::Value::Bool(false))
    );
    let error_without_rows = !object.contains_key("Rows")
        && ["error", "Error", "errors"].iter().any(|k| object.contains_key(*k));

    if !explicit_failure && !error_without_rows {
        return None;
    }

    let message = ["Message", "message", "error", "Error", "detail"]
        .iter()
        .filter_map(|k| object.get(*k))
        .find_map(|v| v.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    Some(RemoteError::Rejected { message })
}

/// Find answers with a bare array or `{ "Rows": [...] }`
fn rows_from_body(body: serde_json::Value) -> Result<Vec<RawRow>, RemoteError> {
    let items = match body {
        serde_json::Value::Null => vec![],
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut object) => match object.remove("Rows") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(RemoteError::Decode {
                    message: "expected an array of rows".to_string(),
                })
            }
        },
        _ => {
            return Err(RemoteError::Decode {
                message: "expected an array of rows".to_string(),
            })
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawRow>(item) {
            Ok(row) => Some(row),
            Err(e) => {
                log::warn!("Skipping malformed row: {}", e);
                None
            }
        })
        .collect())
}
