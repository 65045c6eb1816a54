//! In-memory stand-in for the remote table, shared by unit tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::client::{Action, ActionRequest, Transport, TransportResponse};
use crate::error::RemoteError;

/// Scripted failure for the next call
#[derive(Debug, Clone)]
pub enum Failure {
    Status(u16),
    Transport(String),
}

enum Scripted {
    Fail(Failure),
    Respond(u16, String),
}

/// Table of JSON rows answering Find, Edit and Delete
#[derive(Default)]
pub struct FakeTable {
    rows: Mutex<Vec<Value>>,
    requests: Mutex<Vec<Value>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl FakeTable {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            ..Default::default()
        })
    }

    /// Every request received so far, as sent on the wire
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn rows(&self) -> Vec<Value> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_next(&self, failure: Failure) {
        self.script.lock().unwrap().push_back(Scripted::Fail(failure));
    }

    pub fn respond_with(&self, status: u16, body: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Respond(status, body.to_string()));
    }

    fn answer(&self, request: &ActionRequest) -> Value {
        let mut rows = self.rows.lock().unwrap();
        match request.action {
            Action::Find => Value::Array(rows.clone()),
            Action::Edit => {
                let mut edited = Vec::new();
                for change in &request.rows {
                    let key = change.id.clone().unwrap_or_default();
                    let Some(row) = rows.iter_mut().find(|r| cell(&r["id"]) == key) else {
                        return json!({ "Success": false, "Message": "Row not found" });
                    };
                    if let (Value::Object(target), Ok(Value::Object(fields))) =
                        (row, serde_json::to_value(change))
                    {
                        target.extend(fields);
                        edited.push(Value::Object(target.clone()));
                    }
                }
                json!({ "Rows": edited })
            }
            Action::Delete => {
                let keys: Vec<String> = request
                    .rows
                    .iter()
                    .filter_map(|r| r.id.clone())
                    .collect();
                let before = rows.len();
                rows.retain(|r| !keys.contains(&cell(&r["id"])));
                if rows.len() == before {
                    return json!({ "Success": false, "Message": "Row not found" });
                }
                json!({ "Rows": [] })
            }
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Transport for FakeTable {
    async fn post(&self, request: &ActionRequest) -> Result<TransportResponse, RemoteError> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());

        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(Scripted::Fail(Failure::Transport(message))) => {
                Err(RemoteError::Transport { message })
            }
            Some(Scripted::Fail(Failure::Status(status))) => Ok(TransportResponse {
                status,
                body: b"{\"error\":\"server\"}".to_vec(),
            }),
            Some(Scripted::Respond(status, body)) => Ok(TransportResponse {
                status,
                body: body.into_bytes(),
            }),
            None => Ok(TransportResponse {
                status: 200,
                body: serde_json::to_vec(&self.answer(request)).unwrap(),
            }),
        }
    }
}
