//! Recording transport for unit tests

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::Transport;
use crate::{Error, Result};

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Get {
        path: String,
        query: Vec<(String, String)>,
    },
    Post {
        path: String,
        body: Value,
    },
}

type Responder = Box<dyn Fn(&Recorded) -> Result<Value> + Send + Sync>;

/// Transport that records every call and answers from a responder
pub struct MockTransport {
    calls: Mutex<Vec<Recorded>>,
    responder: Responder,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Recorded) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Answer every request with `body`
    pub fn replying(body: Value) -> Self {
        Self::new(move |_| Ok(body.clone()))
    }

    /// Fail every request with `status`
    pub fn failing(status: u16) -> Self {
        Self::new(move |_| {
            Err(Error::Status {
                status,
                body: "Internal Server Error".to_string(),
            })
        })
    }

    pub async fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Recorded) -> Result<Value> {
        let reply = (self.responder)(&call);
        self.calls.lock().await.push(call);
        reply
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        self.record(Recorded::Get {
            path: path.to_string(),
            query: query.to_vec(),
        })
        .await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.record(Recorded::Post {
            path: path.to_string(),
            body: body.clone(),
        })
        .await
    }
}
