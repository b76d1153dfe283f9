//! Dispatch results and response decoding

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result};

/// How a dispatch reached the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// One direct request
    Single,
    /// One POST to the batch endpoint
    Batch,
}

/// A sub-query that the backend reported as failed inside a successful batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// Status code carried by the entry
    pub code: u16,
    /// Optional reason text from the backend
    pub reason: Option<String>,
}

/// Result for one operation id
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub operation_id: String,
    pub result: std::result::Result<Value, EntryFailure>,
}

impl OperationResult {
    /// Successful result for `operation_id`
    #[must_use]
    pub fn ok(operation_id: impl Into<String>, result: Value) -> Self {
        Self {
            operation_id: operation_id.into(),
            result: Ok(result),
        }
    }

    /// Decode the payload into `T`
    ///
    /// # Errors
    ///
    /// Returns error if the entry failed or the payload doesn't match `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.result {
            Ok(value) => T::deserialize(value).map_err(|e| {
                Error::MalformedResponse(format!("result for {}: {e}", self.operation_id))
            }),
            Err(failure) => Err(Error::Status {
                status: failure.code,
                body: failure.reason.clone().unwrap_or_default(),
            }),
        }
    }
}

/// Ordered results of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub mode: DispatchMode,
    pub results: Vec<OperationResult>,
}

impl DispatchOutcome {
    /// Result for `operation_id`, if the backend returned one
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&OperationResult> {
        self.results.iter().find(|r| r.operation_id == operation_id)
    }
}

/// `{ "result": ... }` envelope shared by both endpoints
#[derive(Debug, Deserialize)]
struct Envelope {
    result: Value,
}

/// One entry of the batch endpoint's `result` array
#[derive(Debug, Deserialize)]
struct RawBatchEntry {
    operation_id: String,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    reason: Option<String>,
}

/// Unwrap a single-endpoint body into the uniform per-operation form
pub(crate) fn decode_single(body: Value, operation_id: String) -> Result<DispatchOutcome> {
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| Error::MalformedResponse(format!("single response: {e}")))?;

    Ok(DispatchOutcome {
        mode: DispatchMode::Single,
        results: vec![OperationResult::ok(operation_id, envelope.result)],
    })
}

/// Decode a batch-endpoint body, keeping entry order and echoed ids
///
/// An entry whose `code` is 400 or above becomes a per-operation failure.
pub(crate) fn decode_batch(body: Value) -> Result<DispatchOutcome> {
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| Error::MalformedResponse(format!("batch response: {e}")))?;

    let entries: Vec<RawBatchEntry> = serde_json::from_value(envelope.result)
        .map_err(|e| Error::MalformedResponse(format!("batch result entries: {e}")))?;

    let results = entries
        .into_iter()
        .map(|entry| {
            let result = match entry.code {
                Some(code) if code >= 400 => Err(EntryFailure {
                    code,
                    reason: entry.reason,
                }),
                _ => Ok(entry.result),
            };
            OperationResult {
                operation_id: entry.operation_id,
                result,
            }
        })
        .collect();

    Ok(DispatchOutcome {
        mode: DispatchMode::Batch,
        results,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_single_wraps_result() {
        let outcome = decode_single(json!({"code": 200, "result": [{"count": 4}]}), "#x".to_string())
            .unwrap();

        assert_eq!(outcome.mode, DispatchMode::Single);
        assert_eq!(outcome.results, vec![OperationResult::ok("#x", json!([{"count": 4}]))]);
    }

    #[test]
    fn test_decode_single_requires_result() {
        let err = decode_single(json!({"count": 4}), "#x".to_string()).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_batch_keeps_order_and_ids() {
        let outcome = decode_batch(json!({
            "result": [
                {"operation_id": "#b", "result": [{"count": 2}]},
                {"operation_id": "#a", "result": [{"count": 1}]},
            ]
        }))
        .unwrap();

        let ids: Vec<&str> = outcome.results.iter().map(|r| r.operation_id.as_str()).collect();
        assert_eq!(ids, vec!["#b", "#a"]);
        assert_eq!(outcome.get("#a").unwrap().result, Ok(json!([{"count": 1}])));
    }

    #[test]
    fn test_decode_batch_entry_failure() {
        let outcome = decode_batch(json!({
            "result": [
                {"operation_id": "#ok", "code": 200, "result": []},
                {"operation_id": "#bad", "code": 404, "reason": "no such job"},
            ]
        }))
        .unwrap();

        assert!(outcome.get("#ok").unwrap().result.is_ok());
        assert_eq!(
            outcome.get("#bad").unwrap().result,
            Err(EntryFailure {
                code: 404,
                reason: Some("no such job".to_string()),
            })
        );
    }

    #[test]
    fn test_decode_batch_rejects_non_array() {
        let err = decode_batch(json!({"result": {"count": 3}})).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_batch_rejects_missing_operation_id() {
        let err = decode_batch(json!({"result": [{"result": []}]})).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_operation_result_decode() {
        #[derive(Debug, Deserialize)]
        struct Count {
            count: u64,
        }

        let ok = OperationResult::ok("#x", json!({"count": 9}));
        assert_eq!(ok.decode::<Count>().unwrap().count, 9);

        let failed = OperationResult {
            operation_id: "#y".to_string(),
            result: Err(EntryFailure {
                code: 500,
                reason: None,
            }),
        };
        assert!(matches!(
            failed.decode::<Count>().unwrap_err(),
            Error::Status { status: 500, .. }
        ));
    }
}
