//! Query descriptor model

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::path::api_path;

/// HTTP method of a logical query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A filter parameter value: a single string or a repeated key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// Iterate the individual values
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::One(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::One(value.to_string())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

/// One logical backend query
///
/// The operation id defaults to the request path until [`operation`](Self::operation)
/// sets it. It must be unique within one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    method: Method,
    operation_id: Option<String>,
    collection: String,
    resource_id: Option<String>,
    params: BTreeMap<String, ParamValue>,
}

impl QueryDescriptor {
    /// Create a descriptor for `collection`
    #[must_use]
    pub fn new(method: Method, collection: impl Into<String>) -> Self {
        Self {
            method,
            operation_id: None,
            collection: collection.into(),
            resource_id: None,
            params: BTreeMap::new(),
        }
    }

    /// Create a GET descriptor for `collection`
    #[must_use]
    pub fn get(collection: impl Into<String>) -> Self {
        Self::new(Method::Get, collection)
    }

    /// Create a POST descriptor for `collection`
    #[must_use]
    pub fn post(collection: impl Into<String>) -> Self {
        Self::new(Method::Post, collection)
    }

    /// Set the operation id used to route the result
    #[must_use]
    pub fn operation(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Address a single resource within the collection
    #[must_use]
    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// Add a filter parameter, replacing any previous value for `key`
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a filter parameter only when `value` is present
    #[must_use]
    pub fn param_opt<V: Into<ParamValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// Request path relative to the backend root: `collection[/resource]`
    #[must_use]
    pub fn path(&self) -> String {
        api_path(
            std::iter::once(self.collection.as_str()).chain(self.resource_id.as_deref()),
        )
    }

    /// The routing id for this query's result
    #[must_use]
    pub fn operation_id(&self) -> String {
        self.operation_id.clone().unwrap_or_else(|| self.path())
    }

    /// Flattened `(key, value)` pairs; repeated keys for multi-valued params
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .flat_map(|(key, value)| value.values().map(move |v| (key.clone(), v.to_string())))
            .collect()
    }

    /// Form-urlencoded query string, as carried in batch entries
    #[must_use]
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }

    /// Wire form of this descriptor as one batch entry
    #[must_use]
    pub fn to_batch_query(&self) -> BatchQuery {
        BatchQuery {
            method: self.method,
            operation_id: self.operation_id(),
            collection: self.collection.clone(),
            document_id: self.resource_id.clone(),
            query: self.query_string(),
        }
    }
}

/// One entry of a batch request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuery {
    pub method: Method,
    pub operation_id: String,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub query: String,
}

/// Batch request body: `{ "batch": [...] }`, order preserved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub batch: Vec<BatchQuery>,
}

impl BatchRequest {
    /// Build the batch body for `descriptors` in their given order
    #[must_use]
    pub fn from_descriptors(descriptors: &[QueryDescriptor]) -> Self {
        Self {
            batch: descriptors.iter().map(QueryDescriptor::to_batch_query).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_with_resource() {
        let q = QueryDescriptor::get("count").resource("boot");
        assert_eq!(q.path(), "count/boot");
        assert_eq!(QueryDescriptor::get("boot").path(), "boot");
    }

    #[test]
    fn test_operation_id_defaults_to_path() {
        let q = QueryDescriptor::get("count").resource("boot");
        assert_eq!(q.operation_id(), "count/boot");

        let q = q.operation("#success-count0");
        assert_eq!(q.operation_id(), "#success-count0");
    }

    #[test]
    fn test_query_string_repeats_multi_valued_keys() {
        let q = QueryDescriptor::get("boot")
            .param("job", "next")
            .param("field", ["job", "kernel"]);

        assert_eq!(q.query_string(), "field=job&field=kernel&job=next");
    }

    #[test]
    fn test_query_string_encodes_values() {
        let q = QueryDescriptor::get("boot").param("kernel", "v4.1-rc1 +x&y");
        assert_eq!(q.query_string(), "kernel=v4.1-rc1+%2Bx%26y");
    }

    #[test]
    fn test_param_opt_skips_none() {
        let q = QueryDescriptor::get("boot")
            .param_opt("date_range", None::<u32>)
            .param_opt("limit", Some(5u32));

        assert_eq!(q.query_pairs(), vec![("limit".to_string(), "5".to_string())]);
    }

    #[test]
    fn test_batch_query_wire_format() {
        let q = QueryDescriptor::get("count")
            .resource("boot")
            .operation("#fail-count1")
            .param("status", "FAIL")
            .param("job", "mainline");

        let json = serde_json::to_value(q.to_batch_query()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "method": "GET",
                "operation_id": "#fail-count1",
                "collection": "count",
                "document_id": "boot",
                "query": "job=mainline&status=FAIL",
            })
        );
    }

    #[test]
    fn test_batch_query_omits_missing_document_id() {
        let q = QueryDescriptor::get("boot").operation("#boot-boards-count");
        let json = serde_json::to_value(q.to_batch_query()).unwrap();
        assert!(json.get("document_id").is_none());
    }

    #[test]
    fn test_batch_request_preserves_order() {
        let descriptors = vec![
            QueryDescriptor::get("count").operation("#b"),
            QueryDescriptor::get("count").operation("#a"),
        ];
        let body = BatchRequest::from_descriptors(&descriptors);
        let ids: Vec<&str> = body.batch.iter().map(|q| q.operation_id.as_str()).collect();
        assert_eq!(ids, vec!["#b", "#a"]);
    }

    #[test]
    fn test_param_value_serializes_untagged() {
        let one = serde_json::to_value(ParamValue::from("x")).unwrap();
        let many = serde_json::to_value(ParamValue::from(vec!["a", "b"])).unwrap();
        assert_eq!(one, serde_json::json!("x"));
        assert_eq!(many, serde_json::json!(["a", "b"]));
    }
}
