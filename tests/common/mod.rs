//! Shared test utilities: an in-process mock of the dashboard backend

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use boot_dashboard::{BackendConfig, Dispatcher, HttpTransport};
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// Token the mock expects in the `Authorization` header
pub const TEST_TOKEN: &str = "test-backend-token";

/// Kernels returned by the aggregated boot query, newest first
pub const KERNELS: [&str; 2] = ["v4.1-rc3", "v4.1-rc2"];

/// The only boot report document the mock knows
pub const BOOT_ID: &str = "beaglebone-mainline-v4.1-rc3-multi_v7_defconfig";

/// How the mock backend misbehaves
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    /// Answer every request with HTTP 500
    pub fail_all: bool,
    /// Answer 500 to any request that counts boots with this status
    pub fail_status: Option<&'static str>,
    /// Inside a batch, mark count entries for this kernel as failed
    pub failing_kernel: Option<&'static str>,
    /// Answer 500 to direct requests on this path, e.g. `/count/job`
    pub fail_path: Option<&'static str>,
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub auth: Option<String>,
}

#[derive(Clone)]
struct MockState {
    behaviour: Arc<Behaviour>,
    hits: Arc<Mutex<Vec<Hit>>>,
}

/// Running mock backend
pub struct MockBackend {
    pub url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl MockBackend {
    /// Start a well-behaved backend
    pub async fn start() -> Self {
        Self::start_with(Behaviour::default()).await
    }

    /// Start a backend with the given behaviour on an ephemeral port
    pub async fn start_with(behaviour: Behaviour) -> Self {
        let state = MockState {
            behaviour: Arc::new(behaviour),
            hits: Arc::default(),
        };
        let hits = state.hits.clone();

        let app = Router::new()
            .route("/count/boot", get(count_boot))
            .route("/count/job", get(count_job))
            .route("/count/defconfig", get(count_defconfig))
            .route("/job", get(job))
            .route("/boot", get(boot))
            .route("/boot/{id}", get(boot_detail))
            .route("/broken", get(broken))
            .route("/batch", post(batch))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock backend");
        let addr = listener.local_addr().expect("mock backend has no address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend failed");
        });

        Self {
            url: format!("http://{addr}"),
            hits,
        }
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig::new(self.url.clone()).with_auth_token(TEST_TOKEN)
    }

    pub fn dispatcher(&self) -> Dispatcher<HttpTransport> {
        Dispatcher::from_config(&self.config()).expect("failed to build dispatcher")
    }

    pub async fn hits(&self) -> Vec<Hit> {
        self.hits.lock().await.clone()
    }

    pub async fn hits_on(&self, path: &str) -> usize {
        self.hits.lock().await.iter().filter(|h| h.path == path).count()
    }
}

fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Canned answer for one logical query
fn answer(path: &str, pairs: &[(String, String)]) -> Value {
    match path {
        "count/boot" => {
            let count = match (param(pairs, "status"), param(pairs, "kernel")) {
                (Some("PASS"), Some("v4.1-rc2")) => 7,
                (Some("PASS"), _) => 10,
                (Some("FAIL"), _) => 2,
                _ => 42,
            };
            json!([{ "count": count }])
        }
        "count/job" => json!({ "count": 24 }),
        "count/defconfig" => json!({ "count": 118 }),
        // the job endpoint sends its list as a JSON string
        "job" => Value::String(
            json!([
                {"job": "mainline", "kernel": KERNELS[0], "status": "PASS",
                 "created_on": {"$date": 1_431_606_270_000_i64},
                 "metadata": {"git_branch": "master", "git_commit": "5ebe6afaf0"}},
                {"job": "mainline", "kernel": KERNELS[1], "status": "FAIL",
                 "created_on": {"$date": 1_431_001_470_000_i64},
                 "metadata": {"git_branch": "master", "git_commit": "e26081808e"}},
            ])
            .to_string(),
        ),
        "boot" => match param(pairs, "aggregate") {
            Some("kernel") => json!([
                {"kernel": KERNELS[0], "job": "mainline", "created_on": {"$date": 1_431_606_270_000_i64}},
                {"kernel": KERNELS[1], "job": "mainline", "created_on": {"$date": 1_431_001_470_000_i64}},
            ]),
            Some("board") => json!([{"board": "beaglebone"}, {"board": "panda"}, {"board": "juno"}]),
            _ => json!([]),
        },
        _ => Value::Null,
    }
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

fn should_fail(behaviour: &Behaviour, pairs: &[(String, String)]) -> bool {
    behaviour.fail_all
        || behaviour
            .fail_status
            .is_some_and(|status| param(pairs, "status") == Some(status))
}

async fn record(state: &MockState, hit: Hit) {
    state.hits.lock().await.push(hit);
}

fn auth(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

async fn single(state: MockState, path: &str, headers: &HeaderMap, pairs: Vec<(String, String)>) -> Response {
    let fail = should_fail(&state.behaviour, &pairs)
        || state.behaviour.fail_path.is_some_and(|p| p.trim_start_matches('/') == path);
    let result = answer(path, &pairs);
    record(
        &state,
        Hit {
            method: "GET",
            path: format!("/{path}"),
            query: pairs,
            body: None,
            auth: auth(headers),
        },
    )
    .await;

    if fail {
        return server_error();
    }
    Json(json!({ "code": 200, "result": result })).into_response()
}

async fn count_boot(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    single(state, "count/boot", &headers, pairs).await
}

async fn count_job(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    single(state, "count/job", &headers, pairs).await
}

async fn count_defconfig(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    single(state, "count/defconfig", &headers, pairs).await
}

async fn job(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    single(state, "job", &headers, pairs).await
}

async fn boot_detail(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    record(
        &state,
        Hit {
            method: "GET",
            path: format!("/boot/{id}"),
            query: Vec::new(),
            body: None,
            auth: auth(&headers),
        },
    )
    .await;

    if id != BOOT_ID {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    Json(json!({
        "code": 200,
        "result": [{
            "board": "beaglebone",
            "job": "mainline",
            "kernel": "v4.1-rc3",
            "defconfig": "multi_v7_defconfig",
            "status": "FAIL",
            "time": {"$date": 8_250},
            "metadata": {"boot_result_description": "Kernel panic"},
            "boot_log": "boot-beaglebone.txt",
            "boot_log_html": "boot-beaglebone.html",
            "warnings": 3,
            "dtb": "dtbs/am335x-boneblack.dtb",
        }]
    }))
    .into_response()
}

async fn boot(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    single(state, "boot", &headers, pairs).await
}

async fn broken(State(state): State<MockState>, headers: HeaderMap) -> Response {
    record(
        &state,
        Hit {
            method: "GET",
            path: "/broken".to_string(),
            query: Vec::new(),
            body: None,
            auth: auth(&headers),
        },
    )
    .await;
    "<html>not json</html>".into_response()
}

async fn batch(State(state): State<MockState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(
        &state,
        Hit {
            method: "POST",
            path: "/batch".to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
            auth: auth(&headers),
        },
    )
    .await;

    let Some(queries) = body.get("batch").and_then(Value::as_array) else {
        return (StatusCode::BAD_REQUEST, "missing batch").into_response();
    };

    let mut results = Vec::with_capacity(queries.len());
    for query in queries {
        let collection = query["collection"].as_str().unwrap_or_default();
        let path = match query.get("document_id").and_then(Value::as_str) {
            Some(doc) => format!("{collection}/{doc}"),
            None => collection.to_string(),
        };
        let pairs: Vec<(String, String)> =
            url::form_urlencoded::parse(query["query"].as_str().unwrap_or_default().as_bytes())
                .into_owned()
                .collect();

        if should_fail(&state.behaviour, &pairs) {
            return server_error();
        }

        let operation_id = query["operation_id"].clone();
        let failing = state
            .behaviour
            .failing_kernel
            .is_some_and(|kernel| path == "count/boot" && param(&pairs, "kernel") == Some(kernel));

        if failing {
            results.push(json!({
                "operation_id": operation_id,
                "code": 500,
                "reason": "count query failed",
            }));
        } else {
            results.push(json!({
                "operation_id": operation_id,
                "code": 200,
                "result": answer(&path, &pairs),
            }));
        }
    }

    Json(json!({ "code": 200, "result": results })).into_response()
}
