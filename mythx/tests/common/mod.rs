#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use mythx::{APIHandler, Client, Credentials, Middleware};

pub const SECRET: &[u8] = b"mock-mythx-secret";
pub const ETH_ADDRESS: &str = "0x0000000000000000000000000000000000000001";
pub const PASSWORD: &str = "correct-horse";
pub const UUID: &str = "ab9092f7-54d0-480f-9b63-1bb1508280e2";
pub const MISSING_UUID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Serialize, Deserialize)]
struct TestClaims {
    exp: i64,
    iss: String,
}

/// Signs a token that expires `exp_offset_secs` from now.
pub fn mint_token(exp_offset_secs: i64) -> String {
    encode(
        &Header::default(),
        &TestClaims {
            exp: Utc::now().timestamp() + exp_offset_secs,
            iss: "MythX API".to_string(),
        },
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

#[derive(Clone)]
pub struct MockState {
    pub login_calls: Arc<AtomicUsize>,
    pub refresh_calls: Arc<AtomicUsize>,
    pub logout_calls: Arc<AtomicUsize>,
    pub submit_calls: Arc<AtomicUsize>,
    pub status_calls: Arc<AtomicUsize>,
    pub issues_calls: Arc<AtomicUsize>,
    pub list_calls: Arc<AtomicUsize>,
    /// Statuses handed out by the status endpoint in order; the last repeats.
    pub statuses: Arc<Mutex<VecDeque<&'static str>>>,
    pub last_submission: Arc<Mutex<Option<Value>>>,
    pub last_list_query: Arc<Mutex<Option<HashMap<String, String>>>>,
    pub last_refresh: Arc<Mutex<Option<Value>>>,
}

impl MockState {
    pub fn new(statuses: &[&'static str]) -> Self {
        Self {
            login_calls: Arc::new(AtomicUsize::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            logout_calls: Arc::new(AtomicUsize::new(0)),
            submit_calls: Arc::new(AtomicUsize::new(0)),
            status_calls: Arc::new(AtomicUsize::new(0)),
            issues_calls: Arc::new(AtomicUsize::new(0)),
            list_calls: Arc::new(AtomicUsize::new(0)),
            statuses: Arc::new(Mutex::new(statuses.iter().copied().collect())),
            last_submission: Arc::new(Mutex::new(None)),
            last_list_query: Arc::new(Mutex::new(None)),
            last_refresh: Arc::new(Mutex::new(None)),
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> &'static str {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or("Finished")
        } else {
            statuses.front().copied().unwrap_or("Finished")
        }
    }
}

pub fn analysis_json(status: &str) -> Value {
    json!({
        "uuid": UUID,
        "apiVersion": "v1.4.0",
        "mythrilVersion": "0.20.0",
        "maestroVersion": "1.2.11",
        "harveyVersion": "0.0.11",
        "maruVersion": "0.3.4",
        "queueTime": 1,
        "runTime": 30,
        "status": status,
        "submittedAt": "2019-02-07T00:40:49.000Z",
        "submittedBy": "000008544b0aa00010a91111",
    })
}

pub fn report_json() -> Value {
    json!([{
        "issues": [{
            "swcID": "SWC-107",
            "swcTitle": "Reentrancy",
            "description": {
                "head": "A call to a user-supplied address is executed.",
                "tail": "The callee may re-enter the contract.",
            },
            "severity": "Medium",
            "locations": [{"sourceMap": "444:1:0"}],
            "extra": {},
        }],
        "sourceType": "raw-bytecode",
        "sourceFormat": "evm-byzantium-bytecode",
        "sourceList": ["0x5d42db2b"],
        "meta": {},
    }])
}

fn token_pair() -> Json<Value> {
    Json(json!({"access": mint_token(600), "refresh": mint_token(86_400)}))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Rejects requests without a currently valid bearer token.
fn check_bearer(headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "missing bearer token"))?;

    let mut validation = Validation::default();
    validation.leeway = 0;
    decode::<TestClaims>(token, &DecodingKey::from_secret(SECRET), &validation)
        .map(|_| ())
        .map_err(|_| error(StatusCode::UNAUTHORIZED, "invalid or expired token"))
}

async fn post_login(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["ethAddress"] != ETH_ADDRESS || body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "wrong credentials");
    }
    token_pair().into_response()
}

async fn post_refresh(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_refresh.lock().unwrap() = Some(body.clone());
    if body["refreshToken"].as_str().unwrap_or_default().is_empty() {
        return error(StatusCode::BAD_REQUEST, "refreshToken is required");
    }
    token_pair().into_response()
}

async fn post_logout(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Err(response) = check_bearer(&headers) {
        return response;
    }
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({})).into_response()
}

async fn get_analyses(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = check_bearer(&headers) {
        return response;
    }
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_list_query.lock().unwrap() = Some(query);
    Json(json!({
        "analyses": [analysis_json("Finished"), analysis_json("Queued")],
        "total": 2,
    }))
    .into_response()
}

async fn post_analyses(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = check_bearer(&headers) {
        return response;
    }
    state.submit_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_submission.lock().unwrap() = Some(body);
    Json(analysis_json("Queued")).into_response()
}

async fn get_status(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(uuid): Path<String>,
) -> Response {
    if let Err(response) = check_bearer(&headers) {
        return response;
    }
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    if uuid != UUID {
        return error(StatusCode::NOT_FOUND, "analysis not found");
    }
    Json(analysis_json(state.next_status())).into_response()
}

async fn get_issues(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(uuid): Path<String>,
) -> Response {
    if let Err(response) = check_bearer(&headers) {
        return response;
    }
    state.issues_calls.fetch_add(1, Ordering::SeqCst);
    if uuid != UUID {
        return error(StatusCode::NOT_FOUND, "analysis not found");
    }
    Json(report_json()).into_response()
}

async fn get_openapi_yaml() -> Response {
    (StatusCode::OK, "openapi: 3.0.0\ninfo:\n  title: MythX API\n").into_response()
}

async fn get_openapi_html() -> Response {
    (StatusCode::OK, "<html><body>MythX API</body></html>").into_response()
}

async fn get_version() -> Response {
    Json(json!({
        "api": "v1.4.0",
        "maru": "0.3.4",
        "mythril": "0.20.0",
        "maestro": "1.2.11",
        "harvey": "0.0.11",
        "hash": "6e1a1a5e7c5c2b4e9f84b9e3ab9e2a71",
    }))
    .into_response()
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/v1/auth/login", post(post_login))
        .route("/v1/auth/refresh", post(post_refresh))
        .route("/v1/auth/logout", post(post_logout))
        .route("/v1/analyses", get(get_analyses).post(post_analyses))
        .route("/v1/analyses/{uuid}", get(get_status))
        .route("/v1/analyses/{uuid}/issues", get(get_issues))
        .route("/v1/openapi.yaml", get(get_openapi_yaml))
        .route("/v1/openapi", get(get_openapi_html))
        .route("/v1/version", get(get_version))
        .with_state(state)
}

pub async fn spawn_router(
    router: Router,
) -> Result<(String, tokio::task::JoinHandle<()>), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("test server stopped: {err}");
        }
    });
    Ok((format!("http://{}", addr), handle))
}

pub fn client(base: &str, credentials: Credentials, middlewares: Vec<Box<dyn Middleware>>) -> Client {
    let base_url = Url::parse(&format!("{}/v1/", base)).expect("base url");
    let handler = APIHandler::with_base_url(base_url).with_middlewares(middlewares);
    Client::new(handler, credentials)
}

pub fn password_credentials() -> Credentials {
    Credentials::password(ETH_ADDRESS, PASSWORD)
}
