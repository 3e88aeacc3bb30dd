//! Test harness: the real router wired to in-process stand-ins for the AI
//! gateway and the Supabase auth service.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use crate::app::{create_app, AppState};
use crate::config::{Environment, Settings, DEFAULT_AI_GATEWAY_MODEL};

pub const VALID_TOKEN: &str = "valid-token";
pub const ANON_KEY: &str = "anon-key";
pub const GATEWAY_KEY: &str = "gateway-key";
pub const USER_ID: &str = "6f1c2a9e-3b7d-4c1e-9a55-2f0d8b7e4a10";
pub const UPSTREAM_SECRET_DETAIL: &str = "Traceback: KeyError at gateway/billing.py:88";

/// Completion text for a manual laptop search in Mumbai.
pub const LAPTOP_REPLY: &str = r#"Here is what I found for your search.

```json
{
  "quotedItems": [
    { "name": "Laptop", "specifications": "Standard configuration", "quotedPrice": 55000 }
  ],
  "marketComparisons": [
    {
      "productName": "Laptop",
      "location": "Lamington Road, Mumbai",
      "vendorName": "Vijay Sales",
      "priceRange": { "min": 48000, "max": 53000 },
      "phone": "022-2300-1111",
      "notes": "Festive discounts, EMI available"
    },
    {
      "productName": "Laptop",
      "location": "Andheri West, Mumbai",
      "vendorName": "Croma",
      "priceRange": { "min": 50000, "max": 56000 },
      "website": "https://www.croma.com"
    },
    {
      "productName": "Laptop",
      "location": "Online",
      "vendorName": "Amazon India",
      "priceRange": { "min": 46500, "max": 52000 }
    }
  ],
  "summary": {
    "totalQuotedAmount": 55000,
    "estimatedMarketRange": { "min": 46500, "max": 56000 },
    "recommendation": "The quote is within the market range but above the midpoint."
  }
}
```"#;

#[derive(Clone)]
struct GatewayState {
    status: StatusCode,
    content: String,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
}

async fn fake_completion(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock() = Some(body);

    let expected = format!("Bearer {GATEWAY_KEY}");
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if state.status != StatusCode::OK {
        return (state.status, UPSTREAM_SECRET_DETAIL).into_response();
    }

    Json(json!({
        "id": "chatcmpl-test",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": state.content } }
        ]
    }))
    .into_response()
}

async fn fake_user(headers: HeaderMap) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());

    let expected = format!("Bearer {VALID_TOKEN}");
    if bearer == Some(expected.as_str()) && apikey == Some(ANON_KEY) {
        Json(json!({ "id": USER_ID, "email": "buyer@example.com", "role": "authenticated" }))
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid JWT: token is expired" })),
        )
            .into_response()
    }
}

async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    Url::parse(&format!("http://{addr}")).expect("test server url")
}

pub struct Harness {
    pub app: Router,
    pub state: Arc<AppState>,
    pub gateway_hits: Arc<AtomicUsize>,
    pub last_gateway_request: Arc<Mutex<Option<Value>>>,
}

impl Harness {
    pub fn gateway_calls(&self) -> usize {
        self.gateway_hits.load(Ordering::SeqCst)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, headers, body)
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }
}

pub struct HarnessBuilder {
    gateway_status: StatusCode,
    reply: String,
    gateway_key: bool,
    auth_configured: bool,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            gateway_status: StatusCode::OK,
            reply: LAPTOP_REPLY.to_string(),
            gateway_key: true,
            auth_configured: true,
        }
    }
}

impl HarnessBuilder {
    pub fn gateway_status(mut self, status: StatusCode) -> Self {
        self.gateway_status = status;
        self
    }

    pub fn reply(mut self, content: &str) -> Self {
        self.reply = content.to_string();
        self
    }

    pub fn without_gateway_key(mut self) -> Self {
        self.gateway_key = false;
        self
    }

    pub fn without_auth_service(mut self) -> Self {
        self.auth_configured = false;
        self
    }

    pub async fn build(self) -> Harness {
        let gateway_hits = Arc::new(AtomicUsize::new(0));
        let last_gateway_request = Arc::new(Mutex::new(None));

        let gateway_url = serve(
            Router::new()
                .route("/v1/chat/completions", post(fake_completion))
                .with_state(GatewayState {
                    status: self.gateway_status,
                    content: self.reply,
                    hits: gateway_hits.clone(),
                    last_request: last_gateway_request.clone(),
                }),
        )
        .await;
        let auth_url = serve(Router::new().route("/auth/v1/user", get(fake_user))).await;

        let settings = Settings {
            env: Environment::Dev,
            server_addr: "127.0.0.1:0".to_string(),
            max_body_bytes: 256 * 1024,
            ai_gateway_url: gateway_url,
            ai_gateway_model: DEFAULT_AI_GATEWAY_MODEL.to_string(),
            ai_gateway_api_key: self
                .gateway_key
                .then(|| SecretString::from(GATEWAY_KEY.to_string())),
            ai_gateway_timeout_seconds: 10,
            supabase_url: self.auth_configured.then_some(auth_url),
            supabase_anon_key: self
                .auth_configured
                .then(|| SecretString::from(ANON_KEY.to_string())),
        };

        let state = AppState::new(settings).expect("app state");
        Harness {
            app: create_app(state.clone()),
            state,
            gateway_hits,
            last_gateway_request,
        }
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request")
}
