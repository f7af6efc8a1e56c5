//! Simulated backend answering the console endpoints from a [`SimulatedStore`].
//!
//! # Endpoints
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | GET / POST | `/api/v1/tables` | list (200) / create (201) |
//! | GET / PATCH / DELETE | `/api/v1/tables/{id}` | get / merge / remove (204) |
//! | GET / POST | `/api/v1/admins` | list / create |
//! | GET / PATCH / DELETE | `/api/v1/admins/{id}` | get / merge / remove |
//! | POST | `/api/v1/admins/auth-with-password` | `{token, user}` |
//! | GET / PATCH | `/api/v1/settings`, `/api/v1/settings/config` | settings |
//! | GET | `/api/v1/logs?level=..&search=..` | filtered logs |
//!
//! Every endpoint except the credential exchange requires a non-empty token.

use super::store::{Collection, SEED_ADMIN_EMAIL};
use super::{ApiRequest, SimulatedStore, Transport};
use crate::client::ClientConfig;
use crate::error::TransportError;
use crate::protocol::ResponseEnvelope;
use async_trait::async_trait;
use http::Method;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Password accepted for the seeded admin.
const SEED_ADMIN_PASSWORD: &str = "password";

/// Upper bound on the synthetic failure probability.
pub const MAX_FAILURE_RATE: f64 = 0.5;

/// Status of injected failures.
const SIMULATED_FAILURE_STATUS: u16 = 503;

/// In-memory transport with artificial latency and failure injection.
pub struct SimulatedTransport {
    store: SimulatedStore,
    latency_ms: (u64, u64),
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedTransport {
    /// Create a transport over `store` using the simulation settings in `config`.
    pub fn new(store: SimulatedStore, config: &ClientConfig) -> Self {
        let min = config.simulated_latency_min_ms;
        let max = config.simulated_latency_max_ms.max(min);
        let rng = match config.simulated_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        SimulatedTransport {
            store,
            latency_ms: (min, max),
            failure_rate: clamp_failure_rate(config.simulated_failure_rate),
            rng: Mutex::new(rng),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &SimulatedStore {
        &self.store
    }

    /// Effective failure probability after clamping.
    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// Route a request to the store without delay or failure injection.
    pub fn handle(&self, request: &ApiRequest) -> ResponseEnvelope {
        let Ok(url) = Url::parse("http://localhost").and_then(|base| base.join(&request.endpoint))
        else {
            return ResponseEnvelope::failure(400, format!("invalid endpoint: {}", request.endpoint));
        };

        let segments: Vec<&str> = url
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let method = request.method();

        match segments.as_slice() {
            ["api", "v1", "admins", "auth-with-password"] if method == Method::POST => {
                return self.auth_with_password(request.options.body.as_ref());
            }
            _ => {}
        }

        if request.token.is_empty() {
            return ResponseEnvelope::failure(401, "missing or invalid token");
        }

        match segments.as_slice() {
            ["api", "v1", "tables"] => self.collection(Collection::Tables, method, request),
            ["api", "v1", "tables", id] => self.record(Collection::Tables, id, method, request),
            ["api", "v1", "admins"] => self.collection(Collection::Admins, method, request),
            ["api", "v1", "admins", id] => self.record(Collection::Admins, id, method, request),
            ["api", "v1", "settings"] | ["api", "v1", "settings", "config"] => {
                self.settings(method, request)
            }
            ["api", "v1", "logs"] if method == Method::GET => {
                let query = |key: &str| {
                    url.query_pairs()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v.into_owned())
                };
                let logs = self
                    .store
                    .logs(query("level").as_deref(), query("search").as_deref());
                ResponseEnvelope::success(200, Value::Array(logs))
            }
            _ => unhandled(request),
        }
    }

    fn collection(&self, collection: Collection, method: &Method, request: &ApiRequest) -> ResponseEnvelope {
        match *method {
            Method::GET => ResponseEnvelope::success(200, Value::Array(self.store.list(collection))),
            Method::POST => {
                let body = request.options.body.clone().unwrap_or(Value::Null);
                match self.store.insert(collection, body) {
                    Some(created) => ResponseEnvelope::success(201, created),
                    None => ResponseEnvelope::failure(400, "request body must be a JSON object"),
                }
            }
            _ => unhandled(request),
        }
    }

    fn record(&self, collection: Collection, id: &str, method: &Method, request: &ApiRequest) -> ResponseEnvelope {
        let missing = || ResponseEnvelope::failure(404, format!("{} {} not found", collection.noun(), id));

        match *method {
            Method::GET => self
                .store
                .get(collection, id)
                .map_or_else(missing, |record| ResponseEnvelope::success(200, record)),
            Method::PATCH => {
                if self.store.get(collection, id).is_none() {
                    return missing();
                }
                let body = request.options.body.clone().unwrap_or_else(|| json!({}));
                match self.store.update(collection, id, body) {
                    Some(updated) => ResponseEnvelope::success(200, updated),
                    None => ResponseEnvelope::failure(400, "request body must be a JSON object"),
                }
            }
            Method::DELETE => {
                if self.store.remove(collection, id) {
                    ResponseEnvelope::no_content()
                } else {
                    missing()
                }
            }
            _ => unhandled(request),
        }
    }

    fn settings(&self, method: &Method, request: &ApiRequest) -> ResponseEnvelope {
        match *method {
            Method::GET => ResponseEnvelope::success(200, self.store.settings()),
            Method::PATCH => {
                let body = request.options.body.clone().unwrap_or(Value::Null);
                match self.store.update_settings(body) {
                    Some(settings) => ResponseEnvelope::success(200, settings),
                    None => ResponseEnvelope::failure(400, "request body must be a JSON object"),
                }
            }
            _ => unhandled(request),
        }
    }

    fn auth_with_password(&self, body: Option<&Value>) -> ResponseEnvelope {
        let field = |name: &str| body.and_then(|b| b.get(name)).and_then(Value::as_str);
        let (Some(email), Some(password)) = (field("email"), field("password")) else {
            return ResponseEnvelope::failure(400, "email and password are required");
        };

        if email != SEED_ADMIN_EMAIL || password != SEED_ADMIN_PASSWORD {
            return ResponseEnvelope::failure(400, "Invalid credentials");
        }

        let Some(user) = self
            .store
            .list(Collection::Admins)
            .into_iter()
            .find(|admin| admin["email"] == email)
        else {
            return ResponseEnvelope::failure(400, "Invalid credentials");
        };

        let token = format!("mock-jwt-token-{}", uuid::Uuid::new_v4().simple());
        ResponseEnvelope::success(200, json!({ "token": token, "user": user }))
    }

    /// Draw this call's latency and failure decision.
    fn roll(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock();
        let (min, max) = self.latency_ms;
        let delay = if max > 0 { rng.gen_range(min..=max) } else { 0 };
        let fail = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
        (Duration::from_millis(delay), fail)
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope, TransportError> {
        let (delay, fail) = self.roll();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if fail {
            tracing::debug!(endpoint = %request.endpoint, "injecting simulated failure");
            return Ok(ResponseEnvelope::failure(
                SIMULATED_FAILURE_STATUS,
                "simulated transient failure",
            ));
        }

        Ok(self.handle(request))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

fn unhandled(request: &ApiRequest) -> ResponseEnvelope {
    ResponseEnvelope::failure(
        404,
        format!("Unhandled {} {}", request.method(), request.endpoint),
    )
}

/// Clamp a configured failure probability into `[0, MAX_FAILURE_RATE]`.
pub(crate) fn clamp_failure_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, MAX_FAILURE_RATE)
    }
}
