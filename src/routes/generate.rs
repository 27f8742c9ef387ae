//! Review-response generation endpoints.
//!
//! Control flow for a generation request:
//! sanitize body → validate fields → check cache → (on miss) call the
//! generation collaborator → store in cache → respond. The collaborator is an
//! injected trait object; prompt construction, provider selection and
//! timeouts are its problem, not ours.

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::task::AbortOnDropHandle;

use crate::{
    CacheStats, Config, Error, FixedWindowLimiter, ResponseCache, Result, ThrottleLayer,
    cache::{cache_sweep_task, response_cache_key},
    sanitize::{sanitize_email, sanitize_review_text, sanitize_text_field, sanitize_value},
    throttle::sweep_task,
    validate,
};

/// Upper bound on reviews per bulk request.
pub const MAX_BULK_REVIEWS: usize = 20;

/// The external generation collaborator.
///
/// Implementations wrap an AI provider SDK. They receive fully sanitized and
/// validated parameters and return one generated response per requested
/// variation, or an error string that the route maps to a 502.
///
/// Cancellation and timeouts are the implementation's responsibility; the
/// route treats the call as an opaque async operation.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(
        &self,
        params: &GenerationParams,
    ) -> std::result::Result<Vec<String>, String>;
}

/// Sanitized, validated parameters for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub review_text: String,
    pub rating: u8,
    pub business_type: String,
    pub tone: String,
    pub response_length: String,
    pub provider: String,
    pub variations: u8,
    pub tone_adjustment: f64,
    pub template_id: Option<String>,
    pub reviewer_email: Option<String>,
}

impl GenerationParams {
    /// Extracts and validates parameters from an already-sanitized JSON body.
    ///
    /// Every failed predicate becomes an invalid-input error that the route
    /// turns into a 400; nothing here panics on odd shapes.
    pub fn from_value(body: &Value) -> Result<Self> {
        if !body.is_object() {
            return Err(Error::invalid_input("request body must be a JSON object"));
        }

        let review_text = sanitize_review_text(&sanitize_text_field(field(body, "review_text")));
        if review_text.is_empty() {
            return Err(Error::invalid_input("review_text is required"));
        }

        let rating_value = field(body, "rating");
        if !validate::is_valid_rating(rating_value) {
            return Err(Error::invalid_input("rating must be between 1 and 5"));
        }
        let rating = coerce_u8(rating_value);

        let business_type = sanitize_text_field(field(body, "business_type"));
        if !validate::is_valid_business_type(&business_type) {
            return Err(Error::invalid_input(format!(
                "business_type must be one of: {}",
                validate::BUSINESS_TYPES.join(", ")
            )));
        }

        let tone = sanitize_text_field(field(body, "tone"));
        if !validate::is_valid_tone(&tone) {
            return Err(Error::invalid_input(format!(
                "tone must be one of: {}",
                validate::TONES.join(", ")
            )));
        }

        let response_length = sanitize_text_field(field(body, "response_length"));
        if !validate::is_valid_response_length(&response_length) {
            return Err(Error::invalid_input(
                "response_length must be one of: short, medium, long",
            ));
        }

        let provider = match field(body, "provider") {
            Value::Null => "auto".to_string(),
            value => {
                let provider = sanitize_text_field(value);
                if !validate::is_valid_provider(&provider) {
                    return Err(Error::invalid_input(
                        "provider must be one of: openai, claude, auto",
                    ));
                }
                provider
            }
        };

        let variations = match field(body, "variations") {
            Value::Null => 1,
            value => {
                if !validate::is_valid_variations(value) {
                    return Err(Error::invalid_input(
                        "variations must be an integer between 1 and 5",
                    ));
                }
                coerce_u8(value)
            }
        };

        let tone_adjustment = match field(body, "tone_adjustment") {
            Value::Null => 5.0,
            value => {
                if !validate::is_valid_tone_adjustment(value) {
                    return Err(Error::invalid_input(
                        "tone_adjustment must be a number between 0 and 10",
                    ));
                }
                coerce_f64(value)
            }
        };

        let template_id = match field(body, "template_id") {
            Value::Null => None,
            value => Some(sanitize_text_field(value)).filter(|s| !s.is_empty()),
        };

        let reviewer_email = match field(body, "reviewer_email") {
            Value::Null => None,
            value => {
                let email = sanitize_email(&sanitize_text_field(value));
                if email.is_empty() {
                    return Err(Error::invalid_input(
                        "reviewer_email is not a valid email address",
                    ));
                }
                Some(email)
            }
        };

        Ok(Self {
            review_text,
            rating,
            business_type,
            tone,
            response_length,
            provider,
            variations,
            tone_adjustment,
            template_id,
            reviewer_email,
        })
    }
}

fn field<'a>(body: &'a Value, name: &str) -> &'a Value {
    body.get(name).unwrap_or(&Value::Null)
}

/// Numeric coercion for fields already vetted by a validator predicate.
fn coerce_u8(value: &Value) -> u8 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0) as u8,
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0) as u8,
        _ => 0,
    }
}

/// See [`coerce_u8`].
fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Shared state behind the generation endpoints.
///
/// Owns the response cache, the bulk limiter, and their periodic sweep tasks;
/// the sweeps abort when the last clone of the state is dropped. Construct
/// once at startup and hand to [`generation_routes`].
#[derive(Clone)]
pub struct GeneratorState {
    cache: Arc<ResponseCache<Vec<String>>>,
    generator: Arc<dyn ResponseGenerator>,
    bulk_limiter: Arc<FixedWindowLimiter>,
    _sweepers: Arc<Vec<AbortOnDropHandle<()>>>,
}

impl GeneratorState {
    /// Builds the state from configuration.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime: the cache and limiter
    /// sweep tasks are spawned here so their lifecycle is tied to the state.
    pub fn new(config: &Config, generator: Arc<dyn ResponseGenerator>) -> Self {
        let cache = Arc::new(ResponseCache::new(
            config.cache.max_entries,
            config.cache.ttl,
        ));
        let bulk_limiter = Arc::new(FixedWindowLimiter::new(
            config.rate_limit.bulk_max_requests,
            config.rate_limit.bulk_window,
        ));

        let sweepers = vec![
            AbortOnDropHandle::new(tokio::spawn(cache_sweep_task(
                cache.clone(),
                config.cache.sweep_interval,
            ))),
            AbortOnDropHandle::new(tokio::spawn(sweep_task(
                bulk_limiter.clone(),
                config.rate_limit.sweep_interval,
            ))),
        ];

        Self {
            cache,
            generator,
            bulk_limiter,
            _sweepers: Arc::new(sweepers),
        }
    }

    /// The response cache, for introspection and tests.
    pub fn cache(&self) -> &ResponseCache<Vec<String>> {
        &self.cache
    }
}

/// Builds the generation route tree.
///
/// `POST /api/generate` is guarded only by the router-wide limiter installed
/// in `setup_middleware()`; `POST /api/generate/bulk` additionally carries
/// its own stricter [`ThrottleLayer`], since one bulk request fans out into
/// many generation calls.
pub fn generation_routes(state: GeneratorState) -> Router {
    let bulk_throttle = ThrottleLayer::new(state.bulk_limiter.clone());

    Router::new()
        .route("/api/generate", post(generate_response))
        .route(
            "/api/generate/bulk",
            post(generate_bulk).layer(bulk_throttle),
        )
        .route("/api/cache/stats", get(cache_stats))
        .with_state(state)
}

/// Successful generation payload.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    /// One generated response per requested variation.
    pub responses: Vec<String>,
    /// Whether the responses came from the cache.
    pub cached: bool,
}

/// Per-review outcome inside a bulk response.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemOutcome {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<String>>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bulk generation payload. Individual failures are reported in place; the
/// batch itself only fails on a malformed envelope.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub results: Vec<BulkItemOutcome>,
}

/// `POST /api/generate`
async fn generate_response(
    State(state): State<GeneratorState>,
    Json(body): Json<Value>,
) -> Result<Json<GenerateOutcome>> {
    let body = sanitize_value(body);
    let params = GenerationParams::from_value(&body)?;
    let outcome = generate_one(&state, &params).await?;
    Ok(Json(outcome))
}

/// `POST /api/generate/bulk`
async fn generate_bulk(
    State(state): State<GeneratorState>,
    Json(body): Json<Value>,
) -> Result<Json<BulkOutcome>> {
    let body = sanitize_value(body);
    let reviews = body
        .get("reviews")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::invalid_input("reviews must be an array"))?;

    if reviews.is_empty() {
        return Err(Error::invalid_input("reviews must not be empty"));
    }
    if reviews.len() > MAX_BULK_REVIEWS {
        return Err(Error::invalid_input(format!(
            "reviews must contain at most {MAX_BULK_REVIEWS} items"
        )));
    }

    let mut results = Vec::with_capacity(reviews.len());
    for (index, review) in reviews.iter().enumerate() {
        let item = match GenerationParams::from_value(review) {
            Err(err) => BulkItemOutcome {
                index,
                responses: None,
                cached: false,
                error: Some(err.to_string()),
            },
            Ok(params) => match generate_one(&state, &params).await {
                Ok(outcome) => BulkItemOutcome {
                    index,
                    responses: Some(outcome.responses),
                    cached: outcome.cached,
                    error: None,
                },
                Err(err) => BulkItemOutcome {
                    index,
                    responses: None,
                    cached: false,
                    error: Some(err.to_string()),
                },
            },
        };
        results.push(item);
    }

    Ok(Json(BulkOutcome { results }))
}

/// `GET /api/cache/stats`
async fn cache_stats(State(state): State<GeneratorState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Cache-aware single generation.
async fn generate_one(state: &GeneratorState, params: &GenerationParams) -> Result<GenerateOutcome> {
    let key = response_cache_key(&params.review_text, &params.tone, params.template_id.as_deref());

    if let Some(responses) = state.cache.get(&key) {
        tracing::debug!(key = %key, "Serving generation from cache");
        return Ok(GenerateOutcome {
            responses,
            cached: true,
        });
    }

    let responses = state
        .generator
        .generate(params)
        .await
        .map_err(Error::generation)?;

    state.cache.set(key, responses.clone(), None);
    Ok(GenerateOutcome {
        responses,
        cached: false,
    })
}
