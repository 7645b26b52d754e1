//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One task per connection;
//! every request goes through [`handle_request`].

use bytes::Bytes;
use ed25519_dalek::VerifyingKey;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{self, JwtValidator};
use crate::routes::{self, response};
use crate::services::Services;
use crate::types::{GateError, Result};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub services: Services,
    pub jwt: JwtValidator,
    pub dev_mode: bool,
    /// Published at /.well-known/content-keys
    pub content_key: VerifyingKey,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(services: Services, jwt: JwtValidator, dev_mode: bool, content_key: VerifyingKey) -> Self {
        Self {
            services,
            jwt,
            dev_mode,
            content_key,
            started_at: Instant::now(),
        }
    }
}

/// Routes that need a learner identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Access(String),
    RecordProgress,
    CourseProgress,
    ModuleProgress(String),
    ModuleAccess(String),
}

impl Route {
    pub fn parse(method: &Method, path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (&Method::GET, ["access", id]) => decode_segment(id).map(Route::Access),
            (&Method::POST, ["progress"]) => Some(Route::RecordProgress),
            (&Method::GET, ["course", "progress"]) => Some(Route::CourseProgress),
            (&Method::GET, ["module", id, "progress"]) => decode_segment(id).map(Route::ModuleProgress),
            (&Method::GET, ["module", id, "access"]) => decode_segment(id).map(Route::ModuleAccess),
            _ => None,
        }
    }
}

fn decode_segment(segment: &str) -> Option<String> {
    if segment.is_empty() {
        return None;
    }
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn run<F>(state: Arc<AppState>, listen: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(listen).await?;
    info!(
        "course-gate listening on {} (store: {}, merge policy: {})",
        listen,
        state.services.store.backend(),
        state.services.policy.merge
    );

    if state.dev_mode {
        warn!("Development mode enabled - X-Learner-Id header accepted");
    }

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, req).await }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            }
        }
    }
}

/// Route an HTTP request
pub async fn handle_request<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("{} {}", method, path);

    match (&method, path.as_str()) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            return Ok(routes::health_check(&state));
        }
        (&Method::GET, "/.well-known/content-keys") => {
            return Ok(routes::handle_content_keys(&state.content_key));
        }
        _ => {}
    }

    let Some(route) = Route::parse(&method, &path) else {
        return Ok(response::not_found());
    };

    let learner_id = match auth::resolve_learner(req.headers(), &state.jwt, state.dev_mode) {
        Ok(learner_id) => learner_id,
        Err(e) => return Ok(response::error_response(&e)),
    };

    let response = match route {
        Route::Access(session_id) => routes::handle_access(&state, &learner_id, &session_id).await,
        Route::RecordProgress => match read_body(req.into_body()).await {
            Ok(body) => routes::handle_record_progress(&state, &learner_id, &body).await,
            Err(rejection) => rejection,
        },
        Route::CourseProgress => routes::handle_course_progress(&state, &learner_id).await,
        Route::ModuleProgress(module_id) => {
            routes::handle_module_progress(&state, &learner_id, &module_id).await
        }
        Route::ModuleAccess(module_id) => {
            routes::handle_module_access(&state, &learner_id, &module_id).await
        }
    };

    Ok(response)
}

/// Collect a request body up to [`MAX_BODY_BYTES`]
async fn read_body<B>(body: B) -> std::result::Result<Bytes, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(response::payload_too_large()),
        Err(e) => {
            warn!("Request body error: {}", e);
            Err(response::error_response(&GateError::Validation(
                "failed to read request body".into(),
            )))
        }
    }
}
