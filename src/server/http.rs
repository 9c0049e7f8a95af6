//! HTTP server for Partgate
//!
//! Built on `hyper` and `tokio`: async I/O, HTTP/1.1, one task per
//! connection. Dropping a connection drops the in-flight backend call with
//! it, which is how caller cancellation propagates.
//!
//! # Endpoints
//!
//! * `POST /upload/start?key=K` - start a multipart upload session
//! * `POST /upload/presign?key=K&uploadId=U&partNumber=N` - presign one part
//! * `POST /upload/complete` - finalize from the caller's part manifest
//! * `POST /upload/abort` - discard an in-progress upload
//! * `GET /health` - health check

use http_body_util::BodyExt;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Incoming, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::HeaderAuthenticator;
use crate::config::{Config, CorsConfig};
use crate::router::{RouterError, UploadRequestParser, UploadRoute};
use crate::s3::S3Client;
use crate::server::ServerError;
use crate::upload::{PartDescriptor, UploadError, UploadSessions};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartUploadResponse {
    upload_id: String,
    key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresignResponse {
    presign_url: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteUploadRequest {
    key: String,
    upload_id: String,
    completed_parts: Vec<PartDescriptor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbortUploadRequest {
    key: String,
    upload_id: String,
}

// ============================================================================
// Server
// ============================================================================

/// Shared per-request state, constructed once at startup
struct AppState {
    sessions: UploadSessions,
    authenticator: HeaderAuthenticator,
    cors: CorsConfig,
}

/// HTTP server
pub struct Server {
    state: Arc<AppState>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Create a new server instance
    ///
    /// Binds immediately (port 0 gets an OS-assigned port) and constructs
    /// the storage client from validated configuration. A missing or
    /// malformed backend configuration fails here, at startup.
    pub async fn new(config: Config) -> Result<Self, ServerError> {
        let addr: SocketAddr = config
            .server
            .address
            .parse()
            .map_err(|e| ServerError::BindError(format!("Invalid address: {}", e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(format!("Failed to get local address: {}", e)))?;

        let client = S3Client::new(&config.s3).await?;
        let sessions = UploadSessions::new(Arc::new(client), config.s3.key_prefix.clone());

        info!("Server bound to {}", local_addr);

        Ok(Self {
            state: Arc::new(AppState {
                sessions,
                authenticator: HeaderAuthenticator::new(&config.server.auth),
                cors: config.server.cors.clone(),
            }),
            listener,
            local_addr,
        })
    }

    /// Get the local address the server is bound to
    ///
    /// Useful with port 0 to discover the assigned port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the server
    ///
    /// Accepts connections forever; each connection is served in its own
    /// task and connection errors never stop the accept loop.
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Starting server on {}", self.local_addr);

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { handle_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", peer_addr, e);
                }
            });
        }
    }
}

// ============================================================================
// Request handling
// ============================================================================

/// Handle one HTTP request
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<String>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("Handling {} {}", method, path);

    // CORS preflight
    if method == Method::OPTIONS {
        return Ok(preflight_response(&state.cors));
    }

    let query = req.uri().query().map(|q| q.to_string());
    let route = match UploadRequestParser::parse(method.as_str(), &path, query.as_deref()) {
        Ok(route) => route,
        Err(RouterError::MethodNotAllowed(msg)) => {
            return Ok(error_body(
                StatusCode::METHOD_NOT_ALLOWED,
                &msg,
                &state.cors,
            ));
        }
        Err(RouterError::NotFound(_)) => {
            return Ok(error_body(StatusCode::NOT_FOUND, "Not Found", &state.cors));
        }
    };

    if route == UploadRoute::Health {
        return Ok(plain_response(StatusCode::OK, "ok", &state.cors));
    }

    // Pass-through auth check for upload routes
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    if state.authenticator.check(authorization).is_err() {
        warn!("Missing authentication for {}", path);
        return Ok(error_body(
            StatusCode::UNAUTHORIZED,
            "no token",
            &state.cors,
        ));
    }

    match route {
        UploadRoute::Start { key } => {
            let result = state.sessions.start_upload(&key).await;
            Ok(upload_response(
                result.map(|started| StartUploadResponse {
                    upload_id: started.upload_id,
                    key: started.key,
                }),
                &state.cors,
            ))
        }
        UploadRoute::Presign {
            key,
            upload_id,
            part_number,
        } => {
            let result = state
                .sessions
                .presign_part(&key, &upload_id, &part_number)
                .await;
            Ok(upload_response(
                result.map(|url| PresignResponse { presign_url: url }),
                &state.cors,
            ))
        }
        UploadRoute::Complete => {
            let body: CompleteUploadRequest = match read_json_body(req).await? {
                Ok(body) => body,
                Err(response) => return Ok(with_cors(response, &state.cors)),
            };
            let result = state
                .sessions
                .complete_upload(&body.key, &body.upload_id, &body.completed_parts)
                .await;
            Ok(upload_response(
                result.map(|()| MessageResponse {
                    message: "upload completed".into(),
                }),
                &state.cors,
            ))
        }
        UploadRoute::Abort => {
            let body: AbortUploadRequest = match read_json_body(req).await? {
                Ok(body) => body,
                Err(response) => return Ok(with_cors(response, &state.cors)),
            };
            let result = state.sessions.abort_upload(&body.key, &body.upload_id).await;
            Ok(upload_response(
                result.map(|()| MessageResponse {
                    message: "upload aborted".into(),
                }),
                &state.cors,
            ))
        }
        UploadRoute::Health => unreachable!("health handled above"),
    }
}

/// Collect and deserialize a JSON request body.
///
/// A malformed or shape-invalid body yields a 400 response without any
/// orchestrator or backend involvement.
async fn read_json_body<T: serde::de::DeserializeOwned>(
    req: Request<Incoming>,
) -> Result<Result<T, Response<String>>, hyper::Error> {
    let bytes = req.into_body().collect().await?.to_bytes();

    match serde_json::from_slice(&bytes) {
        Ok(body) => Ok(Ok(body)),
        Err(e) => {
            warn!("Rejecting malformed request body: {}", e);
            Ok(Err(plain_error(
                StatusCode::BAD_REQUEST,
                "invalid request body",
            )))
        }
    }
}

/// Map an orchestrator result onto the wire
fn upload_response<T: Serialize>(
    result: Result<T, UploadError>,
    cors: &CorsConfig,
) -> Response<String> {
    match result {
        Ok(body) => json_response(StatusCode::OK, &body, cors),
        Err(err) => {
            let status = match err {
                UploadError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                UploadError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status.is_server_error() {
                error!("Upload operation failed: {}", err);
            }
            error_body(status, &err.to_string(), cors)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T, cors: &CorsConfig) -> Response<String> {
    let json = serde_json::to_string(body).expect("response serialization cannot fail");
    with_cors(
        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(json)
            .expect("Failed to build response"),
        cors,
    )
}

fn error_body(status: StatusCode, message: &str, cors: &CorsConfig) -> Response<String> {
    json_response(
        status,
        &ErrorResponse {
            error: message.to_string(),
        },
        cors,
    )
}

fn plain_error(status: StatusCode, message: &str) -> Response<String> {
    let json = serde_json::to_string(&ErrorResponse {
        error: message.to_string(),
    })
    .expect("response serialization cannot fail");
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(json)
        .expect("Failed to build response")
}

fn plain_response(status: StatusCode, body: &str, cors: &CorsConfig) -> Response<String> {
    with_cors(
        Response::builder()
            .status(status)
            .header("Content-Type", "text/plain")
            .body(body.to_string())
            .expect("Failed to build response"),
        cors,
    )
}

fn preflight_response(cors: &CorsConfig) -> Response<String> {
    with_cors(
        Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header(
                "Access-Control-Allow-Methods",
                "GET, POST, PUT, DELETE, OPTIONS",
            )
            .header(
                "Access-Control-Allow-Headers",
                "Origin, Content-Length, Content-Type, Authorization",
            )
            .body(String::new())
            .expect("Failed to build preflight response"),
        cors,
    )
}

/// Attach CORS headers to an outgoing response.
///
/// The upload client reads part ETags off cross-origin responses, so the
/// amz metadata headers are exposed alongside ETag.
fn with_cors(mut response: Response<String>, cors: &CorsConfig) -> Response<String> {
    let headers = response.headers_mut();
    if let Ok(origin) = cors.allowed_origin.parse() {
        headers.insert("Access-Control-Allow-Origin", origin);
    }
    headers.insert(
        "Access-Control-Expose-Headers",
        "Content-Length, Content-Type, ETag, x-amz-request-id, x-amz-id-2"
            .parse()
            .expect("static header value"),
    );
    if cors.allowed_origin != "*" {
        headers.insert(
            "Access-Control-Allow-Credentials",
            "true".parse().expect("static header value"),
        );
    }
    response
}
