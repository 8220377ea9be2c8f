pub mod handlers;

use crate::{
    config::Config,
    error::HaulError,
    genai::Pipeline,
    models::ErrorBody,
};
use actix_web::{
    http::{Method, StatusCode},
    middleware, web, App, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use std::fmt;

/// An error already shaped as an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ErrorBody) -> Self {
        Self { status, body }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorBody::new(message))
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.body.error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(&self.body)
    }
}

impl From<HaulError> for ApiError {
    fn from(err: HaulError) -> Self {
        match err {
            HaulError::InvalidRequest(message) => ApiError::bad_request(message),
            HaulError::Unconfigured(message) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(message))
            }
            HaulError::GenerationFailed { message, details } => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(message).with_details(details),
            ),
            other => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(other.to_string()),
            ),
        }
    }
}

/// Registers `/cutout`, `/generate` and `/health` on the given scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/cutout", web::post().to(handlers::cutout))
        .route("/generate", web::post().to(handlers::generate))
        .route("/health", web::get().to(handlers::health));
}

/// JSON extractor settings: body limit, and parse failures as `400 {error}`.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            log::warn!("Rejected request body: {}", err);
            ApiError::bad_request(format!("Invalid request body: {}", err)).into()
        })
}

fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
}

async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return HttpResponse::NoContent().finish();
    }
    HttpResponse::NotFound().json(ErrorBody::new("Not found"))
}

pub async fn run(config: Config, pipeline: Pipeline) -> std::io::Result<()> {
    let pipeline = web::Data::new(pipeline);
    let prefix = config.api_prefix();
    let limit = config.body_limit;

    HttpServer::new(move || {
        App::new()
            .app_data(pipeline.clone())
            .app_data(json_config(limit))
            .wrap(cors_headers())
            .wrap(middleware::Logger::new("%r %s %b %Dms"))
            .service(web::scope(&prefix).configure(configure))
            .default_service(web::route().to(fallback))
    })
    .bind((config.host().to_string(), config.port()))?
    .run()
    .await
}
