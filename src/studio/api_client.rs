use crate::{
    config::ClientConfig,
    error::{HaulError, Result},
    genai::Composition,
    models::{
        CutoutRequest, ErrorBody, GenerateRequest, HealthResponse, ImagePayload, ImageResponse,
    },
    studio::backend::TryOnBackend,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;

/// JSON client for the pipeline service's `/cutout`, `/generate` and
/// `/health` routes.
#[derive(Clone)]
pub struct PipelineClient {
    client: Client,
    base_url: String,
}

impl PipelineClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HaulError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    pub async fn health(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(|e| HaulError::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| HaulError::SerializationError(e.to_string()))?;
        Ok(health.ok)
    }

    async fn post<T: Serialize>(&self, route: &str, body: &T) -> Result<ImagePayload> {
        let url = self.url(route);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| HaulError::RequestError(format!("{}: {}", url, e)))?;

        read_image(response).await
    }
}

pub(crate) fn generate_request(composition: &Composition) -> GenerateRequest {
    GenerateRequest {
        model_png: Some(composition.subject.to_data_url()),
        garments: composition
            .garments
            .iter()
            .map(ImagePayload::to_data_url)
            .collect(),
        prompt: composition.prompt.clone(),
        background: Some(composition.background),
    }
}

/// 4xx becomes `InvalidRequest`; anything else becomes `GenerationFailed`
/// with the server's `error` and `details`.
pub(crate) fn error_from_response(status: u16, body: &str) -> HaulError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    if (400..500).contains(&status) {
        let message = parsed
            .map(|b| b.error)
            .unwrap_or_else(|| format!("Request rejected with status {}", status));
        return HaulError::InvalidRequest(message);
    }
    match parsed {
        Some(ErrorBody { error, details }) => HaulError::generation_failed(error, details),
        None => HaulError::generation_failed(
            format!("Service returned status {}", status),
            Some(body.trim().to_string()).filter(|b| !b.is_empty()),
        ),
    }
}

async fn read_image(response: Response) -> Result<ImagePayload> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_response(status.as_u16(), &body));
    }

    let image: ImageResponse = response
        .json()
        .await
        .map_err(|e| HaulError::SerializationError(e.to_string()))?;
    image
        .png
        .parse()
        .map_err(|e: HaulError| HaulError::SerializationError(e.to_string()))
}

#[async_trait]
impl TryOnBackend for PipelineClient {
    async fn cutout(&self, image: ImagePayload) -> Result<ImagePayload> {
        let body = CutoutRequest {
            image: Some(image.to_data_url()),
        };
        self.post("cutout", &body).await
    }

    async fn generate(&self, composition: Composition) -> Result<ImagePayload> {
        self.post("generate", &generate_request(&composition)).await
    }
}
