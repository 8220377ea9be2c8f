pub mod gemini;
pub mod pipeline;
pub mod prompts;

use crate::models::ImagePayload;
use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiSynthesizer;
pub use pipeline::{Composition, Pipeline};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("{0}")]
    Request(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Response(String),
    #[error("No image returned")]
    NoImage,
}

/// A generative model that turns an instruction plus images into one image.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Submits `instruction` followed by `images`, in order, as one request
    /// and returns the first image the model produced.
    async fn synthesize(
        &self,
        instruction: &str,
        images: &[ImagePayload],
    ) -> std::result::Result<ImagePayload, SynthesisError>;
}
