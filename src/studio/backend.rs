use crate::{
    error::Result,
    genai::{Composition, Pipeline},
    models::ImagePayload,
};
use async_trait::async_trait;

/// Anything that can run the cutout and dress-up stages for a studio.
#[async_trait]
pub trait TryOnBackend: Send + Sync {
    async fn cutout(&self, image: ImagePayload) -> Result<ImagePayload>;
    async fn generate(&self, composition: Composition) -> Result<ImagePayload>;
}

#[async_trait]
impl TryOnBackend for Pipeline {
    async fn cutout(&self, image: ImagePayload) -> Result<ImagePayload> {
        Pipeline::cutout(self, &image).await
    }

    async fn generate(&self, composition: Composition) -> Result<ImagePayload> {
        Pipeline::generate(self, &composition).await
    }
}
