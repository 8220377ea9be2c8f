use crate::{
    config::GenAiConfig,
    error::{HaulError, Result},
    genai::{prompts, GeminiSynthesizer, ImageSynthesizer, SynthesisError},
    models::{Background, ImagePayload},
};
use std::sync::Arc;
use uuid::Uuid;

pub const MISSING_IMAGE: &str = "Missing image";
pub const MISSING_MODEL_OR_GARMENTS: &str = "Missing model or garments";
pub const MISSING_API_KEY: &str = "Missing API key on server";

/// One dress-up request: subject, garments in layering order, optional
/// caller instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub subject: ImagePayload,
    pub garments: Vec<ImagePayload>,
    pub prompt: Option<String>,
    pub background: Background,
}

impl Composition {
    pub fn new(subject: ImagePayload, garments: Vec<ImagePayload>) -> Self {
        Self {
            subject,
            garments,
            prompt: None,
            background: Background::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn instruction(&self) -> String {
        prompts::dress_instruction(self.background, self.prompt.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Cutout,
    Generate,
}

impl Stage {
    fn failure(&self) -> &'static str {
        match self {
            Stage::Cutout => "Cutout failed",
            Stage::Generate => "Generation failed",
        }
    }
}

/// Cutout and dress-up as single call-throughs to an image synthesizer.
/// Holds no per-request state.
#[derive(Clone)]
pub struct Pipeline {
    synthesizer: Option<Arc<dyn ImageSynthesizer>>,
}

impl Pipeline {
    pub fn new(synthesizer: Arc<dyn ImageSynthesizer>) -> Self {
        Self {
            synthesizer: Some(synthesizer),
        }
    }

    /// Every call fails with `Unconfigured`.
    pub fn unconfigured() -> Self {
        Self { synthesizer: None }
    }

    pub fn from_config(config: &GenAiConfig) -> Result<Self> {
        if !config.has_credentials() {
            log::warn!(
                "No API key found. Set one of {}; cutout and generate will fail until then",
                crate::config::API_KEY_VARS.join(", ")
            );
            return Ok(Self::unconfigured());
        }
        let synthesizer = GeminiSynthesizer::new(config)?;
        log::info!("Using model {} at {}", synthesizer.model(), synthesizer.endpoint());
        Ok(Self::new(Arc::new(synthesizer)))
    }

    pub fn is_configured(&self) -> bool {
        self.synthesizer.is_some()
    }

    fn synthesizer(&self) -> Result<&dyn ImageSynthesizer> {
        self.synthesizer
            .as_deref()
            .ok_or_else(|| HaulError::Unconfigured(MISSING_API_KEY.into()))
    }

    pub async fn cutout(&self, image: &ImagePayload) -> Result<ImagePayload> {
        if image.is_empty() {
            return Err(HaulError::InvalidRequest(MISSING_IMAGE.into()));
        }
        let synthesizer = self.synthesizer()?;

        let request_id = Uuid::new_v4();
        log::info!(
            "[req:{}] cutout of {} ({} bytes) via {}",
            request_id,
            image.media_type(),
            image.len(),
            synthesizer.name()
        );

        let images = [image.clone()];
        Self::finish(
            Stage::Cutout,
            request_id,
            synthesizer
                .synthesize(prompts::CUTOUT_INSTRUCTION, &images)
                .await,
        )
    }

    pub async fn generate(&self, composition: &Composition) -> Result<ImagePayload> {
        if composition.subject.is_empty() || composition.garments.is_empty() {
            return Err(HaulError::InvalidRequest(MISSING_MODEL_OR_GARMENTS.into()));
        }
        if let Some(index) = composition.garments.iter().position(|g| g.is_empty()) {
            return Err(HaulError::InvalidRequest(format!("Garment {} is empty", index)));
        }
        let synthesizer = self.synthesizer()?;

        let instruction = composition.instruction();
        let request_id = Uuid::new_v4();
        log::info!(
            "[req:{}] generate with {} garment(s), background {:?}, instruction length {} via {}",
            request_id,
            composition.garments.len(),
            composition.background,
            instruction.len(),
            synthesizer.name()
        );

        let mut images = Vec::with_capacity(composition.garments.len() + 1);
        images.push(composition.subject.clone());
        images.extend(composition.garments.iter().cloned());

        Self::finish(
            Stage::Generate,
            request_id,
            synthesizer.synthesize(&instruction, &images).await,
        )
    }

    fn finish(
        stage: Stage,
        request_id: Uuid,
        result: std::result::Result<ImagePayload, SynthesisError>,
    ) -> Result<ImagePayload> {
        match result {
            Ok(image) => {
                log::info!(
                    "[req:{}] {:?} produced {} ({} bytes)",
                    request_id,
                    stage,
                    image.media_type(),
                    image.len()
                );
                Ok(image)
            }
            Err(SynthesisError::NoImage) => {
                log::error!("[req:{}] {:?}: model returned no image", request_id, stage);
                Err(HaulError::generation_failed("No image returned", None))
            }
            Err(SynthesisError::Api { status, message }) => {
                log::error!(
                    "[req:{}] {}: upstream status {}: {}",
                    request_id,
                    stage.failure(),
                    status,
                    message
                );
                Err(HaulError::generation_failed(stage.failure(), Some(message)))
            }
            Err(e) => {
                log::error!("[req:{}] {}: {}", request_id, stage.failure(), e);
                Err(HaulError::generation_failed(
                    stage.failure(),
                    Some(e.to_string()),
                ))
            }
        }
    }
}
