pub mod config;
pub mod error;
pub mod genai;
pub mod logger;
pub mod models;
#[cfg(feature = "server")]
pub mod server;
pub mod studio;

pub use config::{ClientConfig, Config, GenAiConfig};
pub use error::{HaulError, Result};
pub use genai::{Composition, GeminiSynthesizer, ImageSynthesizer, Pipeline, SynthesisError};
pub use models::{
    Background, GarmentCategory, GarmentItem, ImagePayload, ImageSource, ModelEntity,
};
pub use studio::{PipelineClient, SlotPolicy, Studio, TryOnBackend};
