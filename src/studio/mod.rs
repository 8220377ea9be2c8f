pub mod api_client;
pub mod backend;
pub mod catalog;
pub mod normalize;
pub mod session;
pub mod staging;

pub use api_client::PipelineClient;
pub use backend::TryOnBackend;
pub use catalog::{GarmentCatalog, ModelCatalog};
pub use normalize::ImageNormalizer;
pub use session::{Notice, NoticeLevel, Studio};
pub use staging::{GarmentSlots, SlotPolicy};
