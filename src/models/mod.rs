pub mod api;
pub mod gemini;
pub mod image;
pub mod wardrobe;

pub use self::api::*;
pub use self::image::*;
pub use self::wardrobe::*;
