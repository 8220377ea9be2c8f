use crate::models::image::ImagePayload;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GarmentCategory {
    AboveWaist,
    BelowWaist,
    Shoes,
    Accessories,
}

impl GarmentCategory {
    pub const ALL: [GarmentCategory; 4] = [
        GarmentCategory::AboveWaist,
        GarmentCategory::BelowWaist,
        GarmentCategory::Shoes,
        GarmentCategory::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentCategory::AboveWaist => "above-waist",
            GarmentCategory::BelowWaist => "below-waist",
            GarmentCategory::Shoes => "shoes",
            GarmentCategory::Accessories => "accessories",
        }
    }

    /// Position in the dressing order, body first.
    pub fn layer(&self) -> u8 {
        match self {
            GarmentCategory::AboveWaist => 1,
            GarmentCategory::BelowWaist => 2,
            GarmentCategory::Shoes => 3,
            GarmentCategory::Accessories => 4,
        }
    }

    /// Where the garment goes on the figure.
    pub fn placement(&self) -> &'static str {
        match self {
            GarmentCategory::AboveWaist => "on torso, shoulders, and arms",
            GarmentCategory::BelowWaist => "on hips, waist, and legs",
            GarmentCategory::Shoes => "on feet with correct perspective",
            GarmentCategory::Accessories => "naturally on the body (bags, jewelry, eyewear)",
        }
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an image comes from before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Bytes {
        bytes: Vec<u8>,
        media_type: Option<String>,
    },
    Path(PathBuf),
    Url(String),
    Encoded(ImagePayload),
}

impl ImageSource {
    pub fn bytes(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes {
            bytes,
            media_type: None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ImageSource::Bytes { bytes, .. } => format!("{} in-memory bytes", bytes.len()),
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Url(url) if url.starts_with("data:") => "inline data URL".to_string(),
            ImageSource::Url(url) => url.clone(),
            ImageSource::Encoded(payload) => format!("encoded {}", payload.media_type()),
        }
    }
}

impl From<ImagePayload> for ImageSource {
    fn from(payload: ImagePayload) -> Self {
        ImageSource::Encoded(payload)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarmentItem {
    pub id: String,
    pub name: String,
    pub category: GarmentCategory,
    pub image: ImageSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntity {
    pub id: String,
    pub name: String,
    pub base_image: ImageSource,
    /// Cutout produced by the last "make model" run; replaced, never edited.
    pub processed_image: Option<ImagePayload>,
    pub is_active: bool,
}

impl ModelEntity {
    /// The image to dress: the cutout when one exists.
    pub fn dress_source(&self) -> ImageSource {
        match &self.processed_image {
            Some(processed) => ImageSource::Encoded(processed.clone()),
            None => self.base_image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&GarmentCategory::AboveWaist).unwrap(),
            "\"above-waist\""
        );
        let parsed: GarmentCategory = serde_json::from_str("\"accessories\"").unwrap();
        assert_eq!(parsed, GarmentCategory::Accessories);
        for category in GarmentCategory::ALL {
            assert_eq!(
                serde_json::to_string(&category).unwrap(),
                format!("\"{}\"", category.as_str())
            );
        }
    }

    #[test]
    fn test_layers_are_ordered() {
        let layers: Vec<u8> = GarmentCategory::ALL.iter().map(|c| c.layer()).collect();
        assert_eq!(layers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_dress_source_prefers_cutout() {
        let mut model = ModelEntity {
            id: "m".into(),
            name: "Sample".into(),
            base_image: ImageSource::Url("http://localhost/model1.png".into()),
            processed_image: None,
            is_active: false,
        };
        assert_eq!(model.dress_source(), model.base_image);

        let cutout = ImagePayload::new("image/png", vec![1, 2, 3]);
        model.processed_image = Some(cutout.clone());
        assert_eq!(model.dress_source(), ImageSource::Encoded(cutout));
    }
}
