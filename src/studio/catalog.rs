use crate::models::{GarmentCategory, GarmentItem, ImagePayload, ImageSource, ModelEntity};
use uuid::Uuid;

const SAMPLE_GARMENTS: [(&str, &str, GarmentCategory, &str); 16] = [
    ("top-1", "Jacket", GarmentCategory::AboveWaist, "Tops_Shirts/jacket.webp"),
    ("top-2", "Blouse", GarmentCategory::AboveWaist, "Tops_Shirts/top2.webp"),
    ("top-3", "T-Shirt", GarmentCategory::AboveWaist, "Tops_Shirts/top3.webp"),
    ("top-4", "Women Top", GarmentCategory::AboveWaist, "Tops_Shirts/womenTop.webp"),
    ("bottom-1", "Jeans", GarmentCategory::BelowWaist, "Bottoms/bo1.webp"),
    ("bottom-2", "Trousers", GarmentCategory::BelowWaist, "Bottoms/bo3.webp"),
    ("bottom-3", "Shorts", GarmentCategory::BelowWaist, "Bottoms/bo4.webp"),
    ("bottom-4", "Skirt", GarmentCategory::BelowWaist, "Bottoms/skirt.webp"),
    ("shoe-1", "Heels", GarmentCategory::Shoes, "Footwear/heels.webp"),
    ("shoe-2", "High Heels", GarmentCategory::Shoes, "Footwear/heels1.webp"),
    ("shoe-3", "Sandals", GarmentCategory::Shoes, "Footwear/heels2.webp"),
    ("shoe-4", "Boots", GarmentCategory::Shoes, "Footwear/heels3.webp"),
    ("acc-1", "Handbag", GarmentCategory::Accessories, "Accessories/bag1.webp"),
    ("acc-2", "Purse", GarmentCategory::Accessories, "Accessories/purse.webp"),
    ("acc-3", "Earrings", GarmentCategory::Accessories, "Accessories/ear1.webp"),
    ("acc-4", "Glasses", GarmentCategory::Accessories, "Accessories/spec.webp"),
];

fn asset(root: &str, relative: &str) -> ImageSource {
    ImageSource::Url(format!("{}/{}", root.trim_end_matches('/'), relative))
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelEntity>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// One sample model served from `asset_root`.
    pub fn samples(asset_root: &str) -> Self {
        Self {
            models: vec![ModelEntity {
                id: "sample-model-1".to_string(),
                name: "Sample Model".to_string(),
                base_image: asset(asset_root, "Model/model1.png"),
                processed_image: None,
                is_active: false,
            }],
        }
    }

    pub fn add(&mut self, name: impl Into<String>, image: ImageSource) -> String {
        let id = Uuid::new_v4().to_string();
        self.models.push(ModelEntity {
            id: id.clone(),
            name: name.into(),
            base_image: image,
            processed_image: None,
            is_active: false,
        });
        id
    }

    pub fn delete(&mut self, id: &str) -> Option<ModelEntity> {
        let index = self.models.iter().position(|m| m.id == id)?;
        Some(self.models.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntity> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Marks exactly `id` as active. Unknown ids leave the catalog untouched.
    pub fn select(&mut self, id: &str) -> Option<&ModelEntity> {
        if self.get(id).is_none() {
            return None;
        }
        for model in &mut self.models {
            model.is_active = model.id == id;
        }
        self.get(id)
    }

    pub fn active(&self) -> Option<&ModelEntity> {
        self.models.iter().find(|m| m.is_active)
    }

    /// Replaces the model's cutout wholesale.
    pub fn set_processed(&mut self, id: &str, processed: ImagePayload) -> bool {
        match self.models.iter_mut().find(|m| m.id == id) {
            Some(model) => {
                model.processed_image = Some(processed);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelEntity> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GarmentCatalog {
    items: Vec<GarmentItem>,
}

impl GarmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Four sample items per category served from `asset_root`.
    pub fn samples(asset_root: &str) -> Self {
        let items = SAMPLE_GARMENTS
            .iter()
            .map(|(id, name, category, path)| GarmentItem {
                id: id.to_string(),
                name: name.to_string(),
                category: *category,
                image: asset(asset_root, path),
            })
            .collect();
        Self { items }
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        category: GarmentCategory,
        image: ImageSource,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.items.push(GarmentItem {
            id: id.clone(),
            name: name.into(),
            category,
            image,
        });
        id
    }

    pub fn delete(&mut self, id: &str) -> Option<GarmentItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&GarmentItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn by_category(&self, category: GarmentCategory) -> impl Iterator<Item = &GarmentItem> {
        self.items.iter().filter(move |i| i.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GarmentItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_wardrobe() {
        let catalog = GarmentCatalog::samples("http://localhost:8080/");
        assert_eq!(catalog.len(), 16);
        for category in GarmentCategory::ALL {
            assert_eq!(catalog.by_category(category).count(), 4);
        }
        assert_eq!(
            catalog.get("acc-4").unwrap().image,
            ImageSource::Url("http://localhost:8080/Accessories/spec.webp".into())
        );
    }

    #[test]
    fn test_select_is_exclusive() {
        let mut catalog = ModelCatalog::samples("http://localhost:8080");
        let second = catalog.add("Runway", ImageSource::bytes(vec![1]));

        catalog.select("sample-model-1");
        catalog.select(&second);
        let active: Vec<&str> = catalog
            .iter()
            .filter(|m| m.is_active)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(active, vec![second.as_str()]);

        assert!(catalog.select("missing").is_none());
        assert_eq!(catalog.active().unwrap().id, second);
    }

    #[test]
    fn test_set_processed_replaces() {
        let mut catalog = ModelCatalog::new();
        let id = catalog.add("Model", ImageSource::bytes(vec![1]));

        assert!(catalog.set_processed(&id, ImagePayload::new("image/png", vec![1])));
        assert!(catalog.set_processed(&id, ImagePayload::new("image/png", vec![2])));
        assert_eq!(
            catalog.get(&id).unwrap().processed_image.as_ref().unwrap().bytes(),
            &[2]
        );
        assert!(!catalog.set_processed("missing", ImagePayload::new("image/png", vec![3])));
    }

    #[test]
    fn test_add_and_delete_garment() {
        let mut catalog = GarmentCatalog::new();
        let id = catalog.add("Scarf", GarmentCategory::Accessories, ImageSource::bytes(vec![1]));
        assert_eq!(catalog.get(&id).unwrap().name, "Scarf");
        assert_eq!(catalog.delete(&id).unwrap().id, id);
        assert!(catalog.is_empty());
    }
}
