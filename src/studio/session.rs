use crate::{
    error::{HaulError, Result},
    genai::Composition,
    models::{Background, GarmentCategory, GarmentItem, ImagePayload, ImageSource, ModelEntity},
    studio::{
        backend::TryOnBackend,
        catalog::{GarmentCatalog, ModelCatalog},
        normalize::ImageNormalizer,
        staging::{GarmentSlots, SlotPolicy},
    },
};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, dismissable message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

/// Placement guidance for the staged garments, one line per item.
pub fn placement_prompt(items: &[&GarmentItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let lines: Vec<String> = items
        .iter()
        .map(|item| format!("- {} ({}): {}", item.name, item.category, item.category.placement()))
        .collect();
    Some(format!(
        "Garments, in the order of the images that follow the model:\n{}",
        lines.join("\n")
    ))
}

/// Raises a busy flag for its lifetime; dropping the guard lowers it, even
/// when the owning future is cancelled mid-call.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Session state for one user: catalogs, the active model, staged garments
/// and the last result. Every mutation goes through an action method.
pub struct Studio {
    backend: Arc<dyn TryOnBackend>,
    normalizer: ImageNormalizer,
    models: ModelCatalog,
    garments: GarmentCatalog,
    staged: GarmentSlots,
    background: Background,
    final_image: Option<ImagePayload>,
    is_processing_model: Arc<AtomicBool>,
    is_generating: Arc<AtomicBool>,
    notices: Vec<Notice>,
    next_notice: u64,
}

impl Studio {
    pub fn new(backend: Arc<dyn TryOnBackend>) -> Self {
        Self {
            backend,
            normalizer: ImageNormalizer::new(),
            models: ModelCatalog::new(),
            garments: GarmentCatalog::new(),
            staged: GarmentSlots::new(),
            background: Background::default(),
            final_image: None,
            is_processing_model: Arc::new(AtomicBool::new(false)),
            is_generating: Arc::new(AtomicBool::new(false)),
            notices: Vec::new(),
            next_notice: 0,
        }
    }

    pub fn with_catalogs(mut self, models: ModelCatalog, garments: GarmentCatalog) -> Self {
        self.models = models;
        self.garments = garments;
        self
    }

    pub fn with_policy(mut self, policy: SlotPolicy) -> Self {
        self.staged = GarmentSlots::with_policy(policy);
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn with_normalizer(mut self, normalizer: ImageNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    pub fn garments(&self) -> &GarmentCatalog {
        &self.garments
    }

    pub fn staged(&self) -> &GarmentSlots {
        &self.staged
    }

    pub fn selected_model(&self) -> Option<&ModelEntity> {
        self.models.active()
    }

    pub fn final_image(&self) -> Option<&ImagePayload> {
        self.final_image.as_ref()
    }

    pub fn is_processing_model(&self) -> bool {
        self.is_processing_model.load(Ordering::SeqCst)
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating.load(Ordering::SeqCst)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss(&mut self, notice_id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != notice_id);
        self.notices.len() != before
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.next_notice += 1;
        let notice = Notice {
            id: self.next_notice,
            level,
            message: message.into(),
        };
        match level {
            NoticeLevel::Error => log::warn!("{}", notice.message),
            _ => log::info!("{}", notice.message),
        }
        self.notices.push(notice);
    }

    fn fail<T>(&mut self, message: &str, err: HaulError) -> Result<T> {
        let detail = err.details().map(str::to_string).unwrap_or_else(|| err.to_string());
        self.notify(NoticeLevel::Error, format!("{} ({})", message, detail));
        Err(err)
    }

    pub fn add_model(&mut self, name: impl Into<String>, image: ImageSource) -> String {
        let id = self.models.add(name, image);
        self.notify(NoticeLevel::Success, "Model added successfully!");
        id
    }

    pub fn delete_model(&mut self, id: &str) -> Option<ModelEntity> {
        let removed = self.models.delete(id)?;
        if removed.is_active {
            self.final_image = None;
        }
        self.notify(NoticeLevel::Success, "Model deleted!");
        Some(removed)
    }

    pub fn select_model(&mut self, id: &str) -> Result<()> {
        let name = match self.models.select(id) {
            Some(model) => model.name.clone(),
            None => return Err(HaulError::InvalidRequest(format!("Unknown model {}", id))),
        };
        self.notify(NoticeLevel::Success, format!("{} selected as model!", name));
        Ok(())
    }

    pub fn add_garment(
        &mut self,
        name: impl Into<String>,
        category: GarmentCategory,
        image: ImageSource,
    ) -> String {
        let id = self.garments.add(name, category, image);
        self.notify(NoticeLevel::Success, "Clothing item added to catalog!");
        id
    }

    pub fn delete_garment(&mut self, id: &str) -> Option<GarmentItem> {
        let removed = self.garments.delete(id)?;
        self.staged.unstage(id);
        self.notify(NoticeLevel::Success, "Clothing item deleted!");
        Some(removed)
    }

    /// Stages a catalog item; the same call serves drag-and-drop and clicks.
    pub fn stage_garment(&mut self, id: &str) -> Result<Vec<GarmentItem>> {
        let item = self
            .garments
            .get(id)
            .cloned()
            .ok_or_else(|| HaulError::InvalidRequest(format!("Unknown garment {}", id)))?;
        Ok(self.staged.stage(item))
    }

    pub fn unstage_garment(&mut self, id: &str) -> Option<GarmentItem> {
        self.staged.unstage(id)
    }

    /// Cuts the subject out of the model's base photo and replaces its
    /// processed image.
    pub async fn make_model(&mut self, id: &str) -> Result<ImagePayload> {
        self.notify(NoticeLevel::Info, "Processing model... creating cutout");
        let busy = BusyGuard::raise(&self.is_processing_model);
        let result = self.run_cutout(id).await;
        drop(busy);

        match result {
            Ok(cutout) => {
                self.notify(NoticeLevel::Success, "Model processed. Ready for dress-up!");
                Ok(cutout)
            }
            Err(e) => self.fail("Failed to process model. Try another photo.", e),
        }
    }

    async fn run_cutout(&mut self, id: &str) -> Result<ImagePayload> {
        let source = self
            .models
            .get(id)
            .map(|model| model.base_image.clone())
            .ok_or_else(|| HaulError::InvalidRequest(format!("Unknown model {}", id)))?;

        let image = self.normalizer.normalize(&source).await?;
        let cutout = self.backend.cutout(image).await?;
        self.models.set_processed(id, cutout.clone());
        Ok(cutout)
    }

    /// Dresses the selected model in the staged garments. `prompt` is added
    /// after the service's base directive; without one, placement guidance
    /// for the staged items is sent.
    pub async fn dress_up(&mut self, prompt: Option<String>) -> Result<ImagePayload> {
        let selected = self.selected_model().map(|model| model.id.clone());
        let model_id = match selected {
            Some(id) if !self.staged.is_empty() => id,
            _ => {
                return self.fail(
                    "Please select a model and add clothing items!",
                    HaulError::InvalidRequest("No model selected or no garments staged".into()),
                )
            }
        };

        let has_cutout = self
            .models
            .get(&model_id)
            .map_or(false, |model| model.processed_image.is_some());
        if !has_cutout {
            if let Err(e) = self.make_model(&model_id).await {
                log::warn!("Dressing the original photo, cutout failed: {}", e);
            }
        }

        let busy = BusyGuard::raise(&self.is_generating);
        let result = self.run_generate(&model_id, prompt).await;
        drop(busy);

        match result {
            Ok(image) => {
                self.final_image = Some(image.clone());
                self.notify(NoticeLevel::Success, "Dress-up complete! Check the preview!");
                Ok(image)
            }
            Err(e) => self.fail("Failed to generate dress-up. Please try again.", e),
        }
    }

    async fn run_generate(&mut self, model_id: &str, prompt: Option<String>) -> Result<ImagePayload> {
        let subject_source = self
            .models
            .get(model_id)
            .map(ModelEntity::dress_source)
            .ok_or_else(|| HaulError::InvalidRequest(format!("Unknown model {}", model_id)))?;

        let ordered = self.staged.in_layer_order();
        let prompt = prompt.or_else(|| placement_prompt(&ordered));
        let sources: Vec<ImageSource> = ordered.iter().map(|item| item.image.clone()).collect();

        let subject = self.normalizer.normalize(&subject_source).await?;
        let garments = self.normalizer.normalize_all(&sources).await?;

        let mut composition = Composition::new(subject, garments).with_background(self.background);
        composition.prompt = prompt;

        self.backend.generate(composition).await
    }
}
