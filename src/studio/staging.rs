use crate::models::{GarmentCategory, GarmentItem};

/// Which categories hold at most one staged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    shoes_exclusive: bool,
}

impl Default for SlotPolicy {
    /// Tops and bottoms are single-slot; shoes and accessories stack.
    fn default() -> Self {
        Self {
            shoes_exclusive: false,
        }
    }
}

impl SlotPolicy {
    /// Treats shoes as single-slot like tops and bottoms.
    pub fn exclusive_shoes() -> Self {
        Self {
            shoes_exclusive: true,
        }
    }

    pub fn is_single_slot(&self, category: GarmentCategory) -> bool {
        match category {
            GarmentCategory::AboveWaist | GarmentCategory::BelowWaist => true,
            GarmentCategory::Shoes => self.shoes_exclusive,
            GarmentCategory::Accessories => false,
        }
    }
}

/// The garments staged for the next dress-up, in staging order.
#[derive(Debug, Clone, Default)]
pub struct GarmentSlots {
    policy: SlotPolicy,
    items: Vec<GarmentItem>,
}

impl GarmentSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: SlotPolicy) -> Self {
        Self {
            policy,
            items: Vec::new(),
        }
    }

    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Stages `item` and returns the items it displaced.
    pub fn stage(&mut self, item: GarmentItem) -> Vec<GarmentItem> {
        let single = self.policy.is_single_slot(item.category);
        let (displaced, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|staged| {
                staged.id == item.id || (single && staged.category == item.category)
            });
        self.items = kept;
        self.items.push(item);
        displaced
    }

    pub fn unstage(&mut self, id: &str) -> Option<GarmentItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn items(&self) -> &[GarmentItem] {
        &self.items
    }

    pub fn in_category(&self, category: GarmentCategory) -> impl Iterator<Item = &GarmentItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    /// Staged items sorted body-outward; staging order breaks ties.
    pub fn in_layer_order(&self) -> Vec<&GarmentItem> {
        let mut ordered: Vec<&GarmentItem> = self.items.iter().collect();
        ordered.sort_by_key(|item| item.category.layer());
        ordered
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
    use crate::models::ImageSource;

    fn item(id: &str, category: GarmentCategory) -> GarmentItem {
        GarmentItem {
            id: id.to_string(),
            name: id.to_uppercase(),
            category,
            image: ImageSource::Url(format!("http://localhost/{}.webp", id)),
        }
    }

    fn ids(slots: &GarmentSlots) -> Vec<&str> {
        slots.items().iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_single_slot_replaces() {
        let mut slots = GarmentSlots::new();
        slots.stage(item("a", GarmentCategory::AboveWaist));
        let displaced = slots.stage(item("b", GarmentCategory::AboveWaist));

        assert_eq!(ids(&slots), vec!["b"]);
        assert_eq!(displaced[0].id, "a");
    }

    #[test]
    fn test_accessories_stack() {
        let mut slots = GarmentSlots::new();
        slots.stage(item("d", GarmentCategory::Accessories));
        slots.stage(item("c", GarmentCategory::Accessories));
        assert_eq!(ids(&slots), vec!["d", "c"]);
    }

    #[test]
    fn test_shoes_follow_policy() {
        let mut stacking = GarmentSlots::new();
        stacking.stage(item("heels", GarmentCategory::Shoes));
        stacking.stage(item("boots", GarmentCategory::Shoes));
        assert_eq!(stacking.in_category(GarmentCategory::Shoes).count(), 2);

        let mut exclusive = GarmentSlots::with_policy(SlotPolicy::exclusive_shoes());
        exclusive.stage(item("heels", GarmentCategory::Shoes));
        exclusive.stage(item("boots", GarmentCategory::Shoes));
        assert_eq!(ids(&exclusive), vec!["boots"]);
    }

    #[test]
    fn test_other_categories_are_untouched() {
        let mut slots = GarmentSlots::new();
        slots.stage(item("top", GarmentCategory::AboveWaist));
        slots.stage(item("jeans", GarmentCategory::BelowWaist));
        slots.stage(item("bag", GarmentCategory::Accessories));
        slots.stage(item("skirt", GarmentCategory::BelowWaist));
        assert_eq!(ids(&slots), vec!["top", "bag", "skirt"]);
    }

    #[test]
    fn test_restaging_same_item_does_not_duplicate() {
        let mut slots = GarmentSlots::new();
        slots.stage(item("bag", GarmentCategory::Accessories));
        slots.stage(item("bag", GarmentCategory::Accessories));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_unstage_by_identity() {
        let mut slots = GarmentSlots::new();
        slots.stage(item("top", GarmentCategory::AboveWaist));
        slots.stage(item("bag", GarmentCategory::Accessories));

        assert_eq!(slots.unstage("top").unwrap().id, "top");
        assert!(slots.unstage("top").is_none());
        assert_eq!(ids(&slots), vec!["bag"]);
    }

    #[test]
    fn test_layer_order_is_stable() {
        let mut slots = GarmentSlots::new();
        slots.stage(item("glasses", GarmentCategory::Accessories));
        slots.stage(item("heels", GarmentCategory::Shoes));
        slots.stage(item("bag", GarmentCategory::Accessories));
        slots.stage(item("jeans", GarmentCategory::BelowWaist));
        slots.stage(item("jacket", GarmentCategory::AboveWaist));

        let ordered: Vec<&str> = slots.in_layer_order().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ordered, vec!["jacket", "jeans", "heels", "glasses", "bag"]);
    }
}
