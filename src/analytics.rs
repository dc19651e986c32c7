//! Inventory analytics.
//!
//! Everything here is a pure function of an item slice. Frequency tables are
//! `BTreeMap`s so that iterating them (and any text generated from them) is
//! stable for the same input.

use std::collections::BTreeMap;

use crate::models::{Item, ItemType, UsageFrequency};

/// Number of items reported in [`Analytics::recent_items`]
pub const RECENT_ITEMS_LIMIT: usize = 5;

/// Derived view over an inventory snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analytics {
    /// Number of items
    pub total_items: usize,
    /// Items used rarely or never
    pub unused_items: usize,
    /// Items per category
    pub category_counts: BTreeMap<String, usize>,
    /// Items per type
    pub type_counts: BTreeMap<ItemType, usize>,
    /// Items per usage frequency
    pub usage_frequency: BTreeMap<UsageFrequency, usize>,
    /// Newest items first, at most [`RECENT_ITEMS_LIMIT`]
    pub recent_items: Vec<Item>,
    /// Share of used items as a percentage
    pub health_score: u8,
}

impl Analytics {
    /// Compute analytics for `items`
    #[must_use]
    pub fn compute(items: &[Item]) -> Self {
        let mut category_counts = BTreeMap::new();
        let mut type_counts = BTreeMap::new();
        let mut usage_frequency = BTreeMap::new();
        let mut unused_items = 0;

        for item in items {
            *category_counts.entry(item.category.clone()).or_insert(0) += 1;
            *type_counts.entry(item.item_type).or_insert(0) += 1;
            *usage_frequency.entry(item.usage_frequency).or_insert(0) += 1;
            if item.usage_frequency.is_unused() {
                unused_items += 1;
            }
        }

        let mut recent_items = items.to_vec();
        recent_items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_items.truncate(RECENT_ITEMS_LIMIT);

        Self {
            total_items: items.len(),
            unused_items,
            category_counts,
            type_counts,
            usage_frequency,
            recent_items,
            health_score: health_score(items.len(), unused_items),
        }
    }
}

/// Percentage of used items, rounded half away from zero.
///
/// An empty inventory scores 100.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn health_score(total_items: usize, unused_items: usize) -> u8 {
    if total_items == 0 {
        return 100;
    }
    let used = total_items.saturating_sub(unused_items);
    let score = (used as f64 / total_items as f64 * 100.0).round();
    score.clamp(0.0, 100.0) as u8
}
