//! Search and multi-select filtering over cached items.

use std::collections::BTreeSet;

use crate::models::{Importance, Item, ItemType, UsageFrequency};

/// Criteria for narrowing the inventory listing.
///
/// Every criterion must hold for an item to match. An empty set places no
/// constraint on its field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Case-insensitive substring of name, category or notes
    pub search: String,
    /// Allowed item types
    pub types: BTreeSet<ItemType>,
    /// Allowed categories, matched exactly
    pub categories: BTreeSet<String>,
    /// Allowed importance levels
    pub importance: BTreeSet<Importance>,
    /// Allowed usage frequencies
    pub usage_frequency: BTreeSet<UsageFrequency>,
}

fn allows<T: Ord>(set: &BTreeSet<T>, value: &T) -> bool {
    set.is_empty() || set.contains(value)
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

impl ItemFilter {
    /// Filter matching only the search term
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            ..Self::default()
        }
    }

    /// Whether any criterion is set
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || !self.types.is_empty()
            || !self.categories.is_empty()
            || !self.importance.is_empty()
            || !self.usage_frequency.is_empty()
    }

    /// Add the type if absent, remove it if present
    pub fn toggle_type(&mut self, item_type: ItemType) {
        toggle(&mut self.types, item_type);
    }

    /// Add the category if absent, remove it if present
    pub fn toggle_category(&mut self, category: impl Into<String>) {
        toggle(&mut self.categories, category.into());
    }

    /// Add the importance if absent, remove it if present
    pub fn toggle_importance(&mut self, importance: Importance) {
        toggle(&mut self.importance, importance);
    }

    /// Add the frequency if absent, remove it if present
    pub fn toggle_usage(&mut self, usage: UsageFrequency) {
        toggle(&mut self.usage_frequency, usage);
    }

    /// Clear every criterion
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether `item` satisfies every criterion
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        let term = self.search.to_lowercase();
        let matches_search = term.is_empty()
            || item.name.to_lowercase().contains(&term)
            || item.category.to_lowercase().contains(&term)
            || item.notes.to_lowercase().contains(&term);

        matches_search
            && allows(&self.types, &item.item_type)
            && allows(&self.categories, &item.category)
            && allows(&self.importance, &item.importance)
            && allows(&self.usage_frequency, &item.usage_frequency)
    }

    /// Matching items, preserving input order
    #[must_use]
    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

/// Distinct values present in an inventory, offered as filter choices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Types in use
    pub types: BTreeSet<ItemType>,
    /// Categories in use
    pub categories: BTreeSet<String>,
    /// Importance levels in use
    pub importance: BTreeSet<Importance>,
    /// Usage frequencies in use
    pub usage_frequency: BTreeSet<UsageFrequency>,
}

impl FilterOptions {
    /// Collect the distinct values of `items`
    #[must_use]
    pub fn from_items(items: &[Item]) -> Self {
        let mut options = Self::default();
        for item in items {
            options.types.insert(item.item_type);
            options.categories.insert(item.category.clone());
            options.importance.insert(item.importance);
            options.usage_frequency.insert(item.usage_frequency);
        }
        options
    }
}
