//! Comprehensive unit tests for analytics.rs module

use chrono::{DateTime, Duration, TimeZone, Utc};
use digital_declutter::analytics::{health_score, Analytics, RECENT_ITEMS_LIMIT};
use digital_declutter::health_check::recommendations;
use digital_declutter::models::{Importance, Item, ItemType, UsageFrequency};
use proptest::prelude::*;
use uuid::Uuid;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn item(name: &str, category: &str, usage: UsageFrequency, minutes: i64) -> Item {
    let created_at = base_time() + Duration::minutes(minutes);
    Item {
        id: Uuid::new_v4(),
        owner_id: Uuid::nil(),
        name: name.to_string(),
        item_type: ItemType::App,
        category: category.to_string(),
        last_used_date: None,
        usage_frequency: usage,
        importance: Importance::Medium,
        platform: String::new(),
        notes: String::new(),
        created_at,
        updated_at: created_at,
    }
}

#[test]
fn test_empty_inventory() {
    let analytics = Analytics::compute(&[]);
    assert_eq!(analytics.total_items, 0);
    assert_eq!(analytics.unused_items, 0);
    assert!(analytics.category_counts.is_empty());
    assert!(analytics.recent_items.is_empty());
    assert_eq!(analytics.health_score, 100);
}

#[test]
fn test_counts_by_category_type_and_usage() {
    let mut device = item("Kindle", "Education", UsageFrequency::Never, 2);
    device.item_type = ItemType::Device;
    let items = vec![
        item("Netflix", "Entertainment", UsageFrequency::Weekly, 0),
        item("Hulu", "Entertainment", UsageFrequency::Rarely, 1),
        device,
    ];

    let analytics = Analytics::compute(&items);

    assert_eq!(analytics.total_items, 3);
    assert_eq!(analytics.unused_items, 2);
    assert_eq!(analytics.category_counts["Entertainment"], 2);
    assert_eq!(analytics.category_counts["Education"], 1);
    assert_eq!(analytics.type_counts[&ItemType::App], 2);
    assert_eq!(analytics.type_counts[&ItemType::Device], 1);
    assert_eq!(analytics.usage_frequency[&UsageFrequency::Rarely], 1);
    assert!(!analytics.usage_frequency.contains_key(&UsageFrequency::Daily));
    assert_eq!(analytics.health_score, 33);
}

#[test]
fn test_recent_items_newest_first_and_capped() {
    let items: Vec<Item> = (0..8)
        .map(|i| item(&format!("item-{i}"), "Other", UsageFrequency::Daily, i))
        .collect();

    let analytics = Analytics::compute(&items);

    let names: Vec<&str> = analytics.recent_items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["item-7", "item-6", "item-5", "item-4", "item-3"]);
}

#[test]
fn test_health_score_rounding() {
    assert_eq!(health_score(3, 1), 67);
    assert_eq!(health_score(8, 1), 88);
    assert_eq!(health_score(8, 3), 63);
    assert_eq!(health_score(2, 1), 50);
    assert_eq!(health_score(4, 4), 0);
    assert_eq!(health_score(0, 0), 100);
}

#[test]
fn test_consolidation_threshold_is_strictly_more_than_two() {
    let two = vec![
        item("A", "Gaming", UsageFrequency::Daily, 0),
        item("B", "Gaming", UsageFrequency::Daily, 1),
    ];
    assert_eq!(
        recommendations(&Analytics::compute(&two)),
        vec!["Your digital footprint looks well-managed!"]
    );
}

#[test]
fn test_recommendations_follow_category_order() {
    let mut items = Vec::new();
    for (i, category) in ["Social Media", "Finance"].iter().enumerate() {
        for j in 0..3 {
            items.push(item("x", category, UsageFrequency::Daily, (i * 3 + j) as i64));
        }
    }
    let recs = recommendations(&Analytics::compute(&items));
    assert_eq!(
        recs,
        vec![
            "You have 3 items in Finance. Consider consolidating.",
            "You have 3 items in Social Media. Consider consolidating.",
        ]
    );
}

fn usage_strategy() -> impl Strategy<Value = UsageFrequency> {
    prop_oneof![
        Just(UsageFrequency::Daily),
        Just(UsageFrequency::Weekly),
        Just(UsageFrequency::Monthly),
        Just(UsageFrequency::Rarely),
        Just(UsageFrequency::Never),
    ]
}

fn items_strategy() -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec(
        (usage_strategy(), 0usize..4, 0i64..10_000),
        0..30,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .map(|(usage, category, minutes)| {
                item("p", ["A", "B", "C", "D"][category], usage, minutes)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_health_score_in_range(total in 0usize..10_000, unused in 0usize..10_000) {
        let unused = unused.min(total);
        let score = health_score(total, unused);
        prop_assert!(score <= 100);
        if unused == 0 {
            prop_assert_eq!(score, 100);
        }
    }

    #[test]
    fn prop_analytics_invariants(items in items_strategy()) {
        let analytics = Analytics::compute(&items);

        prop_assert!(analytics.unused_items <= analytics.total_items);
        prop_assert_eq!(analytics.recent_items.len(), RECENT_ITEMS_LIMIT.min(items.len()));
        prop_assert!(analytics
            .recent_items
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
        prop_assert_eq!(analytics.category_counts.values().sum::<usize>(), items.len());
        prop_assert_eq!(analytics.usage_frequency.values().sum::<usize>(), items.len());
    }

    #[test]
    fn prop_recommendations_never_empty(items in items_strategy()) {
        let recs = recommendations(&Analytics::compute(&items));
        prop_assert!(!recs.is_empty());
        let well_managed = recs.iter().any(|r| r == "Your digital footprint looks well-managed!");
        prop_assert_eq!(well_managed, recs.len() == 1 && items.iter().all(|i| !i.usage_frequency.is_unused())
            && Analytics::compute(&items).category_counts.values().all(|c| *c <= 2));
    }
}
