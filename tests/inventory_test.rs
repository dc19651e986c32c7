//! Integration tests for inventory state against the in-process gateway

use std::sync::Arc;

use chrono::NaiveDate;
use digital_declutter::error::ErrorKind;
use digital_declutter::gateway::{MemoryGateway, RecordGateway};
use digital_declutter::models::{Importance, ItemDraft, ItemPatch, ItemType, Table, UsageFrequency};
use digital_declutter::{DeclutterService, InventoryState};
use uuid::Uuid;

const PASSWORD: &str = "hunter22";

async fn signed_in(gateway: &Arc<MemoryGateway>, email: &str) -> DeclutterService {
    gateway.register_user(email, PASSWORD, true);
    let service = DeclutterService::new(gateway.clone(), gateway.clone(), "http://localhost/signin");
    service.sign_in_and_sync(email, PASSWORD).await.unwrap();
    service
}

fn inventory(service: &DeclutterService) -> &Arc<InventoryState> {
    service.inventory()
}

#[tokio::test]
async fn test_add_then_get_by_id_round_trip() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;

    let draft = ItemDraft {
        name: "Netflix".to_string(),
        item_type: ItemType::Subscription,
        category: "Entertainment".to_string(),
        last_used_date: NaiveDate::from_ymd_opt(2026, 9, 30),
        usage_frequency: UsageFrequency::Weekly,
        importance: Importance::Low,
        platform: "Web".to_string(),
        notes: "Shared plan".to_string(),
    };
    let added = inventory(&service).add_item(draft.clone()).await.unwrap();

    let fetched = inventory(&service).get_item_by_id(added.id).unwrap();
    assert_eq!(fetched.to_draft(), draft);
    assert_eq!(fetched.owner_id, service.session().identity().unwrap().id);
    assert!(!inventory(&service).is_loading());
}

#[tokio::test]
async fn test_get_by_id_unknown_is_none() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;

    assert!(inventory(&service).get_item_by_id(Uuid::new_v4()).is_none());
}

#[tokio::test]
async fn test_added_items_are_prepended() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;

    inventory(&service).add_item(ItemDraft::new("Slack", "Productivity")).await.unwrap();
    inventory(&service).add_item(ItemDraft::new("Notion", "Productivity")).await.unwrap();

    let names: Vec<String> = inventory(&service).items().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Notion", "Slack"]);
}

#[tokio::test]
async fn test_fetch_orders_newest_first() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;

    for name in ["one", "two", "three"] {
        inventory(&service).add_item(ItemDraft::new(name, "Other")).await.unwrap();
    }
    inventory(&service).clear();
    inventory(&service).fetch_items().await.unwrap();

    let names: Vec<String> = inventory(&service).items().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["three", "two", "one"]);
}

#[tokio::test]
async fn test_items_are_scoped_to_owner() {
    let gateway = Arc::new(MemoryGateway::new());
    let ana = signed_in(&gateway, "ana@example.com").await;
    inventory(&ana).add_item(ItemDraft::new("Steam", "Gaming")).await.unwrap();

    let ben = signed_in(&gateway, "ben@example.com").await;
    assert!(inventory(&ben).items().is_empty());
    assert_eq!(gateway.rows(Table::Items).len(), 1);
}

#[tokio::test]
async fn test_update_replaces_cached_item() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;
    let added = inventory(&service)
        .add_item(ItemDraft::new("Spotify", "Entertainment"))
        .await
        .unwrap();

    let patch = ItemPatch {
        usage_frequency: Some(UsageFrequency::Never),
        notes: Some("Switched to another service".to_string()),
        ..ItemPatch::default()
    };
    let updated = inventory(&service).update_item(added.id, patch).await.unwrap();

    assert_eq!(updated.usage_frequency, UsageFrequency::Never);
    assert_eq!(updated.name, "Spotify");
    assert!(updated.updated_at >= added.updated_at);
    assert_eq!(inventory(&service).get_item_by_id(added.id), Some(updated));
    assert_eq!(inventory(&service).analytics().unused_items, 1);
}

#[tokio::test]
async fn test_update_can_clear_last_used_date() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;
    let mut draft = ItemDraft::new("Kindle", "Education");
    draft.last_used_date = NaiveDate::from_ymd_opt(2026, 1, 2);
    let added = inventory(&service).add_item(draft).await.unwrap();

    let patch = ItemPatch {
        last_used_date: Some(None),
        ..ItemPatch::default()
    };
    let updated = inventory(&service).update_item(added.id, patch).await.unwrap();
    assert_eq!(updated.last_used_date, None);
}

#[tokio::test]
async fn test_empty_patch_refreshes_updated_at() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;
    let added = inventory(&service)
        .add_item(ItemDraft::new("Netflix", "Entertainment"))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let touched = inventory(&service)
        .update_item(added.id, ItemPatch::default())
        .await
        .unwrap();

    assert!(touched.updated_at > added.updated_at);
    assert_eq!(touched.to_draft(), added.to_draft());
    assert_eq!(inventory(&service).get_item_by_id(added.id), Some(touched));
}

#[tokio::test]
async fn test_long_free_text_is_accepted() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;

    let mut draft = ItemDraft::new("Streaming bundle ".repeat(10), "Entertainment and Media Streaming Services");
    draft.notes = "x".repeat(2001);
    let added = inventory(&service).add_item(draft).await.unwrap();
    assert_eq!(added.notes.len(), 2001);

    let patch = ItemPatch {
        notes: Some("Line one\nLine two".to_string()),
        ..ItemPatch::default()
    };
    let updated = inventory(&service).update_item(added.id, patch).await.unwrap();
    assert_eq!(updated.notes, "Line one\nLine two");
}

#[tokio::test]
async fn test_update_unknown_item_is_not_found() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;

    let patch = ItemPatch {
        name: Some("Ghost".to_string()),
        ..ItemPatch::default()
    };
    let err = inventory(&service).update_item(Uuid::new_v4(), patch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(inventory(&service).error().is_some());
}

#[tokio::test]
async fn test_update_cannot_touch_other_owners_item() {
    let gateway = Arc::new(MemoryGateway::new());
    let ana = signed_in(&gateway, "ana@example.com").await;
    let item = inventory(&ana).add_item(ItemDraft::new("Steam", "Gaming")).await.unwrap();

    let ben = signed_in(&gateway, "ben@example.com").await;
    let patch = ItemPatch {
        name: Some("Mine now".to_string()),
        ..ItemPatch::default()
    };
    let err = inventory(&ben).update_item(item.id, patch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(gateway.rows(Table::Items)[0]["name"], "Steam");
}

#[tokio::test]
async fn test_delete_twice_is_a_no_op() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;
    let item = inventory(&service).add_item(ItemDraft::new("Vine", "Social Media")).await.unwrap();

    inventory(&service).delete_item(item.id).await.unwrap();
    inventory(&service).delete_item(item.id).await.unwrap();

    assert!(inventory(&service).items().is_empty());
    assert!(inventory(&service).error().is_none());
    assert!(gateway.rows(Table::Items).is_empty());
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_gateway() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;

    let err = inventory(&service).add_item(ItemDraft::new("  ", "Other")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(gateway.rows(Table::Items).is_empty());
}

#[tokio::test]
async fn test_mutations_require_identity() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = DeclutterService::new(gateway.clone(), gateway.clone(), "http://localhost/signin");

    let err = inventory(&service).add_item(ItemDraft::new("Slack", "Productivity")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
    let err = inventory(&service).delete_item(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
    assert!(gateway.rows(Table::Items).is_empty());
}

#[tokio::test]
async fn test_fetch_without_identity_does_nothing() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = DeclutterService::new(gateway.clone(), gateway.clone(), "http://localhost/signin");

    inventory(&service).fetch_items().await.unwrap();
    inventory(&service).fetch_health_checks().await.unwrap();
    assert!(inventory(&service).items().is_empty());
}

#[tokio::test]
async fn test_sign_out_clears_inventory() {
    let gateway = Arc::new(MemoryGateway::new());
    let service = signed_in(&gateway, "ana@example.com").await;
    inventory(&service).add_item(ItemDraft::new("Slack", "Productivity")).await.unwrap();

    service.session().sign_out().await.unwrap();
    inventory(&service).sync_identity().await.unwrap();

    assert!(inventory(&service).items().is_empty());
    assert!(inventory(&service).owner().is_none());
}

#[tokio::test]
async fn test_follow_session_loads_on_sign_in() {
    let gateway = Arc::new(MemoryGateway::new());
    let owner = gateway.register_user("ana@example.com", PASSWORD, true);
    let mut row = serde_json::to_value(ItemDraft::new("Dropbox", "Other")).unwrap();
    row["user_id"] = serde_json::Value::String(owner.id.to_string());
    gateway.insert(Table::Items, row).await.unwrap();

    let service = DeclutterService::new(gateway.clone(), gateway.clone(), "http://localhost/signin");
    let tasks = service.start().await;
    let mut identity = service.session().subscribe();

    service.session().sign_in("ana@example.com", PASSWORD).await.unwrap();
    identity.changed().await.unwrap();

    let mut loaded = false;
    for _ in 0..50 {
        if inventory(&service).items().len() == 1 {
            loaded = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(loaded);

    for task in tasks {
        task.abort();
    }
}
