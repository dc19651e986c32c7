//! Inventory state: the signed-in user's items and health checks.
//!
//! The cache is replaced wholesale by fetches and patched in place by the
//! mutators once the gateway confirms a write. Calls are not serialized
//! against each other; whichever gateway response arrives last is what the
//! cache shows until the next full fetch. Locks guard only the in-memory
//! snapshot and are never held across an await. A response that lands after
//! the identity changed is returned to the caller but never cached.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::analytics::Analytics;
use crate::error::{DeclutterError, Result};
use crate::gateway::RecordGateway;
use crate::metrics::GatewayTimer;
use crate::models::{HealthCheck, Identity, Item, ItemDraft, ItemPatch, NewHealthCheck, Query, Table};
use crate::validation::InputValidator;

#[derive(Debug, Default)]
struct Snapshot {
    items: Vec<Item>,
    health_checks: Vec<HealthCheck>,
    error: Option<String>,
}

/// Clears the loading flag however the operation exits
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn begin(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DeclutterError::from))
        .collect()
}

fn with_owner(mut row: Value, owner: &Identity) -> Value {
    if let Value::Object(fields) = &mut row {
        fields.insert("user_id".to_string(), Value::String(owner.id.to_string()));
    }
    row
}

/// In-memory cache of the current user's records
pub struct InventoryState {
    gateway: Arc<dyn RecordGateway>,
    identity: watch::Receiver<Option<Identity>>,
    snapshot: RwLock<Snapshot>,
    loading: AtomicBool,
}

impl InventoryState {
    /// Inventory scoped to whatever identity `identity` currently holds
    pub fn new(gateway: Arc<dyn RecordGateway>, identity: watch::Receiver<Option<Identity>>) -> Self {
        Self {
            gateway,
            identity,
            snapshot: RwLock::new(Snapshot::default()),
            loading: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identity every query is scoped to
    #[must_use]
    pub fn owner(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    fn require_owner(&self) -> Result<Identity> {
        self.owner().ok_or(DeclutterError::NotAuthenticated)
    }

    /// Whether `owner` is still the signed-in identity after an await
    fn still_owned_by(&self, owner: Uuid) -> bool {
        let same = self
            .identity
            .borrow()
            .as_ref()
            .is_some_and(|current| current.id == owner);
        if !same {
            debug!(%owner, "identity changed mid-call, leaving cache alone");
        }
        same
    }

    /// Cached items, newest first
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.read().items.clone()
    }

    /// Cached health checks, newest first
    #[must_use]
    pub fn health_checks(&self) -> Vec<HealthCheck> {
        self.read().health_checks.clone()
    }

    /// Message of the most recent failed operation, cleared when the next one starts
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Whether a fetch or mutation is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Analytics over the cached items
    #[must_use]
    pub fn analytics(&self) -> Analytics {
        Analytics::compute(&self.read().items)
    }

    /// Look an item up in the cache; never touches the gateway
    #[must_use]
    pub fn get_item_by_id(&self, id: Uuid) -> Option<Item> {
        self.read().items.iter().find(|item| item.id == id).cloned()
    }

    /// The cached health check with the latest check date
    #[must_use]
    pub fn latest_health_check(&self) -> Option<HealthCheck> {
        self.read()
            .health_checks
            .iter()
            .max_by_key(|check| check.check_date)
            .cloned()
    }

    fn set_error(&self, error: Option<String>) {
        self.write().error = error;
    }

    /// Drop every cached record
    pub fn clear(&self) {
        let mut snapshot = self.write();
        snapshot.items.clear();
        snapshot.health_checks.clear();
        snapshot.error = None;
    }

    /// Load or clear the cache to match the current identity
    pub async fn sync_identity(&self) -> Result<()> {
        if self.owner().is_some() {
            let items = self.fetch_items().await;
            let checks = self.fetch_health_checks().await;
            items.and(checks)
        } else {
            debug!("no identity, clearing inventory");
            self.clear();
            Ok(())
        }
    }

    /// Re-sync every time the identity changes, until the session goes away
    pub fn follow_session(self: Arc<Self>) -> JoinHandle<()> {
        let mut identity = self.identity.clone();
        tokio::spawn(async move {
            // Failures are already logged and recorded in the error string
            let _ = self.sync_identity().await;
            while identity.changed().await.is_ok() {
                let _ = self.sync_identity().await;
            }
        })
    }

    /// Run a gateway call with the loading flag, timing and error bookkeeping
    async fn tracked<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _loading = LoadingGuard::begin(&self.loading);
        self.set_error(None);
        let timer = GatewayTimer::start(operation);
        let result = call.await;
        timer.finish(result.is_ok());
        if let Err(err) = &result {
            error!(operation, error = %err, "inventory operation failed");
            self.set_error(Some(err.to_string()));
        }
        result
    }

    /// Replace the cached items with the owner's items, newest first.
    ///
    /// On failure the previous items stay cached and the error is recorded.
    pub async fn fetch_items(&self) -> Result<()> {
        let Some(owner) = self.owner() else {
            return Ok(());
        };
        let query = Query::new()
            .eq("user_id", owner.id)
            .order_by("created_at", false);
        let items: Vec<Item> = self
            .tracked("fetch_items", async {
                let rows = self.gateway.select(Table::Items, &query).await?;
                decode_rows::<Item>(rows)
            })
            .await?;
        debug!(count = items.len(), "fetched items");
        if self.still_owned_by(owner.id) {
            self.write().items = items;
        }
        Ok(())
    }

    /// Replace the cached health checks, latest check first.
    ///
    /// On failure the previous checks stay cached and the error is recorded.
    pub async fn fetch_health_checks(&self) -> Result<()> {
        let Some(owner) = self.owner() else {
            return Ok(());
        };
        let query = Query::new()
            .eq("user_id", owner.id)
            .order_by("check_date", false);
        let timer = GatewayTimer::start("fetch_health_checks");
        let result = async {
            let rows = self.gateway.select(Table::HealthChecks, &query).await?;
            decode_rows::<HealthCheck>(rows)
        }
        .await;
        timer.finish(result.is_ok());
        match result {
            Ok(checks) => {
                debug!(count = checks.len(), "fetched health checks");
                if self.still_owned_by(owner.id) {
                    self.write().health_checks = checks;
                }
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "error fetching health checks");
                self.set_error(Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Create an item owned by the current identity and prepend it to the cache
    pub async fn add_item(&self, draft: ItemDraft) -> Result<Item> {
        let owner = self.require_owner()?;
        InputValidator::validate_item_draft(&draft)?;
        let row = with_owner(serde_json::to_value(&draft)?, &owner);
        let item: Item = self
            .tracked("add_item", async {
                let stored = self.gateway.insert(Table::Items, row).await?;
                Ok::<Item, DeclutterError>(serde_json::from_value(stored)?)
            })
            .await?;
        info!(id = %item.id, name = %item.name, "item added");
        if self.still_owned_by(owner.id) {
            self.write().items.insert(0, item.clone());
        }
        Ok(item)
    }

    /// Apply `patch` to one of the owner's items and refresh its cached copy
    pub async fn update_item(&self, id: Uuid, patch: ItemPatch) -> Result<Item> {
        let owner = self.require_owner()?;
        InputValidator::validate_item_patch(&patch)?;
        if patch.is_empty() {
            debug!(%id, "empty patch, refreshing updated_at only");
        }
        let mut row = serde_json::to_value(&patch)?;
        if let Value::Object(fields) = &mut row {
            fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
        }
        let query = Query::new().eq("id", id).eq("user_id", owner.id);
        let item: Item = self
            .tracked("update_item", async {
                let rows = self.gateway.update(Table::Items, &query, row).await?;
                decode_rows::<Item>(rows)?
                    .into_iter()
                    .next()
                    .ok_or(DeclutterError::NotFound(id))
            })
            .await?;
        info!(id = %item.id, "item updated");
        if self.still_owned_by(owner.id) {
            let mut snapshot = self.write();
            if let Some(cached) = snapshot.items.iter_mut().find(|cached| cached.id == id) {
                *cached = item.clone();
            }
        }
        Ok(item)
    }

    /// Delete one of the owner's items. Deleting an absent item is a no-op.
    pub async fn delete_item(&self, id: Uuid) -> Result<()> {
        let owner = self.require_owner()?;
        let query = Query::new().eq("id", id).eq("user_id", owner.id);
        let removed = self
            .tracked("delete_item", self.gateway.delete(Table::Items, &query))
            .await?;
        if removed == 0 {
            debug!(%id, "delete matched no rows");
        } else {
            info!(%id, "item deleted");
        }
        if self.still_owned_by(owner.id) {
            self.write().items.retain(|item| item.id != id);
        }
        Ok(())
    }

    /// Persist a health check and prepend it to the cache
    pub(crate) async fn persist_health_check(&self, check: &NewHealthCheck) -> Result<HealthCheck> {
        let timer = GatewayTimer::start("create_health_check");
        let result = async {
            let stored = self
                .gateway
                .insert(Table::HealthChecks, serde_json::to_value(check)?)
                .await?;
            Ok::<HealthCheck, DeclutterError>(serde_json::from_value(stored)?)
        }
        .await;
        timer.finish(result.is_ok());
        let stored = result?;
        if self.still_owned_by(check.owner_id) {
            self.write().health_checks.insert(0, stored.clone());
        }
        Ok(stored)
    }
}
