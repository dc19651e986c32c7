//! Application context bundling session and inventory state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{DeclutterError, Result};
use crate::export::{write_export, ExportDocument};
use crate::gateway::{AuthGateway, RecordGateway};
use crate::health_check::HealthCheckRunner;
use crate::inventory::InventoryState;
use crate::models::Identity;
use crate::session::SessionState;

/// Session and inventory wired to the same identity channel
pub struct DeclutterService {
    session: Arc<SessionState>,
    inventory: Arc<InventoryState>,
}

impl DeclutterService {
    /// Service over separate auth and record gateways
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        records: Arc<dyn RecordGateway>,
        redirect_to: impl Into<String>,
    ) -> Self {
        let session = Arc::new(SessionState::new(auth, redirect_to));
        let inventory = Arc::new(InventoryState::new(records, session.subscribe()));
        Self { session, inventory }
    }

    /// Service over a gateway that implements both halves
    pub fn with_gateway<G>(gateway: Arc<G>, config: &AppConfig) -> Self
    where
        G: AuthGateway + RecordGateway + 'static,
    {
        let auth: Arc<dyn AuthGateway> = gateway.clone();
        let records: Arc<dyn RecordGateway> = gateway;
        Self::new(auth, records, config.sign_up_redirect())
    }

    /// Session state
    #[must_use]
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Inventory state
    #[must_use]
    pub fn inventory(&self) -> &Arc<InventoryState> {
        &self.inventory
    }

    /// Restore any existing session and keep inventory in step with it.
    ///
    /// Returns the background tasks; aborting them stops the following.
    pub async fn start(&self) -> Vec<JoinHandle<()>> {
        let session_task = self.session.start().await;
        let inventory_task = Arc::clone(&self.inventory).follow_session();
        vec![session_task, inventory_task]
    }

    /// Sign in and load the inventory before returning
    pub async fn sign_in_and_sync(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.session.sign_in(email, password).await?;
        self.inventory.sync_identity().await?;
        debug!(items = self.inventory.items().len(), "inventory synced");
        Ok(identity)
    }

    /// Staged health-check runner over this inventory
    #[must_use]
    pub fn health_check_runner(&self, config: &AppConfig) -> HealthCheckRunner {
        HealthCheckRunner::new(Arc::clone(&self.inventory), &config.health_check)
    }

    /// Export document for the signed-in identity
    pub fn export_document(&self) -> Result<ExportDocument> {
        let identity = self.session.identity().ok_or(DeclutterError::NotAuthenticated)?;
        Ok(ExportDocument::new(&identity, self.inventory.items()))
    }

    /// Write the export document into `output_dir`
    pub fn export_to(&self, output_dir: &Path, file_name: &str) -> Result<PathBuf> {
        let document = self.export_document()?;
        write_export(output_dir, file_name, &document)
    }
}
