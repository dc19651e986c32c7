//! Digital Declutter - Personal Digital Footprint Tracker
//!
//! A Rust library for cataloguing the apps, accounts, devices and
//! subscriptions a person owns, analysing how they are used, and producing
//! persisted health checks with decluttering recommendations.
//!
//! # Features
//!
//! - Email/password sessions against a hosted auth gateway
//! - Per-user item inventory with add, update, delete and lookup
//! - Usage analytics and a 0-100 health score
//! - Staged health-check generation with stored history
//! - Search and filtering, JSON export

/// Usage analytics and health score
pub mod analytics;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// JSON export
pub mod export;
/// Search and filtering
pub mod filter;
/// Auth and record gateways
pub mod gateway;
/// Health-check generation
pub mod health_check;
/// Inventory state
pub mod inventory;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Application context
pub mod service;
/// Session state
pub mod session;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use analytics::Analytics;
pub use config::AppConfig;
pub use error::{AuthError, AuthErrorKind, DeclutterError, ErrorKind, Result};
pub use gateway::{AuthGateway, MemoryGateway, RecordGateway, SupabaseGateway};
pub use health_check::{CheckPhase, HealthCheckRunner};
pub use inventory::InventoryState;
pub use models::{HealthCheck, Identity, Importance, Item, ItemDraft, ItemPatch, ItemType, UsageFrequency};
pub use service::DeclutterService;
pub use session::SessionState;
