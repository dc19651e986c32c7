//! Data models for the digital inventory
//!
//! This module contains the records exchanged with the gateway (identities,
//! items, health checks), the drafts and patches used to create and change
//! them, and the query description the gateway understands.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category suggestions offered when cataloguing an item
pub const CATEGORY_SUGGESTIONS: [&str; 10] = [
    "Entertainment",
    "Productivity",
    "Social Media",
    "Shopping",
    "Finance",
    "Health",
    "Education",
    "Gaming",
    "Professional",
    "Other",
];

/// The authenticated user principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Gateway-assigned user id
    pub id: Uuid,
    /// Sign-in email address
    pub email: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Kind of tracked digital asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Installed application
    App,
    /// Online account
    Account,
    /// Physical device
    Device,
    /// Paid subscription
    Subscription,
}

/// How often an item gets used
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageFrequency {
    /// Every day
    Daily,
    /// Every week
    Weekly,
    /// Every month
    Monthly,
    /// Hardly ever
    Rarely,
    /// Not at all
    Never,
}

impl UsageFrequency {
    /// True for frequencies that count an item as unused
    #[must_use]
    pub const fn is_unused(self) -> bool {
        matches!(self, Self::Rarely | Self::Never)
    }
}

/// How much the owner cares about an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Keep at all costs
    High,
    /// Useful
    Medium,
    /// Could go
    Low,
}

macro_rules! impl_lowercase_display {
    ($($ty:ty => { $($variant:ident => $text:literal),+ $(,)? }),+ $(,)?) => {
        $(
            impl $ty {
                /// Wire name of this value
                #[must_use]
                pub const fn as_str(self) -> &'static str {
                    match self {
                        $(Self::$variant => $text),+
                    }
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl std::str::FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    match s.trim().to_lowercase().as_str() {
                        $($text => Ok(Self::$variant),)+
                        other => Err(format!("unknown {}: {other}", stringify!($ty))),
                    }
                }
            }
        )+
    };
}

impl_lowercase_display! {
    ItemType => { App => "app", Account => "account", Device => "device", Subscription => "subscription" },
    UsageFrequency => {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Rarely => "rarely",
        Never => "never",
    },
    Importance => { High => "high", Medium => "medium", Low => "low" },
}

/// A tracked digital asset as stored by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Gateway-assigned id
    pub id: Uuid,
    /// Owning identity
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    /// Display name, e.g. "Netflix"
    pub name: String,
    /// Kind of asset
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Free-text category, usually one of [`CATEGORY_SUGGESTIONS`]
    pub category: String,
    /// Last day the item was used, if known
    pub last_used_date: Option<NaiveDate>,
    /// Usage frequency
    pub usage_frequency: UsageFrequency,
    /// Importance to the owner
    pub importance: Importance,
    /// Platform or vendor
    #[serde(default)]
    pub platform: String,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// Creation timestamp (gateway clock)
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// The user-editable fields of this item
    #[must_use]
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            item_type: self.item_type,
            category: self.category.clone(),
            last_used_date: self.last_used_date,
            usage_frequency: self.usage_frequency,
            importance: self.importance,
            platform: self.platform.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Fields supplied by the user when creating an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    /// Display name
    pub name: String,
    /// Kind of asset
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Category
    pub category: String,
    /// Last day used
    pub last_used_date: Option<NaiveDate>,
    /// Usage frequency
    pub usage_frequency: UsageFrequency,
    /// Importance
    pub importance: Importance,
    /// Platform or vendor
    pub platform: String,
    /// Notes
    pub notes: String,
}

impl ItemDraft {
    /// A draft with the form defaults: an app used daily, medium importance
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_type: ItemType::App,
            category: category.into(),
            last_used_date: None,
            usage_frequency: UsageFrequency::Daily,
            importance: Importance::Medium,
            platform: String::new(),
            notes: String::new(),
        }
    }
}

/// Partial update of an item; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    /// New category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `Some(None)` clears the date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_date: Option<Option<NaiveDate>>,
    /// New usage frequency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_frequency: Option<UsageFrequency>,
    /// New importance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    /// New platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// New notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ItemPatch {
    /// True when the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Score quality bands used when presenting a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 80 and above
    Good,
    /// 60 to 79
    Fair,
    /// Below 60
    Poor,
}

impl ScoreBand {
    /// Band for a score in `0..=100`
    #[must_use]
    pub const fn for_score(score: u8) -> Self {
        if score >= 80 {
            Self::Good
        } else if score >= 60 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Immutable snapshot of inventory analytics with recommendations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Gateway-assigned id
    pub id: Uuid,
    /// Owning identity
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    /// When the check ran
    pub check_date: DateTime<Utc>,
    /// Item count at check time
    pub total_items: u32,
    /// Unused item count at check time
    pub unused_items: u32,
    /// Recommendations in generation order
    pub recommendations: Vec<String>,
    /// Creation timestamp (gateway clock)
    pub created_at: DateTime<Utc>,
}

impl HealthCheck {
    /// Health score recomputed from the snapshot counts
    #[must_use]
    pub fn score(&self) -> u8 {
        crate::analytics::health_score(self.total_items as usize, self.unused_items as usize)
    }

    /// Whole days elapsed between the check and `now`
    #[must_use]
    pub fn days_since(&self, now: DateTime<Utc>) -> i64 {
        (now - self.check_date).num_days()
    }
}

/// Payload for persisting a new health check
#[derive(Debug, Clone, Serialize)]
pub struct NewHealthCheck {
    /// Owning identity
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    /// When the check ran
    pub check_date: DateTime<Utc>,
    /// Item count
    pub total_items: u32,
    /// Unused item count
    pub unused_items: u32,
    /// Recommendations
    pub recommendations: Vec<String>,
}

/// Gateway record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Tracked items
    Items,
    /// Persisted health checks
    HealthChecks,
}

impl Table {
    /// Collection name on the gateway
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Items => "digital_items",
            Self::HealthChecks => "health_checks",
        }
    }

    /// Whether rows carry a server-maintained `updated_at` column
    #[must_use]
    pub const fn has_updated_at(self) -> bool {
        matches!(self, Self::Items)
    }
}

/// Equality filter on a single column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column name to filter on
    pub column: String,
    /// Value the column must equal, in its text form
    pub value: String,
}

/// Ordering of query results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to order results by
    pub column: String,
    /// Ascending when true, descending otherwise
    pub ascending: bool,
}

/// Row selection understood by every gateway
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Equality filters, all of which must match
    pub filters: Vec<Filter>,
    /// Optional result ordering
    pub order: Option<Order>,
}

impl Query {
    /// Create a new query matching every row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Set the result ordering
    #[must_use]
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Whether `row` satisfies every filter
    #[must_use]
    pub fn matches(&self, row: &serde_json::Value) -> bool {
        self.filters.iter().all(|filter| match row.get(&filter.column) {
            Some(serde_json::Value::String(s)) => *s == filter.value,
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string() == filter.value,
        })
    }
}
