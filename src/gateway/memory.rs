//! In-process gateway.
//!
//! Behaves like the hosted backend as far as this crate can observe: ids and
//! timestamps are assigned on insert, filters are equality-only, and sign-in
//! failures carry the same messages the hosted auth service sends. Used by the
//! test-suite and by `--offline` runs of the CLI.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use super::{AuthGateway, RecordGateway, SessionEvent};
use crate::error::{DeclutterError, Result};
use crate::models::{Identity, Query, Table};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";
const ALREADY_REGISTERED: &str = "User already registered";

#[derive(Debug, Clone)]
struct UserRecord {
    identity: Identity,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, UserRecord>,
    session: Option<Identity>,
    tables: HashMap<Table, Vec<Value>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Strictly increasing clock so insertion order survives timestamp sorts
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// Gateway that keeps users, the session and all rows in memory
#[derive(Debug)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<SessionEvent>,
    require_confirmation: bool,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Gateway whose sign-ups are confirmed immediately
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
            require_confirmation: false,
        }
    }

    /// Gateway whose sign-ups stay unconfirmed until [`Self::confirm_email`]
    #[must_use]
    pub fn with_email_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::new()
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an account directly, bypassing sign-up
    pub fn register_user(&self, email: &str, password: &str, confirmed: bool) -> Identity {
        let mut state = self.state();
        let created_at = state.next_timestamp();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at,
        };
        state.users.insert(
            email.to_lowercase(),
            UserRecord {
                identity: identity.clone(),
                password: password.to_string(),
                confirmed,
            },
        );
        identity
    }

    /// Mark an account's email as confirmed; false if no such account
    pub fn confirm_email(&self, email: &str) -> bool {
        self.state()
            .users
            .get_mut(&email.to_lowercase())
            .is_some_and(|user| {
                user.confirmed = true;
                true
            })
    }

    /// Copy of every row currently stored in `table`
    #[must_use]
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.state().tables.get(&table).cloned().unwrap_or_default()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

fn rejected(status: u16, message: &str) -> DeclutterError {
    DeclutterError::Rejected {
        status,
        message: message.to_string(),
    }
}

fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Column ordering: timestamps chronologically, numbers numerically, nulls last
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl AuthGateway for MemoryGateway {
    async fn current_session(&self) -> Result<Option<Identity>> {
        Ok(self.state().session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = {
            let mut state = self.state();
            let user = state
                .users
                .get(&email.to_lowercase())
                .filter(|user| user.password == password)
                .cloned()
                .ok_or_else(|| rejected(400, INVALID_CREDENTIALS))?;
            if !user.confirmed {
                return Err(rejected(400, EMAIL_NOT_CONFIRMED));
            }
            state.session = Some(user.identity.clone());
            user.identity
        };
        debug!(email, "memory gateway session started");
        self.publish(SessionEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<Identity> {
        if self.state().users.contains_key(&email.to_lowercase()) {
            return Err(rejected(422, ALREADY_REGISTERED));
        }
        let identity = self.register_user(email, password, !self.require_confirmation);
        debug!(email, redirect_to, "memory gateway account created");
        if !self.require_confirmation {
            self.state().session = Some(identity.clone());
            self.publish(SessionEvent::SignedIn(identity.clone()));
        }
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.state().session = None;
        self.publish(SessionEvent::SignedOut);
        Ok(())
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        let state = self.state();
        let mut rows: Vec<Value> = state
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let Value::Object(mut fields) = row else {
            return Err(rejected(400, "row must be a JSON object"));
        };
        let mut state = self.state();
        let now = timestamp_value(state.next_timestamp());
        if fields.get("id").map_or(true, Value::is_null) {
            fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        fields.entry("created_at").or_insert_with(|| now.clone());
        if table.has_updated_at() {
            fields.entry("updated_at").or_insert(now);
        }
        let stored = Value::Object(fields);
        state.tables.entry(table).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>> {
        let Value::Object(patch) = patch else {
            return Err(rejected(400, "patch must be a JSON object"));
        };
        let mut state = self.state();
        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                if let Value::Object(fields) = row {
                    merge(fields, &patch);
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, query: &Query) -> Result<u64> {
        let mut state = self.state();
        let Some(rows) = state.tables.get_mut(&table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !query.matches(row));
        Ok((before - rows.len()) as u64)
    }
}

fn merge(fields: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }
}
