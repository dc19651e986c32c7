//! Gateway backed by a Supabase-compatible service.
//!
//! Authentication goes through the GoTrue endpoints under `/auth/v1`, rows
//! through PostgREST under `/rest/v1`. The access token of the signed-in user
//! is kept in memory only; every record request carries it so row-level
//! security on the service sees the right user.
//!
//! Nothing is written to disk, so a new process always starts signed out and
//! `current_session` answers `None` until a sign-in succeeds. Restoring a
//! session only finds one inside the process that signed in.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AuthGateway, RecordGateway, SessionEvent};
use crate::config::GatewayConfig;
use crate::error::{DeclutterError, Result};
use crate::models::{Identity, Query, Table};

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl UserPayload {
    fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredSession {
    access_token: String,
}

/// HTTP client for the hosted backend
#[derive(Debug)]
pub struct SupabaseGateway {
    client: Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<StoredSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseGateway {
    /// Build a client for the endpoint in `config`
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            session: RwLock::new(None),
            events,
        })
    }

    fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    fn store_session(&self, session: Option<StoredSession>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let token = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    fn rest_request(&self, method: Method, table: Table, query: &Query) -> RequestBuilder {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for filter in &query.filters {
            params.push((filter.column.clone(), format!("eq.{}", filter.value)));
        }
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }
        self.request(method, &format!("/rest/v1/{}", table.name()))
            .query(&params)
    }

    /// A PostgREST write that returns the affected rows
    fn rest_write(&self, method: Method, table: Table, query: &Query) -> RequestBuilder {
        self.rest_request(method, table, query)
            .header("Prefer", "return=representation")
    }

    /// Parse a token response, remember the session and announce it
    fn start_session(&self, body: Value) -> Result<Identity> {
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string);
        let user = body.get("user").cloned().unwrap_or(body);
        let identity = serde_json::from_value::<UserPayload>(user)?.into_identity();
        if let Some(access_token) = access_token {
            self.store_session(Some(StoredSession { access_token }));
            let _ = self.events.send(SessionEvent::SignedIn(identity.clone()));
        }
        Ok(identity)
    }
}

/// First human-readable message in an error body
fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| body.as_str().map(str::to_string))
}

async fn send(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    if status.is_success() {
        return Ok(body);
    }
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(DeclutterError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn into_rows(body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[async_trait]
impl AuthGateway for SupabaseGateway {
    async fn current_session(&self) -> Result<Option<Identity>> {
        if self.access_token().is_none() {
            return Ok(None);
        }
        match send(self.request(Method::GET, "/auth/v1/user")).await {
            Ok(body) => {
                let identity = serde_json::from_value::<UserPayload>(body)?.into_identity();
                Ok(Some(identity))
            }
            Err(DeclutterError::Rejected { status: 401 | 403, .. }) => {
                debug!("stored session is no longer valid");
                self.store_session(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let request = self
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let body = send(request).await?;
        self.start_session(body)
    }

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<Identity> {
        let request = self
            .request(Method::POST, "/auth/v1/signup")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email, "password": password }));
        let body = send(request).await?;
        self.start_session(body)
    }

    async fn sign_out(&self) -> Result<()> {
        let result = if self.access_token().is_some() {
            send(self.request(Method::POST, "/auth/v1/logout")).await.map(|_| ())
        } else {
            Ok(())
        };
        if let Err(err) = &result {
            warn!(error = %err, "remote sign-out failed, dropping local session anyway");
        }
        self.store_session(None);
        let _ = self.events.send(SessionEvent::SignedOut);
        result
    }
}

#[async_trait]
impl RecordGateway for SupabaseGateway {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        Ok(into_rows(send(self.rest_request(Method::GET, table, query)).await?))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let request = self
            .rest_write(Method::POST, table, &Query::new())
            .json(&row);
        into_rows(send(request).await?)
            .into_iter()
            .next()
            .ok_or_else(|| DeclutterError::Rejected {
                status: 500,
                message: format!("insert into {} returned no row", table.name()),
            })
    }

    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>> {
        let request = self
            .rest_write(Method::PATCH, table, query)
            .json(&patch);
        Ok(into_rows(send(request).await?))
    }

    async fn delete(&self, table: Table, query: &Query) -> Result<u64> {
        let request = self.rest_write(Method::DELETE, table, query);
        Ok(into_rows(send(request).await?).len() as u64)
    }
}
