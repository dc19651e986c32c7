//! Session state: who is signed in.
//!
//! The current [`Identity`] lives in a `watch` channel. Consumers such as the
//! inventory hold a receiver and react to sign-in and sign-out explicitly
//! instead of reading ambient global state.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{AuthError, AuthErrorKind, DeclutterError, Result};
use crate::gateway::AuthGateway;
use crate::models::Identity;

/// Map a gateway failure during sign-in to its structured code.
///
/// Gateway rejections mentioning confirmation are `email_not_confirmed`, all
/// other rejections are `invalid_credentials`; anything that is not a
/// rejection (transport, decoding) is `unexpected_error`.
#[must_use]
pub fn classify_sign_in_error(err: &DeclutterError) -> AuthError {
    match err {
        DeclutterError::Rejected { message, .. } => {
            let kind = if message.to_lowercase().contains("confirmed") {
                AuthErrorKind::EmailNotConfirmed
            } else {
                AuthErrorKind::InvalidCredentials
            };
            AuthError::new(kind, message.clone())
        }
        DeclutterError::Auth(auth) => auth.clone(),
        _ => AuthError::new(AuthErrorKind::Unexpected, "An unexpected error occurred"),
    }
}

fn classify_sign_up_error(err: &DeclutterError) -> AuthError {
    match err {
        DeclutterError::Rejected { message, .. } => {
            AuthError::new(AuthErrorKind::SignUpFailed, message.clone())
        }
        DeclutterError::Auth(auth) => auth.clone(),
        _ => AuthError::new(AuthErrorKind::Unexpected, "An unexpected error occurred"),
    }
}

/// Holds the authenticated identity for this process
pub struct SessionState {
    gateway: Arc<dyn AuthGateway>,
    identity: Arc<watch::Sender<Option<Identity>>>,
    redirect_to: String,
}

impl SessionState {
    /// Session with no identity that has not consulted the gateway yet
    pub fn new(gateway: Arc<dyn AuthGateway>, redirect_to: impl Into<String>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            gateway,
            identity: Arc::new(identity),
            redirect_to: redirect_to.into(),
        }
    }

    /// Adopt any session the gateway already holds.
    ///
    /// A failed lookup is logged and leaves the session signed out.
    pub async fn restore(&self) {
        match self.gateway.current_session().await {
            Ok(Some(identity)) => {
                info!(email = %identity.email, "restored existing session");
                self.set_identity(Some(identity));
            }
            Ok(None) => debug!("no existing session"),
            Err(err) => error!(error = %err, "error checking session"),
        }
    }

    /// Follow the gateway's session-change events until the gateway goes away
    pub fn follow_gateway(&self) -> JoinHandle<()> {
        let mut events = self.gateway.subscribe();
        let identity = Arc::clone(&self.identity);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let next = event.identity();
                        identity.send_if_modified(|current| replace_if_changed(current, next));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed session events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Restore any existing session and start following session changes
    pub async fn start(&self) -> JoinHandle<()> {
        let follower = self.follow_gateway();
        self.restore().await;
        follower
    }

    /// Currently signed-in identity
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Receiver that observes every identity change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    fn set_identity(&self, next: Option<Identity>) {
        self.identity
            .send_if_modified(|current| replace_if_changed(current, next));
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<Identity, AuthError> {
        match self.gateway.sign_in_with_password(email, password).await {
            Ok(identity) => {
                info!(email = %identity.email, "signed in");
                self.set_identity(Some(identity.clone()));
                Ok(identity)
            }
            Err(err) => {
                let auth = classify_sign_in_error(&err);
                warn!(code = auth.code(), error = %err, "sign in failed");
                Err(auth)
            }
        }
    }

    /// Create an account; the confirmation link returns to the sign-in page
    pub async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<Identity, AuthError> {
        match self.gateway.sign_up(email, password, &self.redirect_to).await {
            Ok(identity) => {
                info!(email = %identity.email, "signed up");
                self.set_identity(Some(identity.clone()));
                Ok(identity)
            }
            Err(err) => {
                let auth = classify_sign_up_error(&err);
                warn!(code = auth.code(), error = %err, "sign up failed");
                Err(auth)
            }
        }
    }

    /// Sign out. The local identity is cleared even when the gateway call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.gateway.sign_out().await;
        self.set_identity(None);
        match &result {
            Ok(()) => info!("signed out"),
            Err(err) => error!(error = %err, "sign out error"),
        }
        result
    }
}

fn replace_if_changed(current: &mut Option<Identity>, next: Option<Identity>) -> bool {
    if *current == next {
        false
    } else {
        *current = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sign_in_error() {
        let unconfirmed = DeclutterError::Rejected {
            status: 400,
            message: "Email not confirmed".to_string(),
        };
        assert_eq!(classify_sign_in_error(&unconfirmed).kind, AuthErrorKind::EmailNotConfirmed);

        let wrong = DeclutterError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(classify_sign_in_error(&wrong).kind, AuthErrorKind::InvalidCredentials);

        let other = DeclutterError::Other("connection reset".to_string());
        let classified = classify_sign_in_error(&other);
        assert_eq!(classified.kind, AuthErrorKind::Unexpected);
        assert_eq!(classified.message, "An unexpected error occurred");
    }

    #[test]
    fn test_classify_sign_up_error() {
        let taken = DeclutterError::Rejected {
            status: 422,
            message: "User already registered".to_string(),
        };
        assert_eq!(classify_sign_up_error(&taken).code(), "signup_failed");
    }
}
