//! Operator sign-in.
//!
//! The identity provider is reached through [`Authenticator`]. The bundled
//! [`InMemoryAuthenticator`] serves the built-in admin and staff accounts and
//! keeps sessions in process memory.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Staff,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: SessionToken,
    pub user: UserIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("{role} accounts may not perform this action")]
    Forbidden { role: &'static str },
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Seam to the identity provider.
pub trait Authenticator: Send + Sync {
    fn login(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn resolve(&self, token: &SessionToken) -> Result<UserIdentity, AuthError>;
    fn logout(&self, token: &SessionToken) -> Result<(), AuthError>;
}

/// Resolves `token` and requires the admin role.
pub fn require_admin(
    authenticator: &dyn Authenticator,
    token: &SessionToken,
) -> Result<UserIdentity, AuthError> {
    let user = authenticator.resolve(token)?;
    if !user.is_admin() {
        return Err(AuthError::Forbidden {
            role: user.role.label(),
        });
    }
    Ok(user)
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

struct Account {
    identity: UserIdentity,
    password_digest: [u8; 32],
}

pub struct InMemoryAuthenticator {
    accounts: Vec<Account>,
    sessions: Mutex<HashMap<SessionToken, UserIdentity>>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_account(mut self, identity: UserIdentity, password: &str) -> Self {
        self.accounts.push(Account {
            identity,
            password_digest: digest(password),
        });
        self
    }

    /// The built-in admin and staff accounts, sharing `password`.
    pub fn with_demo_users(password: &str) -> Self {
        Self::new()
            .with_account(
                UserIdentity {
                    id: "1".to_string(),
                    display_name: "Admin User".to_string(),
                    email: "admin@dormhub.com".to_string(),
                    role: UserRole::Admin,
                },
                password,
            )
            .with_account(
                UserIdentity {
                    id: "2".to_string(),
                    display_name: "Staff User".to_string(),
                    email: "staff@dormhub.com".to_string(),
                    role: UserRole::Staff,
                },
                password,
            )
    }

    fn issue_token() -> SessionToken {
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        SessionToken(hex::encode(bytes))
    }

    fn sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionToken, UserIdentity>>, AuthError> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::Unavailable("session lock poisoned".to_string()))
    }
}

impl Default for InMemoryAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for InMemoryAuthenticator {
    fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        let account = self
            .accounts
            .iter()
            .find(|account| account.identity.email.eq_ignore_ascii_case(email))
            .filter(|account| !password.is_empty() && account.password_digest == digest(password));

        let Some(account) = account else {
            warn!(email, "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let token = Self::issue_token();
        self.sessions()?
            .insert(token.clone(), account.identity.clone());
        info!(user = %account.identity.id, role = account.identity.role.label(), "operator signed in");

        Ok(Session {
            token,
            user: account.identity.clone(),
        })
    }

    fn resolve(&self, token: &SessionToken) -> Result<UserIdentity, AuthError> {
        self.sessions()?
            .get(token)
            .cloned()
            .ok_or(AuthError::NotAuthenticated)
    }

    fn logout(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.sessions()?
            .remove(token)
            .map(|_| ())
            .ok_or(AuthError::NotAuthenticated)
    }
}
