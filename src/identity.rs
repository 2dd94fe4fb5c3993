// 🔑 Identity Store - Demo-grade user accounts and sessions
// Supplies the opaque owner reference members carry; the ledger never
// looks inside it. Accounts live in one JSON document, a demo login is
// seeded when the store is empty, and passwords are stored as SHA-256
// digests. This is demo plumbing, not a security model.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

// ============================================================================
// IDENTITY ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Signup with a blank username, email, or password
    MissingFields,

    /// Password shorter than the 6-character minimum
    PasswordTooShort,

    /// Signup with an email that already has an account
    EmailTaken,

    /// Login with an unknown email or wrong password
    InvalidCredentials,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::MissingFields => write!(f, "All fields are required"),
            IdentityError::PasswordTooShort => {
                write!(f, "Password must be at least 6 characters")
            }
            IdentityError::EmailTaken => write!(f, "Email already registered"),
            IdentityError::InvalidCredentials => write!(f, "Invalid email or password"),
        }
    }
}

impl std::error::Error for IdentityError {}

// ============================================================================
// USER ACCOUNT
// ============================================================================

/// Stored account record. The digest never leaves this module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_digest: String,
    pub tier_id: u32,
    pub created_at: DateTime<Utc>,
}

/// Session view of an account: what the rest of the application sees.
/// The `id` doubles as the ledger's opaque `owner_ref`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<&UserAccount> for AuthUser {
    fn from(account: &UserAccount) -> Self {
        AuthUser {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
        }
    }
}

fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// IDENTITY STORE
// ============================================================================

pub struct IdentityStore {
    users: Vec<UserAccount>,
    session: Option<AuthUser>,
}

impl IdentityStore {
    /// New store, seeded with the demo account
    /// (`demo@example.com` / `demo123`, Tier 2)
    pub fn new() -> Self {
        IdentityStore {
            users: vec![UserAccount {
                id: "demo-user-001".to_string(),
                username: "Demo User".to_string(),
                email: "demo@example.com".to_string(),
                password_digest: password_digest("demo123"),
                tier_id: 2,
                created_at: Utc::now(),
            }],
            session: None,
        }
    }

    /// Load accounts from a JSON document. A missing or malformed file
    /// yields a freshly seeded store; never fatal.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(reason) => {
                if path.exists() {
                    eprintln!("⚠️  User store unusable ({}), reseeding", reason);
                }
                Self::new()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user store {:?}", path))?;

        let users: Vec<UserAccount> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse user store {:?}", path))?;

        if users.is_empty() {
            return Ok(Self::new());
        }

        Ok(IdentityStore {
            users,
            session: None,
        })
    }

    /// Persist the account list (sessions are per-process, never stored)
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.users)
            .context("Failed to serialize user store")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write user store {:?}", path))?;
        Ok(())
    }

    /// Register a new account and log it in
    pub fn signup(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        tier_id: u32,
    ) -> Result<AuthUser, IdentityError> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(IdentityError::MissingFields);
        }

        if password.len() < 6 {
            return Err(IdentityError::PasswordTooShort);
        }

        if self.find_by_email(email).is_some() {
            return Err(IdentityError::EmailTaken);
        }

        let account = UserAccount {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_digest: password_digest(password),
            tier_id,
            created_at: Utc::now(),
        };

        let auth_user = AuthUser::from(&account);
        self.users.push(account);
        self.session = Some(auth_user.clone());

        Ok(auth_user)
    }

    /// Authenticate by email and password
    pub fn login(&mut self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        if email.is_empty() || password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }

        let digest = password_digest(password);
        let account = self
            .find_by_email(email)
            .filter(|account| account.password_digest == digest)
            .ok_or(IdentityError::InvalidCredentials)?;

        let auth_user = AuthUser::from(account);
        self.session = Some(auth_user.clone());

        Ok(auth_user)
    }

    pub fn logout(&mut self) {
        self.session = None;
    }

    pub fn current_user(&self) -> Option<&AuthUser> {
        self.session.as_ref()
    }

    /// Case-insensitive email lookup
    pub fn find_by_email(&self, email: &str) -> Option<&UserAccount> {
        let lower = email.to_lowercase();
        self.users.iter().find(|u| u.email.to_lowercase() == lower)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("users-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_store_seeds_demo_account() {
        let mut store = IdentityStore::new();
        assert_eq!(store.user_count(), 1);

        let user = store.login("demo@example.com", "demo123").unwrap();
        assert_eq!(user.id, "demo-user-001");
        assert_eq!(user.username, "Demo User");
        assert_eq!(store.current_user(), Some(&user));
    }

    #[test]
    fn test_signup_creates_account_and_logs_in() {
        let mut store = IdentityStore::new();

        let user = store
            .signup("Grace", "grace@example.com", "hopper1", 3)
            .unwrap();

        assert_eq!(store.user_count(), 2);
        assert_eq!(user.username, "Grace");
        assert_eq!(store.current_user(), Some(&user));

        // Digest stored, never the password itself
        let account = store.find_by_email("grace@example.com").unwrap();
        assert_ne!(account.password_digest, "hopper1");
        assert_eq!(account.tier_id, 3);
    }

    #[test]
    fn test_signup_validation() {
        let mut store = IdentityStore::new();

        assert_eq!(
            store.signup("", "a@b.com", "secret1", 1),
            Err(IdentityError::MissingFields)
        );
        assert_eq!(
            store.signup("A", "a@b.com", "short", 1),
            Err(IdentityError::PasswordTooShort)
        );
        assert_eq!(
            store.signup("A", "demo@example.com", "secret1", 1),
            Err(IdentityError::EmailTaken)
        );
        // Case-insensitive duplicate check
        assert_eq!(
            store.signup("A", "DEMO@EXAMPLE.COM", "secret1", 1),
            Err(IdentityError::EmailTaken)
        );

        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_login_rejects_bad_credentials() {
        let mut store = IdentityStore::new();

        assert_eq!(
            store.login("demo@example.com", "wrong"),
            Err(IdentityError::InvalidCredentials)
        );
        assert_eq!(
            store.login("nobody@example.com", "demo123"),
            Err(IdentityError::InvalidCredentials)
        );
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_logout_clears_session() {
        let mut store = IdentityStore::new();
        store.login("demo@example.com", "demo123").unwrap();

        store.logout();
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let path = scratch_path();

        let mut store = IdentityStore::new();
        store
            .signup("Grace", "grace@example.com", "hopper1", 3)
            .unwrap();
        store.save(&path).unwrap();

        let mut loaded = IdentityStore::load(&path);
        assert_eq!(loaded.user_count(), 2);
        assert!(loaded.login("grace@example.com", "hopper1").is_ok());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_malformed_user_store_reseeds() {
        let path = scratch_path();
        std::fs::write(&path, "not json at all").unwrap();

        let mut store = IdentityStore::load(&path);
        assert_eq!(store.user_count(), 1);
        assert!(store.login("demo@example.com", "demo123").is_ok());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_user_store_seeds_fresh() {
        let store = IdentityStore::load(&scratch_path());
        assert_eq!(store.user_count(), 1);
    }
}
