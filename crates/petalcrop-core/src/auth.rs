//! Authentication session storage.
//!
//! Tokens, role and profile live behind a [`SessionStore`] injected into
//! [`AuthSession`], with an explicit expiry per key. Time comes from a
//! [`Clock`] so expiry is testable and the browser can supply `Date.now()`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::form::AuthResponse;

/// Canonical storage keys.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER_ROLE: &str = "user_role";
    pub const USER_DATA: &str = "user_data";

    pub const ALL: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, USER_ROLE, USER_DATA];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Session storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize session value: {0}")]
    Serialize(String),
}

/// Millisecond wall clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock backed by `SystemTime`. Not usable on `wasm32-unknown-unknown`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Lifetime of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Lives until the store is cleared (browser session).
    Session,
    /// Expires this long after being written.
    After(Duration),
}

impl Expiry {
    fn deadline(&self, now_ms: u64) -> Option<u64> {
        match self {
            Expiry::Session => None,
            Expiry::After(ttl) => Some(now_ms.saturating_add(ttl.as_millis() as u64)),
        }
    }
}

/// How long each key lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub access_token: Expiry,
    pub refresh_token: Expiry,
    pub user_role: Expiry,
    pub user_data: Expiry,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        const DAY: u64 = 24 * 60 * 60;
        Self {
            access_token: Expiry::After(Duration::from_secs(15 * 60)),
            refresh_token: Expiry::After(Duration::from_secs(7 * DAY)),
            user_role: Expiry::Session,
            user_data: Expiry::After(Duration::from_secs(7 * DAY)),
        }
    }
}

/// Key/value storage with per-entry expiry.
pub trait SessionStore {
    /// Value for `key`, unless missing or expired at `now_ms`.
    fn get(&self, key: &str, now_ms: u64) -> Option<String>;

    fn set(&mut self, key: &str, value: &str, expiry: Expiry, now_ms: u64)
        -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    fn clear(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    value: String,
    expires_at_ms: Option<u64>,
}

/// In-memory store, used natively and as the browser fallback.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, Entry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries that have expired by `now_ms`.
    pub fn purge_expired(&mut self, now_ms: u64) {
        self.entries
            .retain(|_, e| e.expires_at_ms.map_or(true, |at| now_ms < at));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str, now_ms: u64) -> Option<String> {
        let entry = self.entries.get(key)?;
        match entry.expires_at_ms {
            Some(at) if now_ms >= at => None,
            _ => Some(entry.value.clone()),
        }
    }

    fn set(
        &mut self,
        key: &str,
        value: &str,
        expiry: Expiry,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at_ms: expiry.deadline(now_ms),
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}

/// Role of the logged-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role {:?}", other)),
        }
    }
}

/// Login state of the current browser session.
#[derive(Debug)]
pub struct AuthSession<S, C> {
    store: S,
    clock: C,
    policy: ExpiryPolicy,
}

impl<S: SessionStore, C: Clock> AuthSession<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_policy(store, clock, ExpiryPolicy::default())
    }

    pub fn with_policy(store: S, clock: C, policy: ExpiryPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    fn get(&self, key: &str) -> Option<String> {
        self.store.get(key, self.clock.now_ms())
    }

    /// Store tokens, role and profile from a login or register response.
    ///
    /// The profile is only written when the response carries one.
    pub fn save(&mut self, response: &AuthResponse, role: Role) -> Result<(), StoreError> {
        let now = self.clock.now_ms();
        let policy = self.policy;

        self.store
            .set(keys::ACCESS_TOKEN, &response.access_token, policy.access_token, now)?;
        self.store.set(
            keys::REFRESH_TOKEN,
            &response.refresh_token,
            policy.refresh_token,
            now,
        )?;
        self.store
            .set(keys::USER_ROLE, role.as_str(), policy.user_role, now)?;

        if let Some(user) = response.user_data() {
            let json =
                serde_json::to_string(user).map_err(|e| StoreError::Serialize(e.to_string()))?;
            self.store.set(keys::USER_DATA, &json, policy.user_data, now)?;
        }

        log::info!("saved auth session for role {}", role);
        Ok(())
    }

    /// Stored profile, if present and readable.
    pub fn current_user(&self) -> Option<Value> {
        let raw = self.get(keys::USER_DATA)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("ignoring unreadable stored user data: {}", e);
                None
            }
        }
    }

    /// Either token still live.
    pub fn is_authenticated(&self) -> bool {
        self.get(keys::ACCESS_TOKEN).is_some() || self.get(keys::REFRESH_TOKEN).is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(keys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(keys::REFRESH_TOKEN)
    }

    pub fn role(&self) -> Option<Role> {
        self.get(keys::USER_ROLE)?.parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_user(&self) -> bool {
        self.role() == Some(Role::User)
    }

    /// `Authorization` header value for API requests.
    pub fn bearer_header(&self) -> Option<String> {
        self.access_token().map(|token| format!("Bearer {}", token))
    }

    /// Remove every auth key. Navigation back to the login page is the
    /// host's job.
    pub fn logout(&mut self) -> Result<(), StoreError> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }
        log::info!("auth session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    const MINUTE: u64 = 60 * 1000;
    const DAY: u64 = 24 * 60 * MINUTE;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<u64>>);

    impl ManualClock {
        fn advance(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    fn response(user: Option<Value>, administrator: Option<Value>) -> AuthResponse {
        AuthResponse {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            administrator,
            user,
        }
    }

    fn session() -> (AuthSession<MemorySessionStore, ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        (AuthSession::new(MemorySessionStore::new(), clock.clone()), clock)
    }

    #[test]
    fn test_empty_session() {
        let (auth, _) = session();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.role(), None);
        assert_eq!(auth.current_user(), None);
        assert_eq!(auth.bearer_header(), None);
    }

    #[test]
    fn test_save_stores_canonical_keys() {
        let (mut auth, _) = session();
        auth.save(&response(Some(json!({"id": 3})), None), Role::User)
            .unwrap();

        let store = auth.store();
        assert_eq!(store.get("access_token", 0).as_deref(), Some("access"));
        assert_eq!(store.get("refresh_token", 0).as_deref(), Some("refresh"));
        assert_eq!(store.get("user_role", 0).as_deref(), Some("user"));
        assert_eq!(store.get("user_data", 0).as_deref(), Some(r#"{"id":3}"#));

        assert!(auth.is_authenticated());
        assert!(auth.is_user());
        assert!(!auth.is_admin());
        assert_eq!(auth.current_user(), Some(json!({"id": 3})));
        assert_eq!(auth.bearer_header().as_deref(), Some("Bearer access"));
    }

    #[test]
    fn test_admin_profile() {
        let (mut auth, _) = session();
        auth.save(&response(None, Some(json!({"id": 1}))), Role::Admin)
            .unwrap();
        assert!(auth.is_admin());
        assert_eq!(auth.current_user(), Some(json!({"id": 1})));
    }

    #[test]
    fn test_missing_profile_is_not_written() {
        let (mut auth, _) = session();
        auth.save(&response(None, None), Role::User).unwrap();
        assert_eq!(auth.store().len(), 3);
        assert_eq!(auth.current_user(), None);
    }

    #[test]
    fn test_access_token_expires_after_fifteen_minutes() {
        let (mut auth, clock) = session();
        auth.save(&response(None, None), Role::User).unwrap();

        clock.advance(15 * MINUTE - 1);
        assert_eq!(auth.access_token().as_deref(), Some("access"));

        clock.advance(1);
        assert_eq!(auth.access_token(), None);
        assert_eq!(auth.bearer_header(), None);
        // Refresh token keeps the session authenticated
        assert!(auth.is_authenticated());
    }

    #[test]
    fn test_refresh_and_profile_expire_after_seven_days() {
        let (mut auth, clock) = session();
        auth.save(&response(Some(json!({"id": 3})), None), Role::User)
            .unwrap();

        clock.advance(7 * DAY);
        assert!(!auth.is_authenticated());
        assert_eq!(auth.current_user(), None);
        // Role has no expiry
        assert_eq!(auth.role(), Some(Role::User));
    }

    #[test]
    fn test_logout_removes_everything() {
        let (mut auth, _) = session();
        auth.save(&response(Some(json!({"id": 3})), None), Role::User)
            .unwrap();

        auth.logout().unwrap();
        assert!(auth.store().is_empty());
        assert!(!auth.is_authenticated());
        assert_eq!(auth.role(), None);
    }

    #[test]
    fn test_unknown_role_and_bad_profile_are_ignored() {
        let (mut auth, _) = session();
        auth.save(&response(None, None), Role::User).unwrap();

        let mut store = auth.store().clone();
        store
            .set(keys::USER_ROLE, "superuser", Expiry::Session, 0)
            .unwrap();
        store
            .set(keys::USER_DATA, "{not json", Expiry::Session, 0)
            .unwrap();
        let auth = AuthSession::new(store, ManualClock::default());

        assert_eq!(auth.role(), None);
        assert!(!auth.is_admin() && !auth.is_user());
        assert_eq!(auth.current_user(), None);
    }

    #[test]
    fn test_custom_policy() {
        let clock = ManualClock::default();
        let policy = ExpiryPolicy {
            access_token: Expiry::After(Duration::from_secs(1)),
            ..ExpiryPolicy::default()
        };
        let mut auth = AuthSession::with_policy(MemorySessionStore::new(), clock.clone(), policy);
        auth.save(&response(None, None), Role::User).unwrap();

        clock.advance(1000);
        assert_eq!(auth.access_token(), None);
    }

    #[test]
    fn test_purge_expired() {
        let mut store = MemorySessionStore::new();
        store
            .set("a", "1", Expiry::After(Duration::from_millis(10)), 0)
            .unwrap();
        store.set("b", "2", Expiry::Session, 0).unwrap();

        store.purge_expired(10);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b", 10).as_deref(), Some("2"));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("guest".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_default_policy() {
        let policy = ExpiryPolicy::default();
        assert_eq!(policy.access_token, Expiry::After(Duration::from_secs(900)));
        assert_eq!(
            policy.refresh_token,
            Expiry::After(Duration::from_secs(7 * 24 * 3600))
        );
        assert_eq!(policy.user_role, Expiry::Session);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
