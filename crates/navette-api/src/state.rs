//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Records live in memory only. Parcels and mandates are keyed by their
//! reference code, users and agencies by their UUID newtypes.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use navette_core::{AgencyId, ReferenceCode, Role, UserId};
use navette_state::{HistoryActor, Mandate, Parcel};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::issuer::ReferenceIssuer;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash + Clone, T: Clone + Send + Sync> Store<K, T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: T) -> Option<T> {
        self.data.write().insert(key, value)
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &K) -> Option<T> {
        self.data.read().get(key).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under a single write lock, so the check it performs
    /// and the write it makes cannot be interleaved with another writer.
    /// Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        key: &K,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(key).map(f)
    }

    /// Check if a record exists.
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, T: Clone + Send + Sync> Default for Store<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Directory Records --------------------------------------------------------

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    #[schema(value_type = uuid::Uuid)]
    pub id: UserId,
    /// Family name.
    pub nom: String,
    /// Given name.
    pub prenom: String,
    #[schema(value_type = String, example = "livreur")]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Agency the user works from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<uuid::Uuid>)]
    pub agency: Option<AgencyId>,
}

impl UserRecord {
    /// The actor block written into history entries.
    pub fn as_actor(&self) -> HistoryActor {
        HistoryActor {
            id: self.id.to_string(),
            last_name: self.nom.clone(),
            first_name: self.prenom.clone(),
            role: self.role,
        }
    }
}

/// A branch or relay point.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgencyRecord {
    #[schema(value_type = uuid::Uuid)]
    pub id: AgencyId,
    pub name: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Manager running the agency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<uuid::Uuid>)]
    pub manager: Option<UserId>,
}

// -- Application State --------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read `PORT`, `AUTH_TOKEN` and `LOG_FORMAT` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(8080);
        let auth_token = lookup("AUTH_TOKEN").filter(|t| !t.trim().is_empty());
        let log_format = LogFormat::from_env_value(lookup("LOG_FORMAT").as_deref());
        Self {
            port,
            auth_token,
            log_format,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            log_format: LogFormat::Pretty,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub parcels: Store<ReferenceCode, Parcel>,
    pub mandates: Store<ReferenceCode, Mandate>,
    pub users: Store<UserId, UserRecord>,
    pub agencies: Store<AgencyId, AgencyRecord>,
    /// Serial allocator for new reference codes.
    pub issuer: ReferenceIssuer,
    /// Prometheus render handle, present when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new application state with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            parcels: Store::new(),
            mandates: Store::new(),
            users: Store::new(),
            agencies: Store::new(),
            issuer: ReferenceIssuer::new(),
            metrics: None,
            config,
        }
    }

    /// Attach the Prometheus handle served at `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// The history actor for the caller, if the token names a registered user.
    ///
    /// Refused when the token's role differs from the user's registered role.
    pub fn actor_for(&self, caller: &CallerIdentity) -> Result<Option<HistoryActor>, AppError> {
        let Some(user) = caller.user_id.and_then(|id| self.users.get(&id)) else {
            return Ok(None);
        };
        if user.role != caller.role {
            tracing::warn!(user = %user.id, registered = %user.role, claimed = %caller.role, "token role differs from registered role");
            return Err(AppError::Forbidden(format!(
                "token role {} does not match the registered role of user {}",
                caller.role, user.id
            )));
        }
        Ok(Some(user.as_actor()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("parcels", &self.parcels.len())
            .field("mandates", &self.mandates.len())
            .field("users", &self.users.len())
            .field("agencies", &self.agencies.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn config_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn config_reads_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn config_ignores_garbage() {
        let config = AppConfig::from_lookup(lookup(&[("PORT", "eighty"), ("AUTH_TOKEN", "  ")]));
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("s3cret".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn store_try_update_runs_under_one_lock() {
        let store: Store<u32, Vec<u32>> = Store::new();
        store.insert(1, vec![]);
        let result = store.try_update(&1, |v| {
            if v.is_empty() {
                v.push(7);
                Ok(v.len())
            } else {
                Err("not empty")
            }
        });
        assert_eq!(result, Some(Ok(1)));
        assert_eq!(store.try_update(&1, |_| Err::<(), _>("x")), Some(Err("x")));
        assert!(store.try_update(&2, |_| Ok::<_, ()>(())).is_none());
        assert_eq!(store.get(&1), Some(vec![7]));
    }
}
