//! Runtime configuration store
//!
//! Every config write goes through [`ConfigService`]: values are checked
//! against the [`ConfigRegistry`], then persisted and announced while holding
//! the lock of their key.

mod registry;

pub use registry::{core_variables, ConfigError, ConfigRegistry, ConfigVariable, InputType};

use crate::autoupdate::{self, Notifier};
use crate::error::{ApiError, ApiResult};
use crate::locks::KeyedLocks;
use crate::storage::Storage;
use lectern_types::ConfigEntry;
use serde_json::Value;
use std::sync::Arc;

/// Key that lets anonymous users in
pub const ENABLE_ANONYMOUS: &str = "general_system_enable_anonymous";

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound(_) => ApiError::not_found("Not found."),
            ConfigError::Invalid(detail) => ApiError::invalid(detail),
        }
    }
}

/// Validating access to config entries
pub struct ConfigService {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    registry: ConfigRegistry,
    locks: KeyedLocks<String>,
}

impl ConfigService {
    pub fn new(
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        registry: ConfigRegistry,
    ) -> Self {
        Self {
            storage,
            notifier,
            registry,
            locks: KeyedLocks::new(),
        }
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// Store the default of every variable that has no entry yet
    pub async fn bootstrap(&self) -> ApiResult<usize> {
        let mut created = 0;
        for variable in self.registry.iter() {
            let _guard = self.locks.lock(&variable.name.to_string()).await;
            if self.find(variable.name).await?.is_none() {
                self.storage
                    .config_entries()
                    .insert(ConfigEntry {
                        id: 0,
                        key: variable.name.to_string(),
                        value: variable.default_value.clone(),
                    })
                    .await?;
                created += 1;
            }
        }
        tracing::info!(created, "Config defaults stored");
        Ok(created)
    }

    pub async fn list(&self) -> ApiResult<Vec<ConfigEntry>> {
        Ok(self.storage.config_entries().list().await?)
    }

    /// Stored entry of `key`
    pub async fn entry(&self, key: &str) -> ApiResult<ConfigEntry> {
        self.find(key)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    /// Current value of `key`, falling back to the registry default
    pub async fn get(&self, key: &str) -> ApiResult<Value> {
        if let Some(entry) = self.find(key).await? {
            return Ok(entry.value);
        }
        self.registry
            .get(key)
            .map(|variable| variable.default_value.clone())
            .ok_or_else(|| ConfigError::NotFound(key.to_string()).into())
    }

    pub async fn get_bool(&self, key: &str) -> ApiResult<bool> {
        Ok(self.get(key).await?.as_bool().unwrap_or(false))
    }

    pub async fn get_i64(&self, key: &str) -> ApiResult<i64> {
        Ok(self.get(key).await?.as_i64().unwrap_or(0))
    }

    pub async fn anonymous_enabled(&self) -> ApiResult<bool> {
        self.get_bool(ENABLE_ANONYMOUS).await
    }

    /// Validate and store a new value
    pub async fn update(&self, key: &str, value: Value) -> ApiResult<ConfigEntry> {
        self.registry.validate(key, &value)?;
        let _guard = self.locks.lock(&key.to_string()).await;
        self.write(key, value).await
    }

    /// Read-compute-write on one key
    ///
    /// `compute` sees the current value and returns the replacement, or `None`
    /// to leave the entry alone. Returns the resulting value.
    pub async fn modify<F>(&self, key: &str, compute: F) -> ApiResult<Value>
    where
        F: FnOnce(&Value) -> Option<Value> + Send,
    {
        let _guard = self.locks.lock(&key.to_string()).await;
        let current = self.get(key).await?;
        match compute(&current) {
            Some(value) => {
                self.registry.validate(key, &value)?;
                Ok(self.write(key, value).await?.value)
            }
            None => Ok(current),
        }
    }

    async fn find(&self, key: &str) -> ApiResult<Option<ConfigEntry>> {
        let entries = self.storage.config_entries().list().await?;
        Ok(entries.into_iter().find(|entry| entry.key == key))
    }

    // Callers hold the lock of `key`
    async fn write(&self, key: &str, value: Value) -> ApiResult<ConfigEntry> {
        let entry = match self.find(key).await? {
            Some(mut entry) => {
                entry.value = value;
                self.storage.config_entries().upsert(entry.clone()).await?;
                entry
            }
            None => {
                self.storage
                    .config_entries()
                    .insert(ConfigEntry {
                        id: 0,
                        key: key.to_string(),
                        value,
                    })
                    .await?
            }
        };
        tracing::info!(key = %entry.key, value = %entry.value, "Config updated");
        self.notifier
            .inform_changed(autoupdate::changed(std::slice::from_ref(&entry))?);
        Ok(entry)
    }
}
