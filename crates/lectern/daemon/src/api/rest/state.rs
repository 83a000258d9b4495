//! Application state for API handlers

use crate::access::{AccessContext, AccessTable};
use crate::auth::{CurrentUser, GroupPermissions, PermissionOracle};
use crate::autoupdate::BroadcastNotifier;
use crate::bootstrap;
use crate::config::{AppConfig, DaemonConfig, StorageConfig};
use crate::config_store::{ConfigRegistry, ConfigService};
use crate::error::{ApiResult, DaemonResult};
use crate::history::HistoryService;
use crate::locks::KeyedLocks;
use crate::projector::ProjectorService;
use crate::storage::{InMemoryStorage, Storage};
use lectern_types::RecordId;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub storage: Arc<dyn Storage>,

    /// Change notifications, also feeding the autoupdate stream
    pub notifier: Arc<BroadcastNotifier>,

    /// Permission oracle
    pub permissions: Arc<dyn PermissionOracle>,

    pub config: Arc<ConfigService>,

    pub projectors: Arc<ProjectorService>,

    pub history: Arc<HistoryService>,

    /// Serializes updates of generic records
    pub record_locks: Arc<KeyedLocks<(&'static str, RecordId)>>,

    /// Metadata for the version view
    pub app: AppConfig,

    /// Daemon version
    pub version: String,
}

impl AppState {
    /// Wire up the services on top of `storage`
    pub fn new(
        storage: Arc<dyn Storage>,
        notifier: Arc<BroadcastNotifier>,
        permissions: Arc<dyn PermissionOracle>,
        app: AppConfig,
    ) -> Self {
        let config = Arc::new(ConfigService::new(
            storage.clone(),
            notifier.clone(),
            ConfigRegistry::core(),
        ));
        let projectors = Arc::new(ProjectorService::new(
            storage.clone(),
            notifier.clone(),
            config.clone(),
        ));
        let history = Arc::new(HistoryService::new(storage.clone(), notifier.clone()));
        Self {
            storage,
            notifier,
            permissions,
            config,
            projectors,
            history,
            record_locks: Arc::new(KeyedLocks::new()),
            app,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Build the state described by `config` and seed its store
    pub async fn bootstrap(config: &DaemonConfig) -> DaemonResult<Self> {
        let storage: Arc<dyn Storage> = match config.storage {
            StorageConfig::Memory => Arc::new(InMemoryStorage::new()),
        };
        let notifier = Arc::new(BroadcastNotifier::new(config.server.autoupdate_capacity));
        let permissions = Arc::new(GroupPermissions::from_config(&config.auth));
        let state = Self::new(storage, notifier, permissions, config.app.clone());
        bootstrap::seed(state.storage.as_ref(), &state.config, &state.history).await?;
        Ok(state)
    }

    /// Fail unless `user` may run `action` on the resource of `table`
    pub async fn authorize(
        &self,
        table: &AccessTable,
        action: &str,
        user: &CurrentUser,
    ) -> ApiResult<()> {
        self.authorize_key(table, action, user, None).await
    }

    /// Like [`authorize`](Self::authorize), for actions addressing a config key
    pub async fn authorize_key(
        &self,
        table: &AccessTable,
        action: &str,
        user: &CurrentUser,
        config_key: Option<&str>,
    ) -> ApiResult<()> {
        let anonymous_enabled = self.config.anonymous_enabled().await?;
        let ctx = AccessContext {
            oracle: self.permissions.as_ref(),
            user,
            anonymous_enabled,
            config_key,
        };
        table.check(action, &ctx)
    }
}
