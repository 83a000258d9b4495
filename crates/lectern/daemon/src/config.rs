//! Configuration for lectern-daemon

use lectern_types::RecordId;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Users, groups and their permissions
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metadata reported by the version view
    #[serde(default)]
    pub app: AppConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Buffered autoupdate messages per subscriber
    #[serde(default = "default_autoupdate_capacity")]
    pub autoupdate_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            enable_cors: true,
            max_body_size: default_max_body_size(),
            autoupdate_capacity: default_autoupdate_capacity(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage
    #[default]
    Memory,
}

/// Permission group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Known user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: RecordId,
    pub username: String,
    #[serde(default)]
    pub groups: Vec<RecordId>,
}

/// Authentication and authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,

    #[serde(default = "default_users")]
    pub users: Vec<UserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            users: default_users(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Plugin metadata reported by the version view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub verbose_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub url: String,
}

/// Application metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_license")]
    pub license: String,

    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default)]
    pub plugins: Vec<PluginInfo>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            license: default_license(),
            url: default_url(),
            plugins: Vec::new(),
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_autoupdate_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_license() -> String {
    "MIT".to_string()
}

fn default_url() -> String {
    "https://github.com/lectern-app/lectern".to_string()
}

fn group(id: RecordId, name: &str, permissions: &[&str]) -> GroupConfig {
    GroupConfig {
        id,
        name: name.to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    }
}

fn default_groups() -> Vec<GroupConfig> {
    vec![
        group(1, "Default", &["core.can_see_projector"]),
        // Group 2 holds every permission implicitly
        group(2, "Admin", &[]),
        group(
            3,
            "Staff",
            &[
                "core.can_see_projector",
                "core.can_manage_projector",
                "core.can_manage_tags",
                "core.can_manage_config",
                "core.can_manage_logos_and_fonts",
                "core.can_use_chat",
                "core.can_manage_chat",
            ],
        ),
        group(4, "Delegates", &["core.can_see_projector", "core.can_use_chat"]),
    ]
}

fn default_users() -> Vec<UserConfig> {
    vec![UserConfig {
        id: 1,
        username: "admin".to_string(),
        groups: vec![2],
    }]
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with LECTERN_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("LECTERN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
