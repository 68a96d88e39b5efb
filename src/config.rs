use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

use crate::router::{EventFilter, OutboundTarget, RouteTable};

/// Listen address used when `general.listen` is not configured
pub const DEFAULT_LISTEN: &str = ":8081";

/// Locations searched for a configuration file when `CONFIG_PATH` is unset
const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.yaml",
    "config.yml",
    "config.json",
    "/etc/jira-chat-notifier/config.yaml",
    "/etc/jira-chat-notifier/config.yml",
    "/etc/jira-chat-notifier/config.json",
];

/// Process settings for the notifier.
/// All values are loaded from environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Explicit path to the configuration file
    #[serde(default)]
    pub config_path: Option<String>,

    /// Shared URL secret; takes precedence over `general.secret`
    #[serde(default)]
    pub url_secret: Option<String>,

    /// How often to check the configuration file for changes (0 disables)
    #[serde(default = "default_reload_interval")]
    pub config_reload_interval_secs: u64,

    /// Timeout applied to every outbound chat request
    #[serde(default = "default_outbound_timeout")]
    pub outbound_timeout_secs: u64,

    /// `json` switches log output to JSON lines
    #[serde(default)]
    pub log_format: Option<String>,
}

fn default_reload_interval() -> u64 {
    5
}

fn default_outbound_timeout() -> u64 {
    5
}

impl Settings {
    /// Load settings from environment variables (e.g., CONFIG_PATH, URL_SECRET).
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Settings>()
    }

    /// The env secret, ignoring an empty value
    pub fn env_secret(&self) -> Option<&str> {
        self.url_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn json_logs(&self) -> bool {
        self.log_format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration file found (searched: {0})")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("general.secret not configured")]
    MissingSecret,

    #[error("projects.{project}[{index}].webhook not configured")]
    MissingWebhook { project: String, index: usize },
}

/// On-disk layout of the configuration file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    general: Option<GeneralSection>,

    /// Kept as an ordered mapping so colliding keys merge in document order
    #[serde(default)]
    projects: Option<serde_yaml::Mapping>,
}

#[derive(Debug, Default, Deserialize)]
struct GeneralSection {
    #[serde(default)]
    secret: Option<String>,

    #[serde(default)]
    ticket_url: Option<String>,

    #[serde(default)]
    listen: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TargetSection {
    #[serde(default)]
    webhook: Option<String>,

    #[serde(default)]
    ticket_url: Option<String>,

    #[serde(default)]
    on_events: Option<OnEvents>,
}

/// `on_events` may be written as `"created, updated"` or as a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OnEvents {
    Joined(String),
    List(Vec<String>),
}

impl OnEvents {
    fn into_filter(self) -> Option<EventFilter> {
        let tokens = match self {
            OnEvents::Joined(s) => s.split(',').map(str::to_string).collect(),
            OnEvents::List(items) => items,
        };
        EventFilter::new(tokens)
    }
}

/// Reads and validates the configuration file into a [`RouteTable`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    env_secret: Option<String>,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>, env_secret: Option<String>) -> Self {
        Self {
            path: path.into(),
            env_secret: env_secret.filter(|s| !s.is_empty()),
        }
    }

    /// Resolve the configuration file from the settings: an explicit
    /// `CONFIG_PATH` is used as-is, otherwise the first existing search path.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let env_secret = settings.env_secret().map(str::to_string);

        if let Some(path) = settings.config_path.as_deref().filter(|p| !p.is_empty()) {
            return Ok(Self::new(path, env_secret));
        }

        CONFIG_SEARCH_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
            .map(|p| Self::new(p, env_secret))
            .ok_or_else(|| ConfigError::NotFound(CONFIG_SEARCH_PATHS.join(", ")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the file, used by the reload task to detect changes
    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
    }

    /// Read, parse and validate the file into a fresh route table
    pub fn load(&self) -> Result<RouteTable, ConfigError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;

        let file = self.parse(&raw)?;
        self.build(file)
    }

    fn parse(&self, raw: &str) -> Result<FileConfig, ConfigError> {
        let is_json = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str::<FileConfig>(raw).map_err(|e| e.to_string())
        } else if raw.trim().is_empty() {
            Ok(FileConfig::default())
        } else {
            serde_yaml::from_str::<FileConfig>(raw).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: self.path.clone(),
            message,
        })
    }

    fn build(&self, file: FileConfig) -> Result<RouteTable, ConfigError> {
        let general = file.general.unwrap_or_default();
        let file_secret = general.secret.filter(|s| !s.is_empty());

        let secret = match (&self.env_secret, file_secret) {
            (Some(env), Some(_)) => {
                warn!("secret configured in config file and env var - env var has precedence");
                env.clone()
            }
            (Some(env), None) => env.clone(),
            (None, Some(file)) => file,
            (None, None) => return Err(ConfigError::MissingSecret),
        };

        let ticket_url = general.ticket_url.unwrap_or_default();
        if ticket_url.is_empty() {
            warn!("general.ticket_url not configured");
        }

        let listen = match general.listen.filter(|l| !l.is_empty()) {
            Some(listen) => listen,
            None => {
                info!(default = DEFAULT_LISTEN, "general.listen not configured - using default");
                DEFAULT_LISTEN.to_string()
            }
        };

        let projects = self.project_entries(file.projects.unwrap_or_default())?;

        let mut routes: HashMap<String, Vec<OutboundTarget>> = HashMap::new();
        for (project, targets) in projects {
            let mut resolved = Vec::with_capacity(targets.len());
            for (index, target) in targets.into_iter().enumerate() {
                let webhook_url = target
                    .webhook
                    .filter(|w| !w.is_empty())
                    .ok_or_else(|| ConfigError::MissingWebhook {
                        project: project.clone(),
                        index,
                    })?;

                resolved.push(OutboundTarget {
                    webhook_url,
                    ticket_url: target.ticket_url.filter(|t| !t.is_empty()),
                    on_events: target.on_events.and_then(OnEvents::into_filter),
                });
            }
            routes
                .entry(project.to_lowercase())
                .or_default()
                .extend(resolved);
        }

        Ok(RouteTable::new(secret, ticket_url, listen, routes))
    }

    /// Decode the `projects` mapping entry by entry, in document order
    fn project_entries(
        &self,
        mapping: serde_yaml::Mapping,
    ) -> Result<Vec<(String, Vec<TargetSection>)>, ConfigError> {
        mapping
            .into_iter()
            .map(|(key, value)| {
                let project = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    other => {
                        return Err(ConfigError::Parse {
                            path: self.path.clone(),
                            message: format!("invalid project key: {:?}", other),
                        });
                    }
                };
                let targets = serde_yaml::from_value::<Option<Vec<TargetSection>>>(value)
                    .map_err(|e| ConfigError::Parse {
                        path: self.path.clone(),
                        message: format!("projects.{}: {}", project, e),
                    })?
                    .unwrap_or_default();
                Ok((project, targets))
            })
            .collect()
    }
}

/// Expand a Go-style `:port` address into something a socket can bind
pub fn bind_address(listen: &str) -> String {
    if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    }
}
