// Configuration management for schemagraph

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{IndexError, Result};
use crate::indexer::ScanOptions;

/// File name looked up in the project directory
pub const CONFIG_FILE: &str = ".schemagraph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub scan: ScanConfig,
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
    pub mcp: McpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    /// Entry schema file, relative to the project directory
    pub entry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 0 means unlimited
    pub max_files: usize,
    pub follow_executables: bool,
    /// How deep to search for the entry file when it is not at the root
    pub entry_search_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub transport: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "unnamed-project".to_string(),
            entry: "index.graphql".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: 0,
            follow_executables: true,
            entry_search_depth: 3,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["graphql".to_string(), "gql".to_string()],
            exclude: vec![
                "node_modules/".to_string(),
                ".git/".to_string(),
                "target/".to_string(),
            ],
            debounce_ms: 250,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| IndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from project directory
    /// Looks for .schemagraph.toml in the project root
    pub fn from_project_dir<P: AsRef<Path>>(project_dir: P) -> Self {
        let config_path = project_dir.as_ref().join(CONFIG_FILE);

        match Self::from_file(&config_path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::debug!("Could not load config from {}: {}", config_path.display(), e);
                tracing::info!("Using default configuration");
                Self::default()
            }
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_files: (self.scan.max_files > 0).then_some(self.scan.max_files),
            follow_executables: self.scan.follow_executables,
        }
    }

    /// Locate the entry schema file: the configured path if it exists, else the
    /// shallowest file with the same name below the project directory
    pub fn resolve_entry<P: AsRef<Path>>(&self, project_dir: P) -> Option<PathBuf> {
        let project_dir = project_dir.as_ref();
        let direct = project_dir.join(&self.project.entry);
        if direct.is_file() {
            return Some(direct);
        }

        let wanted = Path::new(&self.project.entry).file_name()?;
        WalkDir::new(project_dir)
            .max_depth(self.scan.entry_search_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded_dir(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == wanted)
            .min_by_key(|e| e.depth())
            .map(|e| e.into_path())
    }

    fn is_excluded_dir(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.starts_with('.')
            || self
                .watch
                .exclude
                .iter()
                .any(|pattern| pattern.trim_end_matches('/') == name)
    }

    /// Check if a changed file should trigger a rescan
    pub fn should_watch_file(&self, file_path: &str) -> bool {
        if self
            .watch
            .exclude
            .iter()
            .any(|pattern| self.matches_pattern(file_path, pattern))
        {
            return false;
        }

        Path::new(file_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.watch.extensions.iter().any(|wanted| wanted == ext))
            .unwrap_or(false)
    }

    /// Simple pattern matching (supports glob-style patterns)
    fn matches_pattern(&self, file_path: &str, pattern: &str) -> bool {
        if pattern.ends_with('/') {
            // Directory pattern
            file_path.starts_with(pattern)
                || file_path.contains(&format!("/{}/", pattern.trim_end_matches('/')))
        } else if let Some(suffix) = pattern.strip_prefix("*.") {
            file_path.ends_with(&format!(".{suffix}"))
        } else {
            file_path.contains(pattern)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.project.name.is_empty() {
            return Err(IndexError::Config("Project name cannot be empty".to_string()));
        }
        if self.project.entry.is_empty() {
            return Err(IndexError::Config("Entry file cannot be empty".to_string()));
        }

        if self.watch.extensions.is_empty() {
            return Err(IndexError::Config(
                "At least one watched extension is required".to_string(),
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(IndexError::Config("Debounce must be greater than 0".to_string()));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(IndexError::Config(format!("Invalid log level: {}", self.logging.level)));
        }
        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(IndexError::Config(format!("Invalid log format: {}", self.logging.format)));
        }

        if self.mcp.transport != "stdio" {
            return Err(IndexError::Config(format!(
                "Invalid MCP transport: {}",
                self.mcp.transport
            )));
        }

        Ok(())
    }
}
