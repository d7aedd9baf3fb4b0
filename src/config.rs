use crate::baseline::DEFAULT_HISTORY_SIZE;
use std::path::{Path, PathBuf};

/// File name of the metastore snapshot inside the work directory.
pub const METASTORE_FILE: &str = "cluster_metastore.json";

/// Configuration of the activation and baseline control core
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Directory holding the metastore; `None` keeps all state in memory
    pub work_dir: Option<PathBuf>,

    /// Number of replaced baseline versions retained for restore
    pub history_size: usize,

    /// Name of the metastore file within `work_dir`
    pub metastore_file: String,
}

impl ControlConfig {
    /// Create an in-memory configuration
    pub fn new() -> Self {
        Self {
            work_dir: None,
            history_size: DEFAULT_HISTORY_SIZE,
            metastore_file: METASTORE_FILE.to_string(),
        }
    }

    /// Persist cluster state under `dir`
    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set how many replaced baselines are kept
    pub fn history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Set the metastore file name
    pub fn metastore_file(mut self, name: &str) -> Self {
        self.metastore_file = name.to_string();
        self
    }

    /// Full path of the metastore file, if persistence is enabled
    pub fn metastore_path(&self) -> Option<PathBuf> {
        self.work_dir
            .as_ref()
            .map(|dir| dir.join(&self.metastore_file))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.history_size == 0 {
            return Err("history_size must be > 0".to_string());
        }

        if self.metastore_file.trim().is_empty() {
            return Err("metastore_file cannot be empty".to_string());
        }

        if self.metastore_file.contains(['/', '\\']) {
            return Err("metastore_file must be a plain file name".to_string());
        }

        Ok(())
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self::new()
    }
}
