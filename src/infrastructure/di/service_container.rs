//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::application::services::TreeService;
use crate::application::ApplicationError;
use crate::config::Settings;
use crate::domain::Estimator;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{GrampsXml, InfraError, InfraResult};

/// Container holding settings and I/O implementations.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Reference date for the living check (default: the system date)
    today: Option<NaiveDate>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The document to read: the explicit path, else `data_path` from settings.
    pub fn document_path(&self, path: Option<&Path>) -> InfraResult<PathBuf> {
        path.map(Path::to_path_buf)
            .or_else(|| self.settings.data_path.clone())
            .ok_or_else(|| {
                ApplicationError::Config {
                    message: "no document given and data_path is not set".into(),
                }
                .into()
            })
    }

    pub fn load_document(&self, path: Option<&Path>) -> InfraResult<GrampsXml> {
        let path = self.document_path(path)?;
        debug!("loading document {}", path.display());
        GrampsXml::load(self.fs.as_ref(), &path)
    }

    /// Load the document and build a dated, laid-out tree from it.
    pub fn tree_service(&self, path: Option<&Path>) -> InfraResult<TreeService> {
        let document = self.load_document(path)?;
        let mut estimator = Estimator::new(self.settings.estimation_params());
        if let Some(today) = self.today {
            estimator = estimator.with_today(today);
        }
        Ok(TreeService::build_with(
            &document,
            &self.settings,
            estimator,
        )?)
    }

    /// Write `content` to `path`, creating parent directories.
    pub fn write_output(&self, path: &Path, content: &str) -> InfraResult<()> {
        self.fs
            .ensure_parent(path)
            .and_then(|_| self.fs.write(path, content))
            .map_err(|e| InfraError::io(format!("write {}", path.display()), e))
    }
}
