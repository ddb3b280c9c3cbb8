use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::bundle::{resolve_bundle, IconResolver};
use crate::logging;
use crate::model::AppRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// What one provider found. `skipped` counts candidates that could not be resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovered {
    pub apps: Vec<AppRecord>,
    pub skipped: usize,
}

pub trait DiscoveryProvider: Send + Sync {
    fn provider_name(&self) -> String;
    fn discover(&self) -> Result<Discovered, ProviderError>;
}

/// Lists the immediate children of one root and resolves every package entry.
pub struct BundleDirectoryProvider {
    root: PathBuf,
    package_suffix: String,
    icons: Arc<dyn IconResolver>,
}

impl BundleDirectoryProvider {
    pub fn new(
        root: impl Into<PathBuf>,
        package_suffix: impl Into<String>,
        icons: Arc<dyn IconResolver>,
    ) -> Self {
        Self {
            root: root.into(),
            package_suffix: package_suffix.into(),
            icons,
        }
    }

    fn is_package(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                name.len() > self.package_suffix.len() && name.ends_with(&self.package_suffix)
            })
    }
}

impl DiscoveryProvider for BundleDirectoryProvider {
    fn provider_name(&self) -> String {
        self.root.display().to_string()
    }

    fn discover(&self) -> Result<Discovered, ProviderError> {
        if !self.root.is_dir() {
            return Err(ProviderError::new(format!(
                "application directory is not readable: {}",
                self.root.display()
            )));
        }

        let mut discovered = Discovered::default();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    if error.depth() == 0 {
                        return Err(ProviderError::new(format!(
                            "failed to list {}: {error}",
                            self.root.display()
                        )));
                    }
                    discovered.skipped += 1;
                    continue;
                }
            };

            if !self.is_package(entry.path()) {
                continue;
            }

            match resolve_bundle(entry.path(), self.icons.as_ref()) {
                Ok(app) => discovered.apps.push(app),
                Err(error) => {
                    logging::info(&format!("discovery skipped package: {error}"));
                    discovered.skipped += 1;
                }
            }
        }

        Ok(discovered)
    }
}

/// Serves a fixed list. Used by tests and headless sessions.
pub struct AppProvider {
    apps: Vec<AppRecord>,
}

impl AppProvider {
    pub fn from_apps(apps: Vec<AppRecord>) -> Self {
        Self { apps }
    }

    pub fn deterministic_fixture() -> Self {
        Self {
            apps: vec![
                AppRecord::new(
                    "Safari",
                    "com.apple.Safari",
                    "/Applications/Safari.app",
                    None,
                ),
                AppRecord::new(
                    "Calculator",
                    "com.apple.calculator",
                    "/System/Applications/Calculator.app",
                    None,
                ),
            ],
        }
    }
}

impl DiscoveryProvider for AppProvider {
    fn provider_name(&self) -> String {
        "fixture".to_string()
    }

    fn discover(&self) -> Result<Discovered, ProviderError> {
        Ok(Discovered {
            apps: self.apps.clone(),
            skipped: 0,
        })
    }
}
