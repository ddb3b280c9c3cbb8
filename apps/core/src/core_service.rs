use std::path::Path;
use std::sync::Arc;

use crate::action_executor::{launch_app, AppLauncher, LaunchError, SystemLauncher};
use crate::bundle::{BundleIconResolver, IconResolver};
use crate::config::{validate, Config};
use crate::contract::{
    AppDto, CoreRequest, CoreResponse, FolderChangeResponse, FolderDto, ItemDto, ItemsResponse,
    LaunchResponse, ScanResponse,
};
use crate::discovery::{BundleDirectoryProvider, DiscoveryProvider};
use crate::folder_store::{FolderError, FolderStore};
use crate::model::{AppRecord, Folder, FolderColor, FolderId, LaunchpadItem};
use crate::scanner::{AppScanner, ScanReport, ScanStart};
use crate::settings_store::{SettingsStore, SqliteSettingsStore, StoreError};
use crate::view;

#[derive(Debug)]
pub enum ServiceError {
    Config(String),
    Store(StoreError),
    Launch(LaunchError),
    Folder(FolderError),
    AppNotFound(String),
    InvalidRequest(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Store(error) => write!(f, "store error: {error}"),
            Self::Launch(error) => write!(f, "launch error: {error}"),
            Self::Folder(error) => write!(f, "folder error: {error}"),
            Self::AppNotFound(id) => write!(f, "app not found: {id}"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<LaunchError> for ServiceError {
    fn from(value: LaunchError) -> Self {
        Self::Launch(value)
    }
}

impl From<FolderError> for ServiceError {
    fn from(value: FolderError) -> Self {
        Self::Folder(value)
    }
}

pub enum LaunchTarget<'a> {
    BundleIdentifier(&'a str),
    Path(&'a Path),
    /// First app visible for this search text.
    FirstMatch(&'a str),
}

/// One scan root per configured application directory.
pub fn runtime_providers(
    config: &Config,
    icons: Arc<dyn IconResolver>,
) -> Vec<Arc<dyn DiscoveryProvider>> {
    config
        .application_dirs
        .iter()
        .map(|dir| {
            Arc::new(BundleDirectoryProvider::new(
                dir.clone(),
                config.package_suffix.clone(),
                Arc::clone(&icons),
            )) as Arc<dyn DiscoveryProvider>
        })
        .collect()
}

pub struct LaunchpadService {
    config: Config,
    scanner: AppScanner,
    folders: FolderStore,
    launcher: Box<dyn AppLauncher>,
}

impl LaunchpadService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let store = SqliteSettingsStore::open_from_config(&config)?;
        Self::with_store(config, Box::new(store))
    }

    pub fn with_store(
        config: Config,
        store: Box<dyn SettingsStore>,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let icons: Arc<dyn IconResolver> = Arc::new(BundleIconResolver);
        let scanner = AppScanner::new(runtime_providers(&config, Arc::clone(&icons)));
        let folders = FolderStore::open(store, config.folders_key.clone(), icons);
        Ok(Self {
            config,
            scanner,
            folders,
            launcher: Box::new(SystemLauncher),
        })
    }

    pub fn with_parts(
        config: Config,
        scanner: AppScanner,
        folders: FolderStore,
        launcher: Box<dyn AppLauncher>,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        Ok(Self {
            config,
            scanner,
            folders,
            launcher,
        })
    }

    pub fn with_launcher(mut self, launcher: Box<dyn AppLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scanner(&self) -> &AppScanner {
        &self.scanner
    }

    pub fn folder_store(&self) -> &FolderStore {
        &self.folders
    }

    pub fn folder_store_mut(&mut self) -> &mut FolderStore {
        &mut self.folders
    }

    pub fn scan(&mut self) -> ScanStart {
        self.scanner.scan()
    }

    pub fn poll_scan(&mut self) -> Option<ScanReport> {
        self.scanner.poll()
    }

    /// Starts a scan unless one is running, then waits for it.
    pub fn rescan_blocking(&mut self) -> Option<ScanReport> {
        self.scanner.scan_blocking()
    }

    pub fn visible_items(&self, search_text: &str) -> Vec<LaunchpadItem> {
        view::visible_items(self.scanner.apps(), self.folders.folders(), search_text)
    }

    /// Looks in the scan cache first, then in folder contents.
    pub fn find_app(&self, bundle_identifier: &str) -> Option<&AppRecord> {
        self.scanner.find(bundle_identifier).or_else(|| {
            self.folders
                .folders()
                .iter()
                .flat_map(|folder| folder.apps())
                .find(|app| app.bundle_identifier() == bundle_identifier)
        })
    }

    pub fn launch(&self, target: LaunchTarget<'_>) -> Result<AppRecord, ServiceError> {
        let app = match target {
            LaunchTarget::BundleIdentifier(id) => self
                .find_app(id)
                .cloned()
                .ok_or_else(|| ServiceError::AppNotFound(id.to_string()))?,
            LaunchTarget::Path(path) => self
                .scanner
                .apps()
                .iter()
                .find(|app| app.path() == path)
                .cloned()
                .unwrap_or_else(|| {
                    let name = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    AppRecord::new(name, path.to_string_lossy(), path, None)
                }),
            LaunchTarget::FirstMatch(search_text) => view::first_match(
                self.scanner.apps(),
                self.folders.folders(),
                search_text,
            )
            .cloned()
            .ok_or_else(|| ServiceError::AppNotFound(search_text.to_string()))?,
        };

        launch_app(self.launcher.as_ref(), &app)?;
        Ok(app)
    }

    pub fn create_folder(&mut self, name: &str, color: FolderColor) -> Result<Folder, ServiceError> {
        Ok(self.folders.create_folder(name, color)?)
    }

    pub fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<(), ServiceError> {
        Ok(self.folders.rename_folder(id, name)?)
    }

    pub fn delete_folder(&mut self, id: FolderId) -> Result<Folder, ServiceError> {
        Ok(self.folders.delete_folder(id)?)
    }

    pub fn add_to_folder(&mut self, id: FolderId, bundle_identifier: &str) -> Result<bool, ServiceError> {
        let app = self
            .find_app(bundle_identifier)
            .cloned()
            .ok_or_else(|| ServiceError::AppNotFound(bundle_identifier.to_string()))?;
        Ok(self.folders.add_app_to_folder(&app, id)?)
    }

    /// Removing an app the folder does not hold is a no-op that returns false.
    pub fn remove_from_folder(
        &mut self,
        id: FolderId,
        bundle_identifier: &str,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .folders
            .remove_identifier_from_folder(bundle_identifier, id)?)
    }

    pub fn handle_command(&mut self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::Scan => {
                let started = self.scan() == ScanStart::Started;
                let report = self.scanner.wait().unwrap_or_default();
                Ok(CoreResponse::Scan(ScanResponse {
                    started,
                    app_count: report.apps.len(),
                    skipped: report.skipped,
                    failed_roots: report.errors.into_iter().map(|error| error.root).collect(),
                }))
            }
            CoreRequest::ListItems(request) => {
                self.poll_scan();
                let items = self
                    .visible_items(&request.search)
                    .iter()
                    .map(ItemDto::from)
                    .collect();
                Ok(CoreResponse::Items(ItemsResponse {
                    scanning: self.scanner.is_scanning(),
                    items,
                }))
            }
            CoreRequest::Launch(request) => {
                let bundle_identifier = non_blank(request.bundle_identifier);
                let path = request.path.filter(|path| !path.trim().is_empty());
                let app = match (bundle_identifier, path) {
                    (Some(id), _) => self.launch(LaunchTarget::BundleIdentifier(&id))?,
                    (None, Some(path)) => self.launch(LaunchTarget::Path(Path::new(&path)))?,
                    (None, None) => {
                        return Err(ServiceError::InvalidRequest(
                            "launch requires bundle_identifier or path".to_string(),
                        ))
                    }
                };
                Ok(CoreResponse::Launch(LaunchResponse {
                    launched: AppDto::from(&app),
                }))
            }
            CoreRequest::CreateFolder(request) => {
                let folder =
                    self.create_folder(&request.name, request.color.unwrap_or_default())?;
                Ok(folder_response(Some(&folder), true))
            }
            CoreRequest::RenameFolder(request) => {
                let id = parse_folder_id(&request.id)?;
                self.rename_folder(id, &request.name)?;
                Ok(folder_response(self.folders.folder(id), true))
            }
            CoreRequest::DeleteFolder(request) => {
                let id = parse_folder_id(&request.id)?;
                let removed = self.delete_folder(id)?;
                Ok(folder_response(Some(&removed), true))
            }
            CoreRequest::AddToFolder(request) => {
                let id = parse_folder_id(&request.id)?;
                let changed = self.add_to_folder(id, request.bundle_identifier.trim())?;
                Ok(folder_response(self.folders.folder(id), changed))
            }
            CoreRequest::RemoveFromFolder(request) => {
                let id = parse_folder_id(&request.id)?;
                let changed = self.remove_from_folder(id, request.bundle_identifier.trim())?;
                Ok(folder_response(self.folders.folder(id), changed))
            }
        }
    }
}

fn folder_response(folder: Option<&Folder>, changed: bool) -> CoreResponse {
    CoreResponse::Folder(FolderChangeResponse {
        folder: folder.map(FolderDto::from),
        changed,
    })
}

fn parse_folder_id(raw: &str) -> Result<FolderId, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::InvalidRequest(format!("malformed folder id '{raw}'")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
