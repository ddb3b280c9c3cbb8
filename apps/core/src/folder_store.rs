use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bundle::IconResolver;
use crate::events::EventBus;
use crate::logging;
use crate::model::{AppRecord, Folder, FolderColor, FolderId};
use crate::settings_store::SettingsStore;

pub const DEFAULT_FOLDERS_KEY: &str = "LaunchpadFolders";
const CORRUPT_SUFFIX: &str = ".corrupt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderError {
    NotFound(FolderId),
    EmptyName,
}

impl Display for FolderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "folder not found: {id}"),
            Self::EmptyName => write!(f, "folder name must not be empty"),
        }
    }
}

impl std::error::Error for FolderError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderEvent {
    Created(FolderId),
    Renamed(FolderId),
    Deleted(FolderId),
    AppAdded(FolderId),
    AppRemoved(FolderId),
}

/// How the saved folder list looked when the store opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Empty,
    Loaded(usize),
    /// The blob could not be decoded. The list starts empty and the blob was
    /// copied to `<key>.corrupt`; the next save replaces the original.
    Corrupt,
    /// The store failed to read the key. Changes stay in memory and are never
    /// written over the unread value.
    Unreadable,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedFolder {
    name: String,
    color: FolderColor,
    apps: Vec<PersistedApp>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedApp {
    name: String,
    bundle_identifier: String,
    path: PathBuf,
}

/// Single owner of the folder list. Every mutation re-saves the whole list.
///
/// Not synchronized: callers that mutate from more than one thread must wrap
/// the store in their own lock.
pub struct FolderStore {
    store: Box<dyn SettingsStore>,
    key: String,
    folders: Vec<Folder>,
    load_outcome: LoadOutcome,
    last_save_error: Option<String>,
    events: EventBus<FolderEvent>,
}

impl FolderStore {
    pub fn open(
        store: Box<dyn SettingsStore>,
        key: impl Into<String>,
        icons: Arc<dyn IconResolver>,
    ) -> Self {
        let key = key.into();
        let (folders, load_outcome) = load_folders(store.as_ref(), &key, icons.as_ref());
        Self {
            store,
            key,
            folders,
            load_outcome,
            last_save_error: None,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<FolderEvent> {
        self.events.subscribe()
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.id() == id)
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn create_folder(&mut self, name: &str, color: FolderColor) -> Result<Folder, FolderError> {
        let name = clean_name(name)?;
        let folder = Folder::new(name, color);
        let id = folder.id();
        self.folders.push(folder.clone());
        self.save();
        self.events.notify(FolderEvent::Created(id));
        Ok(folder)
    }

    pub fn delete_folder(&mut self, id: FolderId) -> Result<Folder, FolderError> {
        let index = self
            .folders
            .iter()
            .position(|folder| folder.id() == id)
            .ok_or(FolderError::NotFound(id))?;
        let removed = self.folders.remove(index);
        self.save();
        self.events.notify(FolderEvent::Deleted(id));
        Ok(removed)
    }

    /// Names are not required to be unique.
    pub fn rename_folder(&mut self, id: FolderId, new_name: &str) -> Result<(), FolderError> {
        let name = clean_name(new_name)?;
        self.folder_mut(id)?.set_name(name);
        self.save();
        self.events.notify(FolderEvent::Renamed(id));
        Ok(())
    }

    /// Returns false when the folder already held an app with this identifier.
    pub fn add_app_to_folder(&mut self, app: &AppRecord, id: FolderId) -> Result<bool, FolderError> {
        let added = self.folder_mut(id)?.add_app(app.clone());
        self.save();
        if added {
            self.events.notify(FolderEvent::AppAdded(id));
        }
        Ok(added)
    }

    pub fn remove_app_from_folder(
        &mut self,
        app: &AppRecord,
        id: FolderId,
    ) -> Result<bool, FolderError> {
        self.remove_identifier_from_folder(app.bundle_identifier(), id)
    }

    /// Returns false when the folder held no app with this identifier.
    pub fn remove_identifier_from_folder(
        &mut self,
        bundle_identifier: &str,
        id: FolderId,
    ) -> Result<bool, FolderError> {
        let removed = self.folder_mut(id)?.remove_app(bundle_identifier);
        self.save();
        if removed {
            self.events.notify(FolderEvent::AppRemoved(id));
        }
        Ok(removed)
    }

    /// Every bundle identifier referenced by any folder.
    pub fn apps_in_folders(&self) -> HashSet<String> {
        self.folders
            .iter()
            .flat_map(|folder| folder.apps())
            .map(|app| app.bundle_identifier().to_string())
            .collect()
    }

    fn folder_mut(&mut self, id: FolderId) -> Result<&mut Folder, FolderError> {
        self.folders
            .iter_mut()
            .find(|folder| folder.id() == id)
            .ok_or(FolderError::NotFound(id))
    }

    fn save(&mut self) {
        if self.load_outcome == LoadOutcome::Unreadable {
            self.record_save_error(format!(
                "saved folders under '{}' were never read; not overwriting them",
                self.key
            ));
            return;
        }

        let encoded = match encode_folders(&self.folders) {
            Ok(encoded) => encoded,
            Err(error) => {
                self.record_save_error(format!("failed to encode folders: {error}"));
                return;
            }
        };

        match self.store.set(&self.key, &encoded) {
            Ok(()) => self.last_save_error = None,
            Err(error) => self.record_save_error(format!("failed to save folders: {error}")),
        }
    }

    fn record_save_error(&mut self, message: String) {
        logging::error(&format!("[launchpad-core] {message}"));
        self.last_save_error = Some(message);
    }
}

pub fn encode_folders(folders: &[Folder]) -> Result<Vec<u8>, serde_json::Error> {
    let persisted: Vec<PersistedFolder> = folders
        .iter()
        .map(|folder| PersistedFolder {
            name: folder.name().to_string(),
            color: folder.color(),
            apps: folder
                .apps()
                .iter()
                .map(|app| PersistedApp {
                    name: app.name().to_string(),
                    bundle_identifier: app.bundle_identifier().to_string(),
                    path: app.path().to_path_buf(),
                })
                .collect(),
        })
        .collect();
    serde_json::to_vec(&persisted)
}

/// Rebuilds folders with fresh ids; icons are re-resolved from each app path.
pub fn decode_folders(
    bytes: &[u8],
    icons: &dyn IconResolver,
) -> Result<Vec<Folder>, serde_json::Error> {
    let persisted: Vec<PersistedFolder> = serde_json::from_slice(bytes)?;
    Ok(persisted
        .into_iter()
        .map(|entry| {
            let mut folder = Folder::new(entry.name, entry.color);
            for app in entry.apps {
                folder.add_app(AppRecord::resolve(
                    app.name,
                    app.bundle_identifier,
                    app.path,
                    icons,
                ));
            }
            folder
        })
        .collect())
}

fn load_folders(
    store: &dyn SettingsStore,
    key: &str,
    icons: &dyn IconResolver,
) -> (Vec<Folder>, LoadOutcome) {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return (Vec::new(), LoadOutcome::Empty),
        Err(error) => {
            logging::error(&format!(
                "[launchpad-core] failed to read saved folders, changes will not be saved: {error}"
            ));
            return (Vec::new(), LoadOutcome::Unreadable);
        }
    };

    match decode_folders(&bytes, icons) {
        Ok(folders) => {
            logging::info(&format!("[launchpad-core] loaded folders count={}", folders.len()));
            let count = folders.len();
            (folders, LoadOutcome::Loaded(count))
        }
        Err(error) => {
            logging::warn(&format!(
                "[launchpad-core] saved folders are unreadable, starting empty: {error}"
            ));
            let backup_key = format!("{key}{CORRUPT_SUFFIX}");
            if let Err(error) = store.set(&backup_key, &bytes) {
                logging::error(&format!(
                    "[launchpad-core] failed to back up unreadable folders: {error}"
                ));
            }
            (Vec::new(), LoadOutcome::Corrupt)
        }
    }
}

fn clean_name(name: &str) -> Result<String, FolderError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FolderError::EmptyName);
    }
    Ok(trimmed.to_string())
}
