use serde::{Deserialize, Serialize};

use crate::model::{AppRecord, Folder, FolderColor, LaunchpadItem};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListItemsRequest {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchRequest {
    pub bundle_identifier: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateFolderRequest {
    pub name: String,
    pub color: Option<FolderColor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameFolderRequest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderAppRequest {
    pub id: String,
    pub bundle_identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppDto {
    pub name: String,
    pub bundle_identifier: String,
    pub path: String,
    pub icon_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderDto {
    pub id: String,
    pub name: String,
    pub color: FolderColor,
    pub apps: Vec<AppDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemDto {
    Folder { id: String, folder: FolderDto },
    App { id: String, app: AppDto },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResponse {
    pub started: bool,
    pub app_count: usize,
    pub skipped: usize,
    pub failed_roots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemsResponse {
    pub scanning: bool,
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchResponse {
    pub launched: AppDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderChangeResponse {
    pub folder: Option<FolderDto>,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    Scan,
    ListItems(ListItemsRequest),
    Launch(LaunchRequest),
    CreateFolder(CreateFolderRequest),
    RenameFolder(RenameFolderRequest),
    DeleteFolder(FolderRef),
    AddToFolder(FolderAppRequest),
    RemoveFromFolder(FolderAppRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    Scan(ScanResponse),
    Items(ItemsResponse),
    Launch(LaunchResponse),
    Folder(FolderChangeResponse),
}

impl From<&AppRecord> for AppDto {
    fn from(value: &AppRecord) -> Self {
        Self {
            name: value.name().to_string(),
            bundle_identifier: value.bundle_identifier().to_string(),
            path: value.path().to_string_lossy().into_owned(),
            icon_path: value
                .icon()
                .map(|icon| icon.path().to_string_lossy().into_owned()),
        }
    }
}

impl From<&Folder> for FolderDto {
    fn from(value: &Folder) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().to_string(),
            color: value.color(),
            apps: value.apps().iter().map(AppDto::from).collect(),
        }
    }
}

impl From<&LaunchpadItem> for ItemDto {
    fn from(value: &LaunchpadItem) -> Self {
        match value {
            LaunchpadItem::Folder(folder) => Self::Folder {
                id: value.id(),
                folder: FolderDto::from(folder),
            },
            LaunchpadItem::App(app) => Self::App {
                id: value.id(),
                app: AppDto::from(app),
            },
        }
    }
}
