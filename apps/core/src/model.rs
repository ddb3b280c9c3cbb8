use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bundle::IconResolver;

/// Opaque handle to the best available image for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconHandle {
    path: PathBuf,
}

impl IconHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One discovered application. Identity is the bundle identifier alone.
#[derive(Debug, Clone)]
pub struct AppRecord {
    name: String,
    bundle_identifier: String,
    path: PathBuf,
    icon: Option<IconHandle>,
    normalized_name: String,
}

impl AppRecord {
    pub fn new(
        name: impl Into<String>,
        bundle_identifier: impl Into<String>,
        path: impl Into<PathBuf>,
        icon: Option<IconHandle>,
    ) -> Self {
        let name = name.into();
        let normalized_name = normalize_for_search(&name);
        Self {
            name,
            bundle_identifier: bundle_identifier.into(),
            path: path.into(),
            icon,
            normalized_name,
        }
    }

    /// Builds a record and resolves its icon from `path` right away.
    pub fn resolve(
        name: impl Into<String>,
        bundle_identifier: impl Into<String>,
        path: impl Into<PathBuf>,
        icons: &dyn IconResolver,
    ) -> Self {
        let path = path.into();
        let icon = icons.resolve_icon(&path);
        Self::new(name, bundle_identifier, path, icon)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bundle_identifier(&self) -> &str {
        &self.bundle_identifier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn icon(&self) -> Option<&IconHandle> {
        self.icon.as_ref()
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn matches_search(&self, search_text: &str) -> bool {
        let needle = normalize_for_search(search_text.trim());
        needle.is_empty() || self.normalized_name.contains(&needle)
    }
}

impl PartialEq for AppRecord {
    fn eq(&self, other: &Self) -> bool {
        self.bundle_identifier == other.bundle_identifier
    }
}

impl Eq for AppRecord {}

impl Hash for AppRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bundle_identifier.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderId(Uuid);

impl FolderId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for FolderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for FolderId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderColor {
    #[default]
    Blue,
    Green,
    Orange,
    Red,
    Purple,
    Pink,
}

impl FolderColor {
    pub const ALL: [FolderColor; 6] = [
        FolderColor::Blue,
        FolderColor::Green,
        FolderColor::Orange,
        FolderColor::Red,
        FolderColor::Purple,
        FolderColor::Pink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Purple => "purple",
            Self::Pink => "pink",
        }
    }
}

impl Display for FolderColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolderColor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == wanted)
            .ok_or_else(|| format!("unknown folder color '{value}'"))
    }
}

pub const FOLDER_PREVIEW_LEN: usize = 4;

/// A user-created group of applications. Mutated only through the folder store.
#[derive(Debug, Clone)]
pub struct Folder {
    id: FolderId,
    name: String,
    color: FolderColor,
    apps: Vec<AppRecord>,
}

impl Folder {
    pub fn new(name: impl Into<String>, color: FolderColor) -> Self {
        Self {
            id: FolderId::generate(),
            name: name.into(),
            color,
            apps: Vec::new(),
        }
    }

    pub fn id(&self) -> FolderId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> FolderColor {
        self.color
    }

    pub fn apps(&self) -> &[AppRecord] {
        &self.apps
    }

    pub fn contains(&self, bundle_identifier: &str) -> bool {
        self.apps
            .iter()
            .any(|app| app.bundle_identifier() == bundle_identifier)
    }

    pub fn preview_apps(&self) -> &[AppRecord] {
        &self.apps[..self.apps.len().min(FOLDER_PREVIEW_LEN)]
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Returns false when an app with the same identifier is already present.
    pub(crate) fn add_app(&mut self, app: AppRecord) -> bool {
        if self.contains(app.bundle_identifier()) {
            return false;
        }
        self.apps.push(app);
        true
    }

    pub(crate) fn remove_app(&mut self, bundle_identifier: &str) -> bool {
        let before = self.apps.len();
        self.apps
            .retain(|app| app.bundle_identifier() != bundle_identifier);
        self.apps.len() != before
    }
}

impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LaunchpadItem {
    Folder(Folder),
    App(AppRecord),
}

impl LaunchpadItem {
    pub fn id(&self) -> String {
        match self {
            Self::Folder(folder) => format!("folder_{}", folder.id()),
            Self::App(app) => format!("app_{}", app.bundle_identifier()),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Folder(folder) => folder.name(),
            Self::App(app) => app.name(),
        }
    }
}

pub fn normalize_for_search(input: &str) -> String {
    input.chars().flat_map(|c| c.to_lowercase()).collect()
}

/// Primary ordering key for names: diacritics folded to their base letter, then lowercased.
pub fn collation_key(input: &str) -> String {
    input
        .chars()
        .map(nucleo::chars::normalize)
        .flat_map(|c| c.to_lowercase())
        .collect()
}
