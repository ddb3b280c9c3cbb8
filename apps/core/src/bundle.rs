use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{AppRecord, IconHandle};

const INFO_PLIST: &str = "Contents/Info.plist";
const RESOURCES_DIR: &str = "Contents/Resources";
const ICON_EXTENSION: &str = "icns";
const BINARY_PLIST_MAGIC: &[u8] = b"bplist";

pub const KEY_DISPLAY_NAME: &str = "CFBundleDisplayName";
pub const KEY_NAME: &str = "CFBundleName";
pub const KEY_IDENTIFIER: &str = "CFBundleIdentifier";
pub const KEY_ICON_FILE: &str = "CFBundleIconFile";

static PLIST_PAIR: OnceLock<Option<Regex>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    NotADirectory(PathBuf),
    UnreadableMetadata { path: PathBuf, message: String },
    MissingIdentifier(PathBuf),
}

impl Display for BundleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotADirectory(path) => write!(f, "not a package directory: {}", path.display()),
            Self::UnreadableMetadata { path, message } => {
                write!(f, "unreadable metadata at {}: {message}", path.display())
            }
            Self::MissingIdentifier(path) => {
                write!(f, "package has no bundle identifier: {}", path.display())
            }
        }
    }
}

impl std::error::Error for BundleError {}

/// Looks up the representative image for a package path.
pub trait IconResolver: Send + Sync {
    fn resolve_icon(&self, path: &Path) -> Option<IconHandle>;

    /// Same lookup when the package metadata was already read.
    fn resolve_icon_with(&self, path: &Path, _info: &BundleInfo) -> Option<IconHandle> {
        self.resolve_icon(path)
    }
}

/// Resolves `Contents/Resources/<CFBundleIconFile>`, falling back to the first `.icns` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundleIconResolver;

impl IconResolver for BundleIconResolver {
    fn resolve_icon(&self, path: &Path) -> Option<IconHandle> {
        match read_info(path) {
            Ok(info) => self.resolve_icon_with(path, &info),
            Err(_) => first_icns(&path.join(RESOURCES_DIR)).map(IconHandle::new),
        }
    }

    fn resolve_icon_with(&self, path: &Path, info: &BundleInfo) -> Option<IconHandle> {
        let resources = path.join(RESOURCES_DIR);
        let declared = info
            .get(KEY_ICON_FILE)
            .map(|file| {
                let candidate = resources.join(file);
                if candidate.extension().is_some() {
                    candidate
                } else {
                    candidate.with_extension(ICON_EXTENSION)
                }
            })
            .filter(|candidate| candidate.is_file());

        declared
            .or_else(|| first_icns(&resources))
            .map(IconHandle::new)
    }
}

/// Never finds an icon. Useful where images are irrelevant.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIcons;

impl IconResolver for NoIcons {
    fn resolve_icon(&self, _path: &Path) -> Option<IconHandle> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleInfo {
    values: HashMap<String, String>,
}

impl BundleInfo {
    /// Accepts both XML and binary property lists.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.starts_with(BINARY_PLIST_MAGIC) {
            return Self::parse_binary(bytes);
        }
        match std::str::from_utf8(bytes) {
            Ok(content) => Ok(Self::parse(content)),
            Err(_) => Self::parse_binary(bytes),
        }
    }

    fn parse_binary(bytes: &[u8]) -> Result<Self, String> {
        let value =
            plist::Value::from_reader(Cursor::new(bytes)).map_err(|error| error.to_string())?;
        let dict = value
            .as_dictionary()
            .ok_or_else(|| "property list root is not a dictionary".to_string())?;
        let values = dict
            .iter()
            .filter_map(|(key, value)| {
                let value = value.as_string()?.trim();
                (!value.is_empty()).then(|| (key.clone(), value.to_string()))
            })
            .collect();
        Ok(Self { values })
    }

    pub fn parse(content: &str) -> Self {
        let mut values = HashMap::new();
        if let Some(pattern) = plist_pair_regex() {
            for captures in pattern.captures_iter(content) {
                let (Some(key), Some(value)) = (captures.get(1), captures.get(2)) else {
                    continue;
                };
                let value = unescape_xml(value.as_str().trim());
                if value.is_empty() {
                    continue;
                }
                values
                    .entry(unescape_xml(key.as_str().trim()))
                    .or_insert(value);
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }

    pub fn identifier(&self) -> Option<&str> {
        self.get(KEY_IDENTIFIER).map(String::as_str)
    }

    /// Display name, then internal name, then the package file stem.
    pub fn display_name(&self, package_path: &Path) -> String {
        self.get(KEY_DISPLAY_NAME)
            .or_else(|| self.get(KEY_NAME))
            .cloned()
            .unwrap_or_else(|| file_stem(package_path))
    }
}

pub fn read_info(package_path: &Path) -> Result<BundleInfo, BundleError> {
    if !package_path.is_dir() {
        return Err(BundleError::NotADirectory(package_path.to_path_buf()));
    }

    let plist_path = package_path.join(INFO_PLIST);
    let unreadable = |message: String| BundleError::UnreadableMetadata {
        path: plist_path.clone(),
        message,
    };
    let bytes = std::fs::read(&plist_path).map_err(|error| unreadable(error.to_string()))?;
    BundleInfo::from_bytes(&bytes).map_err(unreadable)
}

pub fn resolve_bundle(
    package_path: &Path,
    icons: &dyn IconResolver,
) -> Result<AppRecord, BundleError> {
    let info = read_info(package_path)?;
    let identifier = info
        .identifier()
        .ok_or_else(|| BundleError::MissingIdentifier(package_path.to_path_buf()))?
        .to_string();
    let name = info.display_name(package_path);
    let icon = icons.resolve_icon_with(package_path, &info);

    Ok(AppRecord::new(name, identifier, package_path, icon))
}

fn plist_pair_regex() -> Option<&'static Regex> {
    PLIST_PAIR
        .get_or_init(|| Regex::new(r"<key>([^<]+)</key>\s*<string>([^<]*)</string>").ok())
        .as_ref()
}

fn first_icns(resources: &Path) -> Option<PathBuf> {
    let mut icons: Vec<PathBuf> = std::fs::read_dir(resources)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ICON_EXTENSION))
        })
        .collect();
    icons.sort();
    icons.into_iter().next()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn unescape_xml(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
