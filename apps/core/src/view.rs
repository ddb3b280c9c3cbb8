//! The grid projection the presentation layer renders: folders first, then the
//! apps that are in no folder and match the search text. Recomputed on demand.

use std::collections::HashSet;

use crate::model::{AppRecord, Folder, LaunchpadItem};

/// Apps that belong to no folder and whose name contains `search_text`.
pub fn filtered_apps<'a>(
    apps: &'a [AppRecord],
    folders: &[Folder],
    search_text: &str,
) -> Vec<&'a AppRecord> {
    let in_folders = identifiers_in_folders(folders);
    apps.iter()
        .filter(|app| !in_folders.contains(app.bundle_identifier()))
        .filter(|app| app.matches_search(search_text))
        .collect()
}

pub fn visible_items(apps: &[AppRecord], folders: &[Folder], search_text: &str) -> Vec<LaunchpadItem> {
    folders
        .iter()
        .cloned()
        .map(LaunchpadItem::Folder)
        .chain(
            filtered_apps(apps, folders, search_text)
                .into_iter()
                .cloned()
                .map(LaunchpadItem::App),
        )
        .collect()
}

/// The app a "submit search" gesture launches.
pub fn first_match<'a>(
    apps: &'a [AppRecord],
    folders: &[Folder],
    search_text: &str,
) -> Option<&'a AppRecord> {
    filtered_apps(apps, folders, search_text).into_iter().next()
}

fn identifiers_in_folders(folders: &[Folder]) -> HashSet<&str> {
    folders
        .iter()
        .flat_map(|folder| folder.apps())
        .map(|app| app.bundle_identifier())
        .collect()
}
