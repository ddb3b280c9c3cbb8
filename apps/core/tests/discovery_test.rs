use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use launchpad_core::bundle::{BundleIconResolver, BundleInfo, IconResolver, NoIcons};
use launchpad_core::discovery::{AppProvider, BundleDirectoryProvider, DiscoveryProvider};
use launchpad_core::model::IconHandle;

fn unique_root(label: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("launchpad-discovery-{label}-{unique}"))
}

fn write_bundle(root: &Path, file_name: &str, keys: &[(&str, &str)]) -> PathBuf {
    let bundle = root.join(file_name);
    let contents = bundle.join("Contents");
    std::fs::create_dir_all(&contents).unwrap();
    let mut plist = String::from("<?xml version=\"1.0\"?>\n<plist version=\"1.0\">\n<dict>\n");
    for (key, value) in keys {
        plist.push_str(&format!("  <key>{key}</key>\n  <string>{value}</string>\n"));
    }
    plist.push_str("</dict>\n</plist>\n");
    std::fs::write(contents.join("Info.plist"), plist).unwrap();
    bundle
}

#[test]
fn app_provider_fixture_is_deterministic() {
    let provider = AppProvider::deterministic_fixture();
    let discovered = provider.discover().unwrap();

    assert_eq!(provider.provider_name(), "fixture");
    assert_eq!(discovered.apps.len(), 2);
    assert_eq!(discovered.apps[0].bundle_identifier(), "com.apple.Safari");
    assert_eq!(discovered.apps[1].bundle_identifier(), "com.apple.calculator");
}

#[test]
fn resolves_names_in_priority_order() {
    let root = unique_root("names");
    write_bundle(
        &root,
        "Display.app",
        &[
            ("CFBundleIdentifier", "com.example.display"),
            ("CFBundleName", "Internal"),
            ("CFBundleDisplayName", "Shown Name"),
        ],
    );
    write_bundle(
        &root,
        "Internal.app",
        &[
            ("CFBundleIdentifier", "com.example.internal"),
            ("CFBundleName", "Internal Only"),
        ],
    );
    write_bundle(&root, "Stem Only.app", &[("CFBundleIdentifier", "com.example.stem")]);

    let provider = BundleDirectoryProvider::new(root.clone(), ".app", Arc::new(NoIcons));
    let discovered = provider.discover().unwrap();

    let name_of = |id: &str| {
        discovered
            .apps
            .iter()
            .find(|app| app.bundle_identifier() == id)
            .map(|app| app.name().to_string())
    };
    assert_eq!(discovered.apps.len(), 3);
    assert_eq!(name_of("com.example.display").as_deref(), Some("Shown Name"));
    assert_eq!(name_of("com.example.internal").as_deref(), Some("Internal Only"));
    assert_eq!(name_of("com.example.stem").as_deref(), Some("Stem Only"));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn resolves_packages_with_binary_info_plist() {
    let root = unique_root("binary");
    let contents = root.join("Pages.app").join("Contents");
    std::fs::create_dir_all(&contents).unwrap();
    let mut dict = plist::Dictionary::new();
    dict.insert(
        "CFBundleIdentifier".to_string(),
        plist::Value::String("com.apple.iWork.Pages".into()),
    );
    dict.insert(
        "CFBundleDisplayName".to_string(),
        plist::Value::String("Pages".into()),
    );
    plist::Value::Dictionary(dict)
        .to_file_binary(contents.join("Info.plist"))
        .unwrap();
    assert!(std::fs::read(contents.join("Info.plist"))
        .unwrap()
        .starts_with(b"bplist00"));

    let provider = BundleDirectoryProvider::new(root.clone(), ".app", Arc::new(NoIcons));
    let discovered = provider.discover().unwrap();

    assert_eq!(discovered.skipped, 0);
    assert_eq!(discovered.apps.len(), 1);
    assert_eq!(discovered.apps[0].bundle_identifier(), "com.apple.iWork.Pages");
    assert_eq!(discovered.apps[0].name(), "Pages");

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn skips_invalid_packages_and_ignores_other_entries() {
    let root = unique_root("skips");
    write_bundle(&root, "Good.app", &[("CFBundleIdentifier", "com.example.good")]);
    write_bundle(&root, "NoId.app", &[("CFBundleName", "No Identifier")]);
    std::fs::create_dir_all(root.join("Empty.app")).unwrap();
    std::fs::write(root.join("Flat.app"), b"not a directory").unwrap();
    write_bundle(&root, "Helper.bundle", &[("CFBundleIdentifier", "com.example.helper")]);
    std::fs::write(root.join("README.txt"), b"notes").unwrap();

    let provider = BundleDirectoryProvider::new(root.clone(), ".app", Arc::new(NoIcons));
    let discovered = provider.discover().unwrap();

    assert_eq!(discovered.apps.len(), 1);
    assert_eq!(discovered.apps[0].bundle_identifier(), "com.example.good");
    assert_eq!(discovered.skipped, 3);

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn does_not_descend_into_nested_directories() {
    let root = unique_root("depth");
    let nested = root.join("Utilities");
    std::fs::create_dir_all(&nested).unwrap();
    write_bundle(&nested, "Terminal.app", &[("CFBundleIdentifier", "com.apple.Terminal")]);

    let provider = BundleDirectoryProvider::new(root.clone(), ".app", Arc::new(NoIcons));
    let discovered = provider.discover().unwrap();

    assert!(discovered.apps.is_empty());
    assert_eq!(discovered.skipped, 0);

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn missing_root_is_reported_as_provider_error() {
    let root = unique_root("missing");
    let provider = BundleDirectoryProvider::new(root, ".app", Arc::new(NoIcons));

    assert!(provider.discover().is_err());
}

#[test]
fn resolves_declared_icon_and_falls_back_to_any_icns() {
    let root = unique_root("icons");
    let declared = write_bundle(
        &root,
        "Declared.app",
        &[
            ("CFBundleIdentifier", "com.example.declared"),
            ("CFBundleIconFile", "AppIcon"),
        ],
    );
    let declared_resources = declared.join("Contents").join("Resources");
    std::fs::create_dir_all(&declared_resources).unwrap();
    std::fs::write(declared_resources.join("AppIcon.icns"), b"icns").unwrap();
    std::fs::write(declared_resources.join("Another.icns"), b"icns").unwrap();

    let fallback = write_bundle(&root, "Fallback.app", &[("CFBundleIdentifier", "com.example.fallback")]);
    let fallback_resources = fallback.join("Contents").join("Resources");
    std::fs::create_dir_all(&fallback_resources).unwrap();
    std::fs::write(fallback_resources.join("Generic.icns"), b"icns").unwrap();

    write_bundle(&root, "Plain.app", &[("CFBundleIdentifier", "com.example.plain")]);

    let provider = BundleDirectoryProvider::new(root.clone(), ".app", Arc::new(BundleIconResolver));
    let discovered = provider.discover().unwrap();

    let icon_of = |id: &str| {
        discovered
            .apps
            .iter()
            .find(|app| app.bundle_identifier() == id)
            .and_then(|app| app.icon())
            .map(|icon| icon.path().to_path_buf())
    };
    assert_eq!(
        icon_of("com.example.declared"),
        Some(declared_resources.join("AppIcon.icns"))
    );
    assert_eq!(
        icon_of("com.example.fallback"),
        Some(fallback_resources.join("Generic.icns"))
    );
    assert_eq!(icon_of("com.example.plain"), None);

    std::fs::remove_dir_all(&root).unwrap();
}

#[derive(Default)]
struct CountingResolver {
    path_lookups: AtomicUsize,
    info_lookups: AtomicUsize,
}

impl IconResolver for CountingResolver {
    fn resolve_icon(&self, _path: &Path) -> Option<IconHandle> {
        self.path_lookups.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn resolve_icon_with(&self, _path: &Path, info: &BundleInfo) -> Option<IconHandle> {
        assert!(info.identifier().is_some());
        self.info_lookups.fetch_add(1, Ordering::SeqCst);
        None
    }
}

#[test]
fn icon_lookup_reuses_parsed_metadata() {
    let root = unique_root("reuse");
    write_bundle(&root, "One.app", &[("CFBundleIdentifier", "com.example.one")]);
    write_bundle(&root, "Two.app", &[("CFBundleIdentifier", "com.example.two")]);
    let resolver = Arc::new(CountingResolver::default());

    let provider = BundleDirectoryProvider::new(root.clone(), ".app", resolver.clone());
    let discovered = provider.discover().unwrap();

    assert_eq!(discovered.apps.len(), 2);
    assert_eq!(resolver.info_lookups.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.path_lookups.load(Ordering::SeqCst), 0);

    std::fs::remove_dir_all(&root).unwrap();
}
