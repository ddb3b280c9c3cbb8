use std::sync::Arc;
use std::time::Instant;

use crate::bundle::NoIcons;
use crate::folder_store::FolderStore;
use crate::model::{AppRecord, FolderColor};
use crate::settings_store::MemorySettingsStore;
use crate::view::visible_items;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn warm_projection_p95_under_15ms() {
    let apps: Vec<AppRecord> = (0..2_000)
        .map(|i| {
            AppRecord::new(
                format!("Application {i:04}"),
                format!("com.example.app{i:04}"),
                format!("/Applications/Application {i:04}.app"),
                None,
            )
        })
        .collect();

    let mut store = FolderStore::open(
        Box::new(MemorySettingsStore::new()),
        "LaunchpadFolders",
        Arc::new(NoIcons),
    );
    for f in 0..20 {
        let folder = store
            .create_folder(&format!("Folder {f}"), FolderColor::Blue)
            .unwrap();
        for app in apps.iter().skip(f * 10).take(10) {
            store.add_app_to_folder(app, folder.id()).unwrap();
        }
    }

    for _ in 0..30 {
        let _ = visible_items(&apps, store.folders(), "application 1");
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(80);
        for _ in 0..80 {
            let start = Instant::now();
            let _ = visible_items(&apps, store.folders(), "application 1");
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 15.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 15.0ms); batches={batch_p95:?}",
    );
}
