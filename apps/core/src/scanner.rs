use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, RecvError, TryRecvError};
use std::sync::Arc;

use crate::discovery::{Discovered, DiscoveryProvider, ProviderError};
use crate::events::EventBus;
use crate::logging;
use crate::model::{collation_key, AppRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStart {
    Started,
    AlreadyScanning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerEvent {
    Started,
    Finished { app_count: usize, skipped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFailure {
    pub root: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub apps: Vec<AppRecord>,
    pub skipped: usize,
    pub errors: Vec<RootFailure>,
}

struct WorkerResult {
    index: usize,
    result: Result<Discovered, ProviderError>,
}

struct PendingScan {
    receiver: Receiver<WorkerResult>,
    slots: Vec<Option<Result<Discovered, ProviderError>>>,
    outstanding: usize,
}

impl PendingScan {
    fn accept(&mut self, message: WorkerResult) {
        if let Some(slot) = self.slots.get_mut(message.index) {
            if slot.is_none() {
                self.outstanding -= 1;
            }
            *slot = Some(message.result);
        }
    }

    fn abandon_outstanding(&mut self) {
        for slot in self.slots.iter_mut().filter(|slot| slot.is_none()) {
            *slot = Some(Err(ProviderError::new("discovery worker exited without a result")));
        }
        self.outstanding = 0;
    }
}

/// Discovers applications across every provider and caches the merged list.
///
/// Workers only compute; the cached list and the scanning flag change inside
/// `poll`/`wait`, which run on the owning thread.
pub struct AppScanner {
    providers: Vec<Arc<dyn DiscoveryProvider>>,
    apps: Vec<AppRecord>,
    last_report: Option<ScanReport>,
    pending: Option<PendingScan>,
    events: EventBus<ScannerEvent>,
}

impl AppScanner {
    pub fn new(providers: Vec<Arc<dyn DiscoveryProvider>>) -> Self {
        Self {
            providers,
            apps: Vec::new(),
            last_report: None,
            pending: None,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<ScannerEvent> {
        self.events.subscribe()
    }

    pub fn is_scanning(&self) -> bool {
        self.pending.is_some()
    }

    /// The cached result of the last completed scan.
    pub fn apps(&self) -> &[AppRecord] {
        &self.apps
    }

    pub fn last_report(&self) -> Option<&ScanReport> {
        self.last_report.as_ref()
    }

    pub fn find(&self, bundle_identifier: &str) -> Option<&AppRecord> {
        self.apps
            .iter()
            .find(|app| app.bundle_identifier() == bundle_identifier)
    }

    pub fn scan(&mut self) -> ScanStart {
        if self.pending.is_some() {
            return ScanStart::AlreadyScanning;
        }

        let (sender, receiver) = mpsc::channel();
        let mut pending = PendingScan {
            receiver,
            slots: (0..self.providers.len()).map(|_| None).collect(),
            outstanding: self.providers.len(),
        };

        for (index, provider) in self.providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            let sender = sender.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("app-scan-{index}"))
                .spawn(move || {
                    let result = provider.discover();
                    let _ = sender.send(WorkerResult { index, result });
                });

            if let Err(error) = spawned {
                pending.accept(WorkerResult {
                    index,
                    result: Err(ProviderError::new(format!(
                        "failed to start discovery worker: {error}"
                    ))),
                });
            }
        }
        drop(sender);

        logging::info(&format!(
            "[launchpad-core] scan started roots={}",
            self.providers.len()
        ));
        self.pending = Some(pending);
        self.events.notify(ScannerEvent::Started);
        ScanStart::Started
    }

    /// Applies a finished scan without blocking. Returns the report once every worker is in.
    pub fn poll(&mut self) -> Option<ScanReport> {
        let pending = self.pending.as_mut()?;
        while pending.outstanding > 0 {
            match pending.receiver.try_recv() {
                Ok(message) => pending.accept(message),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => pending.abandon_outstanding(),
            }
        }
        self.complete()
    }

    /// Blocks until the in-flight scan finishes. Returns None when nothing was running.
    pub fn wait(&mut self) -> Option<ScanReport> {
        let pending = self.pending.as_mut()?;
        while pending.outstanding > 0 {
            match pending.receiver.recv() {
                Ok(message) => pending.accept(message),
                Err(RecvError) => pending.abandon_outstanding(),
            }
        }
        self.complete()
    }

    /// Runs a scan to completion on the calling thread's behalf.
    pub fn scan_blocking(&mut self) -> Option<ScanReport> {
        self.scan();
        self.wait()
    }

    fn complete(&mut self) -> Option<ScanReport> {
        let pending = self.pending.take()?;

        let mut merged = Vec::new();
        let mut skipped = 0;
        let mut errors = Vec::new();
        for (index, slot) in pending.slots.into_iter().enumerate() {
            match slot {
                Some(Ok(discovered)) => {
                    skipped += discovered.skipped;
                    merged.extend(discovered.apps);
                }
                Some(Err(error)) => {
                    let root = self
                        .providers
                        .get(index)
                        .map(|provider| provider.provider_name())
                        .unwrap_or_default();
                    logging::warn(&format!("[launchpad-core] scan root failed root={root} error={error}"));
                    errors.push(RootFailure {
                        root,
                        message: error.to_string(),
                    });
                }
                None => {}
            }
        }

        let apps = dedup_and_sort(merged);
        logging::info(&format!(
            "[launchpad-core] scan finished apps={} skipped={skipped} failed_roots={}",
            apps.len(),
            errors.len()
        ));

        let report = ScanReport {
            apps,
            skipped,
            errors,
        };
        self.apps = report.apps.clone();
        self.last_report = Some(report.clone());
        self.events.notify(ScannerEvent::Finished {
            app_count: report.apps.len(),
            skipped: report.skipped,
        });
        Some(report)
    }
}

/// One record per bundle identifier, ordered by case- and accent-insensitive name.
pub fn dedup_and_sort(apps: Vec<AppRecord>) -> Vec<AppRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<AppRecord> = apps
        .into_iter()
        .filter(|app| seen.insert(app.bundle_identifier().to_string()))
        .collect();
    unique.sort_by_cached_key(|app| {
        (
            collation_key(app.name()),
            app.normalized_name().to_string(),
            app.name().to_string(),
            app.bundle_identifier().to_string(),
        )
    });
    unique
}

#[cfg(test)]
mod tests {
    use super::dedup_and_sort;
    use crate::model::AppRecord;

    fn app(name: &str, id: &str) -> AppRecord {
        AppRecord::new(name, id, format!("/Applications/{name}.app"), None)
    }

    #[test]
    fn sorts_case_insensitively() {
        let sorted = dedup_and_sort(vec![app("zeta", "z"), app("Alpha", "a"), app("beta", "b")]);
        let names: Vec<&str> = sorted.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let sorted = dedup_and_sort(vec![
            app("Zoom", "us.zoom.xos"),
            app("Éditeur", "fr.example.editeur"),
            app("Calendar", "com.apple.iCal"),
            app("editor", "com.example.editor"),
        ]);
        let names: Vec<&str> = sorted.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Calendar", "Éditeur", "editor", "Zoom"]);
    }

    #[test]
    fn collapses_duplicate_identifiers() {
        let sorted = dedup_and_sort(vec![
            app("Notes", "com.apple.Notes"),
            app("Notes Copy", "com.apple.Notes"),
            app("Maps", "com.apple.Maps"),
        ]);
        assert_eq!(sorted.len(), 2);
        assert_eq!(
            sorted
                .iter()
                .filter(|a| a.bundle_identifier() == "com.apple.Notes")
                .count(),
            1
        );
    }
}
