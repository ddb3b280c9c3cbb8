use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{self, ConfigError};
use crate::core_service::{LaunchpadService, ServiceError};
use crate::logging;
use crate::model::LaunchpadItem;
use crate::transport::handle_json;

#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Service(ServiceError),
    Io(std::io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Service(error) => write!(f, "service error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ServiceError> for RuntimeError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub search: String,
    pub serve: bool,
}

pub fn parse_cli_args(args: &[String]) -> Result<RunOptions, String> {
    let mut options = RunOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--search" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--search requires a value".to_string())?;
                options.search = value.clone();
            }
            "--serve" => options.serve = true,
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(options)
}

pub fn run_with_options(options: RunOptions) -> Result<(), RuntimeError> {
    let config = config::load(options.config_path.as_deref())?;
    if !config.config_path.exists() {
        config::save(&config)?;
        eprintln!(
            "[launchpad-core] wrote default config to {}",
            config.config_path.display()
        );
    }

    if let Err(error) = logging::init() {
        eprintln!("[launchpad-core] logging disabled: {error}");
    }
    logging::info(&format!(
        "[launchpad-core] startup config_path={} settings_db_path={} roots={}",
        config.config_path.display(),
        config.settings_db_path.display(),
        config.application_dirs.len(),
    ));

    let mut service = LaunchpadService::new(config)?;

    if options.serve {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let handled = serve_lines(&mut service, stdin.lock(), stdout.lock())?;
        logging::info(&format!("[launchpad-core] session closed requests={handled}"));
        return Ok(());
    }

    if let Some(report) = service.rescan_blocking() {
        for failure in &report.errors {
            eprintln!("[launchpad-core] skipped root {}: {}", failure.root, failure.message);
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for item in service.visible_items(&options.search) {
        writeln!(out, "{}", describe_item(&item))?;
    }
    Ok(())
}

/// Answers one JSON request per input line until the input ends.
pub fn serve_lines<R: BufRead, W: Write>(
    service: &mut LaunchpadService,
    reader: R,
    mut writer: W,
) -> Result<usize, std::io::Error> {
    let mut handled = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_json(service, &line);
        writeln!(writer, "{response}")?;
        writer.flush()?;
        handled += 1;
    }
    Ok(handled)
}

fn describe_item(item: &LaunchpadItem) -> String {
    match item {
        LaunchpadItem::Folder(folder) => format!(
            "[folder:{}] {} ({} apps)",
            folder.color(),
            folder.name(),
            folder.apps().len()
        ),
        LaunchpadItem::App(app) => format!(
            "{}\t{}\t{}",
            app.name(),
            app.bundle_identifier(),
            app.path().display()
        ),
    }
}
