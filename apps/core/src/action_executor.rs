use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use crate::logging;
use crate::model::AppRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    EmptyPath,
    MissingPath(PathBuf),
    LaunchFailed { message: String, code: Option<i32> },
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "empty path"),
            Self::MissingPath(path) => write!(f, "path does not exist: {}", path.display()),
            Self::LaunchFailed { message, code } => match code {
                Some(code) => write!(f, "{message} (code={code})"),
                None => write!(f, "{message}"),
            },
        }
    }
}

impl std::error::Error for LaunchError {}

/// Starts an application without waiting for it.
pub trait AppLauncher: Send + Sync {
    fn launch_path(&self, path: &Path) -> Result<(), LaunchError>;
}

/// Hands the package to the platform opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl AppLauncher for SystemLauncher {
    fn launch_path(&self, path: &Path) -> Result<(), LaunchError> {
        let target = validate_launch_path(path)?;
        spawn_opener(&target)
    }
}

/// Checks the path exactly as given. Only an empty or all-whitespace path is "empty".
pub fn validate_launch_path(path: &Path) -> Result<PathBuf, LaunchError> {
    let blank = path
        .to_str()
        .map_or(path.as_os_str().is_empty(), |raw| raw.trim().is_empty());
    if blank {
        return Err(LaunchError::EmptyPath);
    }

    if !path.exists() {
        return Err(LaunchError::MissingPath(path.to_path_buf()));
    }

    Ok(path.to_path_buf())
}

pub fn launch_app(launcher: &dyn AppLauncher, app: &AppRecord) -> Result<(), LaunchError> {
    let result = launcher.launch_path(app.path());
    match &result {
        Ok(()) => logging::info(&format!(
            "[launchpad-core] launched bundle={} path={}",
            app.bundle_identifier(),
            app.path().display()
        )),
        Err(error) => logging::warn(&format!(
            "[launchpad-core] launch failed bundle={} error={error}",
            app.bundle_identifier()
        )),
    }
    result
}

#[cfg(target_os = "windows")]
fn spawn_opener(target: &Path) -> Result<(), LaunchError> {
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::UI::Shell::ShellExecuteW;
    use windows_sys::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    let wide: Vec<u16> = target
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();
    let result = unsafe {
        ShellExecuteW(
            std::ptr::null_mut(),
            std::ptr::null(),
            wide.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            SW_SHOWNORMAL,
        )
    } as isize;

    if result <= 32 {
        return Err(LaunchError::LaunchFailed {
            message: format!("failed to open {}", target.display()),
            code: Some(result as i32),
        });
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn spawn_opener(target: &Path) -> Result<(), LaunchError> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    let mut child = std::process::Command::new(opener)
        .arg(target)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|error| LaunchError::LaunchFailed {
            message: format!("failed to run {opener} for {}: {error}", target.display()),
            code: error.raw_os_error(),
        })?;

    // Reap the opener in the background; the launched app outlives it.
    let _ = std::thread::Builder::new()
        .name("launch-reaper".to_string())
        .spawn(move || {
            let _ = child.wait();
        });
    Ok(())
}
