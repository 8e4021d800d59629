//! Chrome executable discovery
//!
//! Candidates are tried in order:
//! 1. `LaunchOptions::executable` when the caller set one
//! 2. `CHROME_PATH` environment variable
//! 3. Chrome or Chromium in `PATH`
//! 4. Common install locations
//!
//! When nothing is found the session falls back to downloading Chromium with
//! the chromiumoxide fetcher.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

const PATH_NAMES: &[&str] = &[
	"google-chrome",
	"google-chrome-stable",
	"chromium",
	"chromium-browser",
	"chrome",
];

#[cfg(target_os = "macos")]
const COMMON_LOCATIONS: &[&str] = &[
	"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
	"/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(windows)]
const COMMON_LOCATIONS: &[&str] = &[
	"C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
	"C:\\Program Files (x86)\\Google\\Chrome\\Application\\chrome.exe",
];

#[cfg(not(any(target_os = "macos", windows)))]
const COMMON_LOCATIONS: &[&str] = &[
	"/usr/bin/google-chrome",
	"/usr/bin/chromium",
	"/usr/bin/chromium-browser",
	"/snap/bin/chromium",
];

/// Finds a runnable Chrome, or `None` when the fetcher should be used.
///
/// An explicitly requested executable must exist; it is never silently
/// replaced by another candidate.
pub fn find_chrome(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
	if let Some(path) = explicit {
		if !path.exists() {
			return Err(Error::ChromeNotRunnable(path.to_path_buf()));
		}
		return Ok(Some(path.to_path_buf()));
	}

	if let Ok(path) = std::env::var(CHROME_PATH_ENV) {
		let path = PathBuf::from(path);
		if chrome_is_usable(&path) {
			debug!(target = "ew", path = %path.display(), "using Chrome from {CHROME_PATH_ENV}");
			return Ok(Some(path));
		}
		warn!(
			target = "ew",
			path = %path.display(),
			"{CHROME_PATH_ENV} does not point at a runnable Chrome, searching elsewhere"
		);
	}

	if let Some(path) = find_in_path() {
		debug!(target = "ew", path = %path.display(), "using Chrome from PATH");
		return Ok(Some(path));
	}

	for location in COMMON_LOCATIONS {
		let path = PathBuf::from(location);
		if path.exists() {
			debug!(target = "ew", path = %path.display(), "using Chrome from a common location");
			return Ok(Some(path));
		}
	}

	Ok(None)
}

fn find_in_path() -> Option<PathBuf> {
	let path = std::env::var_os("PATH")?;
	std::env::split_paths(&path).find_map(|dir| {
		PATH_NAMES.iter().find_map(|name| {
			let candidate = dir.join(executable_name(name));
			candidate.is_file().then_some(candidate)
		})
	})
}

fn executable_name(name: &str) -> String {
	if cfg!(windows) {
		format!("{name}.exe")
	} else {
		name.to_string()
	}
}

fn chrome_is_usable(path: &Path) -> bool {
	Command::new(path)
		.arg("--version")
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
		.map(|status| status.success())
		.unwrap_or(false)
}
