//! Project root detection.
//!
//! The suite keeps its state under the project root, next to the `.env`
//! file: `playwright/.auth/user.json` for the session cache.

use std::path::{Path, PathBuf};
use std::{env, fs};

use tracing::debug;

use crate::auth_store::{AUTH_FILE, AuthStore};
use crate::config::{ENV_FILE, TEMPLATE_ENV_FILE};

/// Directory names relative to the project root.
pub mod dirs {
	pub const PLAYWRIGHT: &str = "playwright";
	pub const AUTH: &str = ".auth";
}

/// Entries whose presence marks a directory as the project root.
const ROOT_MARKERS: [&str; 3] = [dirs::PLAYWRIGHT, ENV_FILE, TEMPLATE_ENV_FILE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
	pub root: PathBuf,
	/// Auth state directory (default: playwright/.auth)
	pub auth_dir: PathBuf,
}

impl ProjectPaths {
	pub fn from_root(root: PathBuf) -> Self {
		Self {
			auth_dir: root.join(dirs::PLAYWRIGHT).join(dirs::AUTH),
			root,
		}
	}

	pub fn auth_file(&self) -> PathBuf {
		self.auth_dir.join(AUTH_FILE)
	}

	pub fn auth_store(&self) -> AuthStore {
		AuthStore::in_dir(&self.auth_dir)
	}
}

/// Detected project.
#[derive(Debug, Clone)]
pub struct Project {
	pub paths: ProjectPaths,
	/// Whether a marker was found or the start directory was used as-is.
	pub detected: bool,
}

impl Project {
	/// Detects from the current directory, falling back to it.
	pub fn current() -> std::io::Result<Self> {
		let cwd = env::current_dir()?;
		Ok(Self::detect_from(&cwd).unwrap_or_else(|| Self {
			paths: ProjectPaths::from_root(cwd),
			detected: false,
		}))
	}

	pub fn detect_from(start: &Path) -> Option<Self> {
		let root = find_project_root(start)?;
		debug!(target = "ew", root = %root.display(), "detected project root");
		Some(Self {
			paths: ProjectPaths::from_root(root),
			detected: true,
		})
	}

	pub fn root(&self) -> &Path {
		&self.paths.root
	}
}

/// Walks up from `start` to the first directory holding a root marker.
fn find_project_root(start: &Path) -> Option<PathBuf> {
	let mut current = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
	loop {
		if ROOT_MARKERS.iter().any(|marker| current.join(marker).exists()) {
			return Some(current);
		}
		if !current.pop() {
			return None;
		}
	}
}
