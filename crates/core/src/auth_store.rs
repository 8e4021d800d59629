//! File-backed cache for the authentication state snapshot.
//!
//! One slot, one file: `<auth-dir>/user.json`. The setup routine writes it
//! after a complete login and every later run reads it instead of logging in
//! again. Age is advisory: a snapshot older than [`STALE_AFTER_HOURS`] is
//! reported as stale but never deleted automatically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use ew_protocol::StorageState;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Snapshots older than this are flagged stale.
pub const STALE_AFTER_HOURS: u64 = 24;

/// File name of the snapshot inside the auth directory.
pub const AUTH_FILE: &str = "user.json";

/// Result of [`AuthStore::check_freshness`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Freshness {
	pub path: PathBuf,
	pub exists: bool,
	pub stale_after_hours: u64,
	/// Age in whole seconds, when the snapshot exists.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub age_secs: Option<u64>,
	pub is_stale: bool,
}

impl Freshness {
	pub fn age(&self) -> Option<Duration> {
		self.age_secs.map(Duration::from_secs)
	}
}

/// What [`AuthStore::invalidate`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invalidation {
	pub removed_file: bool,
	pub removed_dir: bool,
}

/// The session cache slot.
#[derive(Debug, Clone)]
pub struct AuthStore {
	path: PathBuf,
}

impl AuthStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Store at `<auth_dir>/user.json`.
	pub fn in_dir(auth_dir: impl AsRef<Path>) -> Self {
		Self::new(auth_dir.as_ref().join(AUTH_FILE))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Writes `state`, replacing any previous snapshot in one rename.
	pub fn save(&self, state: &StorageState) -> Result<()> {
		let write_err = |source| Error::Write {
			path: self.path.clone(),
			source,
		};

		let dir = match self.path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};
		fs::create_dir_all(dir).map_err(write_err)?;

		let body = serde_json::to_vec_pretty(state).map_err(|e| write_err(std::io::Error::other(e)))?;

		// The temp file lives next to the target so the rename stays on one filesystem.
		let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
		tmp.write_all(&body).map_err(write_err)?;
		tmp.as_file().sync_all().map_err(write_err)?;
		tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

		info!(
			target = "ew",
			path = %self.path.display(),
			cookies = state.cookies.len(),
			origins = state.origins.len(),
			"saved auth state"
		);
		Ok(())
	}

	/// Reads the snapshot; `Ok(None)` means there is nothing cached.
	pub fn load(&self) -> Result<Option<StorageState>> {
		let raw = match fs::read(&self.path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				debug!(target = "ew", path = %self.path.display(), "no cached auth state");
				return Ok(None);
			}
			Err(source) => {
				return Err(Error::Read {
					path: self.path.clone(),
					source,
				});
			}
		};

		let state = serde_json::from_slice(&raw).map_err(|source| Error::Corrupt {
			path: self.path.clone(),
			source,
		})?;
		Ok(Some(state))
	}

	pub fn check_freshness(&self) -> Result<Freshness> {
		self.check_freshness_at(SystemTime::now())
	}

	/// Freshness as seen at `now`, from the file's modification time.
	pub fn check_freshness_at(&self, now: SystemTime) -> Result<Freshness> {
		let mut freshness = Freshness {
			path: self.path.clone(),
			exists: false,
			stale_after_hours: STALE_AFTER_HOURS,
			age_secs: None,
			is_stale: false,
		};

		let modified = match fs::metadata(&self.path) {
			Ok(meta) => meta.modified()?,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(freshness),
			Err(source) => {
				return Err(Error::Read {
					path: self.path.clone(),
					source,
				});
			}
		};

		// A file from "the future" (clock skew) counts as brand new.
		let age = now.duration_since(modified).unwrap_or_default();
		freshness.exists = true;
		freshness.age_secs = Some(age.as_secs());
		freshness.is_stale = age > Duration::from_secs(STALE_AFTER_HOURS * 60 * 60);
		Ok(freshness)
	}

	/// Deletes the snapshot, then its directory if nothing else lives there.
	pub fn invalidate(&self) -> Result<Invalidation> {
		let mut outcome = Invalidation::default();

		match fs::remove_file(&self.path) {
			Ok(()) => outcome.removed_file = true,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
			Err(err) => return Err(err.into()),
		}

		if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			let is_empty = match fs::read_dir(dir) {
				Ok(mut entries) => entries.next().is_none(),
				Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
				Err(err) => return Err(err.into()),
			};
			if is_empty {
				fs::remove_dir(dir)?;
				outcome.removed_dir = true;
			}
		}

		info!(
			target = "ew",
			path = %self.path.display(),
			removed_file = outcome.removed_file,
			removed_dir = outcome.removed_dir,
			"invalidated auth state"
		);
		Ok(outcome)
	}
}
