use std::path::PathBuf;

use thiserror::Error;

/// Failures of the Chromium backend.
#[derive(Debug, Error)]
pub enum Error {
	#[error("Chrome not found; set {0} or allow the fetcher to download Chromium")]
	ChromeNotFound(&'static str),

	#[error("Chrome at {} is not runnable", .0.display())]
	ChromeNotRunnable(PathBuf),

	#[error("Failed to launch browser: {0}")]
	LaunchFailed(String),

	#[error("Chromium download failed: {0}")]
	Fetch(String),

	#[error("CDP error: {0}")]
	Cdp(#[from] chromiumoxide::error::CdpError),

	#[error("Resolver script returned an unexpected value: {0}")]
	Script(#[from] serde_json::Error),

	#[error("Invalid CDP parameters: {0}")]
	Params(String),

	#[error("No element matches {0}")]
	NoMatch(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for ew::Error {
	fn from(err: Error) -> Self {
		match err {
			Error::Io(err) => ew::Error::Io(err),
			other => ew::Error::driver(other),
		}
	}
}
