use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// The shared secret is empty or not valid base32.
	#[error("invalid TOTP secret: {0}")]
	InvalidSecret(String),

	/// The snapshot could not be persisted.
	#[error("failed to write auth state to {}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to read auth state from {}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("auth state at {} is not valid JSON", path.display())]
	Corrupt {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	/// The two-factor page reported the submitted code as wrong or expired.
	#[error("one-time password rejected: {message}")]
	OtpRejected { message: String },

	/// Enrollment was requested but the account already has a second factor.
	#[error("two-factor is already enabled for this account; set TOTP_SECRET instead")]
	AlreadyEnrolled,

	#[error("no candidate matched target: {target}")]
	TargetNotFound { target: String },

	#[error("timeout after {ms}ms waiting for: {condition}")]
	Timeout { ms: u64, condition: String },

	#[error("missing environment variable {0}")]
	MissingEnv(&'static str),

	#[error("invalid value for {name}: {reason}")]
	InvalidEnv { name: &'static str, reason: String },

	/// Failure reported by the browser backend.
	#[error("browser: {0}")]
	Driver(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Wraps any backend error as [`Error::Driver`].
	pub fn driver(err: impl std::fmt::Display) -> Self {
		Error::Driver(err.to_string())
	}

	/// True for errors that mean "log in again" rather than "give up".
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Error::Corrupt { .. })
	}
}
