//! Environment configuration.
//!
//! Credentials and the target deployment come from the environment, usually
//! via a `.env` file next to the project. `config.env` is read as a fallback
//! so a freshly generated template works before it is renamed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://ewallet.walletwhisper.io";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

pub const ENV_FILE: &str = ".env";
pub const TEMPLATE_ENV_FILE: &str = "config.env";

/// Variables the suite reads, in the order they are documented.
pub const VARIABLES: [(&str, &str); 5] = [
	("EMAIL", "Admin email address"),
	("PASSWORD", "Admin password"),
	("TOTP_SECRET", "Base32 TOTP secret for 2FA"),
	("BASE_URL", "Base URL of the admin panel (default: https://ewallet.walletwhisper.io)"),
	("TIMEOUT_DEFAULT", "Test timeout in milliseconds (default: 60000)"),
];

pub struct Config {
	pub email: Option<String>,
	pub password: Option<SecretString>,
	pub totp_secret: Option<SecretString>,
	pub base_url: String,
	pub timeout: Duration,
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("email", &self.email)
			.field("password", &self.password.as_ref().map(|_| "[redacted]"))
			.field("totp_secret", &self.totp_secret.as_ref().map(|_| "[redacted]"))
			.field("base_url", &self.base_url)
			.field("timeout", &self.timeout)
			.finish()
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			email: None,
			password: None,
			totp_secret: None,
			base_url: DEFAULT_BASE_URL.to_string(),
			timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
		}
	}
}

impl Config {
	/// Loads `.env` (or `config.env`) from `root`, then reads the process environment.
	///
	/// Variables already set in the environment win over the files.
	pub fn load(root: &Path) -> Result<Self> {
		for name in [ENV_FILE, TEMPLATE_ENV_FILE] {
			let path = root.join(name);
			if path.is_file() {
				match dotenvy::from_path(&path) {
					Ok(()) => {
						debug!(target = "ew", path = %path.display(), "loaded environment file");
						break;
					}
					Err(err) => {
						return Err(Error::InvalidEnv {
							name: "env file",
							reason: format!("{}: {err}", path.display()),
						});
					}
				}
			}
		}
		Self::from_env()
	}

	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds a config from any key/value source.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

		let timeout = match get("TIMEOUT_DEFAULT") {
			Some(raw) => {
				let ms = raw.parse::<u64>().map_err(|e| Error::InvalidEnv {
					name: "TIMEOUT_DEFAULT",
					reason: format!("{raw:?}: {e}"),
				})?;
				Duration::from_millis(ms)
			}
			None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
		};

		let base_url = get("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
		url::Url::parse(&base_url).map_err(|e| Error::InvalidEnv {
			name: "BASE_URL",
			reason: format!("{base_url:?}: {e}"),
		})?;

		Ok(Self {
			email: get("EMAIL"),
			password: get("PASSWORD").map(SecretString::from),
			totp_secret: get("TOTP_SECRET").map(SecretString::from),
			base_url: base_url.trim_end_matches('/').to_string(),
			timeout,
		})
	}

	pub fn email(&self) -> Result<&str> {
		self.email.as_deref().ok_or(Error::MissingEnv("EMAIL"))
	}

	pub fn password(&self) -> Result<&str> {
		self.password.as_ref().map(|s| s.expose_secret()).ok_or(Error::MissingEnv("PASSWORD"))
	}

	pub fn totp_secret(&self) -> Result<&str> {
		self.totp_secret
			.as_ref()
			.map(|s| s.expose_secret())
			.ok_or(Error::MissingEnv("TOTP_SECRET"))
	}

	/// Joins `path` onto the base URL.
	pub fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	/// Scheme, host and port of the base URL, as used for localStorage origins.
	pub fn origin(&self) -> String {
		url::Url::parse(&self.base_url)
			.map(|u| u.origin().ascii_serialization())
			.unwrap_or_else(|_| self.base_url.clone())
	}
}

/// Contents written by [`init_env_file`] when no configuration exists yet.
pub fn env_template() -> String {
	format!(
		"# EWallet Test Environment Variables\n\
		 # Replace these with your actual credentials\n\
		 EMAIL=your-email@example.com\n\
		 PASSWORD=your-password\n\
		 TOTP_SECRET=your-totp-secret-key\n\
		 BASE_URL={DEFAULT_BASE_URL}\n\
		 TIMEOUT_DEFAULT={DEFAULT_TIMEOUT_MS}\n"
	)
}

/// What [`init_env_file`] found or did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileStatus {
	/// `.env` is already in place.
	EnvPresent(PathBuf),
	/// Only `config.env` exists; it should be copied to `.env` and edited.
	TemplatePresent(PathBuf),
	/// No configuration existed; a placeholder `config.env` was written.
	TemplateCreated(PathBuf),
}

pub fn init_env_file(root: &Path) -> Result<EnvFileStatus> {
	let env_path = root.join(ENV_FILE);
	if env_path.exists() {
		return Ok(EnvFileStatus::EnvPresent(env_path));
	}

	let template_path = root.join(TEMPLATE_ENV_FILE);
	if template_path.exists() {
		return Ok(EnvFileStatus::TemplatePresent(template_path));
	}

	std::fs::write(&template_path, env_template())?;
	Ok(EnvFileStatus::TemplateCreated(template_path))
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use tempfile::TempDir;

	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn defaults_apply_when_unset() {
		let config = Config::from_lookup(lookup(&[])).unwrap();
		assert_eq!(config.base_url, DEFAULT_BASE_URL);
		assert_eq!(config.timeout, Duration::from_millis(60_000));
		assert!(matches!(config.email(), Err(Error::MissingEnv("EMAIL"))));
		assert!(matches!(config.totp_secret(), Err(Error::MissingEnv("TOTP_SECRET"))));
	}

	#[test]
	fn reads_all_variables() {
		let config = Config::from_lookup(lookup(&[
			("EMAIL", "admin@example.com"),
			("PASSWORD", "hunter2"),
			("TOTP_SECRET", "MGNA5HIZKTHIFEYZ"),
			("BASE_URL", "https://staging.example.io/"),
			("TIMEOUT_DEFAULT", "15000"),
		]))
		.unwrap();

		assert_eq!(config.email().unwrap(), "admin@example.com");
		assert_eq!(config.password().unwrap(), "hunter2");
		assert_eq!(config.totp_secret().unwrap(), "MGNA5HIZKTHIFEYZ");
		assert_eq!(config.url("/admin/login"), "https://staging.example.io/admin/login");
		assert_eq!(config.origin(), "https://staging.example.io");
		assert_eq!(config.timeout, Duration::from_secs(15));
	}

	#[test]
	fn blank_values_count_as_missing() {
		let config = Config::from_lookup(lookup(&[("EMAIL", "  "), ("BASE_URL", "")])).unwrap();
		assert!(config.email.is_none());
		assert_eq!(config.base_url, DEFAULT_BASE_URL);
	}

	#[test]
	fn bad_timeout_is_rejected() {
		let err = Config::from_lookup(lookup(&[("TIMEOUT_DEFAULT", "soon")])).unwrap_err();
		assert!(matches!(err, Error::InvalidEnv { name: "TIMEOUT_DEFAULT", .. }));
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let config = Config::from_lookup(lookup(&[("PASSWORD", "hunter2"), ("TOTP_SECRET", "MGNA5HIZKTHIFEYZ")])).unwrap();
		let debug = format!("{config:?}");
		assert!(!debug.contains("hunter2"));
		assert!(!debug.contains("MGNA5HIZKTHIFEYZ"));
	}

	#[test]
	fn init_env_file_creates_template_once() {
		let tmp = TempDir::new().unwrap();

		let status = init_env_file(tmp.path()).unwrap();
		let path = tmp.path().join(TEMPLATE_ENV_FILE);
		assert_eq!(status, EnvFileStatus::TemplateCreated(path.clone()));
		let written = std::fs::read_to_string(&path).unwrap();
		assert!(written.contains("TOTP_SECRET=your-totp-secret-key"));

		assert_eq!(init_env_file(tmp.path()).unwrap(), EnvFileStatus::TemplatePresent(path));

		std::fs::write(tmp.path().join(ENV_FILE), "EMAIL=a@b.c\n").unwrap();
		assert!(matches!(init_env_file(tmp.path()).unwrap(), EnvFileStatus::EnvPresent(_)));
	}
}
