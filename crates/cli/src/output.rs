//! Result envelope shared by every command.
//!
//! With `--format json` each command prints one object on stdout:
//!
//! ```json
//! { "ok": true, "command": "auth.check", "data": { ... } }
//! ```
//!
//! and on failure:
//!
//! ```json
//! { "ok": false, "command": "auth.setup", "error": { "code": "AUTH_ERROR", "message": "..." } }
//! ```
//!
//! `--format text` prints the command's human summary instead.

use std::io::{self, Write};

use colored::Colorize;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable summary
	#[default]
	Text,
	/// JSON envelope
	Json,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T> {
	pub ok: bool,

	/// Dotted command name, e.g. `auth.check`.
	pub command: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	/// Lines printed in text mode.
	#[serde(skip)]
	pub summary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	pub message: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Stable codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Credentials, TOTP secret or OTP were refused
	AuthError,
	/// The snapshot file is missing or unreadable
	AuthStateError,
	/// Required configuration is missing or malformed
	ConfigError,
	/// Chrome could not be found, fetched or started
	BrowserLaunchFailed,
	/// A page element never appeared
	SelectorNotFound,
	Timeout,
	IoError,
	InvalidInput,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let code = match self {
			ErrorCode::AuthError => "AUTH_ERROR",
			ErrorCode::AuthStateError => "AUTH_STATE_ERROR",
			ErrorCode::ConfigError => "CONFIG_ERROR",
			ErrorCode::BrowserLaunchFailed => "BROWSER_LAUNCH_FAILED",
			ErrorCode::SelectorNotFound => "SELECTOR_NOT_FOUND",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(code)
	}
}

pub struct ResultBuilder<T> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	summary: Vec<String>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			summary: Vec::new(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn line(mut self, line: impl Into<String>) -> Self {
		self.summary.push(line.into());
		self
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			ok: self.error.is_none() && self.data.is_some(),
			command: self.command,
			data: self.data,
			error: self.error,
			summary: self.summary,
		}
	}
}

pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if let Some(error) = &result.error {
		let _ = writeln!(stdout, "{} [{}]: {}", "Error".red().bold(), error.code, error.message);
		return;
	}
	if !result.summary.is_empty() {
		for line in &result.summary {
			let _ = writeln!(stdout, "{line}");
		}
		return;
	}
	if let Some(data) = &result.data {
		if let Ok(json) = serde_json::to_string_pretty(data) {
			let _ = writeln!(stdout, "{json}");
		}
	}
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("{} [{}]: {}", "Error".red().bold(), error.code, error.message);
}
