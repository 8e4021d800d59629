use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("no auth state at {}", .0.display())]
	AuthFileMissing(PathBuf),

	#[error(transparent)]
	Core(#[from] ew::Error),

	#[error(transparent)]
	Browser(#[from] ew_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::AuthFileMissing(_) => ErrorCode::AuthStateError,
			CliError::Core(err) => core_code(err),
			CliError::Browser(ew_runtime::Error::NoMatch(_)) => ErrorCode::SelectorNotFound,
			CliError::Browser(
				ew_runtime::Error::ChromeNotFound(_)
				| ew_runtime::Error::ChromeNotRunnable(_)
				| ew_runtime::Error::LaunchFailed(_)
				| ew_runtime::Error::Fetch(_),
			) => ErrorCode::BrowserLaunchFailed,
			CliError::Browser(_) => ErrorCode::InternalError,
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Json(_) | CliError::Anyhow(_) => ErrorCode::InternalError,
		}
	}

	pub fn to_command_error(&self) -> CommandError {
		let details = match self {
			CliError::AuthFileMissing(path) => Some(serde_json::json!({ "path": path })),
			CliError::Core(ew::Error::Timeout { ms, condition }) => {
				Some(serde_json::json!({ "timeoutMs": ms, "condition": condition }))
			}
			CliError::Core(ew::Error::TargetNotFound { target }) => Some(serde_json::json!({ "target": target })),
			CliError::Core(ew::Error::MissingEnv(name)) => Some(serde_json::json!({ "variable": name })),
			_ => None,
		};
		CommandError {
			code: self.code(),
			message: error_chain(self),
			details,
		}
	}
}

fn core_code(err: &ew::Error) -> ErrorCode {
	use ew::Error;
	match err {
		Error::InvalidSecret(_) | Error::OtpRejected { .. } | Error::AlreadyEnrolled => ErrorCode::AuthError,
		Error::Write { .. } | Error::Read { .. } | Error::Corrupt { .. } => ErrorCode::AuthStateError,
		Error::MissingEnv(_) | Error::InvalidEnv { .. } => ErrorCode::ConfigError,
		Error::TargetNotFound { .. } => ErrorCode::SelectorNotFound,
		Error::Timeout { .. } => ErrorCode::Timeout,
		Error::Io(_) => ErrorCode::IoError,
		Error::Driver(_) => ErrorCode::InternalError,
	}
}

/// Message with its sources, `outer: inner: root`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
	let mut message = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		let cause_text = cause.to_string();
		if !message.ends_with(&cause_text) {
			message.push_str(": ");
			message.push_str(&cause_text);
		}
		source = cause.source();
	}
	message
}
