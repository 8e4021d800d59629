#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Session cache, TOTP and environment helpers for the e-wallet admin suite.
#[derive(Parser, Debug)]
#[command(name = "ew")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Auth state file (defaults to playwright/.auth/user.json under the project root)
	#[arg(long, global = true, value_name = "FILE")]
	pub auth_file: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Inspect and manage the cached authentication state.
	Auth(AuthArgs),
	/// Print the current one-time password.
	Totp(TotpArgs),
	/// Manage the environment file.
	Env(EnvArgs),
}

#[derive(Args, Debug)]
pub struct AuthArgs {
	#[command(subcommand)]
	pub action: AuthAction,
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
	/// Report whether the cached state exists and is fresh (always exits 0).
	Check,
	/// Delete the cached state and its directory when empty.
	Cleanup,
	/// Summarize the cookies and localStorage of a state file.
	Show {
		/// State file to inspect (defaults to the cached state)
		#[arg(value_name = "FILE")]
		file: Option<PathBuf>,
	},
	/// Sign in through a real browser and cache the resulting state.
	Setup(SetupArgs),
	/// Enable two-factor on an account without it and print the new TOTP secret.
	Enroll(EnrollArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetupArgs {
	/// Show the browser window
	#[arg(long)]
	pub headed: bool,

	/// Keep a fresh cached state instead of signing in again
	#[arg(long)]
	pub reuse: bool,

	/// Chrome executable to use instead of discovering one
	#[arg(long, value_name = "PATH")]
	pub chrome: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EnrollArgs {
	/// Show the browser window
	#[arg(long)]
	pub headed: bool,

	/// Chrome executable to use instead of discovering one
	#[arg(long, value_name = "PATH")]
	pub chrome: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TotpArgs {
	/// Base32 secret (defaults to TOTP_SECRET)
	#[arg(long, value_name = "SECRET")]
	pub secret: Option<String>,
}

#[derive(Args, Debug)]
pub struct EnvArgs {
	#[command(subcommand)]
	pub action: EnvAction,
}

#[derive(Subcommand, Debug)]
pub enum EnvAction {
	/// Check for .env and write a config.env template when neither file exists.
	Init,
}

fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
		.error(AnsiColor::Red.on_default().bold())
}
