//! Command implementations.

mod auth;
mod env;
mod totp;

use std::path::PathBuf;

use ew::{AuthStore, Config, Project};
use serde::Serialize;
use tracing::debug;

use crate::cli::{AuthAction, Cli, Commands, EnvAction};
use crate::error::Result;
use crate::output::{self, CommandResult, OutputFormat};

/// What every command needs: where the project is and how to print.
pub struct Context {
	pub project: Project,
	pub format: OutputFormat,
	auth_file: Option<PathBuf>,
}

impl Context {
	pub fn new(project: Project, format: OutputFormat, auth_file: Option<PathBuf>) -> Self {
		Self {
			project,
			format,
			auth_file,
		}
	}

	/// The `--auth-file` override, or the project's cache slot.
	pub fn store(&self) -> AuthStore {
		match &self.auth_file {
			Some(path) => AuthStore::new(path.clone()),
			None => self.project.paths.auth_store(),
		}
	}

	/// Loads `.env` (or `config.env`) from the project root, then the environment.
	pub fn config(&self) -> Result<Config> {
		Ok(Config::load(self.project.root())?)
	}

	pub fn emit<T: Serialize>(&self, result: &CommandResult<T>) {
		output::print_result(result, self.format);
	}
}

/// Dotted name used in the result envelope.
pub fn command_name(command: &Commands) -> &'static str {
	match command {
		Commands::Auth(args) => match args.action {
			AuthAction::Check => "auth.check",
			AuthAction::Cleanup => "auth.cleanup",
			AuthAction::Show { .. } => "auth.show",
			AuthAction::Setup(_) => "auth.setup",
			AuthAction::Enroll(_) => "auth.enroll",
		},
		Commands::Totp(_) => "totp",
		Commands::Env(args) => match args.action {
			EnvAction::Init => "env.init",
		},
	}
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let project = Project::current()?;
	debug!(
		target = "ew",
		root = %project.root().display(),
		detected = project.detected,
		"project"
	);
	let ctx = Context::new(project, cli.format, cli.auth_file);

	match cli.command {
		Commands::Auth(args) => match args.action {
			AuthAction::Check => auth::check(&ctx),
			AuthAction::Cleanup => auth::cleanup(&ctx),
			AuthAction::Show { file } => auth::show(&ctx, file),
			AuthAction::Setup(args) => auth::setup(&ctx, &args).await,
			AuthAction::Enroll(args) => auth::enroll(&ctx, &args).await,
		},
		Commands::Totp(args) => totp::totp(&ctx, &args),
		Commands::Env(args) => match args.action {
			EnvAction::Init => env::init(&ctx),
		},
	}
}
