//! `ew env init`: make sure credentials have somewhere to live.

use std::path::PathBuf;

use colored::Colorize;
use ew::config::{self, EnvFileStatus, VARIABLES};
use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::output::ResultBuilder;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvInitData {
	status: &'static str,
	path: PathBuf,
	variables: Vec<&'static str>,
}

pub fn init(ctx: &Context) -> Result<()> {
	let status = config::init_env_file(ctx.project.root())?;

	let mut result = ResultBuilder::new("env.init");
	let (label, path) = match status {
		EnvFileStatus::EnvPresent(path) => {
			result = result.line(format!("{} {} already exists", "ok".green(), path.display()));
			("envPresent", path)
		}
		EnvFileStatus::TemplatePresent(path) => {
			result = result
				.line(format!("{} {} exists", "ok".green(), path.display()))
				.line(format!(
					"Copy it to {} and fill in your credentials",
					config::ENV_FILE
				));
			("templatePresent", path)
		}
		EnvFileStatus::TemplateCreated(path) => {
			result = result
				.line(format!("{} {} with placeholder values", "Created".green(), path.display()))
				.line("Update it with your credentials");
			("templateCreated", path)
		}
	};

	result = result.line("").line("Variables:".bold().to_string());
	for (name, description) in VARIABLES {
		result = result.line(format!("  {name:<16} {description}"));
	}
	result = result
		.line("")
		.line("Next: ew auth setup")
		.line(format!("Variables can also be set in the shell, e.g. {}", "export EMAIL=you@example.com".cyan()));

	ctx.emit(
		&result
			.data(EnvInitData {
				status: label,
				path,
				variables: VARIABLES.iter().map(|(name, _)| *name).collect(),
			})
			.build(),
	);
	Ok(())
}
