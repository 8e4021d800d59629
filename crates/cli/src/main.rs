use clap::Parser;
use ew_cli::cli::Cli;
use ew_cli::error::CliError;
use ew_cli::output::{self, OutputFormat, ResultBuilder};
use ew_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = commands::command_name(&cli.command);

	if let Err(err) = commands::dispatch(cli).await {
		handle_error(command, err, format);
		std::process::exit(1);
	}
}

fn handle_error(command: &str, err: CliError, format: OutputFormat) {
	let error = err.to_command_error();

	output::print_error_stderr(&error);

	if format == OutputFormat::Json {
		let result = ResultBuilder::<()>::new(command).error(error).build();
		output::print_result(&result, format);
	}
}
