use clap::Parser;
use tfs_cli::cli::Cli;
use tfs_cli::output::{CommandResult, print_result};
use tfs_cli::{commands, logging};
use tracing::error;

fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let name = commands::command_name(&cli.command);
	let outcome = commands::dispatch(&cli.command, &cli.server);

	let printed = match &outcome {
		Ok(data) => print_result(&CommandResult::success(name, data)),
		Err(err) => {
			error!(target = "tfs.cli", command = name, error = %err, "command failed");
			print_result(&CommandResult::failure(name, err))
		}
	};

	if outcome.is_err() || printed.is_err() {
		std::process::exit(1);
	}
}
