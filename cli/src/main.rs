use clap::Parser;
use pagemark_cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    pagemark_cli::init_logger();
    let cli = Cli::parse();

    cli.paginate.run()
}
