use clap::Parser;

pub mod command;

/// Print page approximation for EPUB 2 and EPUB 3 books.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub paginate: command::Paginate,
}

/// Initialise logging from the `PAGEMARK_LOG` environment variable.
pub fn init_logger() {
    let env = env_logger::Env::default().filter("PAGEMARK_LOG");
    env_logger::init_from_env(env);
}
