use clap::Parser;

use gramalign::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();
    cli::set_log_level(cli.verbose, cli.quiet);

    if let Err(err) = cli::run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
