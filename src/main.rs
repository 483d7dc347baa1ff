mod cli;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let result = cli::build_config(&cli).and_then(|config| {
        fee_policy::logger::init(config.get_log_level())?;
        cli::run(cli, &config)
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
