mod commands;
mod terminal;

use commands::{CommandLine, Commands, monitor, scan, sources};
use forge_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; keys may come from flags or the environment.
    let _ = dotenvy::dotenv();

    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    print::banner(commands.no_banner);

    let cfg: Config = commands.config();

    match commands.command {
        Commands::Scan(args) => {
            print::header("starting scan");
            scan::scan(args, cfg).await
        }
        Commands::Monitor(args) => {
            print::header("starting monitor");
            monitor::monitor(args, cfg).await
        }
        Commands::Sources => {
            print::header("passive sources");
            sources::sources(&cfg)
        }
    }
}
