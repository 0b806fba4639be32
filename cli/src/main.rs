mod commands;
mod terminal;

use commands::{CommandLine, Commands, craft, dns, ping, scan};
use phantom_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands: CommandLine = CommandLine::parse_args();

    let cfg: Config = Config {
        quiet: commands.quiet,
        verbose: commands.verbose,
        no_banner: commands.no_banner,
    };

    logging::init_logging(&cfg);
    print::banner(&cfg);

    match commands.command {
        Commands::Dns(args) => dns::dns(args, &cfg).await,
        Commands::Scan(args) => scan::scan(args, &cfg).await,
        Commands::Ping(args) => ping::ping(args, &cfg).await,
        Commands::Craft(args) => craft::craft(args, &cfg).await,
    }
}
