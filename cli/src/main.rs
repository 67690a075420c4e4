mod commands;
mod terminal;

use commands::{CommandLine, rank};
use relayr_common::config::Config;
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();
    let cfg: Config = commands.config();

    logging::init_logging(cfg.verbose)?;

    rank::rank(&commands, &cfg).await
}
