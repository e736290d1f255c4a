use clap::Parser;

mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() {
    forge_distro::init_logging();
    let cli = Cli::parse();

    if let Err(e) = commands::run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
