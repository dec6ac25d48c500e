//! shardex: a data-skipping index service.
//!
//! Two subcommands, matching `original_source`'s split between building an
//! index (`core/petals.py`'s filter generators) and serving it (`core/
//! server.py`'s `TCPServer`): `build` walks a data directory and writes
//! filter blobs plus a manifest; `serve` loads a catalog and answers queries
//! over the tag-delimited XML wire protocol.

mod commands;
mod error;
mod handlers;
mod logging;

use clap::Parser;
use error::Error;

#[derive(Debug, Parser)]
#[clap(name = "shardexd", about = "shardex: a data-skipping index service")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Build filter blobs and a manifest for a data directory.
    Build(commands::build::Config),
    /// Serve queries against an already-built index.
    Serve(commands::serve::Config),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    logging::init();

    let args = Args::parse();
    match args.command {
        Command::Build(config) => commands::build::run(config).await,
        Command::Serve(config) => commands::serve::run(config).await,
    }
}
