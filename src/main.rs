//! `kfs` — CLI wrapper around the KFS embedded file store library.

use clap::Parser;
use kfs::cli::Cli;

#[tokio::main]
async fn main() {
    kfs::init_tracing();
    let cli = Cli::parse();
    let code = kfs::cli::run(cli).await;
    std::process::exit(code);
}
