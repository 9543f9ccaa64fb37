use anyhow::Result;
use clap::Parser;

use garge_core::tracing_init::init_tracing;
use garge_provision::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("garge_provision=info,garge_core=info", cli.log_json);

    let mut stdout = std::io::stdout().lock();
    cli.run(&mut stdout).await
}
