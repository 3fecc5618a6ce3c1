use clap::Parser;
use play_release::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout is reserved for the release progress lines.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Parsed arguments");

    run(cli).await.inspect_err(|e| {
        tracing::error!(error = %e, "play-release failed");
    })
}
