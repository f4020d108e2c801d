use clap::Parser;
use common::config::Config;
use std::path::PathBuf;

/// Relay webhook deliveries to hookwatch over a newline-delimited JSON stream
#[derive(Debug, Parser)]
#[command(name = "hookwatch-relay", version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOOKWATCH_RELAY_HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long, env = "HOOKWATCH_RELAY_PORT")]
    port: Option<u16>,

    /// Config file (defaults to the platform config path)
    #[arg(long, env = "HOOKWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut server = config.server;
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }

    relay_server::run_server_blocking(server).await
}
