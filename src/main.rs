//! Messenger client - Main entry point
//!
//! A command-line chat client with read receipts and presence.

use clap::Parser;
use log::info;
use messenger_client::ChatClient;

#[derive(Parser)]
#[command(name = "messenger")]
#[command(about = "Messenger client - one-to-one chat with read receipts")]
struct Args {
    /// Server URL (default: http://localhost:4000)
    #[arg(long, default_value = "http://localhost:4000")]
    server: String,

    /// Username for this session
    username: String,

    /// Enable verbose logging (DEBUG level)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    info!("Starting messenger client");
    info!("Server: {}", args.server);
    info!("Username: {}", args.username);

    let (client, events) = ChatClient::connect(&args.server, &args.username).await?;

    // Seed the store once; everything after this arrives over the push channel.
    client.initialize().await?;

    client.run(events).await?;

    Ok(())
}
