use clap::Parser;
use log::info;
use server::{Server, ServerConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8888")]
    port: u16,

    /// Responses buffered between handlers and the send loop
    #[arg(long, default_value = "100")]
    channel_capacity: usize,

    /// Maximum number of requests handled concurrently
    #[arg(long, default_value = "64")]
    max_in_flight: usize,

    /// Per-request deadline in milliseconds
    #[arg(long, default_value = "5000")]
    request_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        channel_capacity: args.channel_capacity,
        max_in_flight: args.max_in_flight,
        request_timeout: Duration::from_millis(args.request_timeout_ms),
    };

    info!("Starting server on {}", config.bind_addr);
    let handle = Server::start(config).await?;

    tokio::select! {
        _ = handle.join() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            handle.stop();
            handle.join().await;
        }
    }

    info!("Server exited with {} known sessions", handle.sessions().len());
    Ok(())
}
