use clap::Parser;
use client::{Client, ClientConfig};
use log::info;
use shared::{LoginRequest, Response, ShutdownRequest};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8888")]
    server: String,

    /// Account name sent with the login request
    #[arg(short = 'a', long, default_value = "guest")]
    account: String,

    /// Password sent with the login request
    #[arg(short = 'p', long, default_value = "")]
    password: String,

    /// Ask the server to shut down after logging in
    #[arg(long)]
    shutdown: bool,

    /// Response timeout in milliseconds
    #[arg(short = 't', long, default_value = "10000")]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let config = ClientConfig {
        timeout: Duration::from_millis(args.timeout_ms),
    };
    let mut client = Client::connect_with(&args.server, config).await?;

    if let Response::Login(ack) = client
        .request(LoginRequest::new(args.account, args.password))
        .await?
    {
        println!("{}", ack.welcome);
        println!("session id: {}", ack.header.session_id);
    }

    if args.shutdown {
        client.request(ShutdownRequest::new()).await?;
        println!("server is shutting down");
    }

    client.close();
    Ok(())
}
