use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;
use pac_relay::build_pac;
use pac_relay::constants::DEFAULT_PROXY_PORTS;
use pac_relay::constants::DEFAULT_SERVER_URL;
use pac_relay::default_secret_path;
use pac_relay::load_or_create_secret;
use pac_relay::local_ipv4;
use pac_relay::ClientError;
use pac_relay::PacClient;
use pac_relay::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Publish a PAC script pointing at local proxies and watch who fetches it.
#[derive(Debug, Parser)]
#[command(name = "pac-client", version)]
struct Args {
    /// Relay server base URL
    #[arg(long, env = "PAC_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Secret file (default: ~/.pac-relay.json)
    #[arg(long)]
    secret_file: Option<PathBuf>,

    /// Proxy host advertised in the script (default: detected LAN address)
    #[arg(long)]
    local_ip: Option<Ipv4Addr>,

    /// Proxy ports, tried in order
    #[arg(long = "port", value_delimiter = ',')]
    ports: Vec<u16>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let secret_path = match args.secret_file.or_else(default_secret_path) {
        Some(path) => path,
        None => {
            return Err(ClientError::SecretStore("no home directory for the secret file".into()).into())
        }
    };
    let secret = load_or_create_secret(&secret_path)?;

    let local_ip = match args.local_ip {
        Some(ip) => ip,
        None => local_ipv4()?,
    };
    let ports = if args.ports.is_empty() {
        DEFAULT_PROXY_PORTS.to_vec()
    } else {
        args.ports
    };

    let pac_content = build_pac(IpAddr::V4(local_ip), &ports);
    println!("Generated PAC configuration: \n\n{}\n", pac_content);

    let client = PacClient::new(&args.server)?;
    let id = client.upload(&pac_content, &secret).await?;
    println!("PAC URL: {}", client.pac_url(&id));
    println!("PAC uploaded successfully. Press Ctrl+C to stop serving.");

    tokio::select! {
        result = client.listen(&secret, |message| println!("Message from server: {}", message)) => {
            result?;
            info!("Server closed the notification socket");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        }
    }

    Ok(())
}
