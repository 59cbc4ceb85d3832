use clap::Parser;
use log::{error, info};
use server::{ChatServer, ServerConfig};
use shared::{DEFAULT_HOST, DEFAULT_KEY, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Shared key used to obfuscate every frame
    #[arg(short, long, default_value = DEFAULT_KEY)]
    key: String,

    /// JSON file holding the list of quotes
    #[arg(short, long, default_value = "quotes.json")]
    quotes: PathBuf,

    /// Append-only chat history file
    #[arg(short = 'l', long, default_value = "chat_log.txt")]
    chat_log: PathBuf,

    /// Maximum number of concurrent clients (0 = unlimited)
    #[arg(short, long, default_value_t = 0)]
    max_clients: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            key: args.key,
            quotes_path: args.quotes,
            chat_log_path: args.chat_log,
            max_clients: args.max_clients,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(serve(config));

    // The console's pending stdin read sits on a blocking thread; don't wait for it
    runtime.shutdown_timeout(Duration::from_millis(100));

    result
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting server on {}...", config.bind_address());
    let server = ChatServer::from_config(&config).await?;

    let console = server.admin_console();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = console.run(stdin, tokio::io::stdout()).await {
            error!("Admin console failed: {}", e);
        }
    });

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            shutdown.trigger();
        }
    });

    info!("Admin commands: LIST, BROADCAST <message>, SHUTDOWN");
    server.run().await?;

    info!("Server stopped");
    Ok(())
}
