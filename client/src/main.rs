use clap::Parser;
use client::input::Prompter;
use client::{ChatClient, Session};
use log::info;
use shared::{DEFAULT_HOST, DEFAULT_KEY, DEFAULT_PORT};
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to (defaults to 127.0.0.1:5050)
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Shared key used to obfuscate every frame
    #[arg(short, long, default_value = DEFAULT_KEY)]
    key: String,

    /// Username attached to chat messages; asked for when omitted
    #[arg(short, long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let server = args
        .server
        .unwrap_or_else(|| format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT));

    let mut prompter = Prompter::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    prompter.say("=== Chat Client ===").await?;

    let username = match args.user {
        Some(user) => user,
        None => prompter.ask("Enter username: ").await?.unwrap_or_default(),
    };
    let username = if username.trim().is_empty() {
        "User".to_string()
    } else {
        username.trim().to_string()
    };

    info!("Connecting to: {}", server);
    prompter.say("Connecting...").await?;
    let client = ChatClient::connect(server.as_str(), args.key.as_bytes()).await?;
    prompter.say("Connected!\n").await?;

    Session::new(client, prompter, username).run().await?;

    Ok(())
}
