use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Management CLI for the VANA guard service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    #[arg(short, long, env = "VANA_GUARD_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Show circuit breaker statistics
    Stats,
    /// Show the effective configuration
    Config,
    /// Inspect tracking state for one IP
    Inspect { ip: String },
    /// Clear the circuit for one IP
    Reset { ip: String },
    /// Run text through the chat input validator
    Validate { text: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Stats => client.get(format!("{base}/admin/stats")),
        Commands::Config => client.get(format!("{base}/admin/config")),
        Commands::Inspect { ip } => client.get(format!("{base}/admin/ips/{ip}")),
        Commands::Reset { ip } => client.post(format!("{base}/admin/ips/{ip}/reset")),
        Commands::Validate { text } => client
            .post(format!("{base}/admin/validate"))
            .json(&json!({ "text": text })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
