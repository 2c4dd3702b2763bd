use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Management CLI for the logging proxy", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PROXY_URL", default_value = "http://localhost:5443")]
    url: String,

    /// Accept self-signed certificates on the proxy's own listener.
    #[arg(long)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy status and route
    Health,
    /// Show the newest logged requests
    Logs {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete every logged request
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(cli.insecure)
        .build()?;
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Logs { limit } => {
            let res = client
                .get(format!("{}/log/records", base))
                .query(&[("limit", limit)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Clear => {
            let res = client.post(format!("{}/log/delete", base)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
