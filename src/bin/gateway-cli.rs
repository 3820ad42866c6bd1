use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Client for the JSON to SOAP gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the health endpoint
    Status,
    /// Post a JSON envelope file to /RestApi-call
    Call {
        /// File holding `{ "Header": {...}, "<Operation>": {...} }`
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/statusCheck", cli.url)).send().await?;
            // The health endpoint answers 400 by default; show it as is.
            println!("{}", res.status());
            println!("{}", res.text().await?);
        }
        Commands::Call { file } => {
            let envelope: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let res = client
                .post(format!("{}/RestApi-call", cli.url))
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&envelope)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
