use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fluidgas_intent::{Intent, RawIntent};
use log::info;
use std::{
    io::{self, Read},
    path::PathBuf,
};

#[derive(Debug, Parser)]
#[command(name = "fluidgas-intent", version, about = "FluidGas bridge intent tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Coerce a raw model reply (JSON object) into an intent
    Coerce {
        /// File holding the reply; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Send a prompt to a running backend and print the prepared parameters
    Prepare {
        #[arg(short, long)]
        prompt: String,
        /// Sepolia address the transfer is sent from
        #[arg(short, long)]
        sender: String,
        #[arg(long, env = "FLUIDGAS_ENDPOINT", default_value = "http://localhost:3001")]
        endpoint: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match Cli::parse().command {
        Command::Coerce { file } => coerce(file),
        Command::Prepare {
            prompt,
            sender,
            endpoint,
        } => prepare(&endpoint, &prompt, &sender).await,
    }
}

fn coerce(file: Option<PathBuf>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let raw: RawIntent = serde_json::from_str(&text).context("reply is not a JSON object")?;
    let intent = Intent::from_raw(raw)?;
    println!("{}", serde_json::to_string_pretty(&intent)?);

    if !intent.is_complete() {
        eprintln!("incomplete intent, missing: {}", intent.missing_fields().join(", "));
    }
    Ok(())
}

async fn prepare(endpoint: &str, prompt: &str, sender: &str) -> Result<()> {
    let url = format!("{}/api/prompt/prepare-bridge", endpoint.trim_end_matches('/'));
    info!("Posting prompt to {}", url);

    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({
            "prompt": prompt,
            "userSourceAddress": sender,
        }))
        .send()
        .await
        .with_context(|| format!("backend unreachable at {}", endpoint))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.context("backend reply is not JSON")?;

    println!("{}", status);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
