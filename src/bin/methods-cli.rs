use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use server_methods::client::{ClientDispatch, HttpTransport, Transport};
use server_methods::config::{load_config, ClientConfig, ConfigError};
use server_methods::wire::MethodManifest;

#[derive(Parser)]
#[command(name = "methods-cli")]
#[command(about = "Call methods on a Server Methods service", long_about = None)]
struct Cli {
    /// Config file whose `[client]` section supplies the defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the service, including its base path.
    #[arg(short, long)]
    url: Option<String>,

    #[arg(short, long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the methods the service advertises
    List,
    /// Call a method; each argument is parsed as JSON, or taken as a string
    Call {
        method: String,
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let transport = Arc::new(HttpTransport::from_config(&client_config(&cli)?)?);

    match cli.command {
        Commands::List => {
            let response = transport.manifest().await?;
            if !response.is_success() {
                eprintln!("Error: service returned status {}", response.status);
                eprintln!("Response: {}", response.body);
                return Ok(());
            }
            let manifest: MethodManifest = serde_json::from_str(&response.body)?;
            for (name, info) in manifest.iter() {
                let verbs: Vec<&str> = info.verbs.iter().map(|v| v.as_str()).collect();
                println!(
                    "{:<24} {:<24} ({})  [{}]",
                    name,
                    info.url.as_deref().unwrap_or("-"),
                    info.params.join(", "),
                    verbs.join(" ")
                );
                if let Some(docs) = &info.docs {
                    println!("    {}", docs);
                }
            }
        }
        Commands::Call { method, args } => {
            let dispatch = ClientDispatch::new(transport);
            dispatch.connect().await?;

            let args = args.iter().map(|raw| parse_arg(raw)).collect();
            match dispatch.call(&method, args)?.await {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }

    Ok(())
}

/// `[client]` from `--config` (or defaults), overridden by `--url` and `--timeout-secs`.
fn client_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let mut client = match &cli.config {
        Some(path) => load_config(path)?.client,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.url {
        client.base_url = url.clone();
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        client.timeout_secs = timeout_secs;
    }
    Ok(client)
}

fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
