use std::time::Duration;

use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the API /health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:5000", help = "Server base URL")]
        url: String,
    },

    #[command(about = "Show server information from the API root endpoint")]
    Info {
        #[arg(long, default_value = "http://localhost:5000", help = "Server base URL")]
        url: String,
    },
}

fn endpoint(base: &str, path: &str) -> anyhow::Result<url::Url> {
    let base = url::Url::parse(base)?;
    Ok(base.join(path)?)
}

async fn fetch(url: url::Url) -> anyhow::Result<(reqwest::StatusCode, Value)> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let (status, body) = fetch(endpoint(&url, "/health")?).await?;
            let database = body["data"]["database"].as_str().unwrap_or("unavailable");

            if status.is_success() {
                output_success(
                    output_format,
                    &format!("{} is healthy (database: {})", url, database),
                    Some(json!({ "status": status.as_u16(), "health": body["data"] })),
                )?;
                Ok(())
            } else {
                output_error(
                    output_format,
                    &format!("{} answered {} (database: {})", url, status, database),
                )?;
                anyhow::bail!("server is not healthy")
            }
        }
        ServerCommands::Info { url } => {
            let (status, body) = fetch(endpoint(&url, "/")?).await?;
            if !status.is_success() {
                anyhow::bail!("{} answered {}", url, status);
            }

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
                OutputFormat::Text => {
                    let data = &body["data"];
                    println!(
                        "{} {}",
                        data["name"].as_str().unwrap_or("unknown"),
                        data["version"].as_str().unwrap_or("")
                    );
                    if let Some(endpoints) = data["endpoints"].as_object() {
                        for (name, description) in endpoints {
                            println!("  {:<18} {}", name, description.as_str().unwrap_or(""));
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_resolve_against_base_url() {
        assert_eq!(
            endpoint("http://localhost:5000", "/health").unwrap().as_str(),
            "http://localhost:5000/health"
        );
        assert_eq!(
            endpoint("https://api.example.com/prefix/", "/").unwrap().as_str(),
            "https://api.example.com/"
        );
        assert!(endpoint("not a url", "/health").is_err());
    }
}
