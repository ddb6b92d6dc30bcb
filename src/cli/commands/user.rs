use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::Role;
use crate::database::DatabaseManager;
use crate::services::AccountService;
use crate::validation::validate_register;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an account (use this to bootstrap the first admin)")]
    Create {
        #[arg(help = "Login email, RMXXX@<domain> or the admin email")]
        email: String,
        #[arg(help = "RM number, RMXXX")]
        rm_number: String,
        #[arg(long, env = "RMCTL_PASSWORD", help = "Initial password")]
        password: Option<String>,
        #[arg(long, default_value = "user", help = "admin or user")]
        role: String,
    },

    #[command(about = "List all accounts")]
    List,

    #[command(about = "Change the role of an account")]
    SetRole {
        #[arg(help = "RM number")]
        rm_number: String,
        #[arg(help = "admin or user")]
        role: String,
    },

    #[command(about = "Delete an account and its page permissions")]
    Delete {
        #[arg(help = "RM number")]
        rm_number: String,
    },
}

fn parse_role(value: &str) -> anyhow::Result<Role> {
    match value {
        "admin" => Ok(Role::Admin),
        "user" => Ok(Role::User),
        other => anyhow::bail!("unknown role '{}', expected admin or user", other),
    }
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let result = run(cmd, output_format).await;
    DatabaseManager::close().await;
    result
}

async fn run(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let accounts = AccountService::new().await?;

    match cmd {
        UserCommands::Create {
            email,
            rm_number,
            password,
            role,
        } => {
            let role = parse_role(&role)?;
            let password = password
                .ok_or_else(|| anyhow::anyhow!("--password or RMCTL_PASSWORD is required"))?;

            let errors = validate_register(&email, &password, Some(&rm_number), role, &config().accounts);
            if !errors.is_empty() {
                let details: Vec<String> =
                    errors.iter().map(|e| format!("{}: {}", e.field, e.msg)).collect();
                anyhow::bail!("invalid account: {}", details.join("; "));
            }

            let account = accounts
                .create(&email, &rm_number, &hash_password(&password)?, role)
                .await?;

            output_success(
                output_format,
                &format!("Created {} account {}", account.role, account.rm_number),
                Some(json!({ "user": account })),
            )?;
        }
        UserCommands::List => {
            let users = accounts.list().await?;
            if users.is_empty() {
                return output_empty_collection(output_format, "users", "No accounts");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<6} {:<10} {:<8} {:<32} {}", "ID", "RM", "ROLE", "EMAIL", "CREATED");
                    println!("{}", "-".repeat(80));
                    for user in &users {
                        println!(
                            "{:<6} {:<10} {:<8} {:<32} {}",
                            user.rm_account_id,
                            user.rm_number,
                            user.role,
                            user.email,
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
        }
        UserCommands::SetRole { rm_number, role } => {
            let account = accounts.set_role(&rm_number, parse_role(&role)?).await?;
            output_success(
                output_format,
                &format!("{} is now {}", account.rm_number, account.role),
                Some(json!({ "user": account })),
            )?;
        }
        UserCommands::Delete { rm_number } => {
            accounts.delete_by_rm_number(&rm_number).await?;
            output_success(
                output_format,
                &format!("Deleted account {}", rm_number),
                Some(json!({ "rm_number": rm_number })),
            )?;
        }
    }

    Ok(())
}
