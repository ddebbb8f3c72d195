pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "kmci-api")]
#[command(about = "KMCI API - product catalog and account service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Use in-memory stores instead of Postgres")]
        in_memory: bool,

        #[arg(long, env = "KMCI_ADMIN_EMAIL", help = "Seed a super_admin account with this email")]
        admin_email: Option<String>,

        #[arg(long, env = "KMCI_ADMIN_PASSWORD", help = "Password for the seeded super_admin")]
        admin_password: Option<String>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate {
        #[arg(long, default_value = "migrations", help = "Migrations directory")]
        dir: String,
    },

    #[command(about = "Create an account and profile")]
    CreateUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, default_value = "viewer", help = "super_admin | editor | finance | viewer")]
        role: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve { in_memory, admin_email, admin_password } => {
            let admin = match (admin_email, admin_password) {
                (Some(email), Some(password)) => Some(commands::serve::AdminSeed { email, password }),
                (None, None) => None,
                _ => anyhow::bail!("--admin-email and --admin-password must be given together"),
            };
            commands::serve::handle(config, in_memory, admin).await
        }
        Commands::Migrate { dir } => commands::migrate::handle(config, &dir).await,
        Commands::CreateUser { email, password, name, role } => {
            commands::user::handle(config, email, password, name, role).await
        }
    }
}
