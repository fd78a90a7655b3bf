use clap::{Parser, Subcommand};
use configuration::LogFormat;

/// The GLUE platform backend.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Apply pending database migrations and exit.
    Migrate,
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,

    /// Overrides `logging.format`.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = configuration::load_settings()?;

    match cli.command {
        Commands::Serve(args) => {
            if let Some(host) = args.host {
                settings.server.host = host;
            }
            if let Some(port) = args.port {
                settings.server.port = port;
            }
            if let Some(format) = args.log_format {
                settings.logging.format = format;
            }
            let _log_guard = configuration::init_tracing(&settings.logging)?;
            web_server::run_server(settings).await
        }
        Commands::Migrate => {
            let _log_guard = configuration::init_tracing(&settings.logging)?;
            let db_pool = database::connect().await?;
            database::run_migrations(&db_pool).await?;
            tracing::info!("Database migrations applied.");
            Ok(())
        }
    }
}
