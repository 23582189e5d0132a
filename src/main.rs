use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use boardsync::app::AppContext;
use boardsync::cli::{commands, Cli, Commands};
use boardsync::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so listings stay pipeable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Login { token } => {
            commands::login(&ctx, token).await?;
        }
        Commands::Logout => {
            commands::logout(&ctx).await?;
        }
        Commands::Whoami => {
            commands::whoami(&ctx).await?;
        }
        Commands::List {
            category,
            page,
            search,
        } => {
            commands::list(&ctx, category, page, search).await?;
        }
        Commands::Show { number } => {
            commands::show(&ctx, number).await?;
        }
        Commands::Comment { number, body } => {
            commands::comment(&ctx, number, body).await?;
        }
        Commands::Create {
            title,
            body,
            category,
            tags,
        } => {
            commands::create(&ctx, title, body, category, tags).await?;
        }
        Commands::React { number, reaction } => {
            commands::react(&ctx, number, &reaction).await?;
        }
        Commands::Delete { number } => {
            commands::delete(&ctx, number).await?;
        }
    }

    Ok(())
}
