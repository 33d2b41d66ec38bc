use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ootd_dupe::ai::mime::detect_image_mime;
use ootd_dupe::app::App;
use ootd_dupe::models::{Config, ImageUpload};
use ootd_dupe::server;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ootd-dupe")]
#[command(about = "Find budget look-alikes for celebrity outfits")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default).
    Serve {
        /// Address to bind, overriding BIND_ADDR.
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
    /// Analyze a local image and print the result.
    Analyze {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        /// Produce the structured comparison instead of free-form text.
        #[arg(long)]
        json: bool,
    },
}

async fn serve(config: Config, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.bind_addr.clone());
    let app = Arc::new(App::new(&config)?);
    let router = server::router(app, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    server::serve(listener, router).await?;
    Ok(())
}

async fn analyze(config: Config, image: PathBuf, json: bool) -> Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let upload = ImageUpload {
        mime_type: detect_image_mime(&bytes).to_string(),
        bytes,
    };
    info!(
        "Analyzing {} ({} bytes, {})",
        image.display(),
        upload.bytes.len(),
        upload.mime_type
    );

    let app = App::new(&config)?;
    let output = if json {
        let comparison = app.automate(upload).await?;
        serde_json::to_string_pretty(&comparison)?
    } else {
        app.analyze(upload).await?
    };
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ootd_dupe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env()?;

    let result = match args.command {
        None => serve(config, None).await,
        Some(Command::Serve { addr }) => serve(config, addr).await,
        Some(Command::Analyze { image, json }) => analyze(config, image, json).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
