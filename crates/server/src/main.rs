use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use dupecheck_core::config;
use server::{cors_headers, routes, AppData};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dupecheck-server")]
#[command(about = "Metadata service computing timestamps and hashes for uploaded files", long_about = None)]
struct Args {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,
    /// Override the bind host
    #[arg(long)]
    host: Option<String>,
    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref()).context("load config")?;
    let host = args.host.unwrap_or(cfg.server.host);
    let port = args.port.unwrap_or(cfg.server.port);

    let upload_dir = PathBuf::from(&cfg.server.upload_dir);
    std::fs::create_dir_all(&upload_dir)
        .with_context(|| format!("create upload dir {:?}", upload_dir))?;

    let data = web::Data::new(AppData {
        upload_dir,
        digest: cfg.hashing.algorithm,
        max_files: cfg.server.max_files,
    });

    info!(
        "Server running on {}:{} (digest {}, max {} files)",
        host, port, data.digest, data.max_files
    );

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(cors_headers())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
