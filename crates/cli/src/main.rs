use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::render;
use dupecheck_core::config::{self, AppConfig};
use dupecheck_core::hashing::DigestAlgorithm;
use dupecheck_core::pipeline;
use dupecheck_core::similarity;
use dupecheck_core::Extractor;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Commands::Compare {
            file_a,
            file_b,
            remote,
            url,
            digest,
            json,
        } => run_compare(cfg, file_a, file_b, remote, url, digest, json).await,
        Commands::Inspect { file, digest, json } => run_inspect(cfg, file, digest, json).await,
        Commands::Similarity { name_a, name_b } => {
            run_similarity(&name_a, &name_b);
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(name = "dupecheck")]
#[command(about = "Estimate how likely two files are duplicates", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two files and report a duplication probability
    Compare {
        file_a: PathBuf,
        file_b: PathBuf,
        /// Ask the remote metadata service for timestamps and hashes
        #[arg(long, default_value_t = false)]
        remote: bool,
        /// Remote metadata service base URL (implies --remote)
        #[arg(long)]
        url: Option<String>,
        /// Digest algorithm: sha256|blake3
        #[arg(long, value_parser = ["sha256", "blake3"])]
        digest: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract and print the metadata of a single file
    Inspect {
        file: PathBuf,
        /// Digest algorithm: sha256|blake3
        #[arg(long, value_parser = ["sha256", "blake3"])]
        digest: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the edit distance and similarity of two file names
    Similarity { name_a: String, name_b: String },
}

fn apply_digest(cfg: &mut AppConfig, digest: Option<String>) {
    if let Some(d) = digest {
        cfg.hashing.algorithm = DigestAlgorithm::from(d.as_str());
    }
}

async fn run_compare(
    mut cfg: AppConfig,
    file_a: PathBuf,
    file_b: PathBuf,
    remote: bool,
    url: Option<String>,
    digest: Option<String>,
    json: bool,
) -> Result<()> {
    apply_digest(&mut cfg, digest);
    if remote || url.is_some() {
        cfg.remote.enabled = true;
    }
    if url.is_some() {
        cfg.remote.url = url;
    }

    let extractor =
        pipeline::build_extractor(&cfg).context("configure remote metadata provider")?;
    let outcome = pipeline::compare(&extractor, &file_a, &file_b)
        .await
        .context("comparison failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render::render_outcome(&outcome));
    }
    Ok(())
}

async fn run_inspect(
    mut cfg: AppConfig,
    file: PathBuf,
    digest: Option<String>,
    json: bool,
) -> Result<()> {
    apply_digest(&mut cfg, digest);
    let meta = Extractor::local(cfg.hashing.algorithm)
        .extract(&file)
        .await
        .with_context(|| format!("failed to extract {:?}", file))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        print!("{}", render::render_metadata(&meta));
    }
    Ok(())
}

fn run_similarity(name_a: &str, name_b: &str) {
    let distance = similarity::name_distance(name_a, name_b);
    let sim = similarity::name_similarity(name_a, name_b);
    println!("distance:   {}", distance);
    println!("similarity: {:.3} ({}%)", sim, (sim * 100.0).round());
}
