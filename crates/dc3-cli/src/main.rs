//! Build Controller (C9) command-line front end.
//!
//! Reads a Build Request as JSON (from a file, or stdin when `--request` is
//! omitted), runs the full assemble/derive/describe/write/upload pipeline,
//! and prints the resulting [`dc3_engine::CubeBuildResult`] as JSON on
//! stdout. The HTTP/OGC API surface that would normally front this is out of
//! scope here; this binary is the CLI-facing collaborator §6 names instead.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dc3_common::{BuildConfig, BuildContext, BuildRequest};
use dc3_engine::{run_build, BuildInputs, NullPreviewRenderer};
use dc3_metadata::cache::LruCacheHandle;
use dc3_object_store::{LocalFilesystemInputStorage, ObjectStoreConfig, OutputStore};
use dc3_staging::RasterFormatRegistry;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "dc3")]
#[command(about = "Assemble a satellite raster datacube from a build request")]
struct Args {
    /// Path to a Build Request JSON document. Reads stdin when omitted.
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Root directory build requests' relative raster URIs are resolved
    /// against.
    #[arg(long, default_value = ".")]
    input_root: PathBuf,

    /// Log level.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let request = read_request(args.request.as_deref())?;
    info!(cube_id = %request.cube_id, "starting cube build");

    let build_config = BuildConfig::from_env();
    build_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid build configuration: {e}"))?;

    let cache = Arc::new(LruCacheHandle::new(build_config.chunk_cache_entries));
    let ctx = BuildContext::new(build_config, cache);

    let storage = LocalFilesystemInputStorage::new(&args.input_root);
    let registry = RasterFormatRegistry::with_defaults();
    let object_store_config = ObjectStoreConfig::from_env();
    let output = OutputStore::new(&object_store_config).context("failed to set up output object store")?;
    let renderer = NullPreviewRenderer;

    let result = run_build(BuildInputs {
        request: &request,
        ctx: &ctx,
        storage: &storage,
        registry: &registry,
        output: &output,
        renderer: &renderer,
    })
    .await
    .map_err(|e| anyhow::anyhow!("build failed ({}): {e}", e.kind()))?;

    info!(datacube_url = %result.datacube_url, "cube build completed");
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn read_request(path: Option<&std::path::Path>) -> Result<BuildRequest> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build request from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read build request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("build request is not valid JSON")
}
