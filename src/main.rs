use anyhow::Result;
use argh::FromArgs;
use openline::{AppCatalog, Repl};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(FromArgs)]
/// Interactive prompt that opens websites, applications, files and folders,
/// and reports local system telemetry on request.
struct Args {
    /// directory to scan for installed applications instead of the platform default
    #[argh(option)]
    apps_dir: Option<PathBuf>,

    /// log level filter: error, warn, info, debug or trace
    #[argh(option, default = "String::from(\"info\")")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&args.log_level),
    )
    .init();

    // A missing or unreadable applications directory is fatal: the catalog
    // backs both completion and bare-name commands and has no fallback.
    let catalog = match &args.apps_dir {
        Some(dir) => AppCatalog::scan(dir, openline::catalog::APP_SUFFIX)?,
        None => AppCatalog::scan_default()?,
    };
    log::info!("application catalog loaded: {} entries", catalog.names().len());

    Repl::new(Arc::new(catalog))?.run().await
}
