//! gitsuper binary entry point.

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr; GITSUPER_LOG controls verbosity
    // (e.g. GITSUPER_LOG=gitsuper=debug). Token values are never logged.
    let filter = EnvFilter::try_from_env("GITSUPER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = gitsuper::cli::run().await {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
