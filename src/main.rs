//!
//! memberportal relay binary
//! -------------------------
//! Starts the credential relay. Configuration comes from `PORTAL_*` environment
//! variables, overridden by `--http-port`, `--bind`, `--upstream` and `--insecure-cookies`.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use memberportal::config::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("memberportal relay\n\nUSAGE:\n  memberportal [--http-port N] [--bind ADDR] [--upstream URL] [--insecure-cookies]\n\nOPTIONS:\n  --http-port N        Listen port (env: PORTAL_HTTP_PORT, default 3000)\n  --bind ADDR          Listen address (env: PORTAL_BIND, default 0.0.0.0)\n  --upstream URL       Upstream identity API (env: PORTAL_UPSTREAM_URL)\n  --insecure-cookies   Omit the Secure cookie attribute (env: PORTAL_COOKIE_SECURE=false)\n\nImage storage credentials are read per request from CF_IMAGES_ACCOUNT_ID and CF_IMAGES_TOKEN.\n");
        return Ok(());
    }

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let config = RelayConfig::from_env().apply_args(&args);
    info!(target: "memberportal", "memberportal starting: RUST_LOG='{}', bind={}", rust_log, config.bind_addr());

    memberportal::server::run(config).await
}
