//! ML Agent desktop client

use mlagent::app::App;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    tracing::info!("Starting ML Agent client v{}", env!("CARGO_PKG_VERSION"));
    dioxus::launch(App);
}
