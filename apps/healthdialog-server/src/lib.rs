pub mod api;
pub mod bootstrap;

pub use api::{router, AppState};
pub use bootstrap::{assemble, from_settings};

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise `info`. Logs go to stderr so `healthdialog-ask`
/// can keep stdout for the answer.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
