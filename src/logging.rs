use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG: &str = "NOTECMD_LOG";

/// Install the stderr subscriber. Quiet by default so log lines do not
/// interleave with interactive prompts; `NOTECMD_LOG=debug` for request traces.
pub fn init() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
