//! Command Line Interface (CLI) arguments.

use byte_unit::Byte;
use clap::Parser;

/// Geo analytics command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "GEO_ANALYTICS_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8000, env = "GEO_ANALYTICS_PORT")]
    pub port: u16,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "GEO_ANALYTICS_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to use Rayon for execution of CPU-bound analytics.
    #[arg(long, default_value_t = false, env = "GEO_ANALYTICS_USE_RAYON")]
    pub use_rayon: bool,
    /// Maximum size of an uploaded request body, e.g. "10MiB"
    #[arg(long, default_value = "10MiB", value_parser = parse_byte_size, env = "GEO_ANALYTICS_MAX_UPLOAD_SIZE")]
    pub max_upload_size: usize,
    /// Origins allowed to make cross-origin requests, comma separated. "*" allows any origin.
    #[arg(
        long,
        default_value = "*",
        value_delimiter = ',',
        env = "GEO_ANALYTICS_ALLOWED_ORIGINS"
    )]
    pub allowed_origins: Vec<String>,
}

/// Parse a human readable size such as "512KiB" or "10MB" into a number of bytes.
fn parse_byte_size(size: &str) -> Result<usize, String> {
    let bytes = Byte::parse_str(size, true).map_err(|err| err.to_string())?;
    usize::try_from(bytes.as_u64()).map_err(|err| err.to_string())
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
