//! deepquest command-line entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use deepquest::cli::{Cli, execute};

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the default `warn`
/// level to `info` and `-vv` to `debug`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[allow(clippy::print_stdout)]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = execute(&cli)?;
    if !output.is_empty() {
        print!("{output}");
    }
    Ok(())
}
