/// Command-line surface.

use std::path::PathBuf;

use clap::Parser;

/// Tick rates the server accepts.
pub const TICK_RATES: &[u32] = &[1, 2, 5, 10];

/// Watch a ROSE race live in the terminal.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Game server base URL (e.g. http://127.0.0.1:8880).
    #[arg(long, value_name = "URL")]
    pub url: String,
    /// URLs of the participating drivers.
    #[arg(long, value_name = "URL", num_args = 1.., required = true)]
    pub drivers: Vec<String>,
    /// Server tick rate to request, in updates per second.
    #[arg(long, value_name = "RATE", default_value_t = 5, value_parser = parse_tick_rate)]
    pub fps: u32,
    /// Config file to use instead of searching for config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

fn parse_tick_rate(s: &str) -> Result<u32, String> {
    let rate: u32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if TICK_RATES.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("must be one of {TICK_RATES:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("rosewatch").chain(args.iter().copied()))
    }

    #[test]
    fn minimal_invocation_defaults_fps() {
        let args = parse(&["--url", "http://srv:8880", "--drivers", "http://d1:8081"]).unwrap();
        assert_eq!(args.url, "http://srv:8880");
        assert_eq!(args.drivers, vec!["http://d1:8081"]);
        assert_eq!(args.fps, 5);
        assert!(args.config.is_none());
    }

    #[test]
    fn several_drivers() {
        let args = parse(&[
            "--url", "http://srv", "--drivers", "http://a", "http://b", "--fps", "10",
        ])
        .unwrap();
        assert_eq!(args.drivers, vec!["http://a", "http://b"]);
        assert_eq!(args.fps, 10);
    }

    #[test]
    fn rejects_unsupported_rate() {
        assert!(parse(&["--url", "http://srv", "--drivers", "http://a", "--fps", "3"]).is_err());
        assert!(parse(&["--url", "http://srv", "--drivers", "http://a", "--fps", "fast"]).is_err());
    }

    #[test]
    fn url_and_drivers_are_required() {
        assert!(parse(&["--drivers", "http://a"]).is_err());
        assert!(parse(&["--url", "http://srv"]).is_err());
    }
}
