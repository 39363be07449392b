//! # Till Register Entry Point
//!
//! ## Usage
//! ```bash
//! # Interactive, config from the platform config dir
//! till-register
//!
//! # Explicit config, commands from a file
//! till-register --config ./register.toml --script ./morning.txt
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use register::{init_tracing, Options};

const USAGE: &str = "\
Usage: till-register [OPTIONS]

Options:
  -c, --config <PATH>   Config file (default: <config dir>/register.toml)
  -s, --script <PATH>   Read commands from a file instead of stdin
  -h, --help            Show this help message";

#[tokio::main]
async fn main() -> ExitCode {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    init_tracing();

    match register::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(None)` means help was requested.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config needs a path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--script" | "-s" => {
                let path = args.next().ok_or("--script needs a path")?;
                options.script = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("Unknown argument: {other}")),
        }
    }

    Ok(Some(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(args(&["-c", "r.toml", "--script", "s.txt"])).unwrap().unwrap();
        assert_eq!(options.config_path, Some(PathBuf::from("r.toml")));
        assert_eq!(options.script, Some(PathBuf::from("s.txt")));

        assert_eq!(parse_args(args(&["--help"])).unwrap(), None);
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }
}
