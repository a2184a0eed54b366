//! Command line parsing.

use std::path::PathBuf;

use crate::datetime::parse_rfc3339;
use crate::episode::EpisodeType;
use crate::ranking::TimeWindow;
use crate::{HntldrError, Result};

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Usage text printed on bad arguments.
pub const USAGE: &str = "\
usage: hntldr [--config PATH] <command>

commands:
  serve                                      run the web API (and the recorder when enabled)
  record                                     take one ranking snapshot
  digest daily|weekly [--start T --end T]    generate one episode
  newsletter [--start T --end T]             send the weekly newsletter

T is an RFC 3339 timestamp. Without --start/--end the most recent
daily or weekly window is used.";

/// A parsed subcommand.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Serve,
    Record,
    Digest {
        episode_type: EpisodeType,
        window: Option<TimeWindow>,
    },
    Newsletter {
        window: Option<TimeWindow>,
    },
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub command: Command,
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut positional = Vec::new();
    let mut start = None;
    let mut end = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config_path = PathBuf::from(value_for(&arg, args.next())?),
            "--start" => start = Some(parse_rfc3339(&value_for(&arg, args.next())?)?),
            "--end" => end = Some(parse_rfc3339(&value_for(&arg, args.next())?)?),
            flag if flag.starts_with('-') => {
                return Err(HntldrError::Validation(format!("unknown option: {flag}")))
            }
            _ => positional.push(arg),
        }
    }

    let window = match (start, end) {
        (Some(start), Some(end)) => Some(TimeWindow::new(start, end)?),
        (None, None) => None,
        _ => {
            return Err(HntldrError::Validation(
                "--start and --end must be given together".to_string(),
            ))
        }
    };

    let command = match positional.as_slice() {
        [cmd] if cmd == "serve" => Command::Serve,
        [cmd] if cmd == "record" => Command::Record,
        [cmd, kind] if cmd == "digest" => Command::Digest {
            episode_type: kind.parse()?,
            window,
        },
        [cmd] if cmd == "newsletter" => Command::Newsletter { window },
        [] => return Err(HntldrError::Validation("missing command".to_string())),
        other => {
            return Err(HntldrError::Validation(format!(
                "unknown command: {}",
                other.join(" ")
            )))
        }
    };

    if window.is_some() && matches!(command, Command::Serve | Command::Record) {
        return Err(HntldrError::Validation(
            "--start/--end only apply to digest and newsletter".to_string(),
        ));
    }

    Ok(CliArgs {
        config_path,
        command,
    })
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| HntldrError::Validation(format!("{flag} needs a value")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_serve_with_default_config() {
        let args = parse_args(["serve"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
        assert_eq!(args.command, Command::Serve);
    }

    #[test]
    fn test_parse_config_flag() {
        let args = parse_args(["--config", "/etc/hntldr.toml", "record"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("/etc/hntldr.toml"));
        assert_eq!(args.command, Command::Record);
    }

    #[test]
    fn test_parse_digest_with_window() {
        let args = parse_args([
            "digest",
            "weekly",
            "--start",
            "2025-02-28T05:00:00Z",
            "--end",
            "2025-03-07T05:00:00Z",
        ])
        .unwrap();

        let expected = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 2, 28, 5, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 7, 5, 0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(
            args.command,
            Command::Digest {
                episode_type: EpisodeType::Weekly,
                window: Some(expected),
            }
        );
    }

    #[test]
    fn test_parse_newsletter_without_window() {
        let args = parse_args(["newsletter"]).unwrap();
        assert_eq!(args.command, Command::Newsletter { window: None });
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(Vec::<String>::new()).is_err());
        assert!(parse_args(["digest"]).is_err());
        assert!(parse_args(["digest", "monthly"]).is_err());
        assert!(parse_args(["digest", "daily", "--start", "2025-03-01T00:00:00Z"]).is_err());
        assert!(parse_args(["--config"]).is_err());
        assert!(parse_args(["serve", "--verbose"]).is_err());
        assert!(parse_args(["record", "--start", "2025-03-01T00:00:00Z", "--end", "2025-03-02T00:00:00Z"]).is_err());
    }

    #[test]
    fn test_parse_rejects_inverted_window() {
        let result = parse_args([
            "newsletter",
            "--start",
            "2025-03-07T00:00:00Z",
            "--end",
            "2025-03-01T00:00:00Z",
        ]);
        assert!(matches!(result, Err(HntldrError::Validation(_))));
    }
}
