use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// Environment variable overriding the log level derived from `-v`/`-q`.
pub const LOG_ENV: &str = "LAZY_LOADER_LOG";

/// Run a 32-bit ELF executable, mapping its pages on first touch.
#[derive(Parser, Debug)]
#[command(name = "lazy-loader", version, about)]
pub struct Cli {
    /// Path to the 32-bit ELF executable.
    #[arg(value_name = "ELF")]
    pub executable: PathBuf,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable logging entirely.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Log level from the flags alone.
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Off;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Log level after applying an optional `LAZY_LOADER_LOG` value.
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn effective_log_level(&self, env: Option<&str>) -> LevelFilter {
        env.and_then(|value| value.trim().parse().ok())
            .unwrap_or_else(|| self.log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lazy-loader").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn executable_is_required() {
        let err = Cli::try_parse_from(["lazy-loader"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(parse(&["a.out"]).log_level(), LevelFilter::Warn);
        assert_eq!(parse(&["-v", "a.out"]).log_level(), LevelFilter::Info);
        assert_eq!(parse(&["-vv", "a.out"]).log_level(), LevelFilter::Debug);
        assert_eq!(parse(&["-vvvv", "a.out"]).log_level(), LevelFilter::Trace);
        assert_eq!(parse(&["--quiet", "a.out"]).log_level(), LevelFilter::Off);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["lazy-loader", "-q", "-v", "a.out"]).is_err());
    }

    #[test]
    fn environment_overrides_flags() {
        let cli = parse(&["-v", "a.out"]);
        assert_eq!(cli.effective_log_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(cli.effective_log_level(Some(" OFF ")), LevelFilter::Off);
        assert_eq!(cli.effective_log_level(Some("loud")), LevelFilter::Info);
        assert_eq!(cli.effective_log_level(None), LevelFilter::Info);
    }

    #[test]
    fn executable_path_is_kept() {
        assert_eq!(parse(&["bin/sum"]).executable, PathBuf::from("bin/sum"));
    }
}
