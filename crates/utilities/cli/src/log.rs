//! Logging arguments and tracing subscriber setup.

use crate::{CliError, CliResult};
use clap::{ArgAction, Args};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Logging arguments shared by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArgs {
    /// Increase verbosity: `-v` for debug, `-vv` for trace.
    #[arg(short = 'v', long = "verbosity", action = ArgAction::Count, global = true)]
    pub verbosity: u8,
    /// Only log warnings and errors.
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
    /// Disable ANSI colors in log output.
    #[arg(long = "log.no-color", global = true, env = "HEADWATCH_LOG_NO_COLOR")]
    pub no_color: bool,
}

impl LogArgs {
    /// Returns the default level implied by the flags.
    pub const fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::WARN;
        }
        match self.verbosity {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Installs the global fmt subscriber.
    ///
    /// Without an explicit `filter`, `RUST_LOG` directives apply on top of [`Self::level`].
    pub fn init_tracing_subscriber(&self, filter: Option<EnvFilter>) -> CliResult<()> {
        let filter = filter.unwrap_or_else(|| {
            EnvFilter::builder().with_default_directive(self.level().into()).from_env_lossy()
        });

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(!self.no_color)
            .try_init()
            .map_err(CliError::Tracing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        log: LogArgs,
    }

    #[rstest]
    #[case::default(&[], LevelFilter::INFO)]
    #[case::debug(&["-v"], LevelFilter::DEBUG)]
    #[case::trace(&["-vv"], LevelFilter::TRACE)]
    #[case::beyond_trace(&["-vvvv"], LevelFilter::TRACE)]
    #[case::long(&["--verbosity", "--verbosity"], LevelFilter::TRACE)]
    #[case::quiet(&["-q"], LevelFilter::WARN)]
    fn test_level(#[case] flags: &[&str], #[case] expected: LevelFilter) {
        let cli = TestCli::try_parse_from(std::iter::once("test").chain(flags.iter().copied()))
            .unwrap();
        assert_eq!(cli.log.level(), expected);
    }

    #[test]
    fn test_quiet_conflicts_with_verbosity() {
        assert!(TestCli::try_parse_from(["test", "-q", "-v"]).is_err());
    }
}
