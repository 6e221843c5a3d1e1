use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use mw_harness::AlternationConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "multiwait")]
#[command(about = "Exercise wait-on-many futex facilities with a strict two-process alternation")]
#[command(version)]
pub struct Cli {
    /// Rounds per party. Parsed like atoi: junk reads as 0, negatives clamp to 0.
    #[arg(value_name = "ITERATIONS", allow_negative_numbers = true, value_parser = parse_iterations)]
    pub iterations: Option<u32>,

    /// Print one line per round from each party.
    #[arg(short, long)]
    pub verbose: bool,

    /// Give up on a single acquire after this many milliseconds (0 waits forever).
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Fixed respondent seed; the initiator uses seed + 234251.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Do not ask before running on a kernel that is not Linux.
    #[arg(short = 'y', long)]
    pub assume_yes: bool,

    /// Also print a JSON report of every sub-test.
    #[arg(long)]
    pub json: bool,
}

/// Everything `app::run` needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub alternation: AlternationConfig,
    pub assume_yes: bool,
    pub json: bool,
    pub log_level: LevelFilter,
}

impl Cli {
    pub fn config(&self) -> RunConfig {
        let defaults = AlternationConfig::default();
        let log_level = if self.verbose {
            self.log_level.filter().max(LevelFilter::Info)
        } else {
            self.log_level.filter()
        };
        RunConfig {
            alternation: AlternationConfig {
                iterations: self.iterations.unwrap_or(defaults.iterations),
                verbose: self.verbose,
                timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
                seed: self.seed,
                ..defaults
            },
            assume_yes: self.assume_yes,
            json: self.json,
            log_level,
        }
    }
}

/// `atoi`-style count: optional leading whitespace and sign, then as many
/// digits as follow. Never fails; anything unparsable is 0.
pub fn parse_iterations(arg: &str) -> Result<u32, String> {
    let s = arg.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(u32::from(d - b'0')));
    Ok(if negative { 0 } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("multiwait").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_atoi_rules() {
        assert_eq!(parse_iterations("12"), Ok(12));
        assert_eq!(parse_iterations("  7"), Ok(7));
        assert_eq!(parse_iterations("+3"), Ok(3));
        assert_eq!(parse_iterations("42abc"), Ok(42));
        assert_eq!(parse_iterations("abc"), Ok(0));
        assert_eq!(parse_iterations(""), Ok(0));
        assert_eq!(parse_iterations("-4"), Ok(0));
        assert_eq!(parse_iterations("99999999999"), Ok(u32::MAX));
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).config();
        assert_eq!(config.alternation.iterations, 5);
        assert!(!config.alternation.verbose);
        assert_eq!(config.alternation.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.log_level, LevelFilter::Warn);
        assert!(!config.json);
    }

    #[test]
    fn test_verbose_either_side_of_count() {
        for args in [["-v", "12"], ["12", "--verbose"]] {
            let config = parse(&args).config();
            assert_eq!(config.alternation.iterations, 12);
            assert!(config.alternation.verbose);
            assert_eq!(config.log_level, LevelFilter::Info);
        }
    }

    #[test]
    fn test_negative_and_junk_counts() {
        assert_eq!(parse(&["-3"]).config().alternation.iterations, 0);
        assert_eq!(parse(&["lots"]).config().alternation.iterations, 0);
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let config = parse(&["--timeout-ms", "0", "--seed", "9"]).config();
        assert_eq!(config.alternation.timeout, None);
        assert_eq!(config.alternation.seed, Some(9));
    }

    #[test]
    fn test_verbose_does_not_lower_log_level() {
        let config = parse(&["-v", "--log-level", "trace"]).config();
        assert_eq!(config.log_level, LevelFilter::Trace);
    }
}
