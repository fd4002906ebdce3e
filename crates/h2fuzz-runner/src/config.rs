//! Runner configuration and the `--test` / `--ratio` value syntax.

use std::time::Duration;

use h2fuzz::{FuzzConfig, MutationParams, RatioWindow};

use crate::error::{ConfigError, RunnerError};

/// Default number of connect/send attempts of the stubborn client.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Default pause between two connect attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Inclusive range of test numbers; `end == None` runs forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRange {
    pub start: u64,
    pub end:   Option<u64>,
}

impl TestRange {
    /// Only test `test`.
    pub fn single(test: u64) -> Self {
        Self {
            start: test,
            end:   Some(test),
        }
    }

    /// From `start` on, without an upper bound.
    pub fn open(start: u64) -> Self {
        Self { start, end: None }
    }

    pub fn contains(&self, test: u64) -> bool {
        test >= self.start && self.end.is_none_or(|end| test <= end)
    }
}

impl Default for TestRange {
    fn default() -> Self {
        Self::open(0)
    }
}

impl std::fmt::Display for TestRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}:{}", self.start, end),
            None => write!(f, "{}:infinite", self.start),
        }
    }
}

fn parse_number<T: std::str::FromStr>(option: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        option,
        value: value.to_string(),
    })
}

/// Parse `N`, `start:end`, `start:` or `start:infinite`.
pub fn parse_test_range(value: &str) -> Result<TestRange, ConfigError> {
    let parts: Vec<&str> = value.split(':').collect();
    match parts.as_slice() {
        [test] => Ok(TestRange::single(parse_number("--test", test)?)),
        [start, end] => {
            let start = parse_number("--test", start)?;
            let end = match end.trim() {
                "" | "infinite" => None,
                end => Some(parse_number("--test", end)?),
            };
            Ok(TestRange { start, end })
        },
        _ => Err(ConfigError::TooManyColons {
            option: "--test",
            value:  value.to_string(),
        }),
    }
}

/// Parse `r` (fixed ratio) or `min:max` into the raw bounds. Range checks
/// happen when the [`RatioWindow`] is built.
pub fn parse_ratio(value: &str) -> Result<(f64, f64), ConfigError> {
    let parts: Vec<&str> = value.split(':').collect();
    match parts.as_slice() {
        [ratio] => {
            let ratio = parse_number("--ratio", ratio)?;
            Ok((ratio, ratio))
        },
        [min, max] => Ok((parse_number("--ratio", min)?, parse_number("--ratio", max)?)),
        _ => Err(ConfigError::TooManyColons {
            option: "--ratio",
            value:  value.to_string(),
        }),
    }
}

/// Everything a driver needs to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host:        String,
    pub port:        u16,
    pub tests:       TestRange,
    pub fuzz:        FuzzConfig,
    pub verbose:     bool,
    pub attempts:    u32,
    pub retry_delay: Duration,
}

impl Config {
    /// Build a configuration, rejecting what no driver can run: a zero seed,
    /// a bad ratio window, TLS, or an empty fuzzer set.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        seed: u64,
        tests: TestRange,
        ratio: (f64, f64),
        fuzz: impl FnOnce(MutationParams) -> FuzzConfig,
    ) -> Result<Self, RunnerError> {
        let window = RatioWindow::new(ratio.0, ratio.1)?;
        let params = MutationParams::new(seed, tests.start, window)?;
        let fuzz = fuzz(params);
        if fuzz.enabled.is_empty() {
            return Err(ConfigError::NoFuzzersEnabled.into());
        }
        Ok(Self {
            host: host.into(),
            port,
            tests,
            fuzz,
            verbose: false,
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Plain TCP is the only transport; asking for TLS is a configuration
    /// error.
    pub fn with_tls(self, tls: bool) -> Result<Self, ConfigError> {
        if tls {
            return Err(ConfigError::TlsUnsupported);
        }
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_retries(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// `host:port` as accepted by `TcpStream::connect` and `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use h2fuzz::{FuzzErrorKind, FuzzerKind};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::single("7", TestRange::single(7))]
    #[case::closed("3:10", TestRange { start: 3, end: Some(10) })]
    #[case::open_empty("5:", TestRange::open(5))]
    #[case::open_infinite("5:infinite", TestRange::open(5))]
    #[case::spaces(" 1 : 2 ", TestRange { start: 1, end: Some(2) })]
    fn test_parse_test_range(#[case] value: &str, #[case] expected: TestRange) {
        assert_eq!(parse_test_range(value).unwrap(), expected);
    }

    #[rstest]
    #[case::too_many_colons("1:2:3")]
    #[case::not_a_number("one")]
    #[case::bad_end("1:two")]
    #[case::negative("-1")]
    fn test_parse_test_range_rejects(#[case] value: &str) {
        assert!(parse_test_range(value).is_err());
    }

    #[test]
    fn test_too_many_colons_names_option() {
        let err = parse_ratio("0.1:0.2:0.3").unwrap_err();
        assert_eq!(
            err,
            ConfigError::TooManyColons {
                option: "--ratio",
                value:  "0.1:0.2:0.3".to_string(),
            }
        );
        assert!(err.to_string().contains("too many colons"));
    }

    #[rstest]
    #[case::fixed("0.05", (0.05, 0.05))]
    #[case::window("0.01:0.05", (0.01, 0.05))]
    fn test_parse_ratio(#[case] value: &str, #[case] expected: (f64, f64)) {
        assert_eq!(parse_ratio(value).unwrap(), expected);
    }

    #[test]
    fn test_range_contains() {
        let range = TestRange { start: 2, end: Some(4) };
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(TestRange::open(2).contains(u64::MAX));
        assert_eq!(TestRange::open(3).to_string(), "3:infinite");
    }

    #[test]
    fn test_config_rejects_empty_fuzzer_set() {
        let err = Config::new("localhost", 80, 1, TestRange::default(), (0.01, 0.05), |params| {
            FuzzConfig {
                params,
                enabled: Vec::new(),
            }
        })
        .unwrap_err();
        assert!(matches!(err, RunnerError::Config(ConfigError::NoFuzzersEnabled)));
    }

    #[test]
    fn test_config_rejects_zero_seed_and_bad_ratio() {
        let err =
            Config::new("localhost", 80, 0, TestRange::default(), (0.01, 0.05), FuzzConfig::all)
                .unwrap_err();
        assert!(matches!(err, RunnerError::Fuzz(ref e) if e.kind == FuzzErrorKind::ZeroSeed));

        let err =
            Config::new("localhost", 80, 1, TestRange::default(), (0.5, 0.1), FuzzConfig::all)
                .unwrap_err();
        assert!(
            matches!(err, RunnerError::Fuzz(ref e) if matches!(e.kind, FuzzErrorKind::InvalidRatio(_)))
        );
    }

    #[test]
    fn test_config_start_test_follows_range() {
        let config = Config::new(
            "example.com",
            8080,
            9,
            TestRange { start: 40, end: Some(50) },
            (0.02, 0.02),
            |params| FuzzConfig {
                params,
                enabled: vec![FuzzerKind::Ping],
            },
        )
        .unwrap();
        assert_eq!(config.fuzz.params.start_test, 40);
        assert_eq!(config.fuzz.params.seed, 9);
        assert_eq!(config.address(), "example.com:8080");
        assert_eq!(config.clone().with_tls(false).unwrap(), config);
        assert_eq!(config.with_tls(true).unwrap_err(), ConfigError::TlsUnsupported);
    }
}
