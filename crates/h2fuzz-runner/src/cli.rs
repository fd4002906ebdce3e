//! Command line of the `h2fuzz` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use h2fuzz::{
    DEFAULT_REQUEST, FuzzConfig, FuzzerKind, Http1RequestFuzzer, Http1Upgrade, RoundRobin,
};

use crate::config::{
    Config, DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY, TestRange, parse_ratio, parse_test_range,
};
use crate::connection::{Client, StubbornClient};
use crate::driver::{ClientDriver, Http1Driver, RunStats, ServerDriver};
use crate::error::RunnerError;

#[derive(Parser, Debug)]
#[command(name = "h2fuzz", version, about = "Dumb HTTP/2 and HTTP/1.1 fuzzer")]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// More logs
    #[arg(long = "verbose", global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Host name to connect to, or to listen on in server mode
    #[arg(long = "host", global = true, default_value = "localhost")]
    pub host: String,

    /// Port number
    #[arg(long = "port", global = true, default_value_t = 80)]
    pub port: u16,

    /// Enable TLS (not supported)
    #[arg(long = "tls", global = true, action = ArgAction::SetTrue)]
    pub tls: bool,

    /// Seed for the pseudo-random generators, must not be zero
    #[arg(long = "seed", global = true, default_value_t = 1)]
    pub seed: u64,

    /// Test range: a number, "start:end", "start:" or "start:infinite"
    #[arg(long = "test", global = true)]
    pub test: Option<String>,

    /// Fuzzing ratio: a number, or an interval "min:max"
    #[arg(long = "ratio", global = true, default_value = "0.01:0.05")]
    pub ratio: String,

    /// Connect attempts before giving up
    #[arg(long = "attempts", global = true, default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: u32,

    /// Seconds to wait between connect attempts
    #[arg(long = "retry-delay", global = true, default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    pub retry_delay: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to an HTTP/2 server and send it fuzzed frames
    Client(ClientArgs),

    /// Wait for HTTP/2 clients and answer them with fuzzed frames
    Server(FuzzerArgs),

    /// Send fuzzed HTTP/1.x requests, one connection per test
    Http1(Http1Args),
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    #[command(flatten)]
    pub fuzzers: FuzzerArgs,

    /// Start every connection with an HTTP/1.1 "Upgrade: h2c" request
    #[arg(long = "upgrade", action = ArgAction::SetTrue)]
    pub upgrade: bool,
}

/// Frame fuzzers to enable.
#[derive(Args, Debug, Default)]
pub struct FuzzerArgs {
    /// Enable common frame fuzzer
    #[arg(long = "common", action = ArgAction::SetTrue)]
    pub common: bool,

    /// Enable SETTINGS fuzzer
    #[arg(long = "settings", action = ArgAction::SetTrue)]
    pub settings: bool,

    /// Enable HEADERS fuzzer
    #[arg(long = "headers", action = ArgAction::SetTrue)]
    pub headers: bool,

    /// Enable HPACK fuzzer
    #[arg(long = "hpack", action = ArgAction::SetTrue)]
    pub hpack: bool,

    /// Enable PRIORITY fuzzer
    #[arg(long = "priority", action = ArgAction::SetTrue)]
    pub priority: bool,

    /// Enable RST_STREAM fuzzer
    #[arg(long = "rst_stream", action = ArgAction::SetTrue)]
    pub rst_stream: bool,

    /// Enable DATA fuzzer
    #[arg(long = "data", action = ArgAction::SetTrue)]
    pub data: bool,

    /// Enable PUSH_PROMISE fuzzer
    #[arg(long = "push_promise", action = ArgAction::SetTrue)]
    pub push_promise: bool,

    /// Enable PING fuzzer
    #[arg(long = "ping", action = ArgAction::SetTrue)]
    pub ping: bool,

    /// Enable GOAWAY fuzzer
    #[arg(long = "goaway", action = ArgAction::SetTrue)]
    pub goaway: bool,

    /// Enable WINDOW_UPDATE fuzzer
    #[arg(long = "window_update", action = ArgAction::SetTrue)]
    pub window_update: bool,

    /// Enable CONTINUATION fuzzer
    #[arg(long = "continuation", action = ArgAction::SetTrue)]
    pub continuation: bool,

    /// Enable all fuzzers
    #[arg(long = "all", action = ArgAction::SetTrue)]
    pub all: bool,
}

impl FuzzerArgs {
    /// Enabled fuzzers in dispatch order.
    pub fn enabled(&self) -> Vec<FuzzerKind> {
        if self.all {
            return FuzzerKind::ALL.to_vec();
        }
        let flags = [
            self.common,
            self.settings,
            self.headers,
            self.hpack,
            self.priority,
            self.data,
            self.rst_stream,
            self.push_promise,
            self.ping,
            self.goaway,
            self.window_update,
            self.continuation,
        ];
        FuzzerKind::ALL
            .into_iter()
            .zip(flags)
            .filter_map(|(kind, enabled)| enabled.then_some(kind))
            .collect()
    }
}

#[derive(Args, Debug)]
pub struct Http1Args {
    /// Path to a file with the HTTP request to fuzz
    #[arg(long = "request")]
    pub request: Option<PathBuf>,
}

impl CommonArgs {
    /// Build the run configuration. `default_tests` applies when `--test`
    /// is absent.
    pub fn to_config(
        &self,
        enabled: Vec<FuzzerKind>,
        default_tests: TestRange,
    ) -> Result<Config, RunnerError> {
        let tests = match &self.test {
            Some(value) => parse_test_range(value)?,
            None => default_tests,
        };
        let ratio = parse_ratio(&self.ratio)?;
        let config = Config::new(&self.host, self.port, self.seed, tests, ratio, |params| {
            FuzzConfig { params, enabled }
        })?
        .with_tls(self.tls)?
        .with_verbose(self.verbose)
        .with_retries(self.attempts, Duration::from_secs(self.retry_delay));
        Ok(config)
    }
}

/// Run the selected command to completion.
pub fn run(cli: Cli) -> Result<RunStats, RunnerError> {
    let common = cli.common;
    match cli.command {
        Command::Client(args) => {
            let config = common.to_config(args.fuzzers.enabled(), TestRange::default())?;
            let fuzzers = RoundRobin::from_config(&config.fuzz)?;
            let mut driver = ClientDriver::new(Client::new(config.address()), fuzzers, config.tests)?
                .with_max_resends(config.attempts);
            if args.upgrade {
                driver = driver.with_upgrade(Http1Upgrade::new(&config.host));
            }
            driver.run()
        },
        Command::Server(args) => {
            let config = common.to_config(args.enabled(), TestRange::default())?;
            let fuzzers = RoundRobin::from_config(&config.fuzz)?;
            ServerDriver::new(fuzzers, config.tests)?.listen(&config.address())
        },
        Command::Http1(args) => {
            // The request fuzzer does not use the frame fuzzer set.
            let config = common.to_config(FuzzerKind::ALL.to_vec(), TestRange::single(0))?;
            let request = match &args.request {
                Some(path) => std::fs::read_to_string(path)?,
                None => DEFAULT_REQUEST.to_string(),
            };
            let fuzzer = Http1RequestFuzzer::new(&request, &config.fuzz.params)?;
            let transport = StubbornClient::new(
                Client::new(config.address()),
                config.attempts,
                config.retry_delay,
            );
            Http1Driver::new(transport, fuzzer, config.tests).run()
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::ConfigError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("h2fuzz").chain(args.iter().copied())).unwrap()
    }

    fn client_config(args: &[&str]) -> Result<Config, RunnerError> {
        let cli = parse(args);
        let Command::Client(client) = cli.command else {
            panic!("expected client command");
        };
        cli.common.to_config(client.fuzzers.enabled(), TestRange::default())
    }

    #[test]
    fn test_client_defaults() {
        let config = client_config(&["client", "--ping"]).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 80);
        assert_eq!(config.tests, TestRange::open(0));
        assert_eq!(config.fuzz.params.seed, 1);
        assert_eq!(config.fuzz.enabled, vec![FuzzerKind::Ping]);
        assert!(!config.verbose);
    }

    #[test]
    fn test_flags_after_subcommand() {
        let config = client_config(&[
            "client",
            "--rst_stream",
            "--window_update",
            "--push_promise",
            "--seed",
            "42",
            "--test",
            "10:20",
            "--ratio",
            "0.1",
            "--port",
            "8080",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(
            config.fuzz.enabled,
            vec![FuzzerKind::RstStream, FuzzerKind::PushPromise, FuzzerKind::WindowUpdate]
        );
        assert_eq!(config.fuzz.params.seed, 42);
        assert_eq!(config.fuzz.params.start_test, 10);
        assert_eq!(config.tests, TestRange { start: 10, end: Some(20) });
        assert_eq!(config.fuzz.params.ratio.min(), 0.1);
        assert_eq!(config.fuzz.params.ratio.max(), 0.1);
        assert_eq!(config.port, 8080);
        assert!(config.verbose);
    }

    #[test]
    fn test_all_enables_every_fuzzer() {
        let config = client_config(&["client", "--all", "--ping"]).unwrap();
        assert_eq!(config.fuzz.enabled, FuzzerKind::ALL.to_vec());
    }

    #[rstest]
    #[case::no_fuzzer(&["client"])]
    #[case::test_colons(&["client", "--all", "--test", "1:2:3"])]
    #[case::ratio_colons(&["client", "--all", "--ratio", "0.1:0.2:0.3"])]
    #[case::tls(&["client", "--all", "--tls"])]
    fn test_fatal_configuration(#[case] args: &[&str]) {
        let err = client_config(args).unwrap_err();
        assert!(matches!(
            err,
            RunnerError::Config(
                ConfigError::NoFuzzersEnabled
                    | ConfigError::TooManyColons { .. }
                    | ConfigError::TlsUnsupported
            )
        ));
    }

    #[test]
    fn test_zero_seed_is_fatal() {
        assert!(matches!(
            client_config(&["client", "--all", "--seed", "0"]),
            Err(RunnerError::Fuzz(_))
        ));
    }

    #[test]
    fn test_http1_request_option() {
        let cli = parse(&["http1", "--request", "req.txt", "--host", "example.com"]);
        assert_eq!(cli.common.host, "example.com");
        let Command::Http1(args) = cli.command else {
            panic!("expected http1 command");
        };
        assert_eq!(args.request, Some(PathBuf::from("req.txt")));
    }

    #[test]
    fn test_client_upgrade_flag() {
        let cli = parse(&["client", "--all", "--upgrade"]);
        let Command::Client(args) = cli.command else {
            panic!("expected client command");
        };
        assert!(args.upgrade);
        assert!(args.fuzzers.all);
    }
}
