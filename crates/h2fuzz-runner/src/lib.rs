// HTTP/2 fuzzing runner
// Sends h2fuzz output to real peers: command line, configuration, the TCP
// transport and the client, server and HTTP/1 driver loops.

pub mod cli;
mod config;
mod connection;
mod driver;
mod error;
pub mod response;

pub use config::{
    Config, DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY, TestRange, parse_ratio, parse_test_range,
};
pub use connection::{
    Client, DEFAULT_READ_TIMEOUT, DEFAULT_RECEIVE_LENGTH, StubbornClient, Transport,
};
pub use driver::{ClientDriver, Http1Driver, RunStats, ServerDriver};
pub use error::{ConfigError, RunnerError};
