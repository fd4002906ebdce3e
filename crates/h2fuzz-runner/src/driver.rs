//! Client, server and HTTP/1 fuzzing loops.
//!
//! Every loop walks its [`TestRange`], positions the fuzzer at the current
//! test number and writes one fuzzed message per test. A test only counts
//! as done once its bytes were sent; receive failures are logged and ignored.

use std::net::TcpListener;
use std::time::Duration;

use h2fuzz::frame::{FrameBuilder, SettingsFrame};
use h2fuzz::{Http1RequestFuzzer, Http1Upgrade, RoundRobin, client_preface};
use http::StatusCode;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_ATTEMPTS, TestRange};
use crate::connection::{Client, DEFAULT_READ_TIMEOUT, DEFAULT_RECEIVE_LENGTH, Transport};
use crate::error::RunnerError;
use crate::response::{first_line, hex_dump, log_received, parse_status};

/// Counters reported when a loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Tests whose bytes were sent
    pub completed:   u64,
    /// Sends that failed and were queued for another connection
    pub resent:      u64,
    /// Connections opened or accepted
    pub connections: u64,
}

fn receive_and_log<T: Transport>(transport: &mut T, test: u64) {
    match transport.receive(DEFAULT_RECEIVE_LENGTH) {
        Ok(data) => log_received(test, &data),
        Err(err) => warn!(test, "could not receive data, ignoring: {err}"),
    }
}

/// HTTP/2 client: connects to a server and sends one fuzzed frame per test.
///
/// Each fresh connection starts with the client preface and a valid
/// SETTINGS frame. A frame whose send fails is sent again, unchanged, on
/// the next connection.
#[derive(Debug)]
pub struct ClientDriver<T> {
    transport:   T,
    fuzzers:     RoundRobin,
    tests:       TestRange,
    upgrade:     Option<Http1Upgrade>,
    settings:    Vec<u8>,
    max_resends: u32,
    stats:       RunStats,
}

impl<T: Transport> ClientDriver<T> {
    pub fn new(transport: T, fuzzers: RoundRobin, tests: TestRange) -> Result<Self, RunnerError> {
        Ok(Self {
            transport,
            fuzzers,
            tests,
            upgrade: None,
            settings: SettingsFrame::new().encode()?,
            max_resends: DEFAULT_ATTEMPTS,
            stats: RunStats::default(),
        })
    }

    /// Start each connection with an HTTP/1.1 `Upgrade: h2c` request.
    pub fn with_upgrade(mut self, upgrade: Http1Upgrade) -> Self {
        self.upgrade = Some(upgrade);
        self
    }

    /// Give up after a frame failed to send this many times in a row.
    pub fn with_max_resends(mut self, max_resends: u32) -> Self {
        self.max_resends = max_resends.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn handshake(&mut self) -> Result<(), RunnerError> {
        self.transport.connect()?;
        self.stats.connections += 1;

        if let Some(upgrade) = &self.upgrade {
            info!("send an HTTP/1.1 upgrade request");
            self.transport.send(&upgrade.encode())?;
            let reply = self.transport.receive(DEFAULT_RECEIVE_LENGTH)?;
            if parse_status(&reply) == Some(StatusCode::SWITCHING_PROTOCOLS) {
                debug!("server switched to h2c");
            } else {
                warn!("upgrade not accepted: {:?}", first_line(&reply));
            }
        }

        info!("send a client connection preface");
        self.transport.send(&client_preface())?;
        info!("send a valid settings frame");
        self.transport.send(&self.settings)?;
        match self.transport.receive(DEFAULT_RECEIVE_LENGTH) {
            Ok(data) => debug!("handshake reply: {}", hex_dump(&data)),
            Err(err) => warn!("could not receive handshake reply: {err}"),
        }
        Ok(())
    }

    pub fn run(&mut self) -> Result<RunStats, RunnerError> {
        info!("started, test range {}", self.tests);
        let mut test = self.tests.start;
        let mut pending: Option<Vec<u8>> = None;
        let mut failures = 0;

        while self.tests.contains(test) {
            if !self.transport.is_connected() {
                self.handshake()?;
            }

            info!(test, "start");
            let frame = match pending.take() {
                Some(frame) => frame,
                None => self.fuzzers.next_test(test)?,
            };
            if let Err(err) = self.transport.send(&frame) {
                failures += 1;
                warn!(test, "could not send data: {err}");
                if failures >= self.max_resends {
                    self.transport.close();
                    return Err(err.into());
                }
                info!(test, "re-connect");
                self.transport.close();
                pending = Some(frame);
                self.stats.resent += 1;
                continue;
            }
            failures = 0;

            receive_and_log(&mut self.transport, test);
            self.stats.completed += 1;
            let Some(next) = test.checked_add(1) else {
                break;
            };
            test = next;
        }

        self.transport.close();
        info!("finished: {:?}", self.stats);
        Ok(self.stats)
    }
}

/// HTTP/2 server: accepts one connection at a time and answers it with
/// fuzzed frames.
///
/// A send error ends the session; the next accepted connection resumes the
/// same test with the same bytes.
#[derive(Debug)]
pub struct ServerDriver {
    fuzzers:      RoundRobin,
    tests:        TestRange,
    test:         u64,
    exhausted:    bool,
    pending:      Option<Vec<u8>>,
    settings:     Vec<u8>,
    read_timeout: Duration,
    stats:        RunStats,
}

impl ServerDriver {
    pub fn new(fuzzers: RoundRobin, tests: TestRange) -> Result<Self, RunnerError> {
        let mut settings = SettingsFrame::new();
        settings.disable_push();
        Ok(Self {
            fuzzers,
            tests,
            test: tests.start,
            exhausted: false,
            pending: None,
            settings: settings.encode()?,
            read_timeout: DEFAULT_READ_TIMEOUT,
            stats: RunStats::default(),
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Test the next session starts with.
    pub fn current_test(&self) -> u64 {
        self.test
    }

    pub fn is_finished(&self) -> bool {
        self.exhausted || !self.tests.contains(self.test)
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Bind `address` and serve connections until the range is done.
    pub fn listen(&mut self, address: &str) -> Result<RunStats, RunnerError> {
        let listener = TcpListener::bind(address)?;
        self.serve_listener(&listener)
    }

    pub fn serve_listener(&mut self, listener: &TcpListener) -> Result<RunStats, RunnerError> {
        info!(
            "started server on {}, test range {}",
            listener.local_addr()?,
            self.tests
        );
        while !self.is_finished() {
            let (stream, peer) = listener.accept()?;
            info!("accepted connection from {peer}");
            stream.set_read_timeout(Some(self.read_timeout))?;
            let mut connection = Client::from_stream(stream);
            self.serve(&mut connection)?;
        }
        info!("finished: {:?}", self.stats);
        Ok(self.stats)
    }

    /// Run tests on one accepted connection until the range is done or a
    /// send fails.
    pub fn serve<T: Transport>(&mut self, connection: &mut T) -> Result<(), RunnerError> {
        self.stats.connections += 1;

        info!("send a valid settings frame");
        if let Err(err) = connection.send(&self.settings) {
            warn!("could not send settings: {err}");
            connection.close();
            return Ok(());
        }
        match connection.receive(DEFAULT_RECEIVE_LENGTH) {
            Ok(data) => debug!("client greeting: {}", hex_dump(&data)),
            Err(err) => warn!("could not receive client greeting: {err}"),
        }

        while !self.is_finished() {
            let test = self.test;
            info!(test, "start");
            let frame = match self.pending.take() {
                Some(frame) => frame,
                None => self.fuzzers.next_test(test)?,
            };
            if let Err(err) = connection.send(&frame) {
                warn!(test, "could not send data: {err}");
                info!(test, "will be run again");
                self.pending = Some(frame);
                self.stats.resent += 1;
                break;
            }

            receive_and_log(connection, test);
            self.stats.completed += 1;
            match test.checked_add(1) {
                Some(next) => self.test = next,
                None => self.exhausted = true,
            }
        }

        connection.close();
        Ok(())
    }
}

/// HTTP/1.x request fuzzing, one fresh connection per test.
#[derive(Debug)]
pub struct Http1Driver<T> {
    transport: T,
    fuzzer:    Http1RequestFuzzer,
    tests:     TestRange,
    stats:     RunStats,
}

impl<T: Transport> Http1Driver<T> {
    pub fn new(transport: T, fuzzer: Http1RequestFuzzer, tests: TestRange) -> Self {
        Self {
            transport,
            fuzzer,
            tests,
            stats: RunStats::default(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn exchange(&mut self, test: u64, request: &[u8]) -> Result<(), RunnerError> {
        self.transport.connect()?;
        self.stats.connections += 1;
        self.transport.send(request)?;
        match self.transport.receive(DEFAULT_RECEIVE_LENGTH) {
            Ok(data) if data.is_empty() => info!(test, "no response"),
            Ok(data) => {
                let status = parse_status(&data).map(|status| status.as_u16());
                info!(test, ?status, "received: {}", first_line(&data));
            },
            Err(err) => warn!(test, "could not receive data, ignoring: {err}"),
        }
        Ok(())
    }

    pub fn run(&mut self) -> Result<RunStats, RunnerError> {
        info!("started, test range {}", self.tests);
        let mut test = self.tests.start;
        while self.tests.contains(test) {
            self.fuzzer.set_test(test);
            let request = self.fuzzer.next()?;
            info!(test, "send {} bytes", request.len());
            let result = self.exchange(test, &request);
            self.transport.close();
            result?;

            self.stats.completed += 1;
            let Some(next) = test.checked_add(1) else {
                break;
            };
            test = next;
        }
        info!("finished: {:?}", self.stats);
        Ok(self.stats)
    }
}
