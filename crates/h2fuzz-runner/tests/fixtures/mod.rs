#![allow(dead_code)]
//! Scripted in-memory transport and fuzzer set-up shared by the driver
//! tests.

use std::collections::VecDeque;
use std::io;

use bytes::Bytes;
use h2fuzz::{FuzzConfig, FuzzerKind, MutationParams, RatioWindow, RoundRobin};
use h2fuzz_runner::Transport;

/// Transport that records what was sent and fails on chosen calls.
///
/// Call numbers count every `send` (or `receive`) call from zero, failed
/// ones included. Any failure marks the transport disconnected.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub connected:     bool,
    pub connects:      usize,
    pub closes:        usize,
    /// Bytes of successful sends, in order
    pub sent:          Vec<Vec<u8>>,
    /// Bytes of failed sends, in order
    pub failed:        Vec<Vec<u8>>,
    send_calls:        usize,
    receive_calls:     usize,
    fail_sends:        Vec<usize>,
    fail_receives:     Vec<usize>,
    replies:           VecDeque<Vec<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_sends(mut self, calls: &[usize]) -> Self {
        self.fail_sends = calls.to_vec();
        self
    }

    pub fn failing_receives(mut self, calls: &[usize]) -> Self {
        self.fail_receives = calls.to_vec();
        self
    }

    /// Queue replies handed out by successive receives; afterwards
    /// receives return nothing.
    pub fn with_replies(mut self, replies: &[&[u8]]) -> Self {
        self.replies = replies.iter().map(|r| r.to_vec()).collect();
        self
    }

    /// Connected from the start, like an accepted socket.
    pub fn accepted() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }
}

impl Transport for MockTransport {
    fn connect(&mut self) -> io::Result<()> {
        self.connected = true;
        self.connects += 1;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let call = self.send_calls;
        self.send_calls += 1;
        if self.fail_sends.contains(&call) || !self.connected {
            self.connected = false;
            self.failed.push(data.to_vec());
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.sent.push(data.to_vec());
        Ok(())
    }

    fn receive(&mut self, max_len: usize) -> io::Result<Bytes> {
        let call = self.receive_calls;
        self.receive_calls += 1;
        if self.fail_receives.contains(&call) {
            self.connected = false;
            return Err(io::Error::from(io::ErrorKind::ConnectionReset));
        }
        let mut reply = self.replies.pop_front().unwrap_or_default();
        reply.truncate(max_len);
        Ok(Bytes::from(reply))
    }

    fn close(&mut self) {
        self.connected = false;
        self.closes += 1;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

pub fn params(seed: u64) -> MutationParams {
    MutationParams::new(seed, 0, RatioWindow::default()).unwrap()
}

/// Two identical compositions: one for the driver, one to predict its output.
pub fn round_robin_pair(seed: u64, enabled: &[FuzzerKind]) -> (RoundRobin, RoundRobin) {
    let config = FuzzConfig {
        params:  params(seed),
        enabled: enabled.to_vec(),
    };
    (
        RoundRobin::from_config(&config).unwrap(),
        RoundRobin::from_config(&config).unwrap(),
    )
}
