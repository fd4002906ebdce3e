//! Driver loops against a scripted transport and over loopback TCP.

mod fixtures;

use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use fixtures::*;
use h2fuzz::frame::{FrameBuilder, SettingsFrame, split_frames};
use h2fuzz::{CONNECTION_PREFACE, FuzzerKind, Http1RequestFuzzer, Http1Upgrade, client_preface};
use h2fuzz_runner::{
    Client, ClientDriver, Http1Driver, RunStats, RunnerError, ServerDriver, TestRange,
};

const PING_AND_SETTINGS: &[FuzzerKind] = &[FuzzerKind::Settings, FuzzerKind::Ping];

fn expected_frames(
    replica: &mut h2fuzz::RoundRobin,
    tests: std::ops::RangeInclusive<u64>,
) -> Vec<Vec<u8>> {
    tests.map(|test| replica.next_test(test).unwrap()).collect()
}

// =============================================================================
// Client driver
// =============================================================================

#[test]
fn test_client_sends_preface_settings_then_one_frame_per_test() {
    let (fuzzers, mut replica) = round_robin_pair(5, PING_AND_SETTINGS);
    let range = TestRange { start: 0, end: Some(3) };
    let mut driver = ClientDriver::new(MockTransport::new(), fuzzers, range).unwrap();
    let stats = driver.run().unwrap();

    assert_eq!(
        stats,
        RunStats {
            completed:   4,
            resent:      0,
            connections: 1,
        }
    );
    let sent = &driver.transport().sent;
    assert_eq!(sent[0], client_preface());
    assert_eq!(sent[1], SettingsFrame::new().encode().unwrap());
    assert_eq!(sent[2..], expected_frames(&mut replica, 0..=3)[..]);
    assert!(!driver.transport().connected);
}

#[test]
fn test_client_resends_same_frame_after_reconnect() {
    let (fuzzers, mut replica) = round_robin_pair(8, &FuzzerKind::ALL);
    let expected = expected_frames(&mut replica, 0..=2);

    // Calls: 0 preface, 1 settings, 2 test 0, 3 test 1 (fails)
    let transport = MockTransport::new().failing_sends(&[3]);
    let range = TestRange { start: 0, end: Some(2) };
    let mut driver = ClientDriver::new(transport, fuzzers, range).unwrap();
    let stats = driver.run().unwrap();

    assert_eq!(stats.completed, 3);
    assert_eq!(stats.resent, 1);
    assert_eq!(stats.connections, 2);

    let mock = driver.transport();
    assert_eq!(mock.failed, vec![expected[1].clone()]);
    assert_eq!(mock.sent.len(), 7);
    assert_eq!(mock.sent[2], expected[0]);
    assert_eq!(mock.sent[3], client_preface());
    assert_eq!(mock.sent[5], expected[1]);
    assert_eq!(mock.sent[6], expected[2]);
}

#[test]
fn test_client_gives_up_after_repeated_send_failures() {
    let (fuzzers, _) = round_robin_pair(2, PING_AND_SETTINGS);
    // Every frame send after a handshake fails.
    let transport = MockTransport::new().failing_sends(&[2, 5, 8]);
    let mut driver = ClientDriver::new(transport, fuzzers, TestRange::open(0))
        .unwrap()
        .with_max_resends(3);

    let err = driver.run().unwrap_err();
    assert!(matches!(err, RunnerError::Io(_)));
    assert_eq!(driver.transport().connects, 3);
    assert_eq!(driver.transport().failed.len(), 3);
}

#[test]
fn test_client_ignores_receive_failures() {
    let (fuzzers, _) = round_robin_pair(3, PING_AND_SETTINGS);
    // Receive 0 is the handshake reply, 1 follows test 0.
    let transport = MockTransport::new().failing_receives(&[1]);
    let range = TestRange { start: 0, end: Some(2) };
    let mut driver = ClientDriver::new(transport, fuzzers, range).unwrap();
    let stats = driver.run().unwrap();

    assert_eq!(stats.completed, 3);
    assert_eq!(stats.resent, 0);
    // The failed receive dropped the connection, so test 1 reconnected.
    assert_eq!(stats.connections, 2);
}

#[test]
fn test_client_starts_at_range_start() {
    let (fuzzers, mut replica) = round_robin_pair(11, &[FuzzerKind::GoAway]);
    let range = TestRange { start: 40, end: Some(41) };
    let mut driver = ClientDriver::new(MockTransport::new(), fuzzers, range).unwrap();
    driver.run().unwrap();
    assert_eq!(driver.transport().sent[2..], expected_frames(&mut replica, 40..=41)[..]);
}

#[test]
fn test_client_upgrade_handshake() {
    let (fuzzers, _) = round_robin_pair(1, &[FuzzerKind::Ping]);
    let transport = MockTransport::new()
        .with_replies(&[b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: h2c\r\n\r\n"]);
    let upgrade = Http1Upgrade::new("example.com");
    let mut driver = ClientDriver::new(transport, fuzzers, TestRange::single(0))
        .unwrap()
        .with_upgrade(upgrade.clone());
    driver.run().unwrap();

    let sent = &driver.transport().sent;
    assert_eq!(sent[0], upgrade.encode());
    assert_eq!(sent[1], client_preface());
    assert_eq!(sent.len(), 4);
}

// =============================================================================
// Server driver
// =============================================================================

#[test]
fn test_server_sends_push_disabled_settings() {
    let (fuzzers, _) = round_robin_pair(4, PING_AND_SETTINGS);
    let mut driver = ServerDriver::new(fuzzers, TestRange::single(0)).unwrap();
    let mut connection = MockTransport::accepted();
    driver.serve(&mut connection).unwrap();

    let settings = &connection.sent[0];
    let (frames, rest) = split_frames(settings);
    assert!(rest.is_empty());
    assert_eq!(frames[0].0.frame_type, 0x4);
    // ENABLE_PUSH is the second parameter.
    assert_eq!(&frames[0].1[6..12], &[0x00, 0x02, 0, 0, 0, 0]);
    assert!(driver.is_finished());
    assert_eq!(connection.closes, 1);
}

#[test]
fn test_server_resumes_same_test_on_next_connection() {
    let (fuzzers, mut replica) = round_robin_pair(6, &FuzzerKind::ALL);
    let expected = expected_frames(&mut replica, 0..=4);
    let range = TestRange { start: 0, end: Some(4) };
    let mut driver = ServerDriver::new(fuzzers, range).unwrap();

    // Calls: 0 settings, 1 test 0, 2 test 1, 3 test 2 (fails)
    let mut first = MockTransport::accepted().failing_sends(&[3]);
    driver.serve(&mut first).unwrap();
    assert_eq!(driver.current_test(), 2);
    assert!(!driver.is_finished());
    assert_eq!(first.sent[1..], expected[..2]);
    assert_eq!(first.failed, vec![expected[2].clone()]);

    let mut second = MockTransport::accepted();
    driver.serve(&mut second).unwrap();
    assert!(driver.is_finished());
    assert_eq!(second.sent[1..], expected[2..]);
    assert_eq!(
        driver.stats(),
        RunStats {
            completed:   5,
            resent:      1,
            connections: 2,
        }
    );
}

#[test]
fn test_server_session_ends_when_settings_cannot_be_sent() {
    let (fuzzers, _) = round_robin_pair(4, PING_AND_SETTINGS);
    let mut driver = ServerDriver::new(fuzzers, TestRange::single(7)).unwrap();
    let mut connection = MockTransport::accepted().failing_sends(&[0]);
    driver.serve(&mut connection).unwrap();
    assert_eq!(driver.current_test(), 7);
    assert_eq!(driver.stats().completed, 0);
}

// =============================================================================
// HTTP/1 driver
// =============================================================================

#[test]
fn test_http1_one_connection_per_test() {
    let p = params(13);
    let fuzzer = Http1RequestFuzzer::with_default_request(&p).unwrap();
    let mut replica = Http1RequestFuzzer::with_default_request(&p).unwrap();
    let transport = MockTransport::new().with_replies(&[b"HTTP/1.1 400 Bad Request\r\n\r\n"]);
    let range = TestRange { start: 0, end: Some(2) };
    let mut driver = Http1Driver::new(transport, fuzzer, range);
    let stats = driver.run().unwrap();

    assert_eq!(stats.completed, 3);
    assert_eq!(stats.connections, 3);
    let mock = driver.transport();
    assert_eq!(mock.connects, 3);
    assert_eq!(mock.closes, 3);
    for (test, request) in mock.sent.iter().enumerate() {
        replica.set_test(test as u64);
        assert_eq!(request, &replica.next().unwrap());
        assert!(request.ends_with(b"\r\n\r\n"));
    }
}

#[test]
fn test_http1_send_failure_is_fatal() {
    let fuzzer = Http1RequestFuzzer::with_default_request(&params(1)).unwrap();
    let transport = MockTransport::new().failing_sends(&[1]);
    let mut driver = Http1Driver::new(transport, fuzzer, TestRange::open(0));
    assert!(matches!(driver.run(), Err(RunnerError::Io(_))));
    assert_eq!(driver.transport().sent.len(), 1);
    assert_eq!(driver.transport().closes, 2);
}

// =============================================================================
// Loopback TCP
// =============================================================================

#[test]
fn test_client_driver_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let peer = std::thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).unwrap();
        received
    });

    let (fuzzers, mut replica) = round_robin_pair(21, PING_AND_SETTINGS);
    let client = Client::new(address).with_read_timeout(Some(Duration::from_millis(10)));
    let range = TestRange { start: 0, end: Some(4) };
    let stats = ClientDriver::new(client, fuzzers, range).unwrap().run().unwrap();
    assert_eq!(stats.completed, 5);

    let received = peer.join().unwrap();
    assert!(received.starts_with(CONNECTION_PREFACE));
    let (frames, rest) = split_frames(&received[CONNECTION_PREFACE.len()..]);
    assert!(rest.is_empty());
    assert_eq!(frames.len(), 6);

    let mut expected = SettingsFrame::new().encode().unwrap();
    for frame in expected_frames(&mut replica, 0..=4) {
        expected.extend(frame);
    }
    assert_eq!(&received[CONNECTION_PREFACE.len()..], &expected[..]);
}

#[test]
fn test_server_driver_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    let (fuzzers, mut replica) = round_robin_pair(9, &[FuzzerKind::Ping]);
    let server = std::thread::spawn(move || {
        ServerDriver::new(fuzzers, TestRange { start: 0, end: Some(2) })
            .unwrap()
            .with_read_timeout(Duration::from_millis(10))
            .serve_listener(&listener)
            .unwrap()
    });

    let mut socket = TcpStream::connect(address).unwrap();
    let mut received = Vec::new();
    socket.read_to_end(&mut received).unwrap();
    let stats = server.join().unwrap();
    assert_eq!(stats.completed, 3);

    let (frames, rest) = split_frames(&received);
    assert!(rest.is_empty());
    assert_eq!(frames.len(), 4);
    let fuzzed: Vec<u8> = expected_frames(&mut replica, 0..=2).concat();
    let settings_len = 9 + frames[0].0.length as usize;
    assert_eq!(&received[settings_len..], &fuzzed[..]);
}
