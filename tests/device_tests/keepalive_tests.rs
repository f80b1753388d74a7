//! Keepalive Tests
//!
//! Tests verify:
//! - A send inside the keepalive window reuses the connection
//! - A send after the window reconnects
//! - Refresh batches never open a new window but may extend one
//! - Explicit disconnect cancels a pending window
//! - Dropping the last handle closes a pending window's connection
//! - A batch outliving the window keeps its connection
//! - Accessors answer while a batch is running
//! - Connect attempts are rate limited

#[path = "../common/mod.rs"]
mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::{cc, init_tracing, test_config, Reply, ScriptedTransport};
use jvcprojector::config::Config;
use jvcprojector::device::RateLimiter;
use jvcprojector::protocol::{opcode, HEAD_ACK, HEAD_RES};
use jvcprojector::{AuthScheme, Command, Device};

// =============================================================================
// Helper Functions
// =============================================================================

const TTL_MS: u64 = 150;

fn keepalive_config() -> Config {
    let mut config = test_config();
    config.keepalive_ttl_ms = TTL_MS;
    config
}

fn setup_device(transport: &ScriptedTransport) -> Device<ScriptedTransport> {
    init_tracing();
    Device::with_transport(keepalive_config(), transport.clone()).unwrap()
}

fn push_power_ref(transport: &ScriptedTransport, value: &str) {
    transport
        .push_line(cc(&HEAD_ACK, opcode::POWER))
        .push_line(cc(&HEAD_RES, &format!("{}{}", opcode::POWER, value)));
}

fn refresh_batch() -> [Command; 2] {
    [Command::reference(opcode::POWER), Command::reference(opcode::INPUT)]
}

// =============================================================================
// Window Tests
// =============================================================================

#[test]
fn test_send_within_window_reuses_connection() {
    let transport = ScriptedTransport::new();
    transport
        .push_handshake()
        .push_line(cc(&HEAD_ACK, "RC"))
        .push_line(cc(&HEAD_ACK, "RC"));
    let device = setup_device(&transport);

    device.send(&mut [Command::operation("RC7301")]).unwrap();
    assert!(device.is_connected());

    let mut cmds = [Command::operation("RC7302")];
    device.send(&mut cmds).unwrap();

    assert!(cmds[0].is_acknowledged());
    assert_eq!(transport.connect_calls(), 1);
    // Greeting + auth read only once
    assert_eq!(transport.read_calls(), 2);
}

#[test]
fn test_window_expiry_disconnects() {
    let transport = ScriptedTransport::new();
    transport.push_handshake().push_line(cc(&HEAD_ACK, "RC"));
    let device = setup_device(&transport);

    device.send(&mut [Command::operation("RC7301")]).unwrap();
    assert!(device.is_connected());

    thread::sleep(Duration::from_millis(TTL_MS * 3));
    assert!(!device.is_connected());
}

#[test]
fn test_send_after_window_reconnects() {
    let transport = ScriptedTransport::new();
    transport.push_handshake().push_line(cc(&HEAD_ACK, "RC"));
    let device = setup_device(&transport);

    device.send(&mut [Command::operation("RC7301")]).unwrap();
    thread::sleep(Duration::from_millis(TTL_MS * 3));

    transport.push_handshake().push_line(cc(&HEAD_ACK, "RC"));
    let mut cmds = [Command::operation("RC7302")];
    device.send(&mut cmds).unwrap();

    assert!(cmds[0].is_acknowledged());
    assert_eq!(transport.connect_calls(), 2);
    assert_eq!(transport.read_calls(), 4);
}

#[test]
fn test_reused_window_is_rescheduled() {
    let transport = ScriptedTransport::new();
    transport.push_handshake();
    for _ in 0..3 {
        transport.push_line(cc(&HEAD_ACK, "RC"));
    }
    let device = setup_device(&transport);

    // Each send lands inside the previous window, past the first one's expiry
    for _ in 0..3 {
        device.send(&mut [Command::operation("RC7301")]).unwrap();
        thread::sleep(Duration::from_millis(TTL_MS / 2));
    }

    assert_eq!(transport.connect_calls(), 1);
    assert!(device.is_connected());
}

#[test]
fn test_batch_outliving_window_keeps_connection() {
    let transport = ScriptedTransport::new();
    transport
        .push_handshake()
        .push_line(cc(&HEAD_ACK, "RC"))
        .push_line_reply(Reply::Delayed(
            Duration::from_millis(TTL_MS * 3),
            cc(&HEAD_ACK, "RC"),
        ))
        .push_line(cc(&HEAD_ACK, "RC"));
    let device = setup_device(&transport);

    device.send(&mut [Command::operation("RC7301")]).unwrap();

    // The second command answers long after the first window would expire
    let mut cmds = [Command::operation("RC7302"), Command::operation("RC7303")];
    device.send(&mut cmds).unwrap();

    assert!(cmds.iter().all(Command::is_acknowledged));
    assert_eq!(transport.connect_calls(), 1);
    assert_eq!(transport.state.lock().disconnect_calls, 0);
    assert!(device.is_connected());
}

#[test]
fn test_accessors_do_not_wait_for_running_batch() {
    let transport = ScriptedTransport::new();
    transport
        .push_handshake()
        .push_line_reply(Reply::Delayed(Duration::from_millis(500), cc(&HEAD_ACK, "RC")));
    let device = setup_device(&transport);

    let sender = device.clone();
    let batch = thread::spawn(move || sender.send(&mut [Command::operation("RC7301")]));
    thread::sleep(Duration::from_millis(100));

    let start = Instant::now();
    assert!(device.is_connected());
    assert_eq!(device.auth_scheme(), Some(AuthScheme::None));
    assert_eq!(device.peer_addr(), None);
    assert!(start.elapsed() < Duration::from_millis(250));

    batch.join().unwrap().unwrap();
}

// =============================================================================
// Refresh Tests
// =============================================================================

#[test]
fn test_refresh_does_not_open_window() {
    let transport = ScriptedTransport::new();
    transport.push_handshake();
    push_power_ref(&transport, "1");
    transport
        .push_line(cc(&HEAD_ACK, opcode::INPUT))
        .push_line(cc(&HEAD_RES, "IP6"));
    let device = setup_device(&transport);

    let mut cmds = refresh_batch();
    device.send(&mut cmds).unwrap();

    assert!(cmds[1].is_acknowledged());
    assert!(!device.is_connected());
}

#[test]
fn test_refresh_extends_existing_window() {
    let transport = ScriptedTransport::new();
    transport.push_handshake().push_line(cc(&HEAD_ACK, "RC"));
    push_power_ref(&transport, "1");
    transport
        .push_line(cc(&HEAD_ACK, opcode::INPUT))
        .push_line(cc(&HEAD_RES, "IP6"));
    let device = setup_device(&transport);

    device.send(&mut [Command::operation("RC7301")]).unwrap();

    let mut cmds = refresh_batch();
    device.send(&mut cmds).unwrap();

    assert_eq!(transport.connect_calls(), 1);
    assert!(device.is_connected());
}

// =============================================================================
// Disconnect Tests
// =============================================================================

#[test]
fn test_disconnect_cancels_window() {
    let transport = ScriptedTransport::new();
    transport.push_handshake().push_line(cc(&HEAD_ACK, "RC"));
    let device = setup_device(&transport);

    device.send(&mut [Command::operation("RC7301")]).unwrap();
    device.disconnect();
    assert!(!device.is_connected());
    assert_eq!(transport.state.lock().disconnect_calls, 1);

    // The cancelled job must not close a later connection
    transport.push_handshake();
    device.connect().unwrap();
    thread::sleep(Duration::from_millis(TTL_MS * 3));
    assert!(device.is_connected());
}

#[test]
fn test_dropping_last_handle_closes_connection() {
    let transport = ScriptedTransport::new();
    transport.push_handshake().push_line(cc(&HEAD_ACK, "RC"));
    let device = setup_device(&transport);

    device.send(&mut [Command::operation("RC7301")]).unwrap();
    let other = device.clone();
    drop(device);
    assert!(transport.connected());

    drop(other);
    assert!(!transport.connected());

    // The orphaned window finds nothing to close
    thread::sleep(Duration::from_millis(TTL_MS * 3));
    assert_eq!(transport.state.lock().disconnect_calls, 1);
}

#[test]
fn test_disconnect_is_idempotent() {
    let transport = ScriptedTransport::new();
    let device = setup_device(&transport);

    device.disconnect();
    device.disconnect();
    assert!(!device.is_connected());
}

// =============================================================================
// Rate Limit Tests
// =============================================================================

#[test]
fn test_reconnects_are_spaced() {
    let transport = ScriptedTransport::new();
    let mut config = keepalive_config();
    config.connect_spacing_ms = 200;
    init_tracing();
    let device = Device::with_transport(config, transport.clone()).unwrap();

    let start = Instant::now();
    for _ in 0..2 {
        transport.push_handshake().push_line(cc(&HEAD_ACK, "RC"));
        device.send(&mut [Command::operation("RC7301")]).unwrap();
        device.disconnect();
    }

    assert_eq!(transport.connect_calls(), 2);
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[test]
fn test_rate_limiter_first_call_is_immediate() {
    let mut limiter = RateLimiter::new(Duration::from_secs(5));
    assert!(limiter.last_attempt().is_none());

    let start = Instant::now();
    limiter.wait();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(limiter.last_attempt().is_some());
}

#[test]
fn test_rate_limiter_waits_remainder() {
    let mut limiter = RateLimiter::new(Duration::from_millis(100));
    limiter.wait();
    let first = limiter.last_attempt().unwrap();

    limiter.wait();
    let second = limiter.last_attempt().unwrap();
    assert!(second.duration_since(first) >= Duration::from_millis(100));
}
