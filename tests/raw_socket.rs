//! Testes com socket RAW de verdade. Precisam de root/CAP_NET_RAW:
//! `sudo -E cargo test -- --ignored`

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use pingrs::{EchoTransceiver, PingError, host};

#[test]
#[ignore = "requer privilégio de socket RAW"]
fn loopback_answers_within_timeout() {
    let timeout = Duration::from_millis(1000);
    let t = EchoTransceiver::new(host::current_identifier(), timeout);

    let reply = t.ping(Ipv4Addr::LOCALHOST).expect("loopback deveria responder");
    assert!(reply.delay >= 0.0);
    assert!(reply.delay < timeout.as_secs_f64());
}

#[test]
#[ignore = "requer privilégio de socket RAW"]
fn strict_mode_waits_for_the_real_reply() {
    // No loopback o próprio pedido também chega ao socket RAW
    let t = EchoTransceiver::new(host::current_identifier(), Duration::from_millis(1000))
        .strict(true);

    let reply = t.ping(Ipv4Addr::LOCALHOST).expect("loopback deveria responder");
    assert!(reply.header.is_echo_reply());
}

#[test]
#[ignore = "requer privilégio de socket RAW"]
fn dark_address_times_out_on_budget() {
    // 192.0.2.0/24 (TEST-NET-1) não tem ninguém respondendo
    let t = EchoTransceiver::new(host::current_identifier(), Duration::from_millis(200));

    let start = Instant::now();
    let err = t.ping(Ipv4Addr::new(192, 0, 2, 1)).unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, PingError::Timeout(_)), "{}", err);
    assert!(elapsed >= Duration::from_millis(200), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "{:?}", elapsed);
}
