use lagline::client::{self, Endpoint, ProberConfig, ProberError};
use lagline::protocol::{Message, Timestamp};
use lagline::server::{Responder, ServerCounters, ShutdownHandle};
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

struct TestResponder {
    addr: SocketAddr,
    counters: ServerCounters,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<()>>,
}

impl TestResponder {
    fn start() -> Self {
        let counters = ServerCounters::detached();
        let responder =
            Responder::bind("127.0.0.1:0", counters.clone()).expect("Failed to bind responder");
        let addr = responder.local_addr().unwrap();
        let shutdown = responder.shutdown_handle().unwrap();
        let handle = thread::spawn(move || {
            responder.serve().expect("responder failed");
        });

        Self {
            addr,
            counters,
            shutdown,
            handle: Some(handle),
        }
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::parse(&format!("tcp://{}", self.addr)).unwrap()
    }
}

impl Drop for TestResponder {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn fast_config(probe_count: usize) -> ProberConfig {
    ProberConfig {
        probe_count,
        interval: Duration::from_millis(10),
        probe_timeout: Duration::from_secs(2),
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Raw line-oriented client for poking the responder directly
struct RawClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl RawClient {
    fn connect(addr: SocketAddr) -> Self {
        let writer = TcpStream::connect(addr).unwrap();
        writer
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let reader = BufReader::new(writer.try_clone().unwrap());
        Self { reader, writer }
    }

    fn send_line(&mut self, line: &[u8]) {
        self.writer.write_all(line).unwrap();
        self.writer.write_all(b"\n").unwrap();
    }

    fn recv_message(&mut self) -> Message {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        Message::decode(line.trim_end().as_bytes()).unwrap()
    }
}

#[test]
fn test_live_session_collects_every_sample_and_closes() {
    let responder = TestResponder::start();
    let mut observed = Vec::new();

    let session = client::run(
        &responder.endpoint(),
        &fast_config(3),
        Duration::from_secs(1),
        |index, sample| observed.push((index, sample)),
    )
    .expect("session should succeed");

    assert_eq!(session.len(), 3);
    assert!(session.is_complete());
    assert_eq!(observed.len(), 3);
    assert!(session.samples().iter().all(|s| s.as_millis() >= 0.0));

    // the responder sees the prober hang up
    assert!(wait_until(Duration::from_secs(2), || {
        responder.counters.snapshot().connections_active == 0
    }));
    let stats = responder.counters.snapshot();
    assert_eq!(stats.connections_total, 1);
    assert_eq!(stats.probes_received, 3);
    assert_eq!(stats.echoes_sent, 3);
}

#[test]
fn test_echo_preserves_timestamp_exactly() {
    let responder = TestResponder::start();
    let mut raw = RawClient::connect(responder.addr);

    for millis in [0.0, 1234.56, 98_765.432_1, 1.0e-7] {
        raw.send_line(&Message::probe(Timestamp(millis)).encode().unwrap());
        assert_eq!(
            raw.recv_message(),
            Message::Echo {
                sent_at: Timestamp(millis)
            }
        );
    }
}

#[test]
fn test_silent_endpoint_times_out_instead_of_hanging() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // accept and hold the connection without ever answering
    let holder = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(1));
        drop(stream);
    });

    let config = ProberConfig {
        probe_count: 3,
        interval: Duration::ZERO,
        probe_timeout: Duration::from_millis(200),
    };
    let start = Instant::now();
    let failure = client::run(
        &Endpoint::from(addr),
        &config,
        Duration::from_secs(1),
        |_, _| {},
    )
    .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(failure.session.is_empty());
    assert!(matches!(
        failure.error,
        ProberError::ProbeTimeout { probe: 1, .. }
    ));
    holder.join().unwrap();
}

#[test]
fn test_trickling_endpoint_still_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // dribble spaces faster than the probe timeout, never finishing a frame
    let trickler = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let until = Instant::now() + Duration::from_secs(2);
        while Instant::now() < until {
            if stream.write_all(b" ").is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
    });

    let config = ProberConfig {
        probe_count: 1,
        interval: Duration::ZERO,
        probe_timeout: Duration::from_millis(300),
    };
    let start = Instant::now();
    let failure = client::run(
        &Endpoint::from(addr),
        &config,
        Duration::from_secs(1),
        |_, _| {},
    )
    .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(1), "{:?}", start.elapsed());
    assert!(matches!(
        failure.error,
        ProberError::ProbeTimeout { probe: 1, .. }
    ));
    trickler.join().unwrap();
}

#[test]
fn test_peer_drop_mid_session_keeps_partial_samples() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // echo one probe, then hang up
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let probe = Message::decode(line.trim_end().as_bytes()).unwrap();
        writer
            .write_all(&probe.echo().unwrap().encode().unwrap())
            .unwrap();
        writer.write_all(b"\n").unwrap();
        line.clear();
        reader.read_line(&mut line).unwrap();
    });

    let failure = client::run(
        &Endpoint::from(addr),
        &fast_config(5),
        Duration::from_secs(1),
        |_, _| {},
    )
    .unwrap_err();

    assert_eq!(failure.session.len(), 1);
    assert_eq!(failure.error.probe(), Some(2));
    assert!(matches!(
        failure.error,
        ProberError::ConnectionClosed { probe: 2 }
    ));
    server.join().unwrap();
}

#[test]
fn test_unreachable_endpoint_is_connection_error() {
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let failure = client::run(
        &Endpoint::from(addr),
        &fast_config(1),
        Duration::from_millis(500),
        |_, _| {},
    )
    .unwrap_err();

    assert!(failure.session.is_empty());
    assert!(matches!(failure.error, ProberError::Connection { .. }));
    assert_eq!(failure.error.probe(), None);
}

#[test]
fn test_malformed_frame_does_not_disturb_other_clients() {
    let responder = TestResponder::start();

    let mut noisy = RawClient::connect(responder.addr);
    noisy.send_line(b"{\"type\":\"ping\",\"timestamp\":");
    noisy.send_line(b"definitely not json");
    assert!(wait_until(Duration::from_secs(2), || {
        responder.counters.snapshot().malformed_frames == 2
    }));

    // a concurrent, well-behaved client is served normally
    let session = client::run(
        &responder.endpoint(),
        &fast_config(2),
        Duration::from_secs(1),
        |_, _| {},
    )
    .expect("clean client should succeed");
    assert_eq!(session.len(), 2);

    // and the noisy connection itself is still alive
    noisy.send_line(&Message::probe(Timestamp(42.0)).encode().unwrap());
    assert_eq!(
        noisy.recv_message(),
        Message::Echo {
            sent_at: Timestamp(42.0)
        }
    );
}
