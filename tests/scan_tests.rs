//! End-to-end scans against local listener stubs.

use portsweep::config::ScanConfiguration;
use portsweep::output::write_report;
use portsweep::scanner::{ScanEngine, ScanMode, ScanReport};
use portsweep::types::{resolve_ipv4, Port, PortSpec, ScanTarget};
use std::io::Write;
use std::net::{Ipv4Addr, TcpListener};
use std::thread;
use std::time::Duration;

/// Listener that greets every client with `greeting` and then hangs up.
fn greeting_stub(greeting: &'static [u8]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for mut conn in listener.incoming().flatten() {
            let _ = conn.write_all(greeting);
            thread::sleep(Duration::from_millis(50));
        }
    });
    port
}

/// A port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn scan(open: u16, closed: u16, banners: bool) -> ScanReport {
    let spec: PortSpec = format!("{},{}", open, closed).parse().unwrap();
    let ip = tokio_test::block_on(resolve_ipv4("127.0.0.1")).unwrap();
    let target = ScanTarget::new("127.0.0.1", ip, spec.to_ports());
    let config = ScanConfiguration::new()
        .with_threads(4)
        .with_timeout(Duration::from_millis(300))
        .with_banners(banners);

    ScanEngine::new(target, config).run().unwrap()
}

fn expected_order(open: u16, closed: u16) -> Vec<(u16, bool)> {
    let mut expected = vec![(open, true), (closed, false)];
    expected.sort();
    expected
}

#[test]
fn test_scan_without_banners() {
    let open = greeting_stub(b"220 stub ready\r\n");
    let closed = closed_port();

    let report = scan(open, closed, false);

    assert_eq!(report.target, "127.0.0.1");
    assert_eq!(report.scan_type, ScanMode::Connect);
    let got: Vec<(u16, bool)> = report
        .results
        .iter()
        .map(|r| (r.port.as_u16(), r.open))
        .collect();
    assert_eq!(got, expected_order(open, closed));
    assert!(report.results.iter().all(|r| r.banner.is_none()));
}

#[test]
fn test_scan_with_banners() {
    let open = greeting_stub(b"220 stub ready\r\n");
    let closed = closed_port();

    let report = scan(open, closed, true);

    let open_result = report
        .results
        .iter()
        .find(|r| r.port == Port::new(open).unwrap())
        .unwrap();
    assert!(open_result.open);
    assert!(
        open_result.banner.as_deref().unwrap().starts_with("220 stub ready"),
        "{:?}",
        open_result.banner
    );

    let closed_result = report
        .results
        .iter()
        .find(|r| r.port == Port::new(closed).unwrap())
        .unwrap();
    assert!(!closed_result.open);
    assert_eq!(closed_result.banner, None);
}

#[test]
fn test_report_file_contents() {
    let open = greeting_stub(b"hello\n");
    let closed = closed_port();
    let report = scan(open, closed, true);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    write_report(&report, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["target"], "127.0.0.1");
    assert_eq!(json["scan_type"], "connect");
    assert!(json["timestamp_ms"].as_i64().unwrap() > 0);

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    for entry in results {
        let port = entry["port"].as_u64().unwrap() as u16;
        if port == open {
            assert_eq!(entry["open"], true);
            assert!(entry["banner"].as_str().unwrap().starts_with("hello"));
        } else {
            assert_eq!(port, closed);
            assert_eq!(entry["open"], false);
            assert!(entry.get("banner").is_none());
        }
    }
}

#[test]
fn test_many_closed_ports_all_reported() {
    let spec: PortSpec = "1-50".parse().unwrap();
    let target = ScanTarget::new("localhost", Ipv4Addr::LOCALHOST, spec.to_ports());
    let config = ScanConfiguration::new()
        .with_threads(16)
        .with_timeout(Duration::from_millis(200));

    let report = ScanEngine::new(target, config).run().unwrap();
    let ports: Vec<u16> = report.results.iter().map(|r| r.port.as_u16()).collect();
    assert_eq!(ports, (1..=50).collect::<Vec<_>>());
}
