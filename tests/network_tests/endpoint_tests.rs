//! Endpoint parsing tests

use std::path::PathBuf;

use tiny_mp_cache::{CacheError, Endpoint};

#[test]
fn test_bare_host_port_is_tcp() {
    let endpoint = Endpoint::parse("127.0.0.1:5002").unwrap();
    assert_eq!(endpoint, Endpoint::Tcp("127.0.0.1:5002".to_string()));
    assert!(endpoint.is_tcp());
}

#[test]
fn test_tcp_scheme() {
    let endpoint = Endpoint::parse("tcp://localhost:7000").unwrap();
    assert_eq!(endpoint, Endpoint::Tcp("localhost:7000".to_string()));
    assert_eq!(endpoint.to_string(), "localhost:7000");
}

#[test]
fn test_ipv6_host() {
    let endpoint = Endpoint::parse("[::1]:5002").unwrap();
    assert_eq!(endpoint, Endpoint::Tcp("[::1]:5002".to_string()));
}

#[test]
fn test_unix_scheme() {
    let endpoint = Endpoint::parse("unix:///tmp/cache.sock").unwrap();
    assert_eq!(endpoint, Endpoint::unix("/tmp/cache.sock"));
    assert!(!endpoint.is_tcp());
    assert_eq!(endpoint.to_string(), "unix:///tmp/cache.sock");
}

#[test]
fn test_relative_unix_path() {
    let endpoint: Endpoint = "unix://run/cache.sock".parse().unwrap();
    assert_eq!(endpoint, Endpoint::Unix(PathBuf::from("run/cache.sock")));
}

#[test]
fn test_display_round_trips_through_parse() {
    for input in ["10.0.0.1:80", "unix:///var/run/x.sock"] {
        let endpoint = Endpoint::parse(input).unwrap();
        assert_eq!(Endpoint::parse(&endpoint.to_string()).unwrap(), endpoint);
    }
}

#[test]
fn test_invalid_endpoints() {
    for input in ["", "localhost", ":5002", "host:", "host:notaport", "host:70000", "unix://"] {
        let result = Endpoint::parse(input);
        assert!(
            matches!(result, Err(CacheError::Config(_))),
            "{:?} should be rejected, got {:?}",
            input,
            result
        );
    }
}

#[test]
fn test_tcp_constructor_validates() {
    assert!(Endpoint::tcp("127.0.0.1:0").is_ok());
    assert!(Endpoint::tcp("no-port").is_err());
}
