//! Accept loop tests over real TCP and TLS on a loopback port.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use capsule::content::Resolver;
use capsule::gemini::connection::ServerContext;
use capsule::server::listener::serve;
use capsule::server::tls::load_acceptor;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn content_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("about.gmi"), "# About\n").unwrap();
    dir
}

async fn start_server(dir: &TempDir, request_timeout: Duration, max_connections: usize) -> SocketAddr {
    let acceptor = load_acceptor(&fixture("server.crt"), &fixture("server.key")).unwrap();
    let resolver = Resolver::new(dir.path()).unwrap();
    let context = Arc::new(ServerContext::new(resolver, request_timeout));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, acceptor, context, max_connections));

    addr
}

fn connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();
    let pem = fs::read(fixture("ca.crt")).unwrap();
    for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
        roots.add(cert.unwrap()).unwrap();
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

async fn fetch(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let tcp = TcpStream::connect(addr).await.unwrap();
    let domain = ServerName::try_from("localhost").unwrap();
    let mut tls = connector().connect(domain, tcp).await.unwrap();

    tls.write_all(request).await.unwrap();

    let mut received = Vec::new();
    match tls.read_to_end(&mut received).await {
        Ok(_) => {}
        // Peers that drop TCP without close_notify still delivered the response.
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
        Err(e) => panic!("read failed: {e}"),
    }
    received
}

#[tokio::test]
async fn test_request_over_tls() {
    let dir = content_root();
    let addr = start_server(&dir, Duration::from_secs(10), 4).await;

    let received = timeout(Duration::from_secs(5), fetch(addr, b"gemini://localhost/about\r\n"))
        .await
        .unwrap();

    assert_eq!(received, b"20 text/gemini\r\n# About\n");
}

#[tokio::test]
async fn test_silent_client_is_dropped_after_handshake_timeout() {
    let dir = content_root();
    let addr = start_server(&dir, Duration::from_millis(200), 1).await;

    let mut silent = TcpStream::connect(addr).await.unwrap();

    let mut received = Vec::new();
    let read = timeout(Duration::from_secs(5), silent.read_to_end(&mut received))
        .await
        .unwrap();

    // Closed with a FIN or a reset, but never with any bytes.
    assert!(read.is_ok() || read.unwrap_err().kind() == io::ErrorKind::ConnectionReset);
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_connection_cap_holds_next_client_until_permit_released() {
    let dir = content_root();
    let addr = start_server(&dir, Duration::from_secs(10), 1).await;

    let first = TcpStream::connect(addr).await.unwrap();
    // Let the accept loop take the only permit.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = tokio::spawn(fetch(addr, b"gemini://localhost/about\r\n"));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!second.is_finished());

    drop(first);

    let received = timeout(Duration::from_secs(5), second)
        .await
        .unwrap()
        .unwrap();
    assert!(received.starts_with(b"20 text/gemini\r\n"));
}
