//! HyperTransport against a one-shot HTTP/1.1 server on a local socket.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

use bytes::Bytes;
use http::{Method, StatusCode};
use restwire_core::{CallError, HttpRequest, HttpTransport, HyperTransport};

/// Accepts one connection, reports the raw request, answers with `status` and `body`.
fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        tx.send(request).unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
    });
    (format!("http://{addr}"), rx)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[test]
fn get_returns_status_and_body() {
    let (base, seen) = serve_once("200 OK", r#"{"ok":true}"#);
    let transport = HyperTransport::new().unwrap();
    let mut request = HttpRequest::new(Method::GET, format!("{base}/ping?x=1"));
    request.headers.push(("Accept".into(), "application/json".into()));

    let response = transport.execute(request).unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(br#"{"ok":true}"#));

    let raw = seen.recv().unwrap().to_lowercase();
    assert!(raw.starts_with("get /ping?x=1 http/1.1\r\n"), "{raw}");
    assert!(raw.contains("accept: application/json"));
}

#[test]
fn post_sends_the_encoded_body() {
    let (base, seen) = serve_once("201 Created", "{}");
    let transport = HyperTransport::new().unwrap();
    let mut request = HttpRequest::new(Method::POST, format!("{base}/users"));
    request.headers.push(("Content-Type".into(), "application/json".into()));
    request.body = Some(Bytes::from_static(br#"{"name":"ann"}"#));

    let response = transport.execute(request).unwrap();
    assert_eq!(response.status, StatusCode::CREATED);

    let raw = seen.recv().unwrap();
    assert!(raw.to_lowercase().starts_with("post /users http/1.1\r\n"));
    assert!(raw.ends_with(r#"{"name":"ann"}"#), "{raw}");
}

#[test]
fn error_status_is_a_response_not_a_transport_failure() {
    let (base, _seen) = serve_once("404 Not Found", r#"{"error":"missing"}"#);
    let transport = HyperTransport::new().unwrap();
    let response = transport
        .execute(HttpRequest::new(Method::GET, format!("{base}/users/9")))
        .unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(!response.is_success());
}

#[test]
fn refused_connection_is_a_transport_error() {
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    // The listener is dropped at the end of the statement above; nothing listens on addr.
    let transport = HyperTransport::new().unwrap();
    let err = transport
        .execute(HttpRequest::new(Method::GET, format!("http://{addr}/")))
        .unwrap_err();
    assert!(matches!(err, CallError::Transport(_)), "{err:?}");
}

#[test]
fn malformed_url_is_an_invalid_request() {
    let transport = HyperTransport::new().unwrap();
    let err = transport
        .execute(HttpRequest::new(Method::GET, "not a url"))
        .unwrap_err();
    assert!(matches!(err, CallError::InvalidRequest(_)), "{err:?}");
}

fn caller_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn execute_inside_a_runtime_does_not_reenter_it() {
    let (base, seen) = serve_once("200 OK", "[]");
    let transport = HyperTransport::new().unwrap();
    let response = caller_runtime()
        .block_on(async { transport.execute(HttpRequest::new(Method::GET, format!("{base}/inside"))) })
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"[]"));
    assert!(seen.recv().unwrap().to_lowercase().starts_with("get /inside "));
}

#[test]
fn failures_inside_a_runtime_are_errors() {
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let transport = HyperTransport::new().unwrap();
    let result = caller_runtime().block_on(async {
        transport.execute(HttpRequest::new(Method::GET, format!("http://{addr}/")))
    });
    assert!(matches!(result, Err(CallError::Transport(_))), "{result:?}");
}

#[test]
fn dropping_inside_a_runtime_is_allowed() {
    let transport = HyperTransport::new().unwrap();
    caller_runtime().block_on(async move { drop(transport) });
}
