#![cfg(feature = "cli")]

use std::net::TcpListener;
use std::process::Command;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use wcfrpc_frame::{exchange_handshake, FrameReader, FrameWriter, PAIR1_PROTOCOL};
use wcfrpc_proto::{
    decode_request, encode_response, Function, Request, RequestPayload, Response,
    ResponsePayload, UserInfo,
};
use wcfrpc_transport::{Address, TcpTransport};

fn wcfrpc() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_wcfrpc"));
    command
        .env_remove("WCFRPC_ADDR")
        .env_remove("WCFRPC_EVENT_ADDR")
        .arg("--log-level")
        .arg("error");
    command
}

/// A port nothing listens on.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("probe should bind");
    let port = listener.local_addr().expect("probe address").port();
    drop(listener);
    port
}

/// Serve one command connection, answering with `handler`.
///
/// Requests are forwarded on the returned channel.
fn serve_once<F>(handler: F) -> (Address, mpsc::Receiver<Request>)
where
    F: Fn(&Request) -> Response + Send + 'static,
{
    let listener =
        TcpTransport::bind(&Address::new("127.0.0.1", 0)).expect("host listener should bind");
    let address = listener.address().clone();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let Ok(mut stream) = listener.accept() else {
            return;
        };
        if exchange_handshake(&mut stream, PAIR1_PROTOCOL).is_err() {
            return;
        }
        let Ok(read_half) = stream.try_clone() else {
            return;
        };
        let mut reader = FrameReader::new(read_half);
        let mut writer = FrameWriter::new(stream);
        while let Ok(frame) = reader.read_frame() {
            let Ok(request) = decode_request(&frame.payload) else {
                return;
            };
            let response = handler(&request);
            let _ = tx.send(request);
            if writer.send(&encode_response(&response)).is_err() {
                return;
            }
        }
    });

    (address, rx)
}

#[test]
fn version_prints_package_version() {
    let output = wcfrpc().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_names_the_protocol() {
    let output = wcfrpc()
        .args(["version", "--extended"])
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pair1 (0x0011)"), "{stdout}");
}

#[test]
fn refused_connection_exits_with_transport_code() {
    let output = wcfrpc()
        .arg("--addr")
        .arg(format!("tcp://127.0.0.1:{}", closed_port()))
        .arg("status")
        .output()
        .expect("status should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "{stderr}");
}

#[test]
fn malformed_address_is_a_usage_error() {
    let output = wcfrpc()
        .args(["--addr", "127.0.0.1:10086", "status"])
        .output()
        .expect("status should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn address_is_read_from_the_environment() {
    let output = wcfrpc()
        .env("WCFRPC_ADDR", "udp://127.0.0.1:1")
        .arg("status")
        .output()
        .expect("status should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn status_reports_the_logged_in_account() {
    let (address, requests) = serve_once(|request| {
        let function = Function::try_from(request.func).unwrap_or(Function::Reserved);
        match function {
            Function::IsLogin => Response::with_status(function, 1),
            Function::GetUserInfo => Response::with_payload(
                function,
                ResponsePayload::Ui(UserInfo {
                    wxid: "wxid_self".into(),
                    name: "Bot".into(),
                    mobile: "10000".into(),
                    home: "/data/host".into(),
                }),
            ),
            other => Response::with_status(other, 0),
        }
    });

    let output = wcfrpc()
        .args(["--format", "json", "--addr", &address.to_string(), "status"])
        .output()
        .expect("status should run");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("status output should be json");
    assert_eq!(value["logged_in"], true);
    assert_eq!(value["account"]["wxid"], "wxid_self");

    let first = requests
        .recv_timeout(Duration::from_secs(5))
        .expect("host should see a request");
    assert_eq!(first.func, Function::IsLogin as i32);
}

#[test]
fn send_text_carries_mentions_and_host_status() {
    let (address, requests) = serve_once(|request| {
        let function = Function::try_from(request.func).unwrap_or(Function::Reserved);
        Response::with_status(function, 0)
    });

    let output = wcfrpc()
        .args([
            "--format",
            "json",
            "--addr",
            &address.to_string(),
            "send",
            "text",
            "123@chatroom",
            "hello @Alice",
            "--at",
            "wxid_alice",
        ])
        .output()
        .expect("send should run");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"success\":true"), "{stdout}");

    let request = requests
        .recv_timeout(Duration::from_secs(5))
        .expect("host should see the send");
    match request.msg {
        Some(RequestPayload::Txt(txt)) => {
            assert_eq!(txt.receiver, "123@chatroom");
            assert_eq!(txt.aters, "wxid_alice");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn failed_host_status_exits_with_failure() {
    let (address, _requests) = serve_once(|request| {
        let function = Function::try_from(request.func).unwrap_or(Function::Reserved);
        Response::with_status(function, -1)
    });

    let output = wcfrpc()
        .args([
            "--format",
            "json",
            "--addr",
            &address.to_string(),
            "send",
            "pat",
            "123@chatroom",
            "wxid_alice",
        ])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(1));
}
