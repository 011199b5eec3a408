#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use wcfrpc_client::ClientConfig;
use wcfrpc_frame::{exchange_handshake, FrameReader, FrameWriter, PAIR1_PROTOCOL};
use wcfrpc_proto::{
    decode_request, encode_response, Function, Request, RequestPayload, Response,
    ResponsePayload, RpcContact, RpcContacts, UserInfo, WxMsg,
};
use wcfrpc_transport::{Address, TcpTransport};

pub type Handler = dyn Fn(&Request) -> Response + Send + Sync;

/// In-process stand-in for the automation host.
///
/// Serves every command connection on its own thread through `handler`, and
/// publishes whatever is sent on `publish` to the current event-stream
/// connection.
pub struct FakeHost {
    pub command: Address,
    pub events: Address,
    publish: Sender<WxMsg>,
    requests: Receiver<Request>,
    event_closed: Receiver<()>,
}

impl FakeHost {
    pub fn start() -> Self {
        Self::with_handler(default_handler)
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        let handler: Arc<Handler> = Arc::new(handler);
        let (requests_tx, requests) = channel::unbounded();
        let (publish, publish_rx) = channel::unbounded::<WxMsg>();
        let (closed_tx, event_closed) = channel::unbounded();

        let command_listener = TcpTransport::bind(&Address::new("127.0.0.1", 0))
            .expect("command listener should bind");
        let command = command_listener.address().clone();
        thread::spawn(move || {
            while let Ok(stream) = command_listener.accept() {
                let handler = Arc::clone(&handler);
                let requests_tx = requests_tx.clone();
                thread::spawn(move || serve_commands(stream, handler, requests_tx));
            }
        });

        let event_listener = TcpTransport::bind(&Address::new("127.0.0.1", 0))
            .expect("event listener should bind");
        let events = event_listener.address().clone();
        thread::spawn(move || {
            while let Ok(mut stream) = event_listener.accept() {
                if exchange_handshake(&mut stream, PAIR1_PROTOCOL).is_err() {
                    continue;
                }
                let (gone_tx, gone_rx) = channel::bounded::<()>(1);
                if let Ok(watch) = stream.try_clone() {
                    let closed_tx = closed_tx.clone();
                    thread::spawn(move || {
                        let mut reader = FrameReader::new(watch);
                        while reader.read_frame().is_ok() {}
                        let _ = gone_tx.send(());
                        let _ = closed_tx.send(());
                    });
                }
                let mut writer = FrameWriter::new(stream);
                loop {
                    crossbeam::select! {
                        recv(publish_rx) -> event => {
                            let Ok(event) = event else { return };
                            let frame = encode_response(&Response::event(event));
                            if writer.send(&frame).is_err() {
                                break;
                            }
                        }
                        recv(gone_rx) -> _ => break,
                    }
                }
            }
        });

        Self {
            command,
            events,
            publish,
            requests,
            event_closed,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.command.clone())
            .expect("config should build")
            .with_event_address(self.events.clone())
            .with_deadline(Some(Duration::from_millis(100)))
    }

    pub fn publish(&self, event: WxMsg) {
        self.publish.send(event).expect("publisher should be running");
    }

    /// Functions received so far, in arrival order.
    pub fn received(&self) -> Vec<Function> {
        self.requests
            .try_iter()
            .filter_map(|request| Function::try_from(request.func).ok())
            .collect()
    }

    pub fn next_request(&self, timeout: Duration) -> Option<Request> {
        self.requests.recv_timeout(timeout).ok()
    }

    /// Wait until an event-stream client hangs up.
    pub fn wait_event_close(&self, timeout: Duration) -> bool {
        self.event_closed.recv_timeout(timeout).is_ok()
    }
}

fn serve_commands(
    mut stream: wcfrpc_transport::RpcStream,
    handler: Arc<Handler>,
    requests: Sender<Request>,
) {
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
        let _ = requests.send(request);
        if writer.send(&encode_response(&response)).is_err() {
            return;
        }
    }
}

pub fn contact(wxid: &str, name: &str) -> RpcContact {
    RpcContact {
        wxid: wxid.to_string(),
        name: name.to_string(),
        ..RpcContact::default()
    }
}

pub fn contacts() -> Vec<RpcContact> {
    vec![
        contact("wxid_alice", "Alice"),
        contact("wxid_bob", "Bob"),
        contact("123@chatroom", "Team"),
        contact("gh_news01", "News"),
        contact("filehelper", "File Transfer"),
    ]
}

/// Answers like a logged-in host with a small contact list.
pub fn default_handler(request: &Request) -> Response {
    let function = Function::try_from(request.func).unwrap_or(Function::Reserved);
    match function {
        Function::GetSelfWxid => {
            Response::with_payload(function, ResponsePayload::Str("wxid_self".into()))
        }
        Function::GetContacts => Response::with_payload(
            function,
            ResponsePayload::Contacts(RpcContacts {
                contacts: contacts(),
            }),
        ),
        Function::GetUserInfo => Response::with_payload(
            function,
            ResponsePayload::Ui(UserInfo {
                wxid: "wxid_self".into(),
                name: "Bot".into(),
                mobile: "10000".into(),
                home: "/data/host".into(),
            }),
        ),
        Function::GetDbTables => {
            let name = match &request.msg {
                Some(RequestPayload::Str(db)) => db.clone(),
                _ => String::new(),
            };
            Response::with_payload(
                function,
                ResponsePayload::Tables(wcfrpc_proto::DbTables {
                    tables: vec![wcfrpc_proto::DbTable {
                        name,
                        sql: String::new(),
                    }],
                }),
            )
        }
        other => Response::with_status(other, other.success_code().unwrap_or(0)),
    }
}

pub fn text_event(id: u64, sender: &str, room: Option<&str>) -> WxMsg {
    WxMsg {
        is_group: room.is_some(),
        id,
        r#type: 1,
        ts: 1_700_000_000,
        roomid: room.unwrap_or_default().to_string(),
        content: format!("message {id}"),
        sender: sender.to_string(),
        ..WxMsg::default()
    }
}
