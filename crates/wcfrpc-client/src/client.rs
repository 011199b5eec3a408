use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};
use wcfrpc_proto::{
    decode_response, encode_request, AttachMsg, DbQuery, DbRow, DbTable, DecPath, ForwardMsg,
    Function, MemberMgmt, PatMsg, PathMsg, Request, RequestPayload, Response, ResponsePayload,
    RichText, RpcContact, TextMsg, Transfer, UserInfo, Verification, XmlMsg,
};

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionRole};
use crate::error::{ClientError, Result};
use crate::status::CallStatus;

/// Lifecycle of an [`RpcClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Disconnected => f.write_str("disconnected"),
            ClientState::Connecting => f.write_str("connecting"),
            ClientState::Connected => f.write_str("connected"),
            ClientState::Closed => f.write_str("closed"),
        }
    }
}

/// Shared "receive events" switch.
///
/// Set by [`RpcClient::enable_receiving`], cleared by
/// [`RpcClient::disable_receiving`]; the event listener stops once it sees
/// the flag cleared.
#[derive(Debug, Clone, Default)]
pub struct ReceiveFlag(Arc<AtomicBool>);

impl ReceiveFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct Inner {
    state: ClientState,
    connection: Option<Arc<Connection>>,
}

/// Typed calls to the host over the command connection.
///
/// Safe to share between threads; concurrent calls are serialized by the
/// connection. Calls are never retried here. A reply without the expected
/// result field yields the result type's empty value (logged at debug).
pub struct RpcClient {
    config: ClientConfig,
    inner: Mutex<Inner>,
    receiving: ReceiveFlag,
}

impl RpcClient {
    /// A client that has not dialed yet.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: ClientState::Disconnected,
                connection: None,
            }),
            receiving: ReceiveFlag::default(),
        }
    }

    /// Create a client and connect it.
    pub fn dial(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config);
        client.connect()?;
        Ok(client)
    }

    /// Dial the command connection. No-op when already connected.
    pub fn connect(&self) -> Result<()> {
        {
            let mut inner = self.lock();
            match inner.state {
                ClientState::Connected => return Ok(()),
                ClientState::Closed => {
                    return Err(ClientError::Closed {
                        role: ConnectionRole::Command,
                    })
                }
                ClientState::Connecting => {
                    return Err(ClientError::NotConnected {
                        state: ClientState::Connecting,
                    })
                }
                ClientState::Disconnected => inner.state = ClientState::Connecting,
            }
        }

        let dialed = Connection::dial(
            &self.config.command_address,
            ConnectionRole::Command,
            &self.config.connection,
        );

        let mut inner = self.lock();
        match dialed {
            Ok(connection) => {
                inner.connection = Some(Arc::new(connection));
                inner.state = ClientState::Connected;
                Ok(())
            }
            Err(err) => {
                inner.state = ClientState::Disconnected;
                Err(err)
            }
        }
    }

    /// Current state. A command connection lost to a failed round trip
    /// reports `Closed`.
    pub fn state(&self) -> ClientState {
        let inner = self.lock();
        match (&inner.state, &inner.connection) {
            (ClientState::Connected, Some(conn)) if conn.is_closed() => ClientState::Closed,
            (state, _) => *state,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The flag consulted by event listeners started for this client.
    pub fn receive_flag(&self) -> ReceiveFlag {
        self.receiving.clone()
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving.is_set()
    }

    /// Close the command connection. Later calls fail with `NotConnected`.
    pub fn close(&self) -> Result<()> {
        self.receiving.clear();
        let connection = {
            let mut inner = self.lock();
            inner.state = ClientState::Closed;
            inner.connection.take()
        };
        match connection {
            Some(connection) => connection.close(),
            None => Ok(()),
        }
    }

    /// Perform one validated round trip.
    pub fn call(&self, request: &Request) -> Result<Response> {
        let function = request.validate()?;
        let connection = self.connection()?;

        let bytes = encode_request(request).map_err(|e| ClientError::from(e).in_call(function))?;
        debug!(function = %function, size = bytes.len(), "calling host");

        let reply = connection
            .round_trip(&bytes)
            .map_err(|e| e.in_call(function))?;
        let response =
            decode_response(&reply).map_err(|e| ClientError::from(e).in_call(function))?;

        if response.func != function as i32 && response.func != Function::Reserved as i32 {
            debug!(function = %function, reply_func = response.func, "reply carries a different function id");
        }
        Ok(response)
    }

    fn connection(&self) -> Result<Arc<Connection>> {
        let inner = self.lock();
        match (&inner.state, &inner.connection) {
            (ClientState::Connected, Some(conn)) => Ok(Arc::clone(conn)),
            (state, _) => Err(ClientError::NotConnected { state: *state }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn call_plain(&self, function: Function) -> Result<Response> {
        self.call(&Request::new(function))
    }

    fn call_with(&self, function: Function, payload: RequestPayload) -> Result<Response> {
        self.call(&Request::with_payload(function, payload))
    }

    fn status(&self, function: Function, payload: Option<RequestPayload>) -> Result<CallStatus> {
        let response = match payload {
            Some(payload) => self.call_with(function, payload)?,
            None => self.call_plain(function)?,
        };
        let code = match response.msg {
            Some(ResponsePayload::Status(code)) => Some(code),
            other => {
                unexpected(function, "status", other);
                None
            }
        };
        let status = CallStatus::new(function, code);
        if !status.is_success() {
            debug!(%status, "host reported failure");
        }
        Ok(status)
    }

    // Queries

    /// Whether the host account is logged in.
    pub fn is_login(&self) -> Result<bool> {
        Ok(self.status(Function::IsLogin, None)?.is_success())
    }

    pub fn self_wxid(&self) -> Result<String> {
        match self.call_plain(Function::GetSelfWxid)?.msg {
            Some(ResponsePayload::Str(wxid)) => Ok(wxid),
            other => Ok(empty(Function::GetSelfWxid, "str", other)),
        }
    }

    /// Message type catalog as reported by the host.
    pub fn message_types(&self) -> Result<HashMap<i32, String>> {
        match self.call_plain(Function::GetMsgTypes)?.msg {
            Some(ResponsePayload::Types(types)) => Ok(types.types),
            other => Ok(empty(Function::GetMsgTypes, "types", other)),
        }
    }

    /// Full contact list, unclassified.
    pub fn contacts(&self) -> Result<Vec<RpcContact>> {
        match self.call_plain(Function::GetContacts)?.msg {
            Some(ResponsePayload::Contacts(contacts)) => Ok(contacts.contacts),
            other => Ok(empty(Function::GetContacts, "contacts", other)),
        }
    }

    pub fn db_names(&self) -> Result<Vec<String>> {
        match self.call_plain(Function::GetDbNames)?.msg {
            Some(ResponsePayload::Dbs(dbs)) => Ok(dbs.names),
            other => Ok(empty(Function::GetDbNames, "dbs", other)),
        }
    }

    pub fn db_tables(&self, db: &str) -> Result<Vec<DbTable>> {
        let response = self.call_with(Function::GetDbTables, RequestPayload::Str(db.to_string()))?;
        match response.msg {
            Some(ResponsePayload::Tables(tables)) => Ok(tables.tables),
            other => Ok(empty(Function::GetDbTables, "tables", other)),
        }
    }

    pub fn exec_db_query(&self, db: &str, sql: &str) -> Result<Vec<DbRow>> {
        let payload = RequestPayload::Query(DbQuery {
            db: db.to_string(),
            sql: sql.to_string(),
        });
        match self.call_with(Function::ExecDbQuery, payload)?.msg {
            Some(ResponsePayload::Rows(rows)) => Ok(rows.rows),
            other => Ok(empty(Function::ExecDbQuery, "rows", other)),
        }
    }

    /// Profile of the logged-in account.
    pub fn user_info(&self) -> Result<UserInfo> {
        match self.call_plain(Function::GetUserInfo)?.msg {
            Some(ResponsePayload::Ui(info)) => Ok(info),
            other => Ok(empty(Function::GetUserInfo, "ui", other)),
        }
    }

    /// Decrypt a stored image; returns the written path (empty on failure).
    pub fn decrypt_image(&self, src: &str, dst: &str) -> Result<String> {
        let payload = RequestPayload::Dec(DecPath {
            src: src.to_string(),
            dst: dst.to_string(),
        });
        match self.call_with(Function::DecryptImage, payload)?.msg {
            Some(ResponsePayload::Str(path)) => Ok(path),
            other => Ok(empty(Function::DecryptImage, "str", other)),
        }
    }

    // Actions

    pub fn accept_friend(&self, v3: &str, v4: &str, scene: i64) -> Result<CallStatus> {
        let payload = RequestPayload::V(Verification {
            v3: v3.to_string(),
            v4: v4.to_string(),
            scene,
        });
        self.status(Function::AcceptFriend, Some(payload))
    }

    pub fn receive_transfer(&self, wxid: &str, tfid: &str, taid: &str) -> Result<CallStatus> {
        let payload = RequestPayload::Tf(Transfer {
            wxid: wxid.to_string(),
            tfid: tfid.to_string(),
            taid: taid.to_string(),
        });
        self.status(Function::RecvTransfer, Some(payload))
    }

    /// Refresh the moments feed. Current host builds ignore this.
    pub fn refresh_moments(&self) -> Result<CallStatus> {
        self.status(Function::RefreshPyq, Some(RequestPayload::Ui64(0)))
    }

    pub fn add_room_members<S: AsRef<str>>(&self, room: &str, wxids: &[S]) -> Result<CallStatus> {
        self.status(Function::AddRoomMembers, Some(members(room, wxids)))
    }

    pub fn invite_room_members<S: AsRef<str>>(
        &self,
        room: &str,
        wxids: &[S],
    ) -> Result<CallStatus> {
        self.status(Function::InvRoomMembers, Some(members(room, wxids)))
    }

    pub fn remove_room_members<S: AsRef<str>>(
        &self,
        room: &str,
        wxids: &[S],
    ) -> Result<CallStatus> {
        self.status(Function::DelRoomMembers, Some(members(room, wxids)))
    }

    // Sending

    /// Send text, optionally mentioning `mentions` (group chats only).
    pub fn send_text<S: AsRef<str>>(
        &self,
        receiver: &str,
        text: &str,
        mentions: &[S],
    ) -> Result<CallStatus> {
        let payload = RequestPayload::Txt(TextMsg {
            msg: text.to_string(),
            receiver: receiver.to_string(),
            aters: join_ids(mentions),
        });
        self.status(Function::SendTxt, Some(payload))
    }

    pub fn forward_message(&self, id: u64, receiver: &str) -> Result<CallStatus> {
        let payload = RequestPayload::Fm(ForwardMsg {
            id,
            receiver: receiver.to_string(),
        });
        self.status(Function::ForwardMsg, Some(payload))
    }

    /// `path` is resolved on the host machine.
    pub fn send_image(&self, path: &str, receiver: &str) -> Result<CallStatus> {
        self.status(Function::SendImg, Some(path_msg(path, receiver)))
    }

    /// `path` is resolved on the host machine.
    pub fn send_file(&self, path: &str, receiver: &str) -> Result<CallStatus> {
        self.status(Function::SendFile, Some(path_msg(path, receiver)))
    }

    /// Send a link card; the receiver is part of `card`.
    pub fn send_rich_text(&self, card: &RichText) -> Result<CallStatus> {
        self.status(Function::SendRichTxt, Some(RequestPayload::Rt(card.clone())))
    }

    pub fn send_xml(
        &self,
        receiver: &str,
        content: &str,
        path: &str,
        xml_type: i32,
    ) -> Result<CallStatus> {
        let payload = RequestPayload::Xml(XmlMsg {
            receiver: receiver.to_string(),
            content: content.to_string(),
            path: path.to_string(),
            r#type: xml_type,
        });
        self.status(Function::SendXml, Some(payload))
    }

    /// Send a sticker. Known to crash some host builds.
    pub fn send_emotion(&self, path: &str, receiver: &str) -> Result<CallStatus> {
        self.status(Function::SendEmotion, Some(path_msg(path, receiver)))
    }

    /// "Pat" a member of a group.
    pub fn send_pat(&self, room: &str, wxid: &str) -> Result<CallStatus> {
        let payload = RequestPayload::Pm(PatMsg {
            roomid: room.to_string(),
            wxid: wxid.to_string(),
        });
        self.status(Function::SendPatMsg, Some(payload))
    }

    /// Ask the host to download a message attachment to the given paths.
    pub fn download_attachment(&self, id: u64, thumb: &str, extra: &str) -> Result<CallStatus> {
        let payload = RequestPayload::Att(AttachMsg {
            id,
            thumb: thumb.to_string(),
            extra: extra.to_string(),
        });
        self.status(Function::DownloadAttach, Some(payload))
    }

    // Event stream switch

    /// Ask the host to publish inbound messages; sets the receive flag on success.
    pub fn enable_receiving(&self) -> Result<CallStatus> {
        let status = self.status(Function::EnableRecvTxt, Some(RequestPayload::Flag(true)))?;
        if status.is_success() {
            self.receiving.set();
            info!("receiving enabled");
        } else {
            warn!(%status, "host refused to enable receiving");
        }
        Ok(status)
    }

    /// Clear the receive flag and ask the host to stop publishing.
    ///
    /// The flag is cleared before the call so listeners stop even when the
    /// host cannot be reached.
    pub fn disable_receiving(&self) -> Result<CallStatus> {
        self.receiving.clear();
        let status = self.status(Function::DisableRecvTxt, None)?;
        info!(%status, "receiving disabled");
        Ok(status)
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("command_address", &self.config.command_address.to_string())
            .field("state", &self.state())
            .field("receiving", &self.is_receiving())
            .finish()
    }
}

fn join_ids<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}

fn members<S: AsRef<str>>(room: &str, wxids: &[S]) -> RequestPayload {
    RequestPayload::M(MemberMgmt {
        roomid: room.to_string(),
        wxids: join_ids(wxids),
    })
}

fn path_msg(path: &str, receiver: &str) -> RequestPayload {
    RequestPayload::File(PathMsg {
        path: path.to_string(),
        receiver: receiver.to_string(),
    })
}

fn unexpected(function: Function, expected: &str, actual: Option<ResponsePayload>) {
    let actual = Response {
        func: function as i32,
        msg: actual,
    }
    .kind();
    debug!(function = %function, expected, ?actual, "unexpected reply payload; using empty value");
}

fn empty<T: Default>(function: Function, expected: &str, actual: Option<ResponsePayload>) -> T {
    unexpected(function, expected, actual);
    T::default()
}
