//! Payload messages carried inside the envelopes.
//!
//! Field numbers are fixed by the host and must not change.

use std::collections::HashMap;

/// Explicit "no arguments" payload.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Empty {}

/// Inbound chat message pushed on the event stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WxMsg {
    #[prost(bool, tag = "1")]
    pub is_self: bool,
    #[prost(bool, tag = "2")]
    pub is_group: bool,
    #[prost(uint64, tag = "3")]
    pub id: u64,
    #[prost(uint32, tag = "4")]
    pub r#type: u32,
    #[prost(uint32, tag = "5")]
    pub ts: u32,
    #[prost(string, tag = "6")]
    pub roomid: String,
    #[prost(string, tag = "7")]
    pub content: String,
    #[prost(string, tag = "8")]
    pub sender: String,
    #[prost(string, tag = "9")]
    pub sign: String,
    #[prost(string, tag = "10")]
    pub thumb: String,
    #[prost(string, tag = "11")]
    pub extra: String,
    #[prost(string, tag = "12")]
    pub xml: String,
}

/// Plain text with optional `@` mentions (comma separated wxids).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TextMsg {
    #[prost(string, tag = "1")]
    pub msg: String,
    #[prost(string, tag = "2")]
    pub receiver: String,
    #[prost(string, tag = "3")]
    pub aters: String,
}

/// A host-side file path and who to send it to.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PathMsg {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub receiver: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct XmlMsg {
    #[prost(string, tag = "1")]
    pub receiver: String,
    #[prost(string, tag = "2")]
    pub content: String,
    #[prost(string, tag = "3")]
    pub path: String,
    #[prost(int32, tag = "4")]
    pub r#type: i32,
}

/// Message type catalog: numeric code to display name.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgTypes {
    #[prost(map = "int32, string", tag = "1")]
    pub types: HashMap<i32, String>,
}

/// One entry of the host's contact list.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcContact {
    #[prost(string, tag = "1")]
    pub wxid: String,
    #[prost(string, tag = "2")]
    pub code: String,
    #[prost(string, tag = "3")]
    pub remark: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub country: String,
    #[prost(string, tag = "6")]
    pub province: String,
    #[prost(string, tag = "7")]
    pub city: String,
    #[prost(int32, tag = "8")]
    pub gender: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcContacts {
    #[prost(message, repeated, tag = "1")]
    pub contacts: Vec<RpcContact>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DbNames {
    #[prost(string, repeated, tag = "1")]
    pub names: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DbTable {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub sql: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DbTables {
    #[prost(message, repeated, tag = "1")]
    pub tables: Vec<DbTable>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DbQuery {
    #[prost(string, tag = "1")]
    pub db: String,
    #[prost(string, tag = "2")]
    pub sql: String,
}

/// One column of a query result row.
///
/// `type` follows SQLite's storage classes: 1 integer, 2 float, 3 text,
/// 4 blob, 5 null. `content` holds the raw bytes as stored.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DbField {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "2")]
    pub column: String,
    #[prost(bytes = "vec", tag = "3")]
    pub content: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DbRow {
    #[prost(message, repeated, tag = "1")]
    pub fields: Vec<DbField>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DbRows {
    #[prost(message, repeated, tag = "1")]
    pub rows: Vec<DbRow>,
}

/// Friend request acceptance tickets.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Verification {
    #[prost(string, tag = "1")]
    pub v3: String,
    #[prost(string, tag = "2")]
    pub v4: String,
    #[prost(int64, tag = "3")]
    pub scene: i64,
}

/// Group membership change; `wxids` is comma separated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MemberMgmt {
    #[prost(string, tag = "1")]
    pub roomid: String,
    #[prost(string, tag = "2")]
    pub wxids: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserInfo {
    #[prost(string, tag = "1")]
    pub wxid: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub mobile: String,
    #[prost(string, tag = "4")]
    pub home: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DecPath {
    #[prost(string, tag = "1")]
    pub src: String,
    #[prost(string, tag = "2")]
    pub dst: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transfer {
    #[prost(string, tag = "1")]
    pub wxid: String,
    #[prost(string, tag = "2")]
    pub tfid: String,
    #[prost(string, tag = "3")]
    pub taid: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttachMsg {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub thumb: String,
    #[prost(string, tag = "3")]
    pub extra: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AudioMsg {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub dir: String,
}

/// Link card.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RichText {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub account: String,
    #[prost(string, tag = "3")]
    pub title: String,
    #[prost(string, tag = "4")]
    pub digest: String,
    #[prost(string, tag = "5")]
    pub url: String,
    #[prost(string, tag = "6")]
    pub thumburl: String,
    #[prost(string, tag = "7")]
    pub receiver: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PatMsg {
    #[prost(string, tag = "1")]
    pub roomid: String,
    #[prost(string, tag = "2")]
    pub wxid: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OcrMsg {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub result: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ForwardMsg {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub receiver: String,
}
