use crate::error::{DecodeError, Result};
use crate::function::{Function, PayloadKind};
use crate::messages::{
    AttachMsg, AudioMsg, DbNames, DbQuery, DbRows, DbTables, DecPath, Empty, ForwardMsg,
    MemberMgmt, MsgTypes, OcrMsg, PatMsg, PathMsg, RichText, RpcContacts, TextMsg, Transfer,
    UserInfo, Verification, WxMsg, XmlMsg,
};

/// Call envelope sent on the command connection.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(enumeration = "Function", tag = "1")]
    pub func: i32,
    #[prost(
        oneof = "RequestPayload",
        tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18"
    )]
    pub msg: Option<RequestPayload>,
}

#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum RequestPayload {
    #[prost(message, tag = "2")]
    Empty(Empty),
    #[prost(string, tag = "3")]
    Str(String),
    #[prost(message, tag = "4")]
    Txt(TextMsg),
    #[prost(message, tag = "5")]
    File(PathMsg),
    #[prost(message, tag = "6")]
    Query(DbQuery),
    #[prost(message, tag = "7")]
    V(Verification),
    #[prost(message, tag = "8")]
    M(MemberMgmt),
    #[prost(message, tag = "9")]
    Xml(XmlMsg),
    #[prost(message, tag = "10")]
    Dec(DecPath),
    #[prost(message, tag = "11")]
    Tf(Transfer),
    #[prost(uint64, tag = "12")]
    Ui64(u64),
    #[prost(bool, tag = "13")]
    Flag(bool),
    #[prost(message, tag = "14")]
    Att(AttachMsg),
    #[prost(message, tag = "15")]
    Am(AudioMsg),
    #[prost(message, tag = "16")]
    Rt(RichText),
    #[prost(message, tag = "17")]
    Pm(PatMsg),
    #[prost(message, tag = "18")]
    Fm(ForwardMsg),
}

impl RequestPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            RequestPayload::Empty(_) => PayloadKind::Empty,
            RequestPayload::Str(_) => PayloadKind::Str,
            RequestPayload::Txt(_) => PayloadKind::Text,
            RequestPayload::File(_) => PayloadKind::Path,
            RequestPayload::Query(_) => PayloadKind::Query,
            RequestPayload::V(_) => PayloadKind::Verification,
            RequestPayload::M(_) => PayloadKind::Members,
            RequestPayload::Xml(_) => PayloadKind::Xml,
            RequestPayload::Dec(_) => PayloadKind::DecPath,
            RequestPayload::Tf(_) => PayloadKind::Transfer,
            RequestPayload::Ui64(_) => PayloadKind::Ui64,
            RequestPayload::Flag(_) => PayloadKind::Flag,
            RequestPayload::Att(_) => PayloadKind::Attach,
            RequestPayload::Am(_) => PayloadKind::Audio,
            RequestPayload::Rt(_) => PayloadKind::RichText,
            RequestPayload::Pm(_) => PayloadKind::Pat,
            RequestPayload::Fm(_) => PayloadKind::Forward,
        }
    }
}

impl Request {
    /// A parameterless call.
    pub fn new(function: Function) -> Self {
        Self {
            func: function as i32,
            msg: None,
        }
    }

    pub fn with_payload(function: Function, payload: RequestPayload) -> Self {
        Self {
            func: function as i32,
            msg: Some(payload),
        }
    }

    /// Shape of the payload actually carried.
    pub fn payload_kind(&self) -> PayloadKind {
        self.msg
            .as_ref()
            .map_or(PayloadKind::None, RequestPayload::kind)
    }

    /// Check that the function id is known and the payload fits it.
    pub fn validate(&self) -> Result<Function> {
        let function =
            Function::try_from(self.func).map_err(|_| DecodeError::UnknownFunction(self.func))?;
        let expected = function.payload_kind();
        let actual = self.payload_kind();
        if expected != actual {
            return Err(DecodeError::PayloadMismatch {
                function,
                expected,
                actual,
            });
        }
        Ok(function)
    }
}

/// Reply envelope, and the envelope events arrive in.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(enumeration = "Function", tag = "1")]
    pub func: i32,
    #[prost(oneof = "ResponsePayload", tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11")]
    pub msg: Option<ResponsePayload>,
}

#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum ResponsePayload {
    /// Call-specific status; see [`Function::success_code`].
    #[prost(int32, tag = "2")]
    Status(i32),
    #[prost(string, tag = "3")]
    Str(String),
    #[prost(message, tag = "4")]
    Wxmsg(WxMsg),
    #[prost(message, tag = "5")]
    Types(MsgTypes),
    #[prost(message, tag = "6")]
    Contacts(RpcContacts),
    #[prost(message, tag = "7")]
    Dbs(DbNames),
    #[prost(message, tag = "8")]
    Tables(DbTables),
    #[prost(message, tag = "9")]
    Rows(DbRows),
    #[prost(message, tag = "10")]
    Ui(UserInfo),
    #[prost(message, tag = "11")]
    Ocr(OcrMsg),
}

/// Which result a response carries, for logging mismatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    None,
    Status,
    Str,
    Wxmsg,
    Types,
    Contacts,
    Dbs,
    Tables,
    Rows,
    Ui,
    Ocr,
}

impl Response {
    pub fn with_status(function: Function, code: i32) -> Self {
        Self {
            func: function as i32,
            msg: Some(ResponsePayload::Status(code)),
        }
    }

    pub fn with_payload(function: Function, payload: ResponsePayload) -> Self {
        Self {
            func: function as i32,
            msg: Some(payload),
        }
    }

    /// An inbound event as pushed on the event stream.
    pub fn event(message: WxMsg) -> Self {
        Self {
            func: Function::Reserved as i32,
            msg: Some(ResponsePayload::Wxmsg(message)),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        match &self.msg {
            None => ResponseKind::None,
            Some(ResponsePayload::Status(_)) => ResponseKind::Status,
            Some(ResponsePayload::Str(_)) => ResponseKind::Str,
            Some(ResponsePayload::Wxmsg(_)) => ResponseKind::Wxmsg,
            Some(ResponsePayload::Types(_)) => ResponseKind::Types,
            Some(ResponsePayload::Contacts(_)) => ResponseKind::Contacts,
            Some(ResponsePayload::Dbs(_)) => ResponseKind::Dbs,
            Some(ResponsePayload::Tables(_)) => ResponseKind::Tables,
            Some(ResponsePayload::Rows(_)) => ResponseKind::Rows,
            Some(ResponsePayload::Ui(_)) => ResponseKind::Ui,
            Some(ResponsePayload::Ocr(_)) => ResponseKind::Ocr,
        }
    }
}
