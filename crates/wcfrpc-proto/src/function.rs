use std::fmt;

/// Function ids understood by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Function {
    Reserved = 0x00,
    IsLogin = 0x01,
    GetSelfWxid = 0x10,
    GetMsgTypes = 0x11,
    GetContacts = 0x12,
    GetDbNames = 0x13,
    GetDbTables = 0x14,
    GetUserInfo = 0x15,
    GetAudioMsg = 0x16,
    SendTxt = 0x20,
    SendImg = 0x21,
    SendFile = 0x22,
    SendXml = 0x23,
    SendEmotion = 0x24,
    SendRichTxt = 0x25,
    SendPatMsg = 0x26,
    ForwardMsg = 0x27,
    EnableRecvTxt = 0x30,
    DisableRecvTxt = 0x40,
    ExecDbQuery = 0x50,
    AcceptFriend = 0x51,
    RecvTransfer = 0x52,
    RefreshPyq = 0x53,
    DownloadAttach = 0x54,
    GetContactInfo = 0x55,
    RevokeMsg = 0x56,
    RefreshQrcode = 0x57,
    DecryptImage = 0x60,
    ExecOcr = 0x61,
    AddRoomMembers = 0x70,
    DelRoomMembers = 0x71,
    InvRoomMembers = 0x72,
}

/// The payload shape a request carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// No payload at all.
    None,
    Empty,
    Str,
    Text,
    Path,
    Query,
    Verification,
    Members,
    Xml,
    DecPath,
    Transfer,
    Ui64,
    Flag,
    Attach,
    Audio,
    RichText,
    Pat,
    Forward,
}

impl Function {
    /// The only payload shape the host accepts for this function.
    pub fn payload_kind(self) -> PayloadKind {
        match self {
            Function::Reserved
            | Function::IsLogin
            | Function::GetSelfWxid
            | Function::GetMsgTypes
            | Function::GetContacts
            | Function::GetDbNames
            | Function::GetUserInfo
            | Function::DisableRecvTxt
            | Function::RefreshQrcode => PayloadKind::None,
            Function::GetDbTables | Function::GetContactInfo | Function::ExecOcr => {
                PayloadKind::Str
            }
            Function::GetAudioMsg => PayloadKind::Audio,
            Function::SendTxt => PayloadKind::Text,
            Function::SendImg | Function::SendFile | Function::SendEmotion => PayloadKind::Path,
            Function::SendXml => PayloadKind::Xml,
            Function::SendRichTxt => PayloadKind::RichText,
            Function::SendPatMsg => PayloadKind::Pat,
            Function::ForwardMsg => PayloadKind::Forward,
            Function::EnableRecvTxt => PayloadKind::Flag,
            Function::ExecDbQuery => PayloadKind::Query,
            Function::AcceptFriend => PayloadKind::Verification,
            Function::RecvTransfer => PayloadKind::Transfer,
            Function::RefreshPyq | Function::RevokeMsg => PayloadKind::Ui64,
            Function::DownloadAttach => PayloadKind::Attach,
            Function::DecryptImage => PayloadKind::DecPath,
            Function::AddRoomMembers | Function::DelRoomMembers | Function::InvRoomMembers => {
                PayloadKind::Members
            }
        }
    }

    /// Status code that means success for status-returning calls.
    ///
    /// The host is not consistent: send-style calls report 0, action-style
    /// calls report 1. Functions whose response is not a status return `None`.
    pub fn success_code(self) -> Option<i32> {
        match self {
            Function::IsLogin
            | Function::RefreshPyq
            | Function::AddRoomMembers
            | Function::InvRoomMembers
            | Function::DelRoomMembers
            | Function::AcceptFriend
            | Function::RecvTransfer
            | Function::SendPatMsg
            | Function::ForwardMsg => Some(1),
            Function::SendTxt
            | Function::SendImg
            | Function::SendFile
            | Function::SendRichTxt
            | Function::SendXml
            | Function::SendEmotion
            | Function::DownloadAttach
            | Function::EnableRecvTxt
            | Function::DisableRecvTxt => Some(0),
            _ => None,
        }
    }

    /// Stable lowercase name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Function::Reserved => "reserved",
            Function::IsLogin => "is_login",
            Function::GetSelfWxid => "get_self_wxid",
            Function::GetMsgTypes => "get_msg_types",
            Function::GetContacts => "get_contacts",
            Function::GetDbNames => "get_db_names",
            Function::GetDbTables => "get_db_tables",
            Function::GetUserInfo => "get_user_info",
            Function::GetAudioMsg => "get_audio_msg",
            Function::SendTxt => "send_txt",
            Function::SendImg => "send_img",
            Function::SendFile => "send_file",
            Function::SendXml => "send_xml",
            Function::SendEmotion => "send_emotion",
            Function::SendRichTxt => "send_rich_txt",
            Function::SendPatMsg => "send_pat_msg",
            Function::ForwardMsg => "forward_msg",
            Function::EnableRecvTxt => "enable_recv_txt",
            Function::DisableRecvTxt => "disable_recv_txt",
            Function::ExecDbQuery => "exec_db_query",
            Function::AcceptFriend => "accept_friend",
            Function::RecvTransfer => "recv_transfer",
            Function::RefreshPyq => "refresh_pyq",
            Function::DownloadAttach => "download_attach",
            Function::GetContactInfo => "get_contact_info",
            Function::RevokeMsg => "revoke_msg",
            Function::RefreshQrcode => "refresh_qrcode",
            Function::DecryptImage => "decrypt_image",
            Function::ExecOcr => "exec_ocr",
            Function::AddRoomMembers => "add_room_members",
            Function::DelRoomMembers => "del_room_members",
            Function::InvRoomMembers => "inv_room_members",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02x})", self.name(), *self as i32)
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::None => "none",
            PayloadKind::Empty => "empty",
            PayloadKind::Str => "str",
            PayloadKind::Text => "txt",
            PayloadKind::Path => "file",
            PayloadKind::Query => "query",
            PayloadKind::Verification => "v",
            PayloadKind::Members => "m",
            PayloadKind::Xml => "xml",
            PayloadKind::DecPath => "dec",
            PayloadKind::Transfer => "tf",
            PayloadKind::Ui64 => "ui64",
            PayloadKind::Flag => "flag",
            PayloadKind::Attach => "att",
            PayloadKind::Audio => "am",
            PayloadKind::RichText => "rt",
            PayloadKind::Pat => "pm",
            PayloadKind::Forward => "fm",
        };
        f.write_str(name)
    }
}
