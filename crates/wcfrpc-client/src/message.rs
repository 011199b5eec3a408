use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use wcfrpc_proto::WxMsg;

use crate::client::ClientState;
use crate::error::{ClientError, Result};
use crate::status::CallStatus;

macro_rules! message_types {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// Known inbound message type codes.
        ///
        /// Codes the catalog does not know are kept as [`MessageType::Other`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageType {
            $($variant,)+
            Other(u32),
        }

        impl MessageType {
            pub const KNOWN: &'static [MessageType] = &[$(MessageType::$variant,)+];

            pub fn from_code(code: u32) -> Self {
                match code {
                    $($code => MessageType::$variant,)+
                    other => MessageType::Other(other),
                }
            }

            pub fn code(self) -> u32 {
                match self {
                    $(MessageType::$variant => $code,)+
                    MessageType::Other(code) => code,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(MessageType::$variant => $name,)+
                    MessageType::Other(_) => "unknown",
                }
            }
        }
    };
}

message_types! {
    Moments = 0 => "moments",
    Text = 1 => "text",
    Image = 3 => "image",
    Voice = 34 => "voice",
    FriendConfirm = 37 => "friend confirmation",
    PossibleFriend = 40 => "possible friend",
    BusinessCard = 42 => "business card",
    Video = 43 => "video",
    Emoticon = 47 => "emoticon",
    Location = 48 => "location",
    Xml = 49 => "xml",
    Quote = 4901 => "quote",
    XmlImage = 4903 => "xml image",
    XmlFile = 4906 => "xml file",
    XmlLink = 4916 => "xml link",
    Voip = 50 => "voip",
    Init = 51 => "client init",
    VoipNotify = 52 => "voip notify",
    VoipInvite = 53 => "voip invite",
    ShortVideo = 62 => "short video",
    RedPacket = 66 => "red packet",
    SysNotice = 9999 => "system notice",
    System = 10000 => "system",
    Revoke = 10002 => "revoke",
    SogouEmoji = 1048625 => "sogou emoji",
    RedPacketCover = 536936497 => "red packet cover",
    ChannelVideo = 754974769 => "channel video",
    ChannelCard = 771751985 => "channel card",
    Pat = 922746929 => "pat",
    ChannelLive = 973078577 => "channel live",
    ProductLink = 974127153 => "product link",
    ChannelLiveAlt = 975175729 => "channel live",
    MusicLink = 1040187441 => "music link",
    File = 1090519089 => "file",
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

/// Operations a buffered message can perform against the client it came from.
pub trait Responder: Send + Sync {
    /// Send `text` to `to`, mentioning `mentions`.
    fn reply_text(&self, to: &str, text: &str, mentions: &[&str]) -> Result<CallStatus>;

    /// Whether `wxid` is a known personal contact.
    fn is_friend(&self, wxid: &str) -> bool;
}

/// An inbound message, ready for application code.
#[derive(Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "is_false")]
    pub is_self: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_group: bool,
    pub message_id: u64,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub ts: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub room_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sender: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sign: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thumb: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extra: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub xml: String,
    #[serde(skip)]
    responder: Option<Arc<dyn Responder>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Message {
    /// A message without a responder; replies fail with `NotConnected`.
    pub fn from_event(event: WxMsg) -> Self {
        Self {
            is_self: event.is_self,
            is_group: event.is_group,
            message_id: event.id,
            kind: MessageType::from_code(event.r#type),
            ts: event.ts,
            room_id: event.roomid,
            content: event.content,
            sender: event.sender,
            sign: event.sign,
            thumb: event.thumb,
            extra: event.extra,
            xml: event.xml,
            responder: None,
        }
    }

    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Where a reply goes: the room for group messages, else the sender.
    pub fn reply_target(&self) -> &str {
        if self.is_group && !self.room_id.is_empty() {
            &self.room_id
        } else {
            &self.sender
        }
    }

    pub fn reply_text<S: AsRef<str>>(&self, text: &str, mentions: &[S]) -> Result<CallStatus> {
        let responder = self.responder.as_ref().ok_or(ClientError::NotConnected {
            state: ClientState::Disconnected,
        })?;
        let mentions: Vec<&str> = mentions.iter().map(AsRef::as_ref).collect();
        responder.reply_text(self.reply_target(), text, &mentions)
    }

    /// False for self-sent messages and when no responder is attached.
    pub fn is_sent_by_friend(&self) -> bool {
        if self.is_self {
            return false;
        }
        self.responder
            .as_ref()
            .is_some_and(|responder| responder.is_friend(&self.sender))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("message_id", &self.message_id)
            .field("kind", &self.kind)
            .field("sender", &self.sender)
            .field("room_id", &self.room_id)
            .field("is_self", &self.is_self)
            .field("is_group", &self.is_group)
            .field("has_responder", &self.responder.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use wcfrpc_proto::Function;

    use super::*;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String, Vec<String>)>>,
    }

    impl Responder for Recording {
        fn reply_text(&self, to: &str, text: &str, mentions: &[&str]) -> Result<CallStatus> {
            self.sent.lock().unwrap().push((
                to.to_string(),
                text.to_string(),
                mentions.iter().map(|m| m.to_string()).collect(),
            ));
            Ok(CallStatus::new(Function::SendTxt, Some(0)))
        }

        fn is_friend(&self, wxid: &str) -> bool {
            wxid == "wxid_friend"
        }
    }

    fn event(is_group: bool) -> WxMsg {
        WxMsg {
            is_group,
            id: 42,
            r#type: 1,
            ts: 1_700_000_000,
            roomid: if is_group { "123@chatroom".into() } else { String::new() },
            content: "hello".into(),
            sender: "wxid_friend".into(),
            ..WxMsg::default()
        }
    }

    #[test]
    fn catalog_round_trips_known_codes() {
        for kind in MessageType::KNOWN {
            assert_eq!(MessageType::from_code(kind.code()), *kind);
        }
        assert_eq!(MessageType::from_code(49), MessageType::Xml);
        assert_eq!(MessageType::from_code(1090519089), MessageType::File);
        assert_eq!(MessageType::from_code(12345), MessageType::Other(12345));
        assert_eq!(MessageType::Other(12345).name(), "unknown");
    }

    #[test]
    fn group_replies_go_to_room() {
        let responder = Arc::new(Recording::default());
        let message = Message::from_event(event(true)).with_responder(responder.clone());

        let status = message.reply_text("hi", &["wxid_friend"]).unwrap();
        assert!(status.is_success());

        let sent = responder.sent.lock().unwrap();
        assert_eq!(sent[0].0, "123@chatroom");
        assert_eq!(sent[0].2, vec!["wxid_friend".to_string()]);
    }

    #[test]
    fn direct_replies_go_to_sender() {
        let responder = Arc::new(Recording::default());
        let message = Message::from_event(event(false)).with_responder(responder.clone());
        message.reply_text::<&str>("hi", &[]).unwrap();
        assert_eq!(responder.sent.lock().unwrap()[0].0, "wxid_friend");
    }

    #[test]
    fn reply_without_responder_fails() {
        let message = Message::from_event(event(false));
        assert!(matches!(
            message.reply_text::<&str>("hi", &[]),
            Err(ClientError::NotConnected { .. })
        ));
        assert!(!message.is_sent_by_friend());
    }

    #[test]
    fn self_sent_is_never_from_friend() {
        let mut message =
            Message::from_event(event(false)).with_responder(Arc::new(Recording::default()));
        assert!(message.is_sent_by_friend());
        message.is_self = true;
        assert!(!message.is_sent_by_friend());
    }

    #[test]
    fn json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&Message::from_event(event(true)).to_json().unwrap()).unwrap();
        assert_eq!(json["message_id"], 42);
        assert_eq!(json["type"], 1);
        assert_eq!(json["room_id"], "123@chatroom");
        assert_eq!(json["is_group"], true);
        assert!(json.get("is_self").is_none());
        assert!(json.get("xml").is_none());
        assert!(json.get("responder").is_none());
    }
}
