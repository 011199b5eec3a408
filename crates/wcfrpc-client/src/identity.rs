use std::fmt;

use serde::Serialize;
use wcfrpc_proto::RpcContact;

const PEER_PREFIX: &str = "wxid_";
const GROUP_SUFFIX: &str = "@chatroom";
const CHANNEL_PREFIX: &str = "gh_";

/// The directory partition an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Personal account.
    Peer,
    /// Group conversation.
    Group,
    /// Subscription channel.
    Channel,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKind::Peer => f.write_str("peer"),
            IdentityKind::Group => f.write_str("group"),
            IdentityKind::Channel => f.write_str("channel"),
        }
    }
}

/// Classify an id by its shape. Checked in order; the first match wins.
///
/// Returns `None` for ids that fit no partition (built-in accounts such as
/// `filehelper`, legacy custom ids).
pub fn classify(id: &str) -> Option<IdentityKind> {
    if id.starts_with(PEER_PREFIX) {
        Some(IdentityKind::Peer)
    } else if id.ends_with(GROUP_SUFFIX) {
        Some(IdentityKind::Group)
    } else if id.starts_with(CHANNEL_PREFIX) {
        Some(IdentityKind::Channel)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl From<i32> for Gender {
    fn from(value: i32) -> Self {
        match value {
            1 => Gender::Male,
            2 => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// A contact list entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Identity {
    pub wxid: String,
    /// User-chosen account handle.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark: String,
    /// Nickname, group name or channel name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub province: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    pub gender: Gender,
}

impl Identity {
    pub fn kind(&self) -> Option<IdentityKind> {
        classify(&self.wxid)
    }

    /// Remark if set, otherwise the name.
    pub fn display_name(&self) -> &str {
        if self.remark.is_empty() {
            &self.name
        } else {
            &self.remark
        }
    }
}

impl From<RpcContact> for Identity {
    fn from(contact: RpcContact) -> Self {
        Self {
            wxid: contact.wxid,
            code: contact.code,
            remark: contact.remark,
            name: contact.name,
            country: contact.country,
            province: contact.province,
            city: contact.city,
            gender: Gender::from(contact.gender),
        }
    }
}

/// Built-in system accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialAccount {
    Unknown,
    MediaNote,
    FloatBottle,
    FileHelper,
    FriendRecommendation,
}

impl SpecialAccount {
    pub fn of(wxid: &str) -> Self {
        match wxid {
            "medianote" => SpecialAccount::MediaNote,
            "floatbottle" => SpecialAccount::FloatBottle,
            "filehelper" => SpecialAccount::FileHelper,
            "fmessage" => SpecialAccount::FriendRecommendation,
            _ => SpecialAccount::Unknown,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SpecialAccount::Unknown => "unknown",
            SpecialAccount::MediaNote => "media notes",
            SpecialAccount::FloatBottle => "drift bottle",
            SpecialAccount::FileHelper => "file transfer helper",
            SpecialAccount::FriendRecommendation => "friend recommendations",
        }
    }
}
