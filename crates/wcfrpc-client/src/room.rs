use serde::{Deserialize, Serialize};

/// A group member as reported by the host's contact database.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub wxid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default)]
    pub del_flag: u8,
    #[serde(default)]
    pub contact_type: u8,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nick_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub py_initial: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub quan_pin: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark_py_initial: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark_quan_pin: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub small_head_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub big_head_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomQueryError {
    #[error("room query needs at least one key")]
    EmptyQuery,
}

/// Members of one group conversation.
///
/// Lookups are positional: the result has one slot per query key, `None`
/// where no member matched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ContactInfo>,
}

impl RoomData {
    pub fn new(members: Vec<ContactInfo>) -> Self {
        Self { members }
    }

    pub fn members_by_wxid<S: AsRef<str>>(
        &self,
        wxids: &[S],
    ) -> Result<Vec<Option<&ContactInfo>>, RoomQueryError> {
        self.positional(wxids, |member, key| member.wxid == key)
    }

    /// Nicknames for `wxids`; unmatched ids yield an empty string.
    pub fn nicknames_by_wxid<S: AsRef<str>>(
        &self,
        wxids: &[S],
    ) -> Result<Vec<String>, RoomQueryError> {
        Ok(self
            .members_by_wxid(wxids)?
            .into_iter()
            .map(|member| member.map(|m| m.nick_name.clone()).unwrap_or_default())
            .collect())
    }

    pub fn members_by_nickname<S: AsRef<str>>(
        &self,
        nicknames: &[S],
    ) -> Result<Vec<Option<&ContactInfo>>, RoomQueryError> {
        self.positional(nicknames, |member, key| member.nick_name == key)
    }

    fn positional<S, F>(
        &self,
        keys: &[S],
        matches: F,
    ) -> Result<Vec<Option<&ContactInfo>>, RoomQueryError>
    where
        S: AsRef<str>,
        F: Fn(&ContactInfo, &str) -> bool,
    {
        if keys.is_empty() {
            return Err(RoomQueryError::EmptyQuery);
        }
        Ok(keys
            .iter()
            .map(|key| self.members.iter().find(|m| matches(m, key.as_ref())))
            .collect())
    }
}
