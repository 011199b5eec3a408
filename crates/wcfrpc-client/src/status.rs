use std::fmt;

use serde::Serialize;
use wcfrpc_proto::Function;

/// Outcome of a status-returning host call.
///
/// `code` is `None` when the host answered without a status field. Whether a
/// code means success depends on the call, see [`Function::success_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallStatus {
    #[serde(serialize_with = "serialize_function")]
    pub function: Function,
    pub code: Option<i32>,
}

impl CallStatus {
    pub fn new(function: Function, code: Option<i32>) -> Self {
        Self { function, code }
    }

    pub fn is_success(&self) -> bool {
        match (self.code, self.function.success_code()) {
            (Some(code), Some(expected)) => code == expected,
            _ => false,
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.is_success() { "ok" } else { "failed" };
        match self.code {
            Some(code) => write!(f, "{}: {outcome} (status {code})", self.function.name()),
            None => write!(f, "{}: {outcome} (no status)", self.function.name()),
        }
    }
}

fn serialize_function<S: serde::Serializer>(
    function: &Function,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(function.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_depends_on_function() {
        assert!(CallStatus::new(Function::SendTxt, Some(0)).is_success());
        assert!(!CallStatus::new(Function::SendTxt, Some(1)).is_success());
        assert!(CallStatus::new(Function::AddRoomMembers, Some(1)).is_success());
        assert!(!CallStatus::new(Function::AddRoomMembers, Some(0)).is_success());
    }

    #[test]
    fn missing_status_is_never_success() {
        assert!(!CallStatus::new(Function::SendTxt, None).is_success());
    }

    #[test]
    fn serializes_function_name() {
        let json = serde_json::to_value(CallStatus::new(Function::SendPatMsg, Some(1))).unwrap();
        assert_eq!(json["function"], "send_pat_msg");
        assert_eq!(json["code"], 1);
    }
}
