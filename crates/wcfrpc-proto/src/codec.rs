//! Envelope encoding.
//!
//! Both directions are pure functions over byte slices. The client side only
//! needs [`encode_request`] and [`decode_response`]; the mirror pair exists so
//! a stand-in host can be written against the same types.

use bytes::Bytes;
use prost::Message;
use tracing::trace;

use crate::envelope::{Request, Response};
use crate::error::Result;

/// Validate and encode a request.
pub fn encode_request(request: &Request) -> Result<Bytes> {
    request.validate()?;
    let bytes = request.encode_to_vec();
    trace!(function = %request.func(), size = bytes.len(), "request encoded");
    Ok(Bytes::from(bytes))
}

/// Decode a response (or an event) from the host.
pub fn decode_response(buf: &[u8]) -> Result<Response> {
    Ok(Response::decode(buf)?)
}

/// Decode and validate a request, as the host would.
pub fn decode_request(buf: &[u8]) -> Result<Request> {
    let request = Request::decode(buf)?;
    request.validate()?;
    Ok(request)
}

/// Encode a response, as the host would.
pub fn encode_response(response: &Response) -> Bytes {
    Bytes::from(response.encode_to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{RequestPayload, ResponsePayload};
    use crate::error::DecodeError;
    use crate::function::Function;
    use crate::messages::{TextMsg, WxMsg};

    #[test]
    fn request_survives_the_wire() {
        let request = Request::with_payload(
            Function::SendTxt,
            RequestPayload::Txt(TextMsg {
                msg: "hi".into(),
                receiver: "wxid_abc".into(),
                aters: String::new(),
            }),
        );

        let bytes = encode_request(&request).unwrap();
        let decoded = decode_request(&bytes).unwrap();

        assert_eq!(decoded, request);
        assert_eq!(decoded.func(), Function::SendTxt);
    }

    #[test]
    fn parameterless_request_is_just_the_function_id() {
        let bytes = encode_request(&Request::new(Function::IsLogin)).unwrap();
        // field 1, varint, value 1
        assert_eq!(bytes.as_ref(), &[0x08, 0x01]);
    }

    #[test]
    fn mismatched_request_is_not_encoded() {
        let request = Request::with_payload(Function::SendTxt, RequestPayload::Flag(true));
        let err = encode_request(&request).unwrap_err();
        assert!(matches!(err, DecodeError::PayloadMismatch { .. }));
    }

    #[test]
    fn status_response_decodes() {
        let bytes = encode_response(&Response::with_status(Function::IsLogin, 1));
        let response = decode_response(&bytes).unwrap();

        assert_eq!(response.func(), Function::IsLogin);
        assert_eq!(response.msg, Some(ResponsePayload::Status(1)));
    }

    #[test]
    fn zero_status_is_still_present() {
        // A proto3 oneof member is encoded even when it holds the default.
        let bytes = encode_response(&Response::with_status(Function::SendTxt, 0));
        let response = decode_response(&bytes).unwrap();
        assert_eq!(response.msg, Some(ResponsePayload::Status(0)));
    }

    #[test]
    fn event_envelope_decodes() {
        let event = WxMsg {
            id: 42,
            r#type: 1,
            sender: "wxid_abc".into(),
            content: "hello".into(),
            ..WxMsg::default()
        };
        let bytes = encode_response(&Response::event(event.clone()));

        let response = decode_response(&bytes).unwrap();
        assert_eq!(response.msg, Some(ResponsePayload::Wxmsg(event)));
    }

    #[test]
    fn malformed_bytes_fail_to_decode() {
        let err = decode_response(&[0xff]).unwrap_err();
        assert!(matches!(err, DecodeError::Protobuf(_)));

        // Length-delimited field claiming more bytes than present.
        let err = decode_response(&[0x1a, 0x10, b'x']).unwrap_err();
        assert!(matches!(err, DecodeError::Protobuf(_)));
    }
}
