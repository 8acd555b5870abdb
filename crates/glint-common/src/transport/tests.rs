//! Tests for the transport layer
//!
//! These tests cover the brace-framed wire codec and the async frame I/O
//! helpers.

#[cfg(test)]
mod tests {
    use crate::protocol::{GlintError, Payload, Request, Response};
    use crate::transport::codec;
    use crate::transport::{read_frame, write_frame, MESSAGE_SEPARATOR};
    use serde_json::json;
    use tokio::io::BufReader;

    fn payload(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    #[test]
    fn test_request_round_trip() {
        let mut request = Request::with_trace_id(
            "create_task",
            "trace-1",
            payload(json!({
                "task_list_id": 1,
                "task_type": ["URGENT"],
                "title": "Buy milk",
                "text": null,
            })),
        );
        request
            .headers
            .extra
            .insert("tenant".into(), json!("household"));

        let encoded = codec::encode_request(&request).unwrap();
        let decoded = codec::decode_request(&encoded).unwrap();

        assert_eq!(decoded, request);
    }

    #[test]
    fn test_response_round_trip() {
        let response = Response::new(
            "create_task",
            "trace-1",
            true,
            payload(json!({"task_id": 7})),
        );

        let encoded = codec::encode_response(&response).unwrap();
        let decoded = codec::decode_response(&encoded).unwrap();

        assert_eq!(decoded, response);
    }

    #[test]
    fn test_error_response_round_trip() {
        let response = Response::new(
            "create_task",
            "trace-1",
            false,
            payload(json!({"error_code": "unknown_method", "details": {}})),
        );

        let encoded = codec::encode_response(&response).unwrap();
        assert!(encoded.starts_with(b"create_task:err"));

        let decoded = codec::decode_response(&encoded).unwrap();
        assert!(!decoded.success);
        assert_eq!(decoded.payload["error_code"], "unknown_method");
    }

    #[test]
    fn test_nested_payload_objects_round_trip() {
        // Interior braces in the payload sit strictly between the first and
        // last `{` of the frame, so nesting there is legal.
        let request = Request::with_trace_id(
            "update_task",
            "trace-2",
            payload(json!({"task": {"id": 3, "tags": {"kind": "URGENT"}}})),
        );

        let encoded = codec::encode_request(&request).unwrap();
        let decoded = codec::decode_request(&encoded).unwrap();
        assert_eq!(decoded.payload, request.payload);
    }

    #[test]
    fn test_request_with_fewer_than_two_braces_fails() {
        assert!(matches!(
            codec::decode_request(b"method{}"),
            Err(GlintError::InvalidMessageFormat)
        ));
        assert!(matches!(
            codec::decode_request(b"method"),
            Err(GlintError::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_response_with_fewer_than_two_braces_fails() {
        assert!(matches!(
            codec::decode_response(b"method:ok{}"),
            Err(GlintError::InvalidMessageFormat)
        ));
        assert!(matches!(
            codec::decode_response(b"method:ok"),
            Err(GlintError::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_request_without_method_name_fails() {
        assert!(matches!(
            codec::decode_request(b"{}{\"trace_id\":\"t\"}"),
            Err(GlintError::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_request_with_malformed_json_is_a_validation_error() {
        assert!(matches!(
            codec::decode_request(b"method{not json}{\"trace_id\":\"t\"}"),
            Err(GlintError::Validation { .. })
        ));
    }

    #[test]
    fn test_request_without_trace_id_gets_a_generated_one() {
        let decoded = codec::decode_request(b"ping{}{}").unwrap();
        assert_eq!(decoded.method_name, "ping");
        assert!(!decoded.trace_id.is_empty());
        assert_eq!(decoded.headers.trace_id, decoded.trace_id);
    }

    #[test]
    fn test_response_without_trace_id_fails() {
        assert!(matches!(
            codec::decode_response(b"ping:ok{}{}"),
            Err(GlintError::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_response_with_empty_trace_id_fails() {
        assert!(matches!(
            codec::decode_response(b"ping:ok{}{\"trace_id\":\"\"}"),
            Err(GlintError::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_response_without_status_colon_fails() {
        assert!(matches!(
            codec::decode_response(b"ping{}{\"trace_id\":\"t\"}"),
            Err(GlintError::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_response_err_status_decodes_as_failure() {
        let decoded = codec::decode_response(b"ping:err{}{\"trace_id\":\"t\"}").unwrap();
        assert!(!decoded.success);
        assert_eq!(decoded.trace_id, "t");
    }

    #[test]
    fn test_find_method_name_fast_path() {
        assert_eq!(
            codec::find_method_name(b"create_task{\"a\":1}{\"trace_id\":\"t\"}").unwrap(),
            "create_task"
        );
    }

    #[test]
    fn test_find_method_name_rejects_missing_or_leading_brace() {
        assert!(matches!(
            codec::find_method_name(b"no braces here"),
            Err(GlintError::InvalidMessageFormat)
        ));
        assert!(matches!(
            codec::find_method_name(b"{\"a\":1}{\"b\":2}"),
            Err(GlintError::InvalidMessageFormat)
        ));
    }

    #[tokio::test]
    async fn test_read_frame_stops_at_separator() {
        let data = b"first{}{}\nsecond{}{}\n".to_vec();
        let mut reader = BufReader::new(data.as_slice());

        let first = read_frame(&mut reader, 1024).await.unwrap();
        assert_eq!(first, b"first{}{}");

        let second = read_frame(&mut reader, 1024).await.unwrap();
        assert_eq!(second, b"second{}{}");
    }

    #[tokio::test]
    async fn test_read_frame_enforces_max_message_size() {
        let mut data = vec![b'a'; 64];
        data.push(MESSAGE_SEPARATOR);
        let mut reader = BufReader::new(data.as_slice());

        let result = read_frame(&mut reader, 16).await;
        assert!(matches!(
            result,
            Err(GlintError::MaxMessageSize {
                max_message_size: 16
            })
        ));
    }

    #[tokio::test]
    async fn test_read_frame_reports_truncated_stream() {
        let data = b"truncated{}{".to_vec();
        let mut reader = BufReader::new(data.as_slice());

        let result = read_frame(&mut reader, 1024).await;
        assert!(matches!(result, Err(GlintError::Io(_))));
    }

    #[tokio::test]
    async fn test_write_frame_appends_separator_once() {
        let mut out = Vec::new();
        write_frame(&mut out, b"ping{}{}").await.unwrap();
        assert_eq!(out, b"ping{}{}\n");
    }
}
