use super::*;
use serde_json::json;

#[test]
fn test_request_frame_new_generates_correlation() {
    let a = RequestFrame::new("barcode-request", json!({"barcode": "X1"}));
    let b = RequestFrame::new("barcode-request", json!({"barcode": "X1"}));
    assert_eq!(a.kind, "barcode-request");
    assert_ne!(a.correlation_id, b.correlation_id);
}

#[test]
fn test_request_frame_with_correlation() {
    let corr = CorrelationId::generate();
    let frame = RequestFrame::with_correlation("ping", corr.clone(), Value::Null);
    assert_eq!(frame.correlation_id, corr);
}

#[test]
fn test_request_frame_serde_round_trip() {
    let frame = RequestFrame::new("barcode-request", json!({"foo": 1}));
    let raw = serde_json::to_string(&frame).unwrap();
    let back: RequestFrame = serde_json::from_str(&raw).unwrap();
    assert_eq!(back.kind, frame.kind);
    assert_eq!(back.correlation_id, frame.correlation_id);
    assert_eq!(back.payload, frame.payload);
}

#[test]
fn test_response_ok() {
    let resp = ResponseEnvelope::ok(json!("done"));
    assert!(resp.ok);
    assert!(resp.reason.is_none());
    assert_eq!(resp.data, Some(json!("done")));
}

#[test]
fn test_response_ok_empty_omits_optional_fields() {
    let resp = ResponseEnvelope::ok_empty();
    let raw = serde_json::to_string(&resp).unwrap();
    assert_eq!(raw, "{\"ok\":true}");
}

#[test]
fn test_response_fail() {
    let resp = ResponseEnvelope::fail("boom");
    assert!(!resp.ok);
    assert_eq!(resp.reason.as_deref(), Some("boom"));
    assert!(resp.data.is_none());
}

#[test]
fn test_no_target_reason() {
    let resp = ResponseEnvelope::no_target();
    assert!(!resp.ok);
    assert_eq!(resp.reason.as_deref(), Some("no-target-frames"));
    assert!(resp.is_no_target());
}

#[test]
fn test_business_failure_is_not_no_target() {
    let resp = ResponseEnvelope::fail("validation failed");
    assert!(!resp.is_no_target());
}

#[tokio::test]
async fn test_inbound_request_reply_resolves_once() {
    let (tx, rx) = oneshot::channel();
    let inbound = InboundRequest {
        frame: RequestFrame::new("ping", Value::Null),
        reply: tx,
    };

    inbound.reply.send(ResponseEnvelope::ok_empty()).unwrap();
    let resp = rx.await.unwrap();
    assert!(resp.ok);
}
