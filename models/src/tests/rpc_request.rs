use crate::{JSONRPC_VERSION, RpcErrorPayload, RpcRequest};

use serde_json::{Map, json};

/// **VALUE**: Verifies the serialized request envelope shape.
///
/// **WHY THIS MATTERS**: The server rejects envelopes lacking `jsonrpc: "2.0"` or with
/// params nested under a different key.
///
/// **BUG THIS CATCHES**: Would catch renamed fields or a missing version tag.
#[test]
fn given_request_when_serialized_then_produces_jsonrpc_envelope() {
    // GIVEN: A kill request
    let mut params = Map::new();
    params.insert("task_id".to_string(), json!("abc"));
    let request = RpcRequest::new("kill", params, 7);

    // WHEN: Serializing
    let value = serde_json::to_value(&request).expect("serializable");

    // THEN: Envelope fields are present verbatim
    assert_eq!(
        value,
        json!({"jsonrpc": JSONRPC_VERSION, "method": "kill", "params": {"task_id": "abc"}, "id": 7})
    );
}

/// **VALUE**: Verifies that error payloads keep their optional `data` member.
///
/// **WHY THIS MATTERS**: dbt puts the failing node's logs under `error.data`; callers need
/// it intact to diagnose failures.
///
/// **BUG THIS CATCHES**: Would catch `data` being dropped during typed decoding.
#[test]
fn given_error_member_with_data_when_decoded_then_keeps_data() {
    // GIVEN: A server error member
    let raw = json!({"code": 10003, "message": "Database Error", "data": {"logs": []}});

    // WHEN: Decoding
    let payload = RpcErrorPayload::from_value(&raw).expect("typed payload");

    // THEN: Code, message and data survive
    assert_eq!(payload.code, 10003);
    assert_eq!(payload.message, "Database Error");
    assert_eq!(payload.data, Some(json!({"logs": []})));
}
