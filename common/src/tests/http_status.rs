use crate::HttpStatusCode;

/// **VALUE**: Verifies the status buckets used to classify RPC endpoint replies.
///
/// **WHY THIS MATTERS**: The transport only decodes bodies of 2xx replies; any other
/// status is surfaced as a transport error with the body attached.
///
/// **BUG THIS CATCHES**: Would catch off-by-one range errors (e.g. 300 treated as success).
#[test]
fn given_status_codes_when_classified_then_fall_in_expected_buckets() {
    // GIVEN / WHEN / THEN
    assert!(HttpStatusCode(200).is_success());
    assert!(HttpStatusCode(204).is_success());
    assert!(!HttpStatusCode(300).is_success());
    assert!(HttpStatusCode(404).is_client_error());
    assert!(!HttpStatusCode(404).is_server_error());
    assert!(HttpStatusCode(503).is_server_error());
    assert_eq!(HttpStatusCode::from(502).to_string(), "502");
}
