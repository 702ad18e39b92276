//! Tests for error classification and context plumbing

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::error::mapping::{classify_status, classify_transport, parse_retry_after};
    use crate::error::{ErrorKind, ServiceError};

    #[test]
    fn every_defined_status_maps_to_exactly_one_kind() {
        let expected = [
            (400, ErrorKind::InvalidInput),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::ServiceUnavailable),
            (502, ErrorKind::ServiceUnavailable),
            (503, ErrorKind::ServiceUnavailable),
            (504, ErrorKind::Timeout),
        ];

        for (status, kind) in expected {
            // Repeated classification of the same input is stable
            for _ in 0..3 {
                let err = classify_status("easypost", "shipments", status, None, "{}");
                assert_eq!(err.kind(), kind, "status {}", status);
            }
        }
    }

    #[test]
    fn classification_ignores_call_history() {
        // Interleaving different statuses does not change any mapping
        let first = classify_status("veeqo", "orders", 503, None, "{}").kind();
        let _ = classify_status("veeqo", "orders", 400, None, "{}");
        let _ = classify_status("veeqo", "orders", 429, Some("9"), "{}");
        let second = classify_status("veeqo", "orders", 503, None, "{}").kind();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn connection_refused_classifies_as_network_error() {
        // Bind to an ephemeral port, then drop the listener so the port is
        // known to refuse connections
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = reqwest::Client::new();
        let err = client
            .get(format!("http://127.0.0.1:{}/", port))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .unwrap_err();

        let classified = classify_transport(&err);
        assert_eq!(classified.kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn retry_after_parsing_is_lenient() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after("not-a-number"), None);
        assert_eq!(parse_retry_after("-3"), None);
    }

    #[test]
    fn garbage_vendor_bodies_never_panic() {
        for body in ["", "null", "[1,2,3]", "\u{0}\u{1}", "<html></html>", "{\"error\":{}}"] {
            let err = classify_status("easypost", "shipments", 500, None, body);
            assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        }
    }

    #[test]
    fn display_includes_kind_prefix_and_vendor_message() {
        let err = classify_status(
            "easypost",
            "shipments",
            401,
            None,
            r#"{"error": {"message": "invalid api key"}}"#,
        );
        let text = err.to_string();
        assert!(text.contains("invalid api key"));
        assert!(ServiceError::unauthorized("x").to_string().starts_with("Unauthorized"));
    }

    #[test]
    fn serde_errors_convert_to_external() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: ServiceError = parse_err.into();
        assert_eq!(err.kind(), ErrorKind::ExternalError);
    }
}
