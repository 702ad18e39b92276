//! Mock tests for the EasyPost client
//!
//! These tests use WireMock to simulate the EasyPost API and verify that
//! the shipping facade drives the resilient core correctly: decoding,
//! idempotency headers, retry counts, and rate-limit waits.

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::core::ServiceClient;
    use crate::error::ErrorKind;
    use crate::resilience::{BreakerState, CircuitBreakerConfig};
    use crate::services::easypost::{
        Address, CreateShipmentRequest, CreateTrackerRequest, EasyPostClient, Parcel,
    };

    fn test_address() -> Address {
        Address {
            name: Some("Dr. Steve Brule".to_string()),
            street1: "179 N Harbor Dr".to_string(),
            city: "Redondo Beach".to_string(),
            state: "CA".to_string(),
            zip: "90277".to_string(),
            country: "US".to_string(),
            ..Address::default()
        }
    }

    fn shipment_body(with_label: bool) -> serde_json::Value {
        let mut shipment = json!({
            "id": "shp_1",
            "status": "unknown",
            "to_address": test_address(),
            "from_address": test_address(),
            "parcel": {"weight": 15.4},
            "rates": [
                {
                    "id": "rate_1",
                    "carrier": "USPS",
                    "service": "Priority",
                    "rate": "7.58",
                    "currency": "USD",
                    "delivery_days": 2
                }
            ]
        });
        if with_label {
            shipment["postage_label"] = json!({
                "id": "pl_1",
                "label_url": "https://assets.example/label.png",
                "label_file_type": "image/png"
            });
            shipment["tracking_code"] = json!("9400110898825022579493");
        }
        shipment
    }

    fn client_for(server: &MockServer) -> EasyPostClient {
        EasyPostClient::builder()
            .api_key("EZTK_test")
            .base_url(server.uri())
            .timeout(5)
            .base_delay_ms(10)
            .build()
            .expect("Failed to build EasyPost client")
    }

    #[tokio::test]
    async fn create_shipment_decodes_rates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/shipments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(shipment_body(false)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = CreateShipmentRequest {
            to_address: test_address(),
            from_address: test_address(),
            parcel: Parcel {
                weight: 15.4,
                ..Parcel::default()
            },
        };

        let shipment = client.create_shipment(&request).await.unwrap();
        assert_eq!(shipment.id, "shp_1");
        assert_eq!(shipment.rates.len(), 1);
        assert_eq!(shipment.rates[0].carrier, "USPS");
    }

    #[tokio::test]
    async fn buy_shipment_sends_idempotency_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/shipments/shp_1/buy"))
            .and(header_exists("Idempotency-Key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(shipment_body(true)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let shipment = client.buy_shipment("shp_1", "rate_1").await.unwrap();
        assert!(shipment.postage_label.is_some());
        assert_eq!(
            shipment.tracking_code.as_deref(),
            Some("9400110898825022579493")
        );
    }

    #[tokio::test]
    async fn persistent_503_attempts_exactly_three_times() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/trackers"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": {"message": "temporarily unavailable"}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .create_tracker(&CreateTrackerRequest {
                tracking_code: "EZ1000000001".to_string(),
                carrier: Some("USPS".to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(err.attempts(), Some(3));
    }

    #[tokio::test]
    async fn recovers_after_two_500s_without_tripping_breaker() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/trackers/trk_1"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/trackers/trk_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "trk_1",
                "tracking_code": "EZ1000000001",
                "status": "in_transit"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let tracker = client.get_tracker("trk_1").await.unwrap();
        assert_eq!(tracker.status.as_deref(), Some("in_transit"));

        let breaker = client.inner().breaker();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test]
    async fn rate_limited_call_waits_at_least_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/trackers/trk_2"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "2")
                    .set_body_json(json!({"error": {"message": "rate limited"}})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/trackers/trk_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "trk_2",
                "tracking_code": "EZ2000000002"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let started = Instant::now();
        let tracker = client.get_tracker("trk_2").await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(tracker.id, "trk_2");
        assert!(elapsed >= Duration::from_secs(2), "waited {:?}", elapsed);
    }

    #[tokio::test]
    async fn unauthorized_surfaces_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/addresses"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "invalid api key", "code": "UNAUTHORIZED"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.verify_address(&test_address()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn breaker_can_be_configured_per_client() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/carrier_types"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = EasyPostClient::builder()
            .api_key("EZTK_test")
            .base_url(server.uri())
            .base_delay_ms(10)
            .max_attempts(1)
            .circuit_breaker(CircuitBreakerConfig {
                failure_threshold: 2,
                reset_timeout: Duration::from_secs(60),
            })
            .build()
            .unwrap();

        assert!(!client.health_check().await.unwrap());
        assert!(!client.health_check().await.unwrap());
        assert_eq!(client.inner().breaker().state(), BreakerState::Open);
    }
}
