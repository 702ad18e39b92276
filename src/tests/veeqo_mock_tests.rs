//! Mock tests for the Veeqo client
//!
//! WireMock-backed tests covering product listing, order fetch, stock
//! updates with idempotency keys, and error mapping for auth failures.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::core::ServiceClient;
    use crate::error::ErrorKind;
    use crate::services::veeqo::{CreateOrderRequest, LineItem, UpdateStockRequest, VeeqoClient};

    fn client_for(server: &MockServer) -> VeeqoClient {
        VeeqoClient::builder()
            .api_key("Vqt_test")
            .base_url(server.uri())
            .timeout(5)
            .base_delay_ms(10)
            .build()
            .expect("Failed to build Veeqo client")
    }

    #[tokio::test]
    async fn list_products_sends_key_and_decodes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .and(header("x-api-key", "Vqt_test"))
            .and(query_param("page", "1"))
            .and(query_param("page_size", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 101,
                    "title": "Widget",
                    "sellables": [
                        {
                            "id": 201,
                            "sku_code": "WID-1",
                            "stock_entries": [
                                {
                                    "sellable_id": 201,
                                    "warehouse_id": 7,
                                    "physical_stock_level": 40,
                                    "available_stock_level": 38
                                }
                            ]
                        }
                    ]
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let products = client.list_products(1, 25).await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Widget");
        assert_eq!(
            products[0].sellables[0].stock_entries[0].physical_stock_level,
            40
        );
    }

    #[tokio::test]
    async fn get_order_not_found_is_terminal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders/9999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"message": "order not found"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get_order(9999).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn list_orders_passes_status_filter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(query_param("status", "awaiting_fulfillment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 5001, "status": "awaiting_fulfillment"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let orders = client
            .list_orders(Some("awaiting_fulfillment"))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, 5001);
    }

    #[tokio::test]
    async fn update_stock_entry_is_idempotent_put() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/sellables/201/warehouses/7/stock_entry"))
            .and(header_exists("Idempotency-Key"))
            .and(body_partial_json(json!({
                "stock_entry": {"physical_stock_level": 55}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sellable_id": 201,
                "warehouse_id": 7,
                "physical_stock_level": 55
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let entry = client
            .update_stock_entry(
                201,
                7,
                &UpdateStockRequest {
                    physical_stock_level: 55,
                },
            )
            .await
            .unwrap();

        assert_eq!(entry.physical_stock_level, 55);
    }

    #[tokio::test]
    async fn create_order_wraps_payload_and_sends_idempotency_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(header_exists("Idempotency-Key"))
            .and(body_partial_json(json!({
                "order": {"channel_id": 3, "customer_id": 42}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 6001,
                "status": "awaiting_payment",
                "line_items": [
                    {"id": 1, "sellable_id": 201, "quantity": 2}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let order = client
            .create_order(&CreateOrderRequest {
                channel_id: 3,
                customer_id: 42,
                line_items: vec![LineItem {
                    id: None,
                    sellable_id: 201,
                    quantity: 2,
                    price_per_unit: None,
                }],
            })
            .await
            .unwrap();

        assert_eq!(order.id, 6001);
        assert_eq!(order.line_items.len(), 1);
    }

    #[tokio::test]
    async fn invalid_key_maps_to_unauthorized_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current_user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid api key"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn retries_network_style_500s_before_failing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.list_products(1, 10).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(err.service_name(), Some("veeqo"));
    }
}
