//! Drives the route table end to end against the in-memory store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use jw_api::configure_routes;
use jw_api::handlers::AppState;
use jw_core::models::{Order, Requester};
use jw_core::testing::{ring_order, MemoryOrderRepo};
use jw_core::traits::MockAuthProvider;
use serde_json::{json, Value};
use uuid::Uuid;

struct Fixture {
    repo: Arc<MemoryOrderRepo>,
    state: web::Data<AppState>,
    alice: Uuid,
    bob: Uuid,
}

/// Tokens are just the user's name: "alice", "bob" and "admin".
fn fixture() -> Fixture {
    let alice = Uuid::now_v7();
    let bob = Uuid::now_v7();
    let admin = Uuid::now_v7();
    let users = vec![
        ("alice", Requester { user_id: alice, is_admin: false }),
        ("bob", Requester { user_id: bob, is_admin: false }),
        ("admin", Requester { user_id: admin, is_admin: true }),
    ];

    let mut auth = MockAuthProvider::new();
    auth.expect_verify_token()
        .returning(move |token| users.iter().find(|(name, _)| *name == token).map(|(_, r)| *r));

    let repo = Arc::new(MemoryOrderRepo::new());
    let state = web::Data::new(AppState::new(repo.clone(), Box::new(auth)));
    Fixture { repo, state, alice, bob }
}

/// Sends a request and returns the status with the JSON body (`Null` when empty).
macro_rules! send {
    ($app:expr, $req:expr $(,)?) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let value: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

fn checkout_body() -> Value {
    json!({
        "lineItems": [{ "productRef": "prod-ring-01", "name": "Ring", "quantity": 2, "unitPrice": 100.0 }],
        "shippingAddress": {
            "fullName": "Ada Lovelace",
            "street": "12 Hatton Garden",
            "city": "London",
            "state": "Greater London",
            "postalCode": "EC1N 8AN",
            "country": "GB"
        },
        "paymentMethod": "card",
        "totalAmount": 200.0
    })
}

fn seeded_order(fx: &Fixture) -> Order {
    let order = Order::place(ring_order(fx.alice), chrono::Utc::now()).unwrap();
    fx.repo.seed(order.clone());
    order
}

#[actix_web::test]
async fn health_needs_no_token() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;

    let (status, body) = send!(app, test::TestRequest::get().uri("/health"));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn missing_or_bad_token_is_unauthorized() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;

    let (status, _) = send!(app, test::TestRequest::get().uri("/orders/myorders"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/orders/myorders").insert_header(bearer("mallory")),
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, token failed");
}

#[actix_web::test]
async fn checkout_then_fetch_by_owner_admin_and_stranger() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;

    let (status, created) = send!(
        app,
        test::TestRequest::post()
            .uri("/orders")
            .insert_header(bearer("alice"))
            .set_json(checkout_body()),
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Order Confirmed");
    assert_eq!(created["owner"], fx.alice.to_string());
    assert_eq!(created["statusHistory"].as_array().unwrap().len(), 1);
    let uri = format!("/orders/by-id/{}", created["id"].as_str().unwrap());

    let (status, fetched) = send!(app, test::TestRequest::get().uri(&uri).insert_header(bearer("alice")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["lineItems"], created["lineItems"]);
    assert_eq!(fetched["totalAmount"], 200.0);

    let (status, _) = send!(app, test::TestRequest::get().uri(&uri).insert_header(bearer("admin")));
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(app, test::TestRequest::get().uri(&uri).insert_header(bearer("bob")));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to view this order");
}

#[actix_web::test]
async fn checkout_without_items_is_rejected() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let mut body = checkout_body();
    body["lineItems"] = json!([]);

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/orders").insert_header(bearer("alice")).set_json(body),
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No order items");
    assert!(fx.repo.is_empty());
}

#[actix_web::test]
async fn my_orders_only_lists_own() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    seeded_order(&fx);
    fx.repo.seed(Order::place(ring_order(fx.bob), chrono::Utc::now()).unwrap());

    let (status, body) = send!(app, test::TestRequest::get().uri("/orders/myorders").insert_header(bearer("bob")));

    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["owner"], fx.bob.to_string());
}

#[actix_web::test]
async fn admin_routes_reject_customers() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let order = seeded_order(&fx);

    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/status/{}", order.id))
            .insert_header(bearer("alice"))
            .set_json(json!({ "status": "Delivered" })),
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(app, test::TestRequest::get().uri("/orders").insert_header(bearer("alice")));
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn status_update_validates_then_delivers_then_blocks_cancel() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let order = seeded_order(&fx);
    let status_uri = format!("/orders/status/{}", order.id);

    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri(&status_uri)
            .insert_header(bearer("admin"))
            .set_json(json!({ "status": "Shipped" })),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&status_uri)
            .insert_header(bearer("admin"))
            .set_json(json!({ "status": "Delivered" })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order status updated");
    assert_eq!(body["order"]["isDelivered"], true);
    assert!(body["order"]["deliveredAt"].is_string());

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/cancel", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "reason": "changed mind" })),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot cancel an order that has been delivered");
}

#[actix_web::test]
async fn cancel_without_body_uses_default_note() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let order = seeded_order(&fx);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/cancel", order.id))
            .insert_header(bearer("admin")),
    );

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "Cancelled");
    assert_eq!(body["order"]["statusHistory"][1]["note"], "Order cancelled");
}

#[actix_web::test]
async fn payment_and_tracking_auto_advance() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let order = seeded_order(&fx);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/payment", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "isPaid": true, "paymentReference": "pi_42" })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "Payment Processing");
    assert_eq!(body["order"]["paymentReference"], "pi_42");

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/tracking", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "carrier": "DHL", "trackingNumber": "XYZ123", "trackingUrl": "https://dhl.example/XYZ123" })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tracking information updated");
    assert_eq!(body["order"]["status"], "Order Shipped");
    assert_eq!(body["order"]["tracking"]["trackingNumber"], "XYZ123");

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/notes", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "adminNotes": "engrave: A.L." })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["adminNotes"], "engrave: A.L.");
    assert_eq!(body["order"]["statusHistory"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;

    for id in [Uuid::now_v7().to_string(), "not-a-uuid".to_string()] {
        let (status, body) = send!(
            app,
            test::TestRequest::get().uri(&format!("/orders/by-id/{}", id)).insert_header(bearer("admin")),
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
    }
}

#[actix_web::test]
async fn admin_listing_paginates_and_filters() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    for _ in 0..25 {
        seeded_order(&fx);
    }

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/orders?page=2&limit=10&status=all").insert_header(bearer("admin")),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"], json!({ "total": 25, "page": 2, "pages": 3, "limit": 10 }));

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/orders?status=Delivered&sortBy=totalAmount&order=asc")
            .insert_header(bearer("admin")),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);

    let (status, _) = send!(
        app,
        test::TestRequest::get().uri("/orders?status=Lost").insert_header(bearer("admin")),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_bodies_and_queries_answer_with_json_messages() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let order = seeded_order(&fx);
    let mut checkout = checkout_body();
    checkout.as_object_mut().unwrap().remove("shippingAddress");

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/orders").insert_header(bearer("alice")).set_json(checkout),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("shippingAddress"));
    assert_eq!(fx.repo.len(), 1);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/status/{}", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "note": "no status here" })),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("status"));

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/orders?page=abc").insert_header(bearer("admin")),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn cancel_with_malformed_body_changes_nothing() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let order = seeded_order(&fx);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/cancel", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "reason": 42 })),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid cancel request"));

    let (_, fetched) = send!(
        app,
        test::TestRequest::get().uri(&format!("/orders/by-id/{}", order.id)).insert_header(bearer("admin")),
    );
    assert_eq!(fetched["status"], "Order Confirmed");
    assert_eq!(fetched["statusHistory"].as_array().unwrap().len(), 1);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/cancel", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "reason": "customer request" })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["statusHistory"][1]["note"], "customer request");
}

#[actix_web::test]
async fn owner_views_omit_admin_notes() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure_routes)).await;
    let order = seeded_order(&fx);
    let uri = format!("/orders/by-id/{}", order.id);

    send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}/notes", order.id))
            .insert_header(bearer("admin"))
            .set_json(json!({ "adminNotes": "suspected reseller" })),
    );

    let (_, as_admin) = send!(app, test::TestRequest::get().uri(&uri).insert_header(bearer("admin")));
    assert_eq!(as_admin["adminNotes"], "suspected reseller");

    let (_, as_owner) = send!(app, test::TestRequest::get().uri(&uri).insert_header(bearer("alice")));
    assert!(as_owner.get("adminNotes").is_none());

    let (_, mine) = send!(app, test::TestRequest::get().uri("/orders/myorders").insert_header(bearer("alice")));
    assert!(mine[0].get("adminNotes").is_none());
}
