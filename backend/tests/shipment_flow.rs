//! End-to-end behaviour of the REST API over the in-memory adapters.

mod support;

use actix_web::test::{self as actix_test, TestRequest};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;

use shiptrack::domain::ports::NotificationTemplate;
use support::{Harness, onboard, partner, seller, send};

#[rstest]
#[actix_web::test]
async fn shipment_travels_from_placement_to_delivery() {
    let harness = Harness::new();
    let app = actix_test::init_service(harness.app()).await;
    let outbox = harness.outbox.as_ref();

    let (seller_id, seller_token) = onboard(
        &app,
        outbox,
        "sellers",
        seller("Ada Shop", "ada@shop.example"),
    )
    .await;
    let (partner_id, partner_token) = onboard(
        &app,
        outbox,
        "partners",
        partner("Swift Couriers", "ops@swift.example", &[11_050, 11_051], 1),
    )
    .await;

    let (status, placed) = send(
        &app,
        TestRequest::post().uri("/api/v1/shipments"),
        Some(&seller_token),
        Some(json!({"content": "books", "weight": 2.5, "destination": 11_050})),
    )
    .await;
    assert_eq!(status, 201, "{placed}");
    assert_eq!(placed["status"], "placed");
    assert_eq!(placed["sellerId"], seller_id.as_str());
    assert_eq!(placed["partnerId"], partner_id.as_str());
    let shipment_id = placed["id"].as_str().expect("shipment id").to_owned();
    let shipment_uri = format!("/api/v1/shipments/{shipment_id}");

    let placed_mail = outbox.last_to("ada@shop.example", NotificationTemplate::ShipmentPlaced);
    assert_eq!(placed_mail.context["shipmentId"], shipment_id.as_str());
    assert_eq!(placed_mail.context["partnerName"], "Swift Couriers");
    let code = placed_mail.context["verificationCode"]
        .as_str()
        .expect("verification code")
        .to_owned();
    assert_eq!(code.len(), 6);
    outbox.last_to("ops@swift.example", NotificationTemplate::ShipmentAssigned);

    // The only partner serving 11050 is now at capacity.
    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/shipments"),
        Some(&seller_token),
        Some(json!({"content": "lamp", "weight": 1.0, "destination": 11_050})),
    )
    .await;
    assert_eq!(status, 406);
    assert_eq!(body["code"], "not_acceptable");

    harness.clock.advance(TimeDelta::hours(2));
    let (status, body) = send(
        &app,
        TestRequest::patch().uri(&shipment_uri),
        Some(&partner_token),
        Some(json!({
            "status": "in_transit",
            "location": 11_051,
            "description": "left the depot"
        })),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "in_transit");
    assert_eq!(
        outbox
            .last_to("ada@shop.example", NotificationTemplate::ShipmentStatusChanged)
            .context["status"],
        "in_transit"
    );

    let wrong_code: String = code
        .chars()
        .map(|digit| if digit == '9' { '0' } else { '9' })
        .collect();
    let (status, body) = send(
        &app,
        TestRequest::patch().uri(&shipment_uri),
        Some(&partner_token),
        Some(json!({"status": "delivered", "verificationCode": wrong_code})),
    )
    .await;
    assert_eq!(status, 401, "{body}");

    let (status, body) = send(
        &app,
        TestRequest::patch().uri(&shipment_uri),
        Some(&partner_token),
        Some(json!({"status": "placed"})),
    )
    .await;
    assert_eq!(status, 400, "{body}");
    assert_eq!(body["code"], "invalid_request");

    harness.clock.advance(TimeDelta::hours(5));
    let (status, body) = send(
        &app,
        TestRequest::patch().uri(&shipment_uri),
        Some(&partner_token),
        Some(json!({"status": "delivered", "verificationCode": code})),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "delivered");

    let (status, tracked) = send(
        &app,
        TestRequest::get().uri(&shipment_uri),
        Some(&seller_token),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let statuses: Vec<_> = tracked["timeline"]
        .as_array()
        .expect("timeline")
        .iter()
        .map(|event| event["status"].clone())
        .collect();
    assert_eq!(statuses, vec![json!("delivered"), json!("in_transit"), json!("placed")]);

    let (status, body) = send(
        &app,
        TestRequest::post().uri(&format!("{shipment_uri}/cancel")),
        Some(&seller_token),
        None,
    )
    .await;
    assert_eq!(status, 409, "{body}");
    assert_eq!(body["code"], "conflict");
}

#[rstest]
#[actix_web::test]
async fn unrelated_accounts_cannot_touch_a_shipment() {
    let harness = Harness::new();
    let app = actix_test::init_service(harness.app()).await;
    let outbox = harness.outbox.as_ref();

    let (_, owner_token) =
        onboard(&app, outbox, "sellers", seller("Owner", "owner@shop.example")).await;
    let (_, other_token) =
        onboard(&app, outbox, "sellers", seller("Other", "other@shop.example")).await;
    let (_, assignee_token) = onboard(
        &app,
        outbox,
        "partners",
        partner("Assigned", "assigned@courier.example", &[20_000], 5),
    )
    .await;
    let (_, idle_token) = onboard(
        &app,
        outbox,
        "partners",
        partner("Idle", "idle@courier.example", &[30_000], 5),
    )
    .await;

    let (status, placed) = send(
        &app,
        TestRequest::post().uri("/api/v1/shipments"),
        Some(&owner_token),
        Some(json!({"content": "tea", "weight": 0.5, "destination": 20_000})),
    )
    .await;
    assert_eq!(status, 201, "{placed}");
    let shipment_uri = format!("/api/v1/shipments/{}", placed["id"].as_str().expect("id"));

    for token in [&other_token, &idle_token] {
        let (status, _) = send(&app, TestRequest::get().uri(&shipment_uri), Some(token), None).await;
        assert_eq!(status, 401);
    }
    let (status, _) = send(
        &app,
        TestRequest::get().uri(&shipment_uri),
        Some(&assignee_token),
        None,
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = send(
        &app,
        TestRequest::patch().uri(&shipment_uri),
        Some(&idle_token),
        Some(json!({"status": "in_transit"})),
    )
    .await;
    assert_eq!(status, 401);

    let (status, _) = send(
        &app,
        TestRequest::post().uri(&format!("{shipment_uri}/cancel")),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, 401);

    let (status, cancelled) = send(
        &app,
        TestRequest::post().uri(&format!("{shipment_uri}/cancel")),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, 200, "{cancelled}");
    assert_eq!(cancelled["status"], "cancelled");
    outbox.last_to("assigned@courier.example", NotificationTemplate::ShipmentCancelled);

    let (status, _) = send(
        &app,
        TestRequest::delete().uri(&shipment_uri),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, 204);
    let (status, body) = send(
        &app,
        TestRequest::get().uri(&shipment_uri),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, 404, "{body}");
}
