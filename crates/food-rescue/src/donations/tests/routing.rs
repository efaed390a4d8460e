use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::donations::distance::FixedDistance;
use crate::donations::domain::DonationStatus;
use crate::donations::router::{self, CALLER_ID_HEADER, CALLER_ROLE_HEADER};
use crate::donations::{
    donation_router, CallerContext, CallerRole, DonationError, MemoryDonationStore,
};

fn request(
    method: &str,
    uri: &str,
    caller: Option<(u64, &str)>,
) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match caller {
        Some((id, role)) => builder
            .header(CALLER_ID_HEADER, id.to_string())
            .header(CALLER_ROLE_HEADER, role),
        None => builder,
    }
}

fn caller_headers(id: &str, role: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CALLER_ID_HEADER, HeaderValue::from_str(id).expect("header"));
    headers.insert(CALLER_ROLE_HEADER, HeaderValue::from_str(role).expect("header"));
    headers
}

#[test]
fn caller_identity_is_read_from_headers() {
    let ctx = router::caller_from_headers(&caller_headers("7", "ngo")).expect("valid caller");
    assert_eq!(ctx, CallerContext::claimant(7));

    for (id, role) in [("0", "NGO"), ("abc", "NGO"), ("7", "VOLUNTEER")] {
        let err = router::caller_from_headers(&caller_headers(id, role)).expect_err("rejected");
        assert!(matches!(err, DonationError::Unauthenticated));
    }
    assert!(router::caller_from_headers(&HeaderMap::new()).is_err());
}

#[tokio::test]
async fn claim_route_returns_created_then_conflict() {
    let (service, store) = build_service();
    let first = seed_claimant(store.as_ref(), "Harbour Kitchen", 80.0);
    let second = seed_claimant(store.as_ref(), "Night Shelter", 60.0);
    let donation = seed_donation(store.as_ref(), "Bread", 3, minutes_ago(10));
    let app = donation_router(Arc::new(service));
    let uri = format!("/api/ngo/claim/{}", donation.id);

    let response = app
        .clone()
        .oneshot(
            request("POST", &uri, Some((first.id.0, "NGO")))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "Donation claimed");
    assert_eq!(payload["data"]["requestId"], 1);
    assert_eq!(payload["data"]["donationId"], donation.id.0);

    let response = app
        .oneshot(
            request("POST", &uri, Some((second.id.0, "NGO")))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("already claimed"));
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let (service, _) = build_service();
    let app = donation_router(Arc::new(service));

    let response = app
        .oneshot(
            request("GET", "/api/ngo/overview", None)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_is_forbidden() {
    let (service, _) = build_service();
    let app = donation_router(Arc::new(service));

    let response = app
        .oneshot(
            request("GET", "/api/admin/overview", Some((3, "DONOR")))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_path_ids_are_bad_requests() {
    let (service, store) = build_service();
    let claimant = seed_claimant(store.as_ref(), "Harbour Kitchen", 80.0);
    let app = donation_router(Arc::new(service));

    let response = app
        .oneshot(
            request(
                "POST",
                "/api/ngo/claim/not-a-number",
                Some((claimant.id.0, "NGO")),
            )
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_handler_maps_unknown_requests_to_bad_request() {
    let (service, store) = build_service();
    let claimant = seed_claimant(store.as_ref(), "Harbour Kitchen", 80.0);

    let response = router::verify_handler::<MemoryDonationStore, FixedDistance>(
        State(Arc::new(service)),
        caller_headers(&claimant.id.0.to_string(), "NGO"),
        Path("55".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "verification failed");
}

#[tokio::test]
async fn donor_can_post_and_list_donations() {
    let (service, _) = build_service();
    let app = donation_router(Arc::new(service));
    let body = json!({
        "foodType": "Vegetable curry",
        "quantity": "20 portions",
        "expiryHours": 3,
        "pickupAddress": "8 Canal Street"
    });

    let response = app
        .clone()
        .oneshot(
            request("POST", "/api/donor/donations", Some((5, "DONOR")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("json")))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    assert_eq!(created["data"]["status"], "PENDING");
    assert_eq!(created["data"]["donorId"], 5);

    let response = app
        .oneshot(
            request(
                "GET",
                "/api/donor/donations?status=ALL&search=curry&page=1",
                Some((5, "DONOR")),
            )
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json_body(response).await;
    assert_eq!(listed["data"]["total"], 1);
    assert_eq!(listed["data"]["items"][0]["foodType"], "Vegetable curry");
}

#[tokio::test]
async fn incomplete_donation_body_is_a_bad_request() {
    let (service, store) = build_service();
    let app = donation_router(Arc::new(service));
    let body = json!({ "foodType": "Rice", "quantity": "1kg", "expiryHours": 2 });

    let response = app
        .oneshot(
            request("POST", "/api/donor/donations", Some((101, "DONOR")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("json")))
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("pickupAddress"));
    let stored = crate::donations::DonationStore::fetch_donation(
        store.as_ref(),
        crate::donations::domain::DonationId(1),
    )
    .expect("read");
    assert!(stored.is_none());
}

#[tokio::test]
async fn identity_is_checked_before_the_body() {
    let (service, _) = build_service();
    let app = donation_router(Arc::new(service));

    for uri in ["/api/donor/donations", "/api/admin/claimants"] {
        let response = app
            .clone()
            .oneshot(
                request("POST", uri, None)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("not json"))
                    .expect("request"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let payload = read_json_body(response).await;
        assert_eq!(payload["error"], "missing or malformed caller identity");
    }
}

#[tokio::test]
async fn garbage_claimant_body_uses_the_error_envelope() {
    let (service, store) = build_service();
    let app = donation_router(Arc::new(service));

    let response = app
        .oneshot(
            request("POST", "/api/admin/claimants", Some((1, "ADMIN")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"name\": "))
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .starts_with("invalid input: "));
    let claimants = crate::donations::DonationStore::claimants(store.as_ref()).expect("list");
    assert!(claimants.is_empty());
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let (service, _) = build_service();
    let app = donation_router(Arc::new(service));

    let response = app
        .oneshot(
            request("GET", "/api/donor/donations?status=EXPIRED", Some((5, "DONOR")))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn browse_route_returns_ranked_donations() {
    let (service, store) = build_service();
    let claimant = seed_claimant(store.as_ref(), "Harbour Kitchen", 80.0);
    seed_donation(store.as_ref(), "Rice", 8, minutes_ago(20));
    seed_donation(store.as_ref(), "Rice pudding", 1, minutes_ago(10));
    seed_donation(store.as_ref(), "Bread", 1, minutes_ago(5));
    let app = donation_router(Arc::new(service));

    let response = app
        .oneshot(
            request("GET", "/api/ngo/browse?search=rice", Some((claimant.id.0, "NGO")))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let rows = payload["data"].as_array().expect("ranked list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["foodType"], "Rice pudding");
    assert_eq!(rows[0]["priorityScore"], 88.0);
    assert_eq!(rows[0]["distanceKm"], 5.0);
}

#[tokio::test]
async fn admin_can_register_and_verify_claimants() {
    let (service, store) = build_service();
    let app = donation_router(Arc::new(service));
    let body = json!({ "name": "Food Bank South", "area": "Docklands", "capacityKgPerDay": 300 });

    let response = app
        .clone()
        .oneshot(
            request("POST", "/api/admin/claimants", Some((1, "ADMIN")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("json")))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    let id = created["data"]["id"].as_u64().expect("claimant id");

    let response = app
        .oneshot(
            request(
                "POST",
                &format!("/api/admin/claimants/{id}/verify"),
                Some((1, "ADMIN")),
            )
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let claimants = crate::donations::DonationStore::claimants(store.as_ref()).expect("list");
    assert!(claimants[0].verified);
}

#[tokio::test]
async fn store_failures_surface_as_service_unavailable() {
    let store = Arc::new(FaultyStore::failing_commits());
    let claimant = seed_claimant(&store.inner, "Harbour Kitchen", 80.0);
    let donation = seed_donation(&store.inner, "Bread", 3, minutes_ago(10));
    let app = donation_router(Arc::new(service_over(store.clone())));

    let response = app
        .oneshot(
            request(
                "POST",
                &format!("/api/ngo/claim/{}", donation.id),
                Some((claimant.id.0, CallerRole::Claimant.label())),
            )
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(donation_status(&store.inner, donation.id), DonationStatus::Pending);
}
