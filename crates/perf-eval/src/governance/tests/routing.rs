use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::governance::router::{create_handler, get_handler};
use crate::governance::{category_router, NewCategory};

#[tokio::test]
async fn create_handler_returns_created_category() {
    let (service, _catalog) = build_service();
    let service = Arc::new(service);

    let response = create_handler(
        State(service.clone()),
        axum::Json(NewCategory {
            name: "Technical".to_string(),
            description: Some("Engineering depth".to_string()),
            weight: pct("100"),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["name"], "Technical");
    assert_eq!(payload["is_active"], true);
}

#[tokio::test]
async fn get_handler_maps_missing_category_to_not_found() {
    let (service, _catalog) = build_service();

    let response = get_handler(State(Arc::new(service)), Path(4242)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("4242"));
}

#[tokio::test]
async fn validate_route_reports_current_total() {
    let (service, _catalog, _categories) = seeded_service(&["60", "30"]);
    let router = category_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::get("/api/v1/criteria-categories/validate-weights")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["is_valid"], false);
    assert_eq!(payload["active_categories"], 2);
}

#[tokio::test]
async fn rebalance_route_applies_plan() {
    let (service, catalog, categories) = seeded_service(&["40", "35", "25"]);
    let router = category_router(Arc::new(service));
    let body = json!({
        "weights": [{ "category_id": categories[0].id, "proposed_weight": 10 }]
    });

    let response = router
        .oneshot(
            Request::post("/api/v1/criteria-categories/rebalance")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["validation"]["is_valid"], true);
    assert_eq!(payload["applied"].as_array().map(Vec::len), Some(3));
    assert_eq!(weight_of(&catalog, categories[1].id), pct("52.5"));
}

#[tokio::test]
async fn rebalance_route_rejects_over_allocation() {
    let (service, catalog, categories) = seeded_service(&["50", "30", "20"]);
    let router = category_router(Arc::new(service));
    let body = json!({
        "weights": [
            { "category_id": categories[0].id, "proposed_weight": 70 },
            { "category_id": categories[1].id, "proposed_weight": 40 }
        ]
    });

    let response = router
        .oneshot(
            Request::post("/api/v1/criteria-categories/rebalance")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(weight_of(&catalog, categories[0].id), pct("50"));
}

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let (service, _catalog, _categories) = seeded_service(&["100"]);
    let router = category_router(Arc::new(service));
    let body = json!({ "name": "Category A", "description": null, "weight": 5 });

    let response = router
        .oneshot(
            Request::post("/api/v1/criteria-categories")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
