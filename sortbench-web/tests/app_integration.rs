//! End-to-end route wiring tests driven through `actix_web::test`, grounded
//! on the teacher's `server::test` integration style. Exercises the real
//! `app::configure` assembly — middleware order, status codes, and body
//! shapes — rather than calling handlers directly.

mod common;

use actix_web::{http::StatusCode, test, App};
use serde_json::json;
use sortbench_web::{app::configure, auth::ApiKeySet};

#[actix_web::test]
async fn healthz_is_unauthenticated_and_ok() {
    let state = common::test_state();
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::get().uri("/healthz").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn meta_lists_builtin_algorithms_for_every_type() {
    let state = common::test_state();
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::get().uri("/meta").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert!(body["types"].as_array().unwrap().contains(&json!("i32")));
    assert!(body["algos"]["i32"].as_array().unwrap().contains(&json!("std_sort")));
}

#[actix_web::test]
async fn run_executes_a_real_benchmark_synchronously() {
    let state = common::test_state();
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::post()
        .uri("/run")
        .set_json(json!({
            "n": 64,
            "distribution": "random",
            "elem_type": "i32",
            "repeats": 1,
            "algorithms": ["std_sort"],
            "assert_sorted": true,
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rows: Vec<serde_json::Value> = test::read_body_json(resp).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["algo"], "std_sort");
}

#[actix_web::test]
async fn run_rejects_n_of_zero_with_validation_error() {
    let state = common::test_state();
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::post()
        .uri("/run")
        .set_json(json!({
            "n": 0,
            "distribution": "random",
            "elem_type": "i32",
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn jobs_round_trip_through_submit_get_and_cancel() {
    let state = common::test_state();
    let app = test::init_service(App::new().configure(configure(state))).await;

    let submit_req = test::TestRequest::post()
        .uri("/jobs")
        .set_json(json!({
            "n": 64,
            "distribution": "random",
            "elem_type": "i32",
            "algorithms": ["std_sort"],
        }))
        .to_request();
    let submit_resp = test::call_service(&app, submit_req).await;
    assert_eq!(submit_resp.status(), StatusCode::ACCEPTED);

    let body: serde_json::Value = test::read_body_json(submit_resp).await;
    let job_id = body["job_id"].as_str().unwrap().to_owned();

    let get_req = test::TestRequest::get().uri(&format!("/jobs/{job_id}")).to_request();
    let job: serde_json::Value = test::call_and_read_body_json(&app, get_req).await;
    assert_eq!(job["id"], job_id);
    assert!(matches!(job["status"].as_str(), Some("pending" | "running" | "done")));

    let cancel_req = test::TestRequest::post()
        .uri(&format!("/jobs/{job_id}/cancel"))
        .to_request();
    let cancel_resp = test::call_service(&app, cancel_req).await;
    assert_eq!(cancel_resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn jobs_get_of_unknown_id_is_not_found() {
    let state = common::test_state();
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::get().uri("/jobs/does-not-exist").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn jobs_scope_rejects_missing_api_key_when_keys_are_configured() {
    let mut keys = std::collections::HashSet::new();
    keys.insert("secret-key".to_owned());
    let state = common::test_state_with(sortbench_settings::Settings::test_settings(), ApiKeySet::new(keys));
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::post()
        .uri("/jobs")
        .set_json(json!({"n": 16, "distribution": "random", "elem_type": "i32"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn jobs_scope_admits_a_valid_api_key() {
    let mut keys = std::collections::HashSet::new();
    keys.insert("secret-key".to_owned());
    let state = common::test_state_with(sortbench_settings::Settings::test_settings(), ApiKeySet::new(keys));
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::post()
        .uri("/jobs")
        .insert_header(("X-API-Key", "secret-key"))
        .set_json(json!({"n": 16, "distribution": "random", "elem_type": "i32"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn limits_reports_in_process_mode_and_no_pool() {
    let state = common::test_state();
    let app = test::init_service(App::new().configure(configure(state))).await;

    let req = test::TestRequest::get().uri("/limits").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["mode"], "in-process");
    assert_eq!(body["durable"], false);
    assert!(body["pool"].is_null());
}
