mod support;

#[tokio::test]
async fn status_reports_an_empty_lobby_before_any_connection() {
    let harness = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/status", harness.admin_url))
        .send()
        .await
        .expect("status request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.expect("status body should be json");
    assert_eq!(body["match_active"], false);
    assert!(body["player_count"].as_u64().is_some());
}

#[tokio::test]
async fn lock_and_config_round_trip_through_the_admin_facade() {
    let harness = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/config", harness.admin_url))
        .json(&serde_json::json!({ "min_players": 4 }))
        .send()
        .await
        .expect("config request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.expect("config body should be json");
    assert_eq!(body["min_players"], 4);

    let res = client
        .post(format!("{}/lock", harness.admin_url))
        .json(&serde_json::json!({ "locked": true }))
        .send()
        .await
        .expect("lock request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn start_reports_ok_false_when_rate_limited() {
    let harness = support::ensure_server();
    let client = reqwest::Client::new();

    let first = client
        .post(format!("{}/start", harness.admin_url))
        .send()
        .await
        .expect("first start request should succeed");
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let first_body: serde_json::Value = first.json().await.expect("start body should be json");
    assert_eq!(first_body["ok"], true);

    let second = client
        .post(format!("{}/start", harness.admin_url))
        .send()
        .await
        .expect("second start request should succeed");
    assert_eq!(second.status(), reqwest::StatusCode::OK);
    let second_body: serde_json::Value = second.json().await.expect("start body should be json");
    assert_eq!(second_body["ok"], false);
}
