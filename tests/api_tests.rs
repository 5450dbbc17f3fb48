use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

use common::{complete, get, post, send};

#[tokio::test]
async fn test_health_root_reports_loaded_catalog() {
    let app = common::create_test_app();
    let (status, body) = get(&app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["resources"], 4);
}

#[tokio::test]
async fn test_health_root_degraded_without_catalog() {
    let app = common::create_empty_app();
    let (status, body) = get(&app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["catalog"], "empty");
}

#[tokio::test]
async fn test_health_live_and_info() {
    let app = common::create_test_app();

    let (status, _) = get(&app, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/health/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defaultGoal"], "basics");
    assert_eq!(body["maxPathSteps"], 50);
    assert_eq!(body["tieBreak"], "horizontal");
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = common::create_test_app();
    let (status, body) = get(&app, "/api/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_resources_marks_availability() {
    let app = common::create_test_app();
    let (status, body) = get(&app, "/api/resources", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["total"], 4);
    assert_eq!(data["gridSize"], json!({ "x": 10, "y": 10 }));

    let resources = data["resources"].as_array().unwrap();
    let a = resources.iter().find(|r| r["name"] == "A").unwrap();
    let b = resources.iter().find(|r| r["name"] == "B").unwrap();
    assert_eq!(a["available"], true);
    assert_eq!(b["available"], false);
    assert_eq!(b["type"], "tutorial");
    assert_eq!(b["x"], 3);
    assert_eq!(b["y"], 2);
}

#[tokio::test]
async fn test_available_resources_follow_completions() {
    let app = common::create_test_app();

    let (_, body) = get(&app, "/api/resources/available?limit=10", None).await;
    assert_eq!(body["data"]["resources"], json!(["A", "D"]));

    complete(&app, None, "A").await;
    let (_, body) = get(&app, "/api/resources/available?limit=10", None).await;
    assert_eq!(body["data"]["resources"], json!(["B", "D"]));

    let (_, body) = get(&app, "/api/resources/available?limit=1", None).await;
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn test_prerequisites_endpoint() {
    let app = common::create_test_app();

    let (status, body) = get(&app, "/api/resources/C/prerequisites", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["missing"], json!(["B"]));
    assert_eq!(body["data"]["available"], false);

    let (status, body) = get(&app, "/api/resources/Nowhere/prerequisites", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_completion_requires_prerequisites() {
    let app = common::create_test_app();
    let (status, body) = complete(&app, None, "B").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "PREREQUISITES_NOT_MET");
    assert_eq!(body["details"]["missingPrerequisites"], json!(["A"]));

    let (_, body) = get(&app, "/api/progress", None).await;
    assert_eq!(body["data"]["completedCount"], 0);
    assert_eq!(body["data"]["score"], 0);
}

#[tokio::test]
async fn test_completion_in_order_updates_score_and_achievements() {
    let app = common::create_test_app();

    let (status, body) = complete(&app, None, "A").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["score"], 10);
    assert_eq!(body["data"]["alreadyCompleted"], false);
    assert_eq!(body["data"]["newAchievements"], json!(["First Steps"]));

    let (status, body) = complete(&app, None, "B").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["score"], 20);
    assert_eq!(body["data"]["completedCount"], 2);
    assert_eq!(body["data"]["newAchievements"], json!([]));

    let (_, body) = get(&app, "/api/progress", None).await;
    assert_eq!(body["data"]["completedResources"], json!(["A", "B"]));
    assert_eq!(body["data"]["totalResources"], 4);
}

#[tokio::test]
async fn test_recompletion_keeps_score() {
    let app = common::create_test_app();
    complete(&app, None, "A").await;

    let (status, body) = post(
        &app,
        "/api/progress/complete",
        None,
        json!({ "resourceName": "A", "position": { "x": 2, "y": 3 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["alreadyCompleted"], true);
    assert_eq!(body["data"]["score"], 10);
    assert_eq!(body["data"]["position"], json!({ "x": 2, "y": 3 }));
}

#[tokio::test]
async fn test_completion_validation_errors() {
    let app = common::create_test_app();

    let (status, body) = post(&app, "/api/progress/complete", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = complete(&app, None, "Unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = common::create_test_app();
    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        app.clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/progress/complete")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap()
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_suggest_path_walks_to_next_resource() {
    let app = common::create_test_app();
    complete(&app, None, "A").await;

    let (status, body) = post(
        &app,
        "/api/path/suggest",
        None,
        json!({ "currentPosition": { "x": 0, "y": 0 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["nextResource"], "B");
    assert_eq!(data["goal"], "basics");
    assert_eq!(data["targetPosition"], json!({ "x": 3, "y": 2 }));
    assert_eq!(data["confidenceKind"], "placeholder");

    let path = data["path"].as_array().unwrap();
    let actions: Vec<&str> = path.iter().map(|s| s["action"].as_str().unwrap()).collect();
    assert_eq!(actions, vec!["RIGHT", "RIGHT", "RIGHT", "UP", "UP"]);
    let last = path.last().unwrap();
    assert_eq!((last["x"].as_u64(), last["y"].as_u64()), (Some(3), Some(2)));
    assert_eq!(path[0]["confidence"], 0.85);

    let (_, body) = get(&app, "/api/progress", None).await;
    assert_eq!(body["data"]["recentPaths"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_suggest_path_on_target_cell_is_empty() {
    let app = common::create_test_app();
    let (status, body) = post(&app, "/api/path/suggest", None, json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextResource"], "A");
    assert_eq!(body["data"]["path"], json!([]));
}

#[tokio::test]
async fn test_suggest_path_with_empty_catalog_completes() {
    let app = common::create_empty_app();
    let (status, body) = post(&app, "/api/path/suggest", None, json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["nextResource"].is_null());
    let path = body["data"]["path"].as_array().unwrap();
    assert_eq!(path.len(), 1);
    assert_eq!(path[0]["action"], "COMPLETE");
}

#[tokio::test]
async fn test_goals_list_and_switch() {
    let app = common::create_test_app();

    let (status, body) = get(&app, "/api/goals", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentGoal"], "basics");
    assert_eq!(body["data"]["goals"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/goals/current",
        None,
        Some(json!({ "goal": "review" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentGoal"], "review");

    let (_, body) = post(&app, "/api/path/suggest", None, json!({})).await;
    assert_eq!(body["data"]["nextResource"], "D");
    assert_eq!(body["data"]["goal"], "review");
}

#[tokio::test]
async fn test_unknown_goal_lists_valid_goals() {
    let app = common::create_test_app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/goals/current",
        None,
        Some(json!({ "goal": "astrology" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNKNOWN_GOAL");
    assert_eq!(body["details"]["validGoals"], json!(["basics", "review"]));
}

#[tokio::test]
async fn test_learners_are_isolated() {
    let app = common::create_test_app();
    complete(&app, Some("alice"), "A").await;

    let (_, alice) = get(&app, "/api/progress", Some("alice")).await;
    let (_, bob) = get(&app, "/api/progress", Some("bob")).await;
    assert_eq!(alice["data"]["completedCount"], 1);
    assert_eq!(bob["data"]["completedCount"], 0);

    let (status, body) = get(&app, "/api/progress", Some("bad id!")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_reset_clears_progress() {
    let app = common::create_test_app();
    complete(&app, None, "A").await;

    let (status, body) = post(&app, "/api/progress/reset", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["learnerId"], "default");
    assert_eq!(body["data"]["progress"]["completedCount"], 0);
    assert_eq!(body["data"]["progress"]["score"], 0);

    let (_, body) = get(&app, "/api/achievements", None).await;
    assert_eq!(body["data"]["unlockedCount"], 0);
}

#[tokio::test]
async fn test_master_achievement_after_whole_catalog() {
    let app = common::create_test_app();
    for name in ["A", "B", "C", "D"] {
        let (status, _) = complete(&app, None, name).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = get(&app, "/api/achievements", None).await;
    let achievements = body["data"]["achievements"].as_array().unwrap();
    let master = achievements.iter().find(|a| a["name"] == "Master").unwrap();
    assert_eq!(master["unlocked"], true);
    let expert = achievements.iter().find(|a| a["name"] == "Expert").unwrap();
    assert_eq!(expert["unlocked"], false);
}

#[tokio::test]
async fn test_activity_log_records_events() {
    let app = common::create_test_app();
    complete(&app, None, "A").await;
    post(&app, "/api/path/suggest", None, json!({})).await;

    let (status, body) = get(&app, "/api/progress/activity", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 2);
    let kinds: Vec<&str> = body["data"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["resource_completed", "path_suggested"]);
}

#[tokio::test]
async fn test_unplaced_path_resource_does_not_stall_recommendations() {
    let app = common::create_ghost_app();

    let (_, body) = post(&app, "/api/path/suggest", None, json!({})).await;
    assert_eq!(body["data"]["nextResource"], "Ghost");
    assert_eq!(body["data"]["path"][0]["action"], "UNREACHABLE");

    let (status, _) = complete(&app, None, "Ghost").await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(&app, "/api/path/suggest", None, json!({})).await;
    assert_eq!(body["data"]["nextResource"], "A");
    let actions: Vec<&str> = body["data"]["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["RIGHT", "RIGHT"]);

    let (_, body) = get(&app, "/api/progress", None).await;
    assert_eq!(body["data"]["totalResources"], 1);
    assert_eq!(body["data"]["progressPercentage"], 0.0);
}

#[tokio::test]
async fn test_read_only_requests_do_not_register_learners() {
    let app = common::create_test_app();
    for i in 0..20 {
        let learner = format!("visitor-{i}");
        for uri in [
            "/api/progress",
            "/api/progress/activity",
            "/api/achievements",
            "/api/goals",
            "/api/resources",
            "/api/resources/available",
        ] {
            let (status, _) = get(&app, uri, Some(&learner)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
    }

    let (_, body) = get(&app, "/health/info", None).await;
    assert_eq!(body["learners"], 0);
}

#[tokio::test]
async fn test_learner_registry_stays_within_capacity() {
    let app = common::create_capped_app(3);
    for i in 0..10 {
        let learner = format!("learner-{i}");
        let (status, _) = complete(&app, Some(&learner), "A").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = get(&app, "/health/info", None).await;
    assert_eq!(body["learners"], 3);
    assert_eq!(body["maxLearners"], 3);

    let (_, body) = get(&app, "/api/progress", Some("learner-9")).await;
    assert_eq!(body["data"]["completedCount"], 1);
    let (_, body) = get(&app, "/api/progress", Some("learner-0")).await;
    assert_eq!(body["data"]["completedCount"], 0);
}

#[tokio::test]
async fn test_recent_paths_are_bounded() {
    let app = common::create_test_app();
    for _ in 0..12 {
        post(&app, "/api/path/suggest", None, json!({})).await;
    }

    let (_, body) = get(&app, "/api/progress", None).await;
    assert_eq!(body["data"]["recentPaths"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["pathsGenerated"], 12);
}

#[tokio::test]
async fn test_session_start_and_end() {
    let app = common::create_test_app();

    let (_, body) = get(&app, "/api/progress", Some("sam")).await;
    assert_eq!(body["data"]["sessionCount"], 1);

    let (status, body) = post(&app, "/api/progress/session/start", Some("sam"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ended"]["number"], 1);
    assert_eq!(body["data"]["started"]["number"], 2);
    assert_eq!(body["data"]["sessionCount"], 2);

    complete(&app, Some("sam"), "A").await;

    let (status, body) = post(&app, "/api/progress/session/end", Some("sam"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["session"]["number"], 2);
    assert_eq!(body["data"]["session"]["resourcesCompleted"], 1);
    assert!(body["data"]["session"]["endedAt"].is_string());
    assert!(body["data"]["totalTimeSpent"].as_f64().unwrap() >= 0.0);

    let (status, body) = post(&app, "/api/progress/session/end", Some("sam"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NO_ACTIVE_SESSION");

    let (_, body) = get(&app, "/api/progress", Some("sam")).await;
    assert!(body["data"]["sessionStartedAt"].is_null());
    assert_eq!(body["data"]["sessionCount"], 2);
}

#[tokio::test]
async fn test_non_numeric_limit_is_json_validation_error() {
    let app = common::create_test_app();

    let (status, body) = get(&app, "/api/resources/available?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = get(&app, "/api/resources/available?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/api/resources/available?limit=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}
