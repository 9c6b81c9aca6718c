//! `HttpBackend` against an in-process axum server.

mod common;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use common::*;
use workboard::board::{BoardBackend, BoardSession, Completion, DropEvent, HttpBackend};
use workboard::errors::BoardError;

const TOKEN: &str = "t0k";

async fn list_workflows(headers: HeaderMap) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"title": "Unauthorized"})),
        )
            .into_response();
    }
    Json(vec![workflow()]).into_response()
}

async fn list_jobs(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("workflowId").map(String::as_str) {
        Some("1") => Json(vec![job(1, INTAKE), job(2, REVIEW)]).into_response(),
        Some("500") => (StatusCode::BAD_GATEWAY, "upstream down").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn set_stage(Path((job_id, stage_id)): Path<(i64, i64)>) -> Response {
    if stage_id == DONE {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "Job has open tasks"})),
        )
            .into_response();
    }
    let mut updated = job(job_id, stage_id);
    updated.updated_at = Some("2024-06-01T10:00:00Z".to_string());
    updated.completed_task_count = Some(1);
    Json(updated).into_response()
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/api/workflows", get(list_workflows))
        .route("/api/jobs", get(list_jobs))
        .route("/api/job/{id}/stage/{stage_id}", patch(set_stage));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, token: Option<&str>) -> HttpBackend {
    HttpBackend::new(
        &format!("http://{}/api/", addr),
        token.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_list_workflows_with_token() {
    let addr = spawn_server().await;
    let workflows = client(addr, Some(TOKEN)).list_workflows().await.unwrap();
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0].stages.len(), 3);
}

#[tokio::test]
async fn test_list_workflows_unauthorized_is_other_error() {
    let addr = spawn_server().await;
    let err = client(addr, None).list_workflows().await.unwrap_err();
    match err {
        BoardError::Other(e) => assert!(e.to_string().contains("Unauthorized")),
        other => panic!("Expected Other, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_jobs_by_workflow() {
    let addr = spawn_server().await;
    let jobs = client(addr, None).list_jobs(1).await.unwrap();
    let ids: Vec<i64> = jobs.iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(jobs[0].contact_name, "Client 1");
}

#[tokio::test]
async fn test_list_jobs_not_found_and_server_error() {
    let addr = spawn_server().await;
    let backend = client(addr, None);
    assert!(matches!(
        backend.list_jobs(9).await,
        Err(BoardError::NotFound { .. })
    ));
    assert!(matches!(
        backend.list_jobs(500).await,
        Err(BoardError::RemoteUnavailable(_))
    ));
}

#[tokio::test]
async fn test_set_job_stage_returns_server_record() {
    let addr = spawn_server().await;
    let updated = client(addr, None).set_job_stage(1, REVIEW).await.unwrap();
    assert_eq!(updated.current_stage_id, REVIEW);
    assert_eq!(updated.updated_at.as_deref(), Some("2024-06-01T10:00:00Z"));
}

#[tokio::test]
async fn test_set_job_stage_conflict_carries_reason() {
    let addr = spawn_server().await;
    let err = client(addr, None).set_job_stage(1, DONE).await.unwrap_err();
    match err {
        BoardError::StageUpdateRejected {
            job_id,
            stage_id,
            reason,
        } => {
            assert_eq!(job_id, 1);
            assert_eq!(stage_id, DONE);
            assert_eq!(reason, "Job has open tasks");
        }
        other => panic!("Expected StageUpdateRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_remote_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr, None).list_workflows().await.unwrap_err();
    assert!(matches!(err, BoardError::RemoteUnavailable(_)));
}

#[tokio::test]
async fn test_session_over_http_confirms_and_rolls_back() {
    let addr = spawn_server().await;
    let mut session = BoardSession::new(Arc::new(client(addr, Some(TOKEN))));
    session.open_workflow(WORKFLOW).await.unwrap();

    session
        .on_drop(DropEvent {
            job_id: 1,
            source_stage: INTAKE,
            source_index: 0,
            dest_stage: REVIEW,
            dest_index: 1,
        })
        .unwrap();
    assert!(matches!(
        session.next_completion().await.unwrap(),
        Completion::Confirmed { .. }
    ));
    assert_eq!(session.buckets().bucket(REVIEW).unwrap(), &[2, 1]);
    assert_eq!(session.job(1).unwrap().completed_task_count, Some(1));

    session
        .on_drop(DropEvent {
            job_id: 2,
            source_stage: REVIEW,
            source_index: 0,
            dest_stage: DONE,
            dest_index: 0,
        })
        .unwrap();
    assert!(matches!(
        session.next_completion().await.unwrap(),
        Completion::RolledBack { .. }
    ));
    assert_eq!(session.buckets().bucket(REVIEW).unwrap(), &[2, 1]);
    assert!(session.buckets().bucket(DONE).unwrap().is_empty());
}
