//! Integration coverage for the fetch pipelines against a mocked upstream,
//! plus (behind `--ignored`) the PostgreSQL persistence cycle.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::Extension;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use diesel::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use projects_ingestion::config::{RepoTarget, RunTargets};
use projects_ingestion::db::issue::models::{GithubIssueRow, NewGithubIssue};
use projects_ingestion::db::issue::queries::{insert_github_issue, reset_github_issues};
use projects_ingestion::db::post::models::SoPostRow;
use projects_ingestion::db::schema::{github_issues, so_posts};
use projects_ingestion::db::{self, PgPool};
use projects_ingestion::endpoints::github::index::handler as github_handler;
use projects_ingestion::endpoints::metrics::index::handler as metrics_handler;
use projects_ingestion::endpoints::stackoverflow::index::handler as stackoverflow_handler;
use projects_ingestion::extract::ExtractError;
use projects_ingestion::ingest::github::{fetch_repo_issues, FetchRepoIssuesError};
use projects_ingestion::ingest::stackexchange::{
    fetch_recent_questions, FetchRecentQuestionsError, NO_BODY,
};
use projects_ingestion::run::run_ingestion;
use utils_metrics::ApiCallMetrics;

/// Serializes the tests that drop and recreate the shared tables.
static DB_LOCK: Mutex<()> = Mutex::new(());

fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("set TEST_DATABASE_URL or DATABASE_URL to run the database tests");

    db::build_pool(&url).expect("connection pool")
}

async fn mount_issue_pages(server: &MockServer, owner: &str, name: &str) {
    let issues_path = format!("/repos/{owner}/{name}/issues");

    let first_page = json!([
        {"title": "first", "number": 1,
         "created_at": "2024-01-01T00:00:00Z", "closed_at": null},
        {"title": "second", "number": 2,
         "created_at": "2024-01-02T00:00:00Z", "closed_at": "2024-01-03T00:00:00Z"}
    ]);
    let second_page = json!([
        {"title": "third", "number": 3,
         "created_at": "2024-01-04T00:00:00Z", "closed_at": null}
    ]);

    let next_link = format!("<{}{}?page=2>; rel=\"next\"", server.uri(), issues_path);

    Mock::given(method("GET"))
        .and(path(issues_path.clone()))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(first_page)
                .insert_header("Link", next_link.as_str()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(issues_path))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(second_page))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn issue_paging_concatenates_pages_in_order() -> Result<()> {
    let server = MockServer::start().await;
    mount_issue_pages(&server, "golang", "go").await;

    let metrics = ApiCallMetrics::new();
    let issues = fetch_repo_issues(&server.uri(), "token", "golang", "go", &metrics).await?;

    assert_eq!(issues.len(), 3);
    assert_eq!(issues[0].title, "first");
    assert_eq!(issues[1].number, 2);
    assert_eq!(issues[2].title, "third");
    assert!(issues.iter().all(|issue| issue.repo == "go"));
    assert_eq!(metrics.snapshot().github_api_calls, 1);

    Ok(())
}

#[tokio::test]
async fn issue_fetch_handles_an_empty_repository() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/golang/go/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let issues = fetch_repo_issues(&server.uri(), "token", "golang", "go", &metrics).await?;

    assert!(issues.is_empty());
    assert_eq!(metrics.snapshot().github_api_calls, 1);

    Ok(())
}

#[tokio::test]
async fn issue_fetch_reports_non_success_statuses() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/golang/go/issues"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let outcome = fetch_repo_issues(&server.uri(), "token", "golang", "go", &metrics).await;

    assert!(matches!(
        outcome,
        Err(FetchRepoIssuesError::UpstreamStatus { .. })
    ));
    assert_eq!(metrics.snapshot().github_api_calls, 0);

    Ok(())
}

#[tokio::test]
async fn issue_fetch_reports_undecodable_bodies() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/golang/go/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let outcome = fetch_repo_issues(&server.uri(), "token", "golang", "go", &metrics).await;

    assert!(matches!(
        outcome,
        Err(FetchRepoIssuesError::DecodeIssuesPage { .. })
    ));
    assert_eq!(metrics.snapshot().github_api_calls, 0);

    Ok(())
}

#[tokio::test]
async fn api_call_counters_track_successful_fetches() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/golang/go/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();

    for _ in 0..3 {
        fetch_repo_issues(&server.uri(), "token", "golang", "go", &metrics).await?;
    }
    assert_eq!(metrics.snapshot().github_api_calls, 3);
    assert_eq!(metrics.snapshot().stackoverflow_api_calls, 0);

    for _ in 0..2 {
        fetch_recent_questions(&server.uri(), "Go", &metrics).await?;
    }
    assert_eq!(metrics.snapshot().github_api_calls, 3);
    assert_eq!(metrics.snapshot().stackoverflow_api_calls, 2);

    Ok(())
}

#[tokio::test]
async fn question_fetch_normalizes_items_through_the_field_policy() -> Result<()> {
    let server = MockServer::start().await;

    let response = json!({
        "items": [
            {
                "title": "foo",
                "creation_date": 1_700_000_000,
                "answers": [{"body": "bar"}]
            }
        ],
        "has_more": false,
        "quota_remaining": 299
    });

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("tagged", "Go"))
        .and(query_param("site", "stackoverflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let questions = fetch_recent_questions(&server.uri(), "Go", &metrics).await?;

    assert_eq!(questions.len(), 1);
    let question = &questions[0];
    assert_eq!(question.title, "foo");
    assert_eq!(question.body, NO_BODY);
    assert_eq!(question.technology, "Go");
    assert_eq!(question.created_at.unwrap().timestamp(), 1_700_000_000);
    assert!(question.closed_at.is_none());
    assert_eq!(question.answers.len(), 1);
    assert_eq!(question.answers[0].body, "bar");
    assert_eq!(metrics.snapshot().stackoverflow_api_calls, 1);

    Ok(())
}

#[tokio::test]
async fn question_without_title_fails_the_fetch() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [{"body": "only a body"}]})),
        )
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let outcome = fetch_recent_questions(&server.uri(), "Go", &metrics).await;

    assert!(matches!(
        outcome,
        Err(FetchRecentQuestionsError::ExtractQuestion { .. })
    ));
    assert_eq!(metrics.snapshot().stackoverflow_api_calls, 0);

    Ok(())
}

#[tokio::test]
async fn question_fetch_reports_non_success_statuses() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let outcome = fetch_recent_questions(&server.uri(), "Go", &metrics).await;

    assert!(matches!(
        outcome,
        Err(FetchRecentQuestionsError::UpstreamStatus { .. })
    ));
    assert_eq!(metrics.snapshot().stackoverflow_api_calls, 0);

    Ok(())
}

#[tokio::test]
async fn question_fetch_reports_undecodable_bodies() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Temporarily unavailable"))
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let outcome = fetch_recent_questions(&server.uri(), "Go", &metrics).await;

    assert!(matches!(
        outcome,
        Err(FetchRecentQuestionsError::DecodeQuestions { .. })
    ));
    assert_eq!(metrics.snapshot().stackoverflow_api_calls, 0);

    Ok(())
}

#[tokio::test]
async fn question_fetch_requires_the_items_sequence() -> Result<()> {
    let server = MockServer::start().await;

    // The upstream reports its own failures as a JSON document without
    // `items`.
    let error_document = json!({
        "error_id": 502,
        "error_name": "throttle_violation",
        "error_message": "too many requests from this IP"
    });

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_document))
        .mount(&server)
        .await;

    let metrics = ApiCallMetrics::new();
    let outcome = fetch_recent_questions(&server.uri(), "Go", &metrics).await;

    assert!(matches!(
        outcome,
        Err(FetchRecentQuestionsError::ExtractQuestion {
            source: ExtractError::MissingField { field: "items" }
        })
    ));
    assert_eq!(metrics.snapshot().stackoverflow_api_calls, 0);

    Ok(())
}

#[tokio::test]
async fn placeholder_and_metrics_endpoints_respond() -> Result<()> {
    let response = github_handler().await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"GitHub functionality");

    let response = stackoverflow_handler().await.into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"StackOverflow functionality");

    let metrics = Arc::new(ApiCallMetrics::new());
    metrics.record_github_call();

    let response = metrics_handler(Extension(metrics)).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str()?.to_string();
    assert_eq!(content_type, "text/plain; version=0.0.4");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let exposition = std::str::from_utf8(&bytes)?;
    assert!(exposition.contains("github_api_calls_total 1"));
    assert!(exposition.contains("stackoverflow_api_calls_total 0"));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn reset_is_idempotent_and_leaves_an_empty_table() -> Result<()> {
    let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let pool = test_pool();
    let mut conn = pool.get()?;

    reset_github_issues(&mut conn)?;
    insert_github_issue(
        &mut conn,
        &NewGithubIssue {
            title: "left over",
            issue_number: 1,
            created_at: None,
            closed_at: None,
            repo: "go",
        },
    )?;

    reset_github_issues(&mut conn)?;
    reset_github_issues(&mut conn)?;

    let remaining: i64 = github_issues::table.count().get_result(&mut conn)?;
    assert_eq!(remaining, 0);

    // The schema survives the double reset: a full-width insert still works.
    let stored = insert_github_issue(
        &mut conn,
        &NewGithubIssue {
            title: "fresh",
            issue_number: 2,
            created_at: Some(chrono::Utc::now()),
            closed_at: None,
            repo: "go",
        },
    )?;
    assert_eq!(stored.title, "fresh");
    assert!(stored.created_at.is_some());
    assert!(stored.closed_at.is_none());

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn issue_run_stores_the_union_of_all_pages() -> Result<()> {
    let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let pool = test_pool();
    let server = MockServer::start().await;
    mount_issue_pages(&server, "golang", "go").await;

    let targets = RunTargets {
        repos: vec![RepoTarget {
            owner: "golang".to_string(),
            name: "go".to_string(),
        }],
        technologies: vec![],
    };
    let metrics = ApiCallMetrics::new();

    let report = run_ingestion(
        &pool,
        &targets,
        &metrics,
        "token",
        &server.uri(),
        &server.uri(),
    )
    .await?;

    assert_eq!(report.issues_stored, 3);
    assert_eq!(report.questions_stored, 0);
    assert_eq!(metrics.snapshot().github_api_calls, 1);

    let mut conn = pool.get()?;
    let rows: Vec<GithubIssueRow> = github_issues::table
        .order(github_issues::id.asc())
        .load(&mut conn)?;

    let titles: Vec<&str> = rows.iter().map(|row| row.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert!(rows.iter().all(|row| row.repo == "go"));
    assert!(rows[0].closed_at.is_none());
    assert!(rows[1].closed_at.is_some());

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn question_run_stores_the_normalized_row() -> Result<()> {
    let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let pool = test_pool();
    let server = MockServer::start().await;

    let response = json!({
        "items": [
            {
                "title": "foo",
                "creation_date": 1_700_000_000,
                "answers": [{"body": "bar"}]
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("tagged", "Go"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let targets = RunTargets {
        repos: vec![],
        technologies: vec!["Go".to_string()],
    };
    let metrics = ApiCallMetrics::new();

    let report = run_ingestion(
        &pool,
        &targets,
        &metrics,
        "token",
        &server.uri(),
        &server.uri(),
    )
    .await?;

    assert_eq!(report.questions_stored, 1);

    let mut conn = pool.get()?;
    let rows: Vec<SoPostRow> = so_posts::table.load(&mut conn)?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "foo");
    assert_eq!(rows[0].body, "No Body");
    assert_eq!(rows[0].technology, "Go");
    assert_eq!(rows[0].created_at.unwrap().timestamp(), 1_700_000_000);
    assert!(rows[0].closed_at.is_none());

    // Answers ride along on the in-memory record; they are not persisted.
    let questions = fetch_recent_questions(&server.uri(), "Go", &metrics).await?;
    assert_eq!(questions[0].answers[0].body, "bar");

    Ok(())
}
