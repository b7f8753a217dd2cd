mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{StatusCode, header};
use serde_json::{Value, json};
use uuid::Uuid;

use common::{TestApp, app, body_json, body_text, delete, get, mint_token, post_json};
use kiln_generate::{GenerateError, Generator};
use kiln_types::api::{ChatRequest, ChatResponse};

struct Offline;

#[async_trait]
impl Generator for Offline {
    async fn generate(&self, _req: &ChatRequest) -> Result<ChatResponse, GenerateError> {
        Err(GenerateError::Network("connection refused".into()))
    }
}

async fn project_and_thread(app: &TestApp, token: &str) -> (String, String) {
    let resp = app
        .send(post_json("/api/projects", Some(token), json!({ "name": "  Landing page " })))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let project = body_json(resp).await;
    assert_eq!(project["name"], "Landing page");
    let project_id = project["id"].as_str().unwrap().to_string();

    let resp = app
        .send(post_json(
            &format!("/api/projects/{project_id}/threads"),
            Some(token),
            json!({ "title": "Hero section" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let thread = body_json(resp).await;
    (project_id, thread["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn projects_are_listed_per_owner() {
    let app = app().build();
    let alice = mint_token(Uuid::new_v4(), "alice@example.com");
    let bob = mint_token(Uuid::new_v4(), "bob@example.com");

    project_and_thread(&app, &alice).await;

    let resp = app.send(get("/api/projects", Some(&alice))).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

    let resp = app.send(get("/api/projects", Some(&bob))).await;
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let app = app().build();
    let token = mint_token(Uuid::new_v4(), "a@example.com");

    let resp = app
        .send(post_json("/api/projects", Some(&token), json!({ "name": "   " })))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Project name must not be empty");
}

#[tokio::test]
async fn foreign_resources_answer_not_found() {
    let app = app().build();
    let alice = mint_token(Uuid::new_v4(), "alice@example.com");
    let bob = mint_token(Uuid::new_v4(), "bob@example.com");
    let (project_id, thread_id) = project_and_thread(&app, &alice).await;

    let resp = app.send(get(&format!("/api/threads/{thread_id}/messages"), Some(&bob))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .send(post_json(
            &format!("/api/threads/{thread_id}/messages"),
            Some(&bob),
            json!({ "content": "hi" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.send(delete(&format!("/api/projects/{project_id}"), &bob)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.send(get(&format!("/api/projects/{project_id}/threads"), Some(&alice))).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sending_records_both_turns_and_code() {
    let app = app().build();
    let token = mint_token(Uuid::new_v4(), "a@example.com");
    let (_, thread_id) = project_and_thread(&app, &token).await;

    let resp = app
        .send(post_json(
            &format!("/api/threads/{thread_id}/messages"),
            Some(&token),
            json!({ "content": "Build me an analytics dashboard" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["metadata"]["model"], "fallback-system");
    assert_eq!(body["code"][0]["file_path"], "dashboard.tsx");
    assert_eq!(body["code"][0]["message_id"], messages[1]["id"]);

    let resp = app.send(get(&format!("/api/threads/{thread_id}/messages"), Some(&token))).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);

    let resp = app.send(get(&format!("/api/threads/{thread_id}/code"), Some(&token))).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_message_is_a_bad_request() {
    let app = app().build();
    let token = mint_token(Uuid::new_v4(), "a@example.com");
    let (_, thread_id) = project_and_thread(&app, &token).await;

    let resp = app
        .send(post_json(
            &format!("/api/threads/{thread_id}/messages"),
            Some(&token),
            json!({ "content": "  \n " }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn network_failure_becomes_one_assistant_message() {
    let app = app().generator(Arc::new(Offline)).build();
    let token = mint_token(Uuid::new_v4(), "a@example.com");
    let (_, thread_id) = project_and_thread(&app, &token).await;

    let resp = app
        .send(post_json(
            &format!("/api/threads/{thread_id}/messages"),
            Some(&token),
            json!({ "content": "hello" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], json!([]));

    let resp = app.send(get(&format!("/api/threads/{thread_id}/messages"), Some(&token))).await;
    let stored = body_json(resp).await;
    let errors: Vec<&Value> = stored
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["metadata"]["networkError"] == json!(true))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["metadata"]["error"], true);
    assert!(errors[0]["content"].as_str().unwrap().starts_with("❌ Network error"));

    assert!(!app.state.chat.is_loading(Uuid::parse_str(&thread_id).unwrap()));
}

#[tokio::test]
async fn preview_frame_and_export() {
    let app = app().build();
    let token = mint_token(Uuid::new_v4(), "a@example.com");
    let (_, thread_id) = project_and_thread(&app, &token).await;

    let resp = app
        .send(post_json(
            &format!("/api/threads/{thread_id}/messages"),
            Some(&token),
            json!({ "content": "a login screen" }),
        ))
        .await;
    let body = body_json(resp).await;
    let code_id = body["code"][0]["id"].as_str().unwrap().to_string();

    let resp = app.send(get(&format!("/api/code/{code_id}/preview"), Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_SECURITY_POLICY],
        "sandbox allow-scripts"
    );
    let html = body_text(resp).await;
    assert!(html.contains("root.render(React.createElement(LoginForm));"));
    assert!(!html.contains("@/components/ui"));

    let resp = app.send(get(&format!("/api/code/{code_id}/frame"), Some(&token))).await;
    let frame = body_text(resp).await;
    assert!(frame.starts_with("<iframe"));
    assert!(frame.contains(r#"sandbox="allow-scripts""#));

    let other = mint_token(Uuid::new_v4(), "b@example.com");
    let resp = app.send(get(&format!("/api/code/{code_id}/preview"), Some(&other))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .send(get(&format!("/api/threads/{thread_id}/code/export"), Some(&token)))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"generated-code-{thread_id}.txt\"").as_str()
    );
    let text = body_text(resp).await;
    assert!(text.starts_with("// login-form.tsx\n"));
}

#[tokio::test]
async fn deleting_a_project_removes_its_threads() {
    let app = app().build();
    let token = mint_token(Uuid::new_v4(), "a@example.com");
    let (project_id, thread_id) = project_and_thread(&app, &token).await;

    let resp = app.send(delete(&format!("/api/projects/{project_id}"), &token)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.send(get(&format!("/api/threads/{thread_id}/messages"), Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
