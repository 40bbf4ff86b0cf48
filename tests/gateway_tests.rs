/// HTTP contract tests for the gateway client.
///
/// Each test runs an in-process `tiny_http` server that plays the service,
/// then drives `GatewayClient` against it and inspects what went over the
/// wire.
mod common;

use std::collections::BTreeMap;

use daec::api::{ApiError, Credentials, ExpressionStatus, Gateway, GatewayClient, Id};
use daec::config::schema::ApiConfig;
use daec::session::{FileStorage, MemoryStorage, SessionContext};

use common::TestServer;

fn client_for(server: &TestServer) -> GatewayClient {
    GatewayClient::from_config(&ApiConfig {
        base_url: server.base_url.clone(),
        timeout_ms: 5_000,
    })
}

// ---------------------------------------------------------------------------
// Authorization header
// ---------------------------------------------------------------------------

#[test]
fn login_persists_token_and_later_calls_carry_it() {
    let server = TestServer::start(|req| match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/v1/login") => (200, r#"{"token":"jwt-123"}"#.to_string()),
        ("GET", "/v1/operations") => (
            200,
            r#"[{"operation_id":1,"operation_type":"+","execution_time":5,"user_id":1}]"#
                .to_string(),
        ),
        _ => (404, r#"{"error":"not found"}"#.to_string()),
    });
    let client = client_for(&server);
    let storage = MemoryStorage::new();
    let mut session = SessionContext::new(Box::new(storage.clone()));

    let token = client
        .login(&mut session, &Credentials::new("a@b.com", "x"))
        .unwrap();
    assert_eq!(token.as_str(), "jwt-123");
    assert_eq!(storage.snapshot().unwrap().token, Some(token.clone()));

    let ops = client.list_operations(&session).unwrap();
    assert_eq!(ops[0].operation_type, "+");

    let requests = server.requests();
    assert_eq!(requests[0].authorization, None);
    assert_eq!(
        requests[0].body,
        r#"{"email":"a@b.com","password":"x"}"#
    );
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer jwt-123"));
}

#[test]
fn token_survives_reload_into_new_context() {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/v1/login" => (200, r#"{"token":"abc"}"#.to_string()),
        _ => (200, "[]".to_string()),
    });
    let client = client_for(&server);
    let storage = MemoryStorage::new();
    {
        let mut session = SessionContext::new(Box::new(storage.clone()));
        client
            .login(&mut session, &Credentials::new("a@b.com", "x"))
            .unwrap();
    }

    let session = SessionContext::new(Box::new(storage));
    client.list_agents(&session).unwrap();
    let requests = server.requests();
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer abc"));
}

#[test]
fn token_in_session_file_survives_restart() {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/v1/login" => (200, r#"{"token":"file-token"}"#.to_string()),
        _ => (200, "[]".to_string()),
    });
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions").join("default.json");

    {
        let mut session = SessionContext::new(Box::new(FileStorage::new(&path)));
        client
            .login(&mut session, &Credentials::new("a@b.com", "x"))
            .unwrap();
    }
    assert!(path.exists());

    let session = SessionContext::new(Box::new(FileStorage::new(&path)));
    client.list_expressions(&session).unwrap();
    let requests = server.requests();
    assert_eq!(requests[1].path, "/v1/expressions");
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer file-token"));
}

#[test]
fn read_only_calls_work_without_token() {
    let server = TestServer::start(|_| {
        (
            200,
            r#"[{"agent_id":1,"number_of_parallel_calculations":5,
                 "last_ping":"2024-03-01T10:00:00Z","status":"waiting",
                 "created_at":"2024-03-01T09:00:00Z",
                 "number_of_active_calculations":0}]"#
                .to_string(),
        )
    });
    let client = client_for(&server);
    let agents = client.list_agents(&SessionContext::in_memory()).unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(server.requests()[0].authorization, None);
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[test]
fn create_expression_posts_data_field() {
    let server = TestServer::start(|_| {
        (
            201,
            r#"{"expression_id":9,"user_id":1,"agent_id":{"Int32":0,"Valid":false},
                "created_at":"2024-03-01T10:00:00Z","updated_at":"2024-03-01T10:00:00Z",
                "data":"2+2","parse_data":"2 2 +","status":"ready_for_computation",
                "result":0,"is_ready":false}"#
                .to_string(),
        )
    });
    let client = client_for(&server);
    let expr = client
        .create_expression(&SessionContext::in_memory(), "2+2")
        .unwrap();

    assert_eq!(expr.id, Id::new("9"));
    assert_eq!(expr.status, ExpressionStatus::ReadyForComputation);
    assert!(!expr.is_ready);

    let req = &server.requests()[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/v1/expressions");
    assert_eq!(req.body, r#"{"data":"2+2"}"#);
}

#[test]
fn update_operation_patches_type_and_time() {
    let server = TestServer::start(|_| {
        (
            200,
            r#"{"operation_id":2,"operation_type":"*","execution_time":7,"user_id":1}"#
                .to_string(),
        )
    });
    let client = client_for(&server);
    let op = client
        .update_operation(&SessionContext::in_memory(), "*", 7)
        .unwrap();
    assert_eq!(op.execution_time, 7);

    let req = &server.requests()[0];
    assert_eq!(req.method, "PATCH");
    assert_eq!(req.path, "/v1/operations");
    assert_eq!(req.body, r#"{"operation_type":"*","execution_time":7}"#);
}

#[test]
fn register_returns_user_id() {
    let server = TestServer::start(|_| (200, r#"{"user_id":42}"#.to_string()));
    let client = client_for(&server);
    let session = SessionContext::in_memory();
    let id = client
        .register(&session, &Credentials::new("new@b.com", "pw"))
        .unwrap();
    assert_eq!(id, Id::new("42"));
    // Registration never authenticates.
    assert!(session.get_token().is_none());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn validation_error_carries_service_message_verbatim() {
    let server = TestServer::start(|_| (400, r#"{"error":"parse error"}"#.to_string()));
    let client = client_for(&server);
    let err = client
        .create_expression(&SessionContext::in_memory(), "bad+")
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation { status: 400, .. }));
    assert_eq!(err.message(), "parse error");
}

#[test]
fn forbidden_is_an_auth_error() {
    let server = TestServer::start(|_| (403, r#"{"error":"Status Forbidden"}"#.to_string()));
    let client = client_for(&server);
    let err = client
        .list_expressions(&SessionContext::in_memory())
        .unwrap_err();
    assert!(err.is_auth());
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.message(), "Status Forbidden");
}

#[test]
fn non_json_error_body_is_surfaced_raw() {
    let server = TestServer::start(|_| (502, "upstream unavailable".to_string()));
    let client = client_for(&server);
    let err = client.list_agents(&SessionContext::in_memory()).unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 502, .. }));
    assert_eq!(err.message(), "upstream unavailable");
}

#[test]
fn unknown_status_is_a_decode_error() {
    let server = TestServer::start(|_| {
        (
            200,
            r#"[{"agent_id":1,"number_of_parallel_calculations":5,
                 "last_ping":"2024-03-01T10:00:00Z","status":"hibernating",
                 "created_at":"2024-03-01T09:00:00Z"}]"#
                .to_string(),
        )
    });
    let client = client_for(&server);
    let err = client.list_agents(&SessionContext::in_memory()).unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn unreachable_service_is_a_transport_error() {
    // Bind and immediately drop a server to get a port nobody listens on.
    let port = {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        server.server_addr().to_ip().unwrap().port()
    };
    let client = GatewayClient::from_config(&ApiConfig {
        base_url: format!("http://127.0.0.1:{port}/v1"),
        timeout_ms: 2_000,
    });
    let err = client
        .list_expressions(&SessionContext::in_memory())
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[test]
fn failed_login_leaves_session_untouched() {
    let server = TestServer::start(|_| {
        (
            400,
            r#"{"error":"can't login user: invalid credentials"}"#.to_string(),
        )
    });
    let client = client_for(&server);
    let mut session = SessionContext::in_memory();
    let err = client
        .login(&mut session, &Credentials::new("a@b.com", "wrong"))
        .unwrap_err();
    assert_eq!(err.message(), "can't login user: invalid credentials");
    assert!(session.get_token().is_none());
}

// ---------------------------------------------------------------------------
// Round trip against a stateful service
// ---------------------------------------------------------------------------

#[test]
fn update_then_list_shows_new_cost() {
    let mut costs: BTreeMap<String, u64> = [("+", 1), ("-", 1), ("*", 2), ("/", 2)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    let server = TestServer::start(move |req| match req.method.as_str() {
        "PATCH" => {
            let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
            let kind = body["operation_type"].as_str().unwrap().to_string();
            let time = body["execution_time"].as_u64().unwrap();
            costs.insert(kind.clone(), time);
            (
                200,
                serde_json::json!({
                    "operation_id": 1, "operation_type": kind,
                    "execution_time": time, "user_id": 1
                })
                .to_string(),
            )
        }
        _ => {
            let list: Vec<_> = costs
                .iter()
                .enumerate()
                .map(|(i, (kind, time))| {
                    serde_json::json!({
                        "operation_id": i, "operation_type": kind,
                        "execution_time": time, "user_id": 1
                    })
                })
                .collect();
            (200, serde_json::Value::from(list).to_string())
        }
    });

    let client = client_for(&server);
    let session = SessionContext::in_memory();
    client.update_operation(&session, "/", 9).unwrap();
    let ops = client.list_operations(&session).unwrap();
    let div = ops.iter().find(|o| o.operation_type == "/").unwrap();
    assert_eq!(div.execution_time, 9);
}
