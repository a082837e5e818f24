use assert_matches::assert_matches;
use fedmcp_identity::{ArtifactSigner, ArtifactVerifier, KeyMaterial, LocalSigner};
use fedmcp_transport::{ArtifactTransport, HttpArtifactTransport};
use fedmcp_types::{Artifact, TransportError};
use httpmock::{Method::GET, Method::POST, MockServer};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const WORKSPACE: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

fn signed_policy() -> (Arc<KeyMaterial>, Artifact, fedmcp_identity::SignatureToken) {
    let key = Arc::new(KeyMaterial::generate());
    let artifact = Artifact::new("policy", WORKSPACE, json!({"rule": "deny-all"})).unwrap();
    let token = LocalSigner::new(key.clone()).sign(&artifact).unwrap();
    (key, artifact, token)
}

#[tokio::test]
async fn test_push_posts_artifact_and_token() {
    let server = MockServer::start();
    let (_, artifact, token) = signed_policy();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/workspaces/{WORKSPACE}/artifacts"))
            .header("x-workspace-id", WORKSPACE)
            .header("content-type", "application/json")
            .json_body_partial(json!({ "jws": token.as_str() }).to_string());
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({
                "artifactId": artifact.id().to_string(),
                "storedAt": "2024-05-01T12:00:00Z"
            }));
    });

    let transport = HttpArtifactTransport::new(&server.base_url()).unwrap();
    let ack = transport.push(&artifact, &token).await.unwrap();

    mock.assert();
    assert_eq!(ack.artifact_id, artifact.id());
    assert_eq!(ack.stored_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
}

#[tokio::test]
async fn test_push_sends_bearer_token_when_configured() {
    let server = MockServer::start();
    let (_, artifact, token) = signed_policy();

    let mock = server.mock(|when, then| {
        when.method(POST).header("authorization", "Bearer secret-key");
        then.status(200).json_body(json!({
            "artifact_id": artifact.id().to_string(),
            "stored_at": "2024-05-01T12:00:00Z"
        }));
    });

    let transport = HttpArtifactTransport::new(&server.base_url())
        .unwrap()
        .with_api_key("secret-key");
    let ack = transport.push(&artifact, &token).await.unwrap();

    mock.assert();
    assert_eq!(ack.artifact_id, artifact.id());
}

#[tokio::test]
async fn test_push_rejection_carries_reason() {
    let server = MockServer::start();
    let (_, artifact, token) = signed_policy();

    server.mock(|when, then| {
        when.method(POST);
        then.status(422).json_body(json!({
            "error": "invalid_signature",
            "message": "signature does not verify against registered key"
        }));
    });

    let transport = HttpArtifactTransport::new(&server.base_url()).unwrap();
    let err = transport.push(&artifact, &token).await.unwrap_err();
    assert_matches!(
        err,
        TransportError::Rejected { status: 422, ref reason, .. } if reason == "invalid_signature"
    );
}

#[tokio::test]
async fn test_push_server_error_without_json() {
    let server = MockServer::start();
    let (_, artifact, token) = signed_policy();

    server.mock(|when, then| {
        when.method(POST);
        then.status(500).body("Internal Server Error from mock");
    });

    let transport = HttpArtifactTransport::new(&server.base_url()).unwrap();
    let err = transport.push(&artifact, &token).await.unwrap_err();
    assert_matches!(
        err,
        TransportError::Rejected { status: 500, ref reason, ref message }
            if reason == "unknown" && message.contains("Internal Server Error")
    );
}

#[tokio::test]
async fn test_push_bad_success_body_is_invalid_response() {
    let server = MockServer::start();
    let (_, artifact, token) = signed_policy();

    server.mock(|when, then| {
        when.method(POST);
        then.status(200).body("ok");
    });

    let transport = HttpArtifactTransport::new(&server.base_url()).unwrap();
    assert_matches!(
        transport.push(&artifact, &token).await,
        Err(TransportError::InvalidResponse { .. })
    );
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    let (_, artifact, token) = signed_policy();
    let transport =
        HttpArtifactTransport::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    assert_matches!(
        transport.push(&artifact, &token).await,
        Err(TransportError::Request { .. })
    );
}

#[tokio::test]
async fn test_fetch_returns_verifiable_artifact() {
    let server = MockServer::start();
    let (key, artifact, token) = signed_policy();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/workspaces/{WORKSPACE}/artifacts/{}", artifact.id()))
            .header("x-workspace-id", WORKSPACE);
        then.status(200).json_body(json!({
            "artifact": serde_json::to_value(&artifact).unwrap(),
            "jws": token.as_str()
        }));
    });

    let transport = HttpArtifactTransport::new(&server.base_url()).unwrap();
    let stored = transport.fetch(artifact.workspace_id(), artifact.id()).await.unwrap();
    mock.assert();

    assert_eq!(stored.artifact, artifact);
    let jws = stored.jws.expect("stored token");
    assert!(ArtifactVerifier::new()
        .verify(&stored.artifact, &jws, &key.trusted_key())
        .is_valid());
}

#[tokio::test]
async fn test_fetch_missing_artifact_is_rejected() {
    let server = MockServer::start();
    let (_, artifact, _) = signed_policy();

    server.mock(|when, then| {
        when.method(GET);
        then.status(404).json_body(json!({"error": "not_found", "message": "no such artifact"}));
    });

    let transport = HttpArtifactTransport::new(&server.base_url()).unwrap();
    assert_matches!(
        transport.fetch(artifact.workspace_id(), artifact.id()).await,
        Err(TransportError::Rejected { status: 404, .. })
    );
}
