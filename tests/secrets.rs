use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::config::{Credentials, Region};
use aws_smithy_runtime::client::http::test_util::{ReplayEvent, StaticReplayClient};
use aws_smithy_types::body::SdkBody;
use base64::prelude::*;
use bq_daily_ingest::error::JobError;
use bq_daily_ingest::gcp::GcpAuth;
use bq_daily_ingest::secrets::{AwsSecretsManager, GcpSecretManager, SecretAccessor};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// get_mock_secrets_client returns a secrets manager client that answers every call with the given status and body
fn get_mock_secrets_client(status: u16, body: &str) -> aws_sdk_secretsmanager::Client {
    let replay_event = ReplayEvent::new(
        http::Request::builder()
            .body(SdkBody::from(""))
            .unwrap(),
        http::Response::builder()
            .status(status)
            .body(SdkBody::from(body.to_string()))
            .unwrap(),
    );

    let conf = aws_sdk_secretsmanager::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .credentials_provider(Credentials::new(
            "SOMETESTKEYID",
            "somesecretkey",
            Some("somesessiontoken".to_string()),
            None,
            "",
        ))
        .region(Region::new("eu-central-1"))
        .http_client(StaticReplayClient::new(vec![replay_event]))
        .build();

    aws_sdk_secretsmanager::Client::from_conf(conf)
}

fn gcp_accessor(server: &MockServer) -> GcpSecretManager {
    GcpSecretManager::new(
        reqwest::Client::new(),
        &format!("{}/v1", server.uri()),
        GcpAuth::Static("sm-token".to_string()),
    )
}

#[tokio::test]
async fn test_gcp_secret_latest_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/v1/projects/acme-analytics/secrets/CURRENCYLAYER_API_KEY/versions/latest:access",
        ))
        .and(header("authorization", "Bearer sm-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/123/secrets/CURRENCYLAYER_API_KEY/versions/3",
            "payload": {"data": BASE64_STANDARD.encode("cl-key-123")}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secret = gcp_accessor(&server)
        .get_secret("acme-analytics", "CURRENCYLAYER_API_KEY")
        .await
        .unwrap();
    assert_eq!(secret, "cl-key-123");
}

#[tokio::test]
async fn test_gcp_secret_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "Secret [projects/123/secrets/FACEBOOK_APP_ID] not found or has no versions.",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&server)
        .await;

    let err = gcp_accessor(&server)
        .get_secret("acme-analytics", "FACEBOOK_APP_ID")
        .await
        .unwrap_err();
    match err {
        JobError::SecretUnavailable { secret_id, reason } => {
            assert_eq!(secret_id, "FACEBOOK_APP_ID");
            assert!(reason.starts_with("404 Not Found NOT_FOUND"), "{}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_gcp_secret_bad_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"data": "%%% not base64 %%%"}
        })))
        .mount(&server)
        .await;

    let err = gcp_accessor(&server)
        .get_secret("acme-analytics", "FACEBOOK_ACCESS_TOKEN")
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::SecretUnavailable { .. }));
}

#[tokio::test]
async fn test_aws_secret_string() {
    let client = get_mock_secrets_client(
        200,
        r#"{
            "ARN": "arn:aws:secretsmanager:eu-central-1:111111111111:secret:acme-analytics/CURRENCYLAYER_API_KEY-AbCdEf",
            "Name": "acme-analytics/CURRENCYLAYER_API_KEY",
            "SecretString": "cl-key-123",
            "VersionId": "EXAMPLE1-90ab-cdef-fedc-ba987SECRET1",
            "VersionStages": ["AWSCURRENT"],
            "CreatedDate": 1.523477145713E9
        }"#,
    );

    let secret = AwsSecretsManager::from_client(client)
        .get_secret("acme-analytics", "CURRENCYLAYER_API_KEY")
        .await
        .unwrap();
    assert_eq!(secret, "cl-key-123");
}

#[tokio::test]
async fn test_aws_secret_without_string() {
    let client = get_mock_secrets_client(
        200,
        r#"{
            "Name": "acme-analytics/FACEBOOK_APP_SECRET",
            "SecretBinary": "c2VjcmV0"
        }"#,
    );

    let err = AwsSecretsManager::from_client(client)
        .get_secret("acme-analytics", "FACEBOOK_APP_SECRET")
        .await
        .unwrap_err();
    match err {
        JobError::SecretUnavailable { secret_id, reason } => {
            assert_eq!(secret_id, "FACEBOOK_APP_SECRET");
            assert_eq!(reason, "acme-analytics/FACEBOOK_APP_SECRET has no string value");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_aws_secret_not_found() {
    let client = get_mock_secrets_client(
        400,
        r#"{
            "__type": "ResourceNotFoundException",
            "Message": "Secrets Manager can't find the specified secret."
        }"#,
    );

    let err = AwsSecretsManager::from_client(client)
        .get_secret("acme-analytics", "FACEBOOK_APP_ID")
        .await
        .unwrap_err();
    match err {
        JobError::SecretUnavailable { secret_id, reason } => {
            assert_eq!(secret_id, "FACEBOOK_APP_ID");
            assert!(
                reason.starts_with("acme-analytics/FACEBOOK_APP_ID: "),
                "{}",
                reason
            );
            assert!(reason.contains("ResourceNotFoundException"), "{}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
}
