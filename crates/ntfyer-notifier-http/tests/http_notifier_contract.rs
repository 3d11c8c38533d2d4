//! Contract Test: HTTP Notifier
//!
//! The notifier makes exactly one POST with the text as body and maps the
//! outcome onto the error taxonomy.
//!
//! Constraints verified:
//! - 200 is success, with the text delivered verbatim as the body
//! - Any other status (including other 2xx) is NotificationFailed
//! - A refused connection is TransportError
//! - No retries: one request per send, even on failure
//! - End to end: the facade's notifier URL is where the POST lands

use ntfyer_core::{Error, MemorySettingsStore, Notifier, Settings, keys};
use ntfyer_notifier_http::HttpNotifier;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn status_200_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test_topic"))
        .and(body_string("backup finished"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = HttpNotifier::new(reqwest::Client::new());
    notifier
        .send(&format!("{}/test_topic", server.uri()), "backup finished")
        .await
        .unwrap();
}

#[tokio::test]
async fn non_200_status_is_notification_failed() {
    for status in [201u16, 204, 400, 403, 429, 500] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpNotifier::default();
        let err = notifier
            .send(&format!("{}/topic", server.uri()), "hi")
            .await
            .unwrap_err();

        match err {
            Error::NotificationFailed { status: got, .. } => assert_eq!(got, status),
            other => panic!("status {status}: expected NotificationFailed, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    // Bind then drop a plain listener so the port is known to be closed
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let err = HttpNotifier::default()
        .send(&format!("http://{}/topic", addr), "hi")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TransportError(_)), "got {err:?}");
}

#[tokio::test]
async fn settings_route_notification_to_configured_topic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploys"))
        .and(body_string("v1.2.3 is live"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = Settings::new(Box::new(MemorySettingsStore::new())).await.unwrap();
    settings.write_config_value(keys::URL, &server.uri()).await.unwrap();
    settings.write_config_value(keys::TOPIC, "deploys").await.unwrap();

    settings
        .send_notification(&HttpNotifier::default(), "v1.2.3 is live")
        .await
        .unwrap();
}
