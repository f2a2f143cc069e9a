use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::telegram::TelegramNotifier;

const TEST_BOT_TOKEN: &str = "test-token";
const TEST_CHAT_ID: i64 = 42;

/// A Bot API mock that answers every `sendPhoto` call with `status` and `reply`.
pub(crate) async fn mock_telegram(status: u16, reply: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TEST_BOT_TOKEN}/sendPhoto")))
        .respond_with(ResponseTemplate::new(status).set_body_json(reply))
        .mount(&server)
        .await;

    server
}

/// A successful `sendPhoto` reply.
pub(crate) fn sent_photo_reply() -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 1,
            "date": 1700000000,
            "chat": {
                "id": TEST_CHAT_ID,
                "type": "private",
                "first_name": "Test"
            },
            "photo": [{
                "file_id": "photo-file-id",
                "file_unique_id": "photo-unique-id",
                "width": 1,
                "height": 1,
                "file_size": 16
            }],
            "caption": "New Payment Received!"
        }
    })
}

/// A reply rejecting the message because the chat does not exist.
pub(crate) fn chat_not_found_reply() -> Value {
    json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})
}

/// A notifier that sends to `server`.
pub(crate) fn test_notifier(server: &MockServer) -> TelegramNotifier {
    TelegramNotifier::new(&server.uri(), TEST_BOT_TOKEN, &TEST_CHAT_ID.to_string())
        .expect("Could not create notifier")
}
