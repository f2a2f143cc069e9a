//! The endpoint for submitting a payment transaction with a screenshot.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    telegram::{TelegramNotifier, notify_payment},
    transaction::{
        NewTransaction, create_transaction,
        upload::{SCREENSHOT_FIELD, StoredFile, store_upload},
    },
};

/// The multipart field that holds the sender's name.
pub const SENDER_NAME_FIELD: &str = "senderName";
/// The multipart field that holds the transaction ID.
pub const TRANSACTION_ID_FIELD: &str = "transactionId";
/// The message sent to the client when a transaction has been saved.
pub const SUBMISSION_SUCCEEDED: &str = "Transaction submitted and Telegram notified.";

/// The JSON body of every reply from the submission endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmissionReply {
    /// Whether the transaction was saved.
    pub success: bool,
    /// A human readable description of the outcome.
    pub message: String,
}

impl SubmissionReply {
    /// A failed submission with `message` and `status_code`.
    pub fn failure(status_code: StatusCode, message: &str) -> Response {
        (
            status_code,
            Json(SubmissionReply {
                success: false,
                message: message.to_owned(),
            }),
        )
            .into_response()
    }
}

/// The state needed for submitting a transaction.
#[derive(Debug, Clone)]
pub struct SubmitTransactionState {
    /// The database connection for saving transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where uploaded screenshots are written.
    pub upload_dir: PathBuf,
    /// The Telegram client, `None` if no credentials were provided.
    pub notifier: Option<TelegramNotifier>,
}

impl FromRef<AppState> for SubmitTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            upload_dir: state.upload_dir.clone(),
            notifier: state.notifier.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct SubmissionForm {
    sender_name: Option<String>,
    transaction_id: Option<String>,
    screenshot: Option<StoredFile>,
}

/// Route handler for submitting a payment transaction.
///
/// The screenshot is written to disk as soon as it is read from the form, and
/// removed again if the submission is rejected before it is saved.
/// Once the transaction is saved, a notification is sent to Telegram. A failed
/// notification is logged and does not change the response.
pub async fn submit_transaction_endpoint(
    State(state): State<SubmitTransactionState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionReply>, Error> {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!("submission is not a multipart form: {rejection}");
            return Err(Error::MissingFields);
        }
    };

    let mut form = SubmissionForm::default();
    if let Err(error) = read_submission_form(multipart, &state, &mut form).await {
        if let Some(screenshot) = &form.screenshot {
            remove_orphaned_upload(screenshot).await;
        }

        return Err(error);
    }

    let (Some(sender_name), Some(transaction_id), Some(screenshot)) =
        (form.sender_name, form.transaction_id, form.screenshot.clone())
    else {
        if let Some(screenshot) = form.screenshot {
            remove_orphaned_upload(&screenshot).await;
        }

        return Err(Error::MissingFields);
    };

    let transaction = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        create_transaction(
            NewTransaction {
                name: sender_name,
                transaction_id,
                image_url: screenshot.file_name.clone(),
            },
            &connection,
        )?
    };

    tracing::info!(
        "saved transaction {} from {} with screenshot {}",
        transaction.transaction_id,
        transaction.name,
        transaction.image_url
    );

    if let Err(error) = notify_payment(
        state.notifier.as_ref(),
        &screenshot.path,
        &transaction.name,
        &transaction.transaction_id,
    )
    .await
    {
        tracing::warn!("Telegram error (not fatal): {error}");
    }

    Ok(Json(SubmissionReply {
        success: true,
        message: SUBMISSION_SUCCEEDED.to_owned(),
    }))
}

async fn read_submission_form(
    mut multipart: Multipart,
    state: &SubmitTransactionState,
    form: &mut SubmissionForm,
) -> Result<(), Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);

        match file_name {
            Some(file_name) => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|error| Error::MultipartError(error.body_text()))?;

                // Browsers send an unnamed, empty part when no file was chosen.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                if field_name != SCREENSHOT_FIELD || form.screenshot.is_some() {
                    tracing::debug!("rejecting file \"{file_name}\" in field \"{field_name}\"");
                    return Err(Error::UnexpectedField(field_name));
                }

                form.screenshot = Some(store_upload(&state.upload_dir, &file_name, &data).await?);
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.body_text()))?;
                let value = Some(text).filter(|text| !text.is_empty());

                match field_name.as_str() {
                    SENDER_NAME_FIELD => form.sender_name = value,
                    TRANSACTION_ID_FIELD => form.transaction_id = value,
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

async fn remove_orphaned_upload(screenshot: &StoredFile) {
    if let Err(error) = tokio::fs::remove_file(&screenshot.path).await {
        tracing::warn!(
            "could not remove orphaned upload {}: {error}",
            screenshot.path.display()
        );
    }
}

#[cfg(test)]
mod submit_transaction_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use serde_json::json;
    use wiremock::MockServer;

    use crate::{
        endpoints,
        error::{ALL_FIELDS_REQUIRED, SERVER_ERROR_OCCURRED, UNEXPECTED_FIELD},
        telegram::TelegramNotifier,
        test_utils::{
            chat_not_found_reply, get_test_db_connection, mock_telegram, screenshot_part,
            sent_photo_reply, test_notifier, uploaded_files,
        },
        transaction::{SubmissionReply, get_all_transactions},
    };

    use super::{SUBMISSION_SUCCEEDED, SubmitTransactionState, submit_transaction_endpoint};

    fn get_test_state(
        upload_dir: &std::path::Path,
        notifier: Option<TelegramNotifier>,
    ) -> SubmitTransactionState {
        SubmitTransactionState {
            db_connection: get_test_db_connection(),
            upload_dir: upload_dir.to_path_buf(),
            notifier,
        }
    }

    fn get_test_server(state: SubmitTransactionState) -> TestServer {
        let app = Router::new()
            .route(
                endpoints::SUBMIT_TRANSACTION,
                post(submit_transaction_endpoint),
            )
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn valid_form() -> MultipartForm {
        MultipartForm::new()
            .add_text("senderName", "Alice")
            .add_text("transactionId", "TXN123")
            .add_part("screenshot", screenshot_part("receipt.png"))
    }

    #[tokio::test]
    async fn submit_saves_transaction_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let telegram = mock_telegram(200, sent_photo_reply()).await;
        let notifier = test_notifier(&telegram);
        let state = get_test_state(dir.path(), Some(notifier));
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form())
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<SubmissionReply>(),
            SubmissionReply {
                success: true,
                message: SUBMISSION_SUCCEEDED.to_owned()
            }
        );

        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 1);
        let transaction = &transactions[0];
        assert_eq!(transaction.name, "Alice");
        assert_eq!(transaction.transaction_id, "TXN123");

        let files = uploaded_files(dir.path());
        assert_eq!(files, vec![transaction.image_url.clone()]);
        assert!(transaction.image_url.starts_with("txn-"));
        assert!(transaction.image_url.ends_with(".png"));

        let requests = telegram.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("*Name:* Alice"));
        assert!(body.contains("*Transaction ID:* TXN123"));
    }

    #[tokio::test]
    async fn submit_succeeds_when_telegram_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let telegram = mock_telegram(400, chat_not_found_reply()).await;
        let notifier = test_notifier(&telegram);
        let state = get_test_state(dir.path(), Some(notifier));
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form())
            .await;

        response.assert_status_ok();
        assert!(response.json::<SubmissionReply>().success);
        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 1);
    }

    #[tokio::test]
    async fn submit_succeeds_when_telegram_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let telegram = MockServer::start().await;
        let notifier = test_notifier(&telegram);
        drop(telegram);
        let state = get_test_state(dir.path(), Some(notifier));
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form())
            .await;

        response.assert_status_ok();
        assert!(response.json::<SubmissionReply>().success);
        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 1);
    }

    #[tokio::test]
    async fn submit_succeeds_without_telegram_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form())
            .await;

        response.assert_status_ok();
        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 1);
    }

    #[tokio::test]
    async fn submitting_twice_creates_two_transactions() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let server = get_test_server(state.clone());

        for _ in 0..2 {
            server
                .post(endpoints::SUBMIT_TRANSACTION)
                .multipart(valid_form())
                .await
                .assert_status_ok();
        }

        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_ne!(transactions[0].id, transactions[1].id);
    }

    #[tokio::test]
    async fn submit_fails_on_missing_fields() {
        let forms = [
            (
                "missing sender name",
                MultipartForm::new()
                    .add_text("transactionId", "TXN123")
                    .add_part("screenshot", screenshot_part("receipt.png")),
            ),
            (
                "missing transaction ID",
                MultipartForm::new()
                    .add_text("senderName", "Alice")
                    .add_part("screenshot", screenshot_part("receipt.png")),
            ),
            (
                "missing screenshot",
                MultipartForm::new()
                    .add_text("senderName", "Alice")
                    .add_text("transactionId", "TXN123"),
            ),
            (
                "empty sender name",
                MultipartForm::new()
                    .add_text("senderName", "")
                    .add_text("transactionId", "TXN123")
                    .add_part("screenshot", screenshot_part("receipt.png")),
            ),
        ];

        for (case, form) in forms {
            let dir = tempfile::tempdir().unwrap();
            let state = get_test_state(dir.path(), None);
            let server = get_test_server(state.clone());

            let response = server
                .post(endpoints::SUBMIT_TRANSACTION)
                .multipart(form)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<SubmissionReply>(),
                SubmissionReply {
                    success: false,
                    message: ALL_FIELDS_REQUIRED.to_owned()
                },
                "{case}"
            );
            let transactions =
                get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
            assert!(transactions.is_empty(), "{case}: got {transactions:?}");
            assert!(uploaded_files(dir.path()).is_empty(), "{case}");
        }
    }

    #[tokio::test]
    async fn submit_fails_on_non_multipart_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .json(&json!({"senderName": "Alice", "transactionId": "TXN123"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<SubmissionReply>().message,
            ALL_FIELDS_REQUIRED
        );
    }

    #[tokio::test]
    async fn submit_fails_on_unexpected_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(
                MultipartForm::new()
                    .add_text("senderName", "Alice")
                    .add_text("transactionId", "TXN123")
                    .add_part("avatar", screenshot_part("me.png")),
            )
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<SubmissionReply>().message, UNEXPECTED_FIELD);
        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn submit_fails_on_second_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form().add_part("screenshot", screenshot_part("other.png")))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<SubmissionReply>().message, UNEXPECTED_FIELD);
        assert!(uploaded_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn submit_ignores_empty_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(
                MultipartForm::new()
                    .add_text("senderName", "Alice")
                    .add_text("transactionId", "TXN123")
                    .add_part("screenshot", Part::bytes(Vec::new()).file_name("")),
            )
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<SubmissionReply>().message,
            ALL_FIELDS_REQUIRED
        );
        assert!(uploaded_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn submit_accepts_unnamed_screenshot_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(
                MultipartForm::new()
                    .add_text("senderName", "Alice")
                    .add_text("transactionId", "TXN123")
                    .add_part("screenshot", Part::bytes(b"png".to_vec()).file_name("")),
            )
            .await;

        response.assert_status_ok();
        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(
            uploaded_files(dir.path()),
            vec![transactions[0].image_url.clone()]
        );
    }

    #[tokio::test]
    async fn submit_fails_when_database_lock_is_poisoned() {
        let dir = tempfile::tempdir().unwrap();
        let state = get_test_state(dir.path(), None);
        let db_connection = state.db_connection.clone();
        let _ = std::thread::spawn(move || {
            let _guard = db_connection.lock().unwrap();
            panic!("panicking while holding the database lock");
        })
        .join();
        assert!(state.db_connection.is_poisoned());
        let server = get_test_server(state);

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form())
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<SubmissionReply>(),
            SubmissionReply {
                success: false,
                message: SERVER_ERROR_OCCURRED.to_owned()
            }
        );
    }

    #[tokio::test]
    async fn submit_fails_when_database_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let telegram = mock_telegram(200, sent_photo_reply()).await;
        let notifier = test_notifier(&telegram);
        let state = get_test_state(dir.path(), Some(notifier));
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DROP TABLE payment_transaction", ())
            .unwrap();
        let server = get_test_server(state);

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form())
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<SubmissionReply>(),
            SubmissionReply {
                success: false,
                message: SERVER_ERROR_OCCURRED.to_owned()
            }
        );
        assert!(
            telegram.received_requests().await.unwrap().is_empty(),
            "Telegram should not be notified when the transaction was not saved"
        );
    }

    #[tokio::test]
    async fn submit_fails_when_upload_dir_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("uploads");
        std::fs::write(&not_a_dir, b"").unwrap();
        let state = get_test_state(&not_a_dir, None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SUBMIT_TRANSACTION)
            .multipart(valid_form())
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<SubmissionReply>().message,
            SERVER_ERROR_OCCURRED
        );
        let transactions = get_all_transactions(&state.db_connection.lock().unwrap()).unwrap();
        assert!(transactions.is_empty());
    }
}
