#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod http;
pub(crate) mod telegram;

pub(crate) use fixtures::{
    get_test_app_state, get_test_db_connection, screenshot_part, uploaded_files,
};
pub(crate) use http::parse_json;
pub(crate) use telegram::{chat_not_found_reply, mock_telegram, sent_photo_reply, test_notifier};
