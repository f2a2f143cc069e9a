use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use axum_test::multipart::Part;
use rusqlite::Connection;

use crate::{AppState, db::initialize, telegram::TelegramNotifier};

/// An in-memory database with the app's tables.
pub(crate) fn get_test_db_connection() -> Arc<Mutex<Connection>> {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    Arc::new(Mutex::new(connection))
}

pub(crate) fn get_test_app_state(
    upload_dir: &Path,
    notifier: Option<TelegramNotifier>,
) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, upload_dir, notifier).expect("Could not create app state")
}

/// A fake PNG file part for the screenshot field.
pub(crate) fn screenshot_part(file_name: &str) -> Part {
    Part::bytes(b"\x89PNG\r\n\x1a\nnot really a png".to_vec())
        .file_name(file_name)
        .mime_type("image/png")
}

/// The sorted names of the files in `upload_dir`, empty if it does not exist.
pub(crate) fn uploaded_files(upload_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(upload_dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .map(|entry| {
            entry
                .expect("Could not read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();

    names
}
