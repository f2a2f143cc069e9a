//! Implements a struct that holds the state of the REST server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{Error, db::initialize, telegram::TelegramNotifier};

/// The state of the REST server.
///
/// The state is created once at start up and only read afterwards.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The directory that uploaded screenshots are written to.
    pub upload_dir: PathBuf,

    /// The client for payment notifications, `None` if Telegram is not configured.
    pub notifier: Option<TelegramNotifier>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        upload_dir: impl Into<PathBuf>,
        notifier: Option<TelegramNotifier>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            upload_dir: upload_dir.into(),
            notifier,
        })
    }
}
