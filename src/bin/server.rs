use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use astrowatch::{
    AppState, DEFAULT_TELEGRAM_API_URL, TelegramNotifier, build_router, graceful_shutdown,
    logging_middleware,
};

/// The REST API server for AstroWatch.
///
/// Every option can also be set with an environment variable or a `.env` file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    db_path: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// The directory that uploaded screenshots are saved to.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// The token of the Telegram bot that sends payment notifications.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: Option<String>,

    /// The chat that payment notifications are sent to.
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: Option<String>,

    /// The base URL of the Telegram Bot API.
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_TELEGRAM_API_URL)]
    telegram_api_url: String,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine, the variables may be set in the environment.
    let dotenv_result = dotenvy::dotenv();

    setup_logging();

    if let Err(error) = &dotenv_result
        && !error.not_found()
    {
        tracing::warn!("could not load .env file: {error}");
    }

    let args = Args::parse();

    let notifier = match (&args.telegram_bot_token, &args.telegram_chat_id) {
        (Some(bot_token), Some(chat_id)) => {
            match TelegramNotifier::new(&args.telegram_api_url, bot_token, chat_id) {
                Ok(notifier) => {
                    tracing::info!(
                        "Payment notifications will be sent to chat {}",
                        notifier.chat_id()
                    );
                    Some(notifier)
                }
                Err(error) => {
                    tracing::error!("could not create Telegram client: {error}");
                    exit(1);
                }
            }
        }
        _ => {
            tracing::warn!(
                "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must both be set to send payment notifications"
            );
            None
        }
    };

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!(
                "could not open database at {}: {error}",
                args.db_path.display()
            );
            exit(1);
        }
    };

    let state = match AppState::new(connection, args.upload_dir.clone(), notifier) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("could not initialize database: {error}");
            exit(1);
        }
    };
    tracing::info!("Connected to database at {}", args.db_path.display());

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state).layer(middleware::from_fn(logging_middleware)));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("HTTP server listening on http://localhost:{}", args.port);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("server error: {error}");
        exit(1);
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let debug_log = match OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
    {
        Ok(log_file) => Some(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(false)
                .with_writer(Arc::new(log_file))
                .with_filter(filter::LevelFilter::DEBUG),
        ),
        Err(error) => {
            eprintln!("Could not create log file, logging to stdout only: {error}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
