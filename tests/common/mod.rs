use logistics_api::{db, events, handlers::AppServices};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// A fully-migrated service stack over a throwaway SQLite database.
/// The temp dir keeps the database file alive for the duration of the test.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub event_sender: events::EventSender,
    _tmp: TempDir,
}

pub async fn spawn_services(allow_negative_stock: bool) -> TestApp {
    let tmp = TempDir::new().expect("temp dir");
    let db_path = tmp.path().join("logistics-test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let db_arc = Arc::new(pool);
    let (tx, rx) = mpsc::channel(256);
    let sender = events::EventSender::new(tx);
    tokio::spawn(events::process_events(rx));

    let services = AppServices::new(db_arc.clone(), sender.clone(), allow_negative_stock);

    TestApp {
        db: db_arc,
        services,
        event_sender: sender,
        _tmp: tmp,
    }
}
