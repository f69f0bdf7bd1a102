use crate::entities::transfer_records;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", db_url);

    let db = Database::connect(connect_options(db_url)).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:")
}

/// Stand-in for "no timeout": the pool falls back to its own recycling
/// defaults when none is given.
const NEVER: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Idle timeout and max lifetime for pooled connections. An in-memory
/// SQLite database lives only as long as its single connection, so that
/// connection is never recycled.
fn recycle_timeouts(db_url: &str) -> (Duration, Duration) {
    if is_in_memory(db_url) {
        (NEVER, NEVER)
    } else {
        (Duration::from_secs(600), Duration::from_secs(1800))
    }
}

fn connect_options(db_url: &str) -> ConnectOptions {
    // Each pooled connection to an in-memory SQLite database sees its own empty database
    let max_connections = if is_in_memory(db_url) { 1 } else { 20 };
    let (idle, lifetime) = recycle_timeouts(db_url);

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(idle)
        .max_lifetime(lifetime)
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);
    opt
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    let stmt = schema
        .create_table_from_entity(transfer_records::Entity)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&stmt)).await?;
    info!("   - Table 'transfer_records' checked/created");

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_transfer_records_key ON transfer_records(key)",
        "CREATE INDEX IF NOT EXISTS idx_transfer_records_created_at ON transfer_records(created_at)",
    ];

    for query in indexes {
        match db
            .execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await
        {
            Ok(_) => info!("   - Executed schema update: {}", query),
            Err(e) => tracing::warn!("   - Schema update warning: {} -> {}", query, e),
        }
    }

    Ok(())
}
