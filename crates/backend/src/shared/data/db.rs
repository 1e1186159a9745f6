use std::path::Path;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};

const CREATE_GOATS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS goats (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        breed TEXT NOT NULL,
        age_years REAL NOT NULL,
        weight_lbs REAL NOT NULL,
        price_usd REAL NOT NULL,
        temperament TEXT NOT NULL,
        image_data_url TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 0
    );
"#;

/// Open the store once at startup and bootstrap the schema.
pub async fn init_db(db_path: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Normalize path separators and ensure proper URL form on Windows
    let normalized = db_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Connecting to database at {}", db_url);
    let conn = Database::connect(&db_url).await?;
    init_schema(&conn).await?;
    Ok(conn)
}

/// Minimal schema bootstrap, shared with the in-memory test databases.
pub async fn init_schema(conn: &DatabaseConnection) -> Result<(), DbErr> {
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        CREATE_GOATS_TABLE.to_string(),
    ))
    .await?;
    Ok(())
}
