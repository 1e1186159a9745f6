use sea_orm::DatabaseConnection;

/// Process-wide shared state handed to every handler. The connection is
/// opened once at startup and cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}
