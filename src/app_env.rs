/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. Accepts standard tracing env-filter
/// directives, e.g. `info` or `todo_rest=debug,sqlx=warn`
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Socket address the HTTP server binds to. Defaults to 0.0.0.0:8080 when unset
pub const LISTEN_ADDR: &str = "LISTEN_ADDR";
