/// CRUD helpers for user/customer/history
pub mod crud_tests;


use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

/// Connect and migrate, or `None` when no database is available
/// (`SKIP_DB_TESTS` set, or the server cannot be reached).
pub(crate) async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match crate::db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

#[test]
fn connect_options_follow_config() {
    let cfg = configs::DatabaseConfig {
        url: "postgres://u:p@localhost:5432/x".into(),
        max_connections: 7,
        min_connections: 3,
        ..configs::DatabaseConfig::default()
    };
    let opt = crate::db::connect_options(&cfg);
    assert_eq!(opt.get_url(), "postgres://u:p@localhost:5432/x");
    assert_eq!(opt.get_max_connections(), Some(7));
    assert_eq!(opt.get_min_connections(), Some(3));
}
