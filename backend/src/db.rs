#[cfg(not(any(feature = "db-sqlite", feature = "db-postgres")))]
compile_error!("Either the `db-sqlite` or `db-postgres` feature must be enabled.");

#[cfg(all(feature = "db-sqlite", feature = "db-postgres"))]
compile_error!("Only one of `db-sqlite` or `db-postgres` can be enabled.");

#[cfg(feature = "db-postgres")]
pub use sqlx::postgres::{
    PgConnection as DbConnection, PgPool as DbPool, PgPoolOptions as DbPoolOptions, Postgres as Db,
};

#[cfg(feature = "db-sqlite")]
pub use sqlx::sqlite::{
    Sqlite as Db, SqliteConnection as DbConnection, SqlitePool as DbPool,
    SqlitePoolOptions as DbPoolOptions,
};

use crate::config::DatabaseConfig;

/// Opens the connection pool. SQLite connections get foreign keys switched on,
/// which the cascading deletes of `leads` and `refresh_tokens` rely on.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    #[cfg(feature = "db-sqlite")]
    let options = {
        use std::str::FromStr;
        sqlx::sqlite::SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
    };

    #[cfg(feature = "db-postgres")]
    let options = {
        use std::str::FromStr;
        sqlx::postgres::PgConnectOptions::from_str(&config.url)?
    };

    DbPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

pub async fn migrate(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    #[cfg(feature = "db-sqlite")]
    sqlx::migrate!("./migrations/sqlite").run(pool).await?;

    #[cfg(feature = "db-postgres")]
    sqlx::migrate!("./migrations/postgres").run(pool).await?;

    Ok(())
}
