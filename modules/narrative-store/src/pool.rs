use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect and run pending migrations idempotently at process start,
/// rather than as a separate deploy step.
pub async fn connect_and_migrate(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
