//! Utility to inspect the collection tables and print their structure.

use aurum_vision_api::store::quote_ident;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

/// Main entry point for the collection inspection utility.
///
/// Connects to the database and lists the columns and row count of every
/// table in the configured schema (`DATABASE_NAME`, default `public`).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url =
        env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let schema = env::var("DATABASE_NAME").unwrap_or_else(|_| "public".to_string());

    let pool = PgPoolOptions::new().connect(&database_url).await?;

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name::text FROM information_schema.tables WHERE table_schema = $1 ORDER BY table_name",
    )
    .bind(&schema)
    .fetch_all(&pool)
    .await?;

    println!("Collections in schema '{}':", schema);
    for (table,) in &tables {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {}.{}",
            quote_ident(&schema),
            quote_ident(table)
        ))
        .fetch_one(&pool)
        .await?;
        println!("- {} ({} rows)", table, count);

        let columns: Vec<(String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text FROM information_schema.columns WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
        )
        .bind(&schema)
        .bind(table)
        .fetch_all(&pool)
        .await?;

        for (col, type_) in columns {
            println!("  - {}: {}", col, type_);
        }
        println!();
    }

    Ok(())
}
