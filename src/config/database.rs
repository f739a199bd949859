//! Database configuration module for the order manager.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! The `taquizas` table is generated from the entity definition with
//! `Schema::create_table_from_entity`, so the on-disk schema always matches the Rust model.

use super::settings::DatabaseSettings;
use crate::entities::Order;
use crate::errors::{Error, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::{debug, info};

/// Opens the connection pool described by `settings`.
///
/// Every store operation checks a connection out of this pool for the duration of a
/// single statement; the pool gets it back when the statement future completes or is
/// dropped, whichever path it takes.
pub async fn create_connection(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .sqlx_logging(false);

    debug!(url = %settings.url, "Opening order database");
    Database::connect(options)
        .await
        .map_err(|e| Error::Connection {
            message: e.to_string(),
        })
}

/// Creates the order table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut order_table = schema.create_table_from_entity(Order);
    order_table.if_not_exists();

    db.execute(builder.build(&order_table)).await?;
    Ok(())
}

/// Connects and makes sure the schema is in place.
pub async fn init_db(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    let db = create_connection(settings).await?;
    create_tables(&db).await?;
    info!(url = %settings.url, "Order database ready");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OrderModel;
    use sea_orm::{EntityTrait, QuerySelect};

    fn memory_settings() -> DatabaseSettings {
        DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            ..DatabaseSettings::default()
        }
    }

    #[tokio::test]
    async fn test_init_db_creates_order_table() -> Result<()> {
        let db = init_db(&memory_settings()).await?;

        let rows: Vec<OrderModel> = Order::find().limit(1).all(&db).await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection(&memory_settings()).await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<OrderModel> = Order::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_file_database_survives_reopening() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let settings = DatabaseSettings {
            url: format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("taquizas.sqlite").display()
            ),
            ..DatabaseSettings::default()
        };

        let db = init_db(&settings).await?;
        crate::core::order::add_order(&db, &crate::test_utils::ana_fields()).await?;
        db.close().await?;

        let reopened = init_db(&settings).await?;
        let rows: Vec<OrderModel> = Order::find().all(&reopened).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].requester_name, "Ana");
        Ok(())
    }

    #[tokio::test]
    async fn test_unopenable_database_is_a_connection_error() {
        let settings = DatabaseSettings {
            url: "sqlite:///nonexistent-dir/for/sure/taquizas.sqlite?mode=ro".to_string(),
            acquire_timeout_secs: 1,
            ..DatabaseSettings::default()
        };

        let result = create_connection(&settings).await;
        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
