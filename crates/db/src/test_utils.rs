//! PostgreSQL fixtures for integration tests.
//!
//! Connection settings come from `TEST_DB_*` variables.

#![allow(missing_docs)]

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;

/// Tables emptied between tests, children first.
const TABLES: [&str; 6] = [
    "user_plant_mylist",
    "user_plant_likes",
    "comments",
    "plant_images",
    "plants",
    "users",
];

/// Test database connection settings.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        let var = |name: &str, fallback: &str| {
            std::env::var(name).unwrap_or_else(|_| fallback.to_string())
        };

        Self {
            host: var("TEST_DB_HOST", "localhost"),
            port: var("TEST_DB_PORT", "5433").parse().unwrap_or(5433),
            username: var("TEST_DB_USER", "verdant_test"),
            password: var("TEST_DB_PASSWORD", "verdant_test"),
            database: var("TEST_DB_NAME", "verdant_test"),
        }
    }
}

impl TestDbConfig {
    /// Connection URL for the test database.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    conn: DatabaseConnection,
}

impl TestDatabase {
    /// Connect using `TEST_DB_*` settings and run migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with explicit settings and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        tracing::debug!(database = %config.database, "Test database ready");
        Ok(Self { conn })
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Empty every catalog table and reset id sequences.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let truncate = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", TABLES.join(", "));
        self.conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url() {
        let config = TestDbConfig {
            host: "db".to_string(),
            port: 5433,
            username: "user".to_string(),
            password: "pass".to_string(),
            database: "plants".to_string(),
        };
        assert_eq!(config.database_url(), "postgres://user:pass@db:5433/plants");
    }
}
