use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::models::{Project, ProjectInput, ProjectRow};

const CREATE_PROJECTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        due_date TIMESTAMP,
        status TEXT
    )
"#;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("project {id} not found")]
    NotFound { id: i32 },
}

/// Project persistence as seen by the HTTP handlers.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects, in whatever order the store yields them.
    async fn list_all(&self) -> Result<Vec<Project>, DbError>;

    async fn get_by_id(&self, id: i32) -> Result<Project, DbError>;

    /// Insert a project and return it with its store-assigned id.
    async fn create(&self, input: &ProjectInput) -> Result<Project, DbError>;

    /// Overwrite every writable field of an existing project.
    async fn update(&self, id: i32, input: &ProjectInput) -> Result<Project, DbError>;

    /// Remove a project, failing with `NotFound` if it is not there to begin with.
    async fn delete(&self, id: i32) -> Result<(), DbError>;
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(config.database_url())
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Make sure the `projects` table exists. Safe to run on every start.
    pub async fn bootstrap(&self) -> Result<(), DbError> {
        sqlx::query(CREATE_PROJECTS_TABLE)
            .execute(self.get_pool())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ProjectStore for Database {
    async fn list_all(&self) -> Result<Vec<Project>, DbError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, description, due_date, status FROM projects",
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn get_by_id(&self, id: i32) -> Result<Project, DbError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, description, due_date, status FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.get_pool())
        .await?
        .ok_or(DbError::NotFound { id })?;

        Ok(row.into())
    }

    async fn create(&self, input: &ProjectInput) -> Result<Project, DbError> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO projects (name, description, due_date, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.due_date_naive())
        .bind(&input.status)
        .fetch_one(self.get_pool())
        .await?;

        tracing::debug!(id, "project created");
        Ok(input.clone().with_id(id))
    }

    async fn update(&self, id: i32, input: &ProjectInput) -> Result<Project, DbError> {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE projects
            SET name = $1, description = $2, due_date = $3, status = $4
            WHERE id = $5
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.due_date_naive())
        .bind(&input.status)
        .bind(id)
        .fetch_optional(self.get_pool())
        .await?
        .ok_or(DbError::NotFound { id })?;

        Ok(input.clone().with_id(id))
    }

    async fn delete(&self, id: i32) -> Result<(), DbError> {
        self.get_by_id(id).await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        // Someone else got there between the lookup and the delete.
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound { id });
        }

        Ok(())
    }
}

/// Connect to the database and make sure the schema is in place
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;
    db.bootstrap().await?;

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // Integration tests - run with DATABASE_URL set
    // cargo test -- --ignored

    async fn connect() -> Database {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        let db = Database::from_pool(pool);
        db.bootstrap().await.unwrap();
        db
    }

    fn input(name: &str) -> ProjectInput {
        ProjectInput {
            name: name.to_string(),
            description: String::new(),
            due_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            status: "Not Started".to_string(),
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn bootstrap_is_idempotent() {
        let db = connect().await;
        db.bootstrap().await.unwrap();
        db.bootstrap().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_get_round_trips() {
        let db = connect().await;
        let created = db.create(&input("Alpha")).await.unwrap();
        assert!(created.id > 0);

        let fetched = db.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);

        db.delete(created.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn ids_are_not_reused_after_delete() {
        let db = connect().await;
        let first = db.create(&input("First")).await.unwrap();
        db.delete(first.id).await.unwrap();

        let second = db.create(&input("Second")).await.unwrap();
        assert!(second.id > first.id);
        db.delete(second.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_overwrites_all_fields() {
        let db = connect().await;
        let created = db.create(&input("Before")).await.unwrap();

        let changed = ProjectInput {
            name: "After".to_string(),
            description: String::new(),
            due_date: None,
            status: "Completed".to_string(),
        };
        db.update(created.id, &changed).await.unwrap();

        let fetched = db.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, changed.with_id(created.id));
        db.delete(created.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn missing_ids_report_not_found() {
        let db = connect().await;
        let created = db.create(&input("Gone")).await.unwrap();
        db.delete(created.id).await.unwrap();

        assert!(matches!(
            db.get_by_id(created.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.update(created.id, &input("Gone")).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.delete(created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
