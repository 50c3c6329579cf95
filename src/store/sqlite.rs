use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, sqlite::SqlitePoolOptions};
use tokio::sync::broadcast;
use tracing::info;

use super::{ChangeEvent, ChangeFeed, ChangeKind, EntityStore, Row, Table, decode, encode};
use crate::error::StoreError;
use crate::models::{NameFields, OfferingFields, OfferingRecord, Registration, RegistrationFields};

/// Entity store on a local SQLite database.
pub struct SqliteStore {
    db: SqlitePool,
    feed: ChangeFeed,
}

#[derive(Debug, Serialize, FromRow)]
struct NamedRow {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NamePatch {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OfferingPatch {
    course: Option<i64>,
    course_type: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPatch {
    student: Option<String>,
    offering_id: Option<i64>,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    /// A private in-memory database; one connection so every query sees it.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(db: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&db).await?;
        info!("sqlite store ready");
        Ok(Self {
            db,
            feed: ChangeFeed::new(),
        })
    }
}

fn to_rows<T: Serialize>(table: Table, rows: &[T]) -> Result<Vec<Row>, StoreError> {
    rows.iter().map(|row| encode(table, row)).collect()
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn select(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        match table {
            Table::CourseTypes | Table::Courses => {
                let sql = format!("SELECT id, name FROM {} ORDER BY id", table.name());
                let rows = sqlx::query_as::<_, NamedRow>(&sql).fetch_all(&self.db).await?;
                to_rows(table, &rows)
            }
            Table::Offerings => {
                let rows = sqlx::query_as::<_, OfferingRecord>(
                    "SELECT id, course, course_type FROM offerings ORDER BY id",
                )
                .fetch_all(&self.db)
                .await?;
                to_rows(table, &rows)
            }
            Table::Registrations => {
                let rows = sqlx::query_as::<_, Registration>(
                    "SELECT id, student, offering_id FROM registrations ORDER BY id",
                )
                .fetch_all(&self.db)
                .await?;
                to_rows(table, &rows)
            }
        }
    }

    async fn insert(&self, table: Table, fields: Row) -> Result<Row, StoreError> {
        let row = match table {
            Table::CourseTypes | Table::Courses => {
                let fields: NameFields = decode(table, fields)?;
                let sql = format!(
                    "INSERT INTO {} (name) VALUES (?1) RETURNING id, name",
                    table.name()
                );
                let row = sqlx::query_as::<_, NamedRow>(&sql)
                    .bind(fields.name)
                    .fetch_one(&self.db)
                    .await?;
                encode(table, &row)?
            }
            Table::Offerings => {
                let fields: OfferingFields = decode(table, fields)?;
                let row = sqlx::query_as::<_, OfferingRecord>(
                    r#"
                    INSERT INTO offerings (course, course_type)
                    VALUES (?1, ?2)
                    RETURNING id, course, course_type
                    "#,
                )
                .bind(fields.course)
                .bind(fields.course_type)
                .fetch_one(&self.db)
                .await?;
                encode(table, &row)?
            }
            Table::Registrations => {
                let fields: RegistrationFields = decode(table, fields)?;
                let row = sqlx::query_as::<_, Registration>(
                    r#"
                    INSERT INTO registrations (student, offering_id)
                    VALUES (?1, ?2)
                    RETURNING id, student, offering_id
                    "#,
                )
                .bind(fields.student)
                .bind(fields.offering_id)
                .fetch_one(&self.db)
                .await?;
                encode(table, &row)?
            }
        };

        self.feed.publish(table, ChangeKind::Insert);
        Ok(row)
    }

    async fn update(&self, table: Table, id: i64, patch: Row) -> Result<Row, StoreError> {
        let row = match table {
            Table::CourseTypes | Table::Courses => {
                let patch: NamePatch = decode(table, patch)?;
                let sql = format!(
                    "UPDATE {} SET name = COALESCE(?1, name) WHERE id = ?2 RETURNING id, name",
                    table.name()
                );
                sqlx::query_as::<_, NamedRow>(&sql)
                    .bind(patch.name)
                    .bind(id)
                    .fetch_optional(&self.db)
                    .await?
                    .map(|row| encode(table, &row))
            }
            Table::Offerings => {
                let patch: OfferingPatch = decode(table, patch)?;
                sqlx::query_as::<_, OfferingRecord>(
                    r#"
                    UPDATE offerings
                    SET course = COALESCE(?1, course),
                        course_type = COALESCE(?2, course_type)
                    WHERE id = ?3
                    RETURNING id, course, course_type
                    "#,
                )
                .bind(patch.course)
                .bind(patch.course_type)
                .bind(id)
                .fetch_optional(&self.db)
                .await?
                .map(|row| encode(table, &row))
            }
            Table::Registrations => {
                let patch: RegistrationPatch = decode(table, patch)?;
                sqlx::query_as::<_, Registration>(
                    r#"
                    UPDATE registrations
                    SET student = COALESCE(?1, student),
                        offering_id = COALESCE(?2, offering_id)
                    WHERE id = ?3
                    RETURNING id, student, offering_id
                    "#,
                )
                .bind(patch.student)
                .bind(patch.offering_id)
                .bind(id)
                .fetch_optional(&self.db)
                .await?
                .map(|row| encode(table, &row))
            }
        };

        let row = row.ok_or(StoreError::NotFound { table, id })??;
        self.feed.publish(table, ChangeKind::Update);
        Ok(row)
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
        let affected = sqlx::query(&sql)
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(StoreError::NotFound { table, id });
        }

        self.feed.publish(table, ChangeKind::Delete);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
