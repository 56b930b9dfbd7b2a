use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};

use crate::{
    models::{Note, SortOrder},
    repository::{NoteStore, PageSlice, StoreError, embedded::migrations},
};

pub struct PgNoteStore {
    client: Client,
}

impl PgNoteStore {
    pub async fn new(database_dsn: &str) -> Result<Self, StoreError> {
        let (client, con) = tokio_postgres::connect(database_dsn, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = con.await {
                tracing::error!("connection error: {}", e);
            }
        });

        Ok(Self { client })
    }

    pub async fn migrate(&mut self) -> Result<(), StoreError> {
        let migrations_report = migrations::runner().run_async(&mut self.client).await?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("DB migrations finished!");

        Ok(())
    }
}

fn note_from_row(row: &Row) -> Note {
    Note {
        id: row.get("id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Page of notes plus the size of the whole table, read in one statement.
fn page_query(order: SortOrder) -> String {
    // Direction cannot be bound as a parameter; it only ever comes from the enum.
    let direction = if order.is_ascending() { "ASC" } else { "DESC" };
    format!(
        "SELECT id, content, created_at, updated_at, COUNT(*) OVER () AS total_count FROM notes \
         ORDER BY updated_at {direction}, id {direction} LIMIT $1 OFFSET $2"
    )
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn list_page(
        &self,
        offset: usize,
        limit: usize,
        order: SortOrder,
    ) -> Result<PageSlice, StoreError> {
        let rows = self
            .client
            .query(&page_query(order), &[&to_sql_int(limit), &to_sql_int(offset)])
            .await?;

        // Past the end there is no row to carry the window count.
        let count: i64 = match rows.first() {
            Some(row) => row.get("total_count"),
            None => self
                .client
                .query_one("SELECT COUNT(*) FROM notes", &[])
                .await?
                .get(0),
        };

        Ok(PageSlice {
            items: rows.iter().map(note_from_row).collect(),
            total_count: usize::try_from(count).unwrap_or_default(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Note>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT id, content, created_at, updated_at FROM notes WHERE id = $1",
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn create(&self, content: &str, owner_id: &str) -> Result<Note, StoreError> {
        let row = self.client.query_one(
            "INSERT INTO notes (content, user_id) VALUES ($1, $2) RETURNING id, content, created_at, updated_at",
            &[&content, &owner_id],
        ).await?;

        Ok(note_from_row(&row))
    }

    async fn update(&self, id: i64, content: &str) -> Result<Option<Note>, StoreError> {
        let row = self.client.query_opt(
            "UPDATE notes SET content = $1, updated_at = GREATEST(now(), created_at) WHERE id = $2 \
             RETURNING id, content, created_at, updated_at",
            &[&content, &id],
        ).await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let rows = self
            .client
            .execute("DELETE FROM notes WHERE id = $1", &[&id])
            .await?;

        Ok(rows == 1)
    }
}
