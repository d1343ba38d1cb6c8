//! Repository for the `entries` table.

use newsreel_core::entry::Feed;
use newsreel_core::types::DbId;
use sqlx::{Sqlite, SqlitePool};

use crate::models::entry::{CreateEntry, EntryRecord, EntryStats};

/// Column list for `entries` queries.
const COLUMNS: &str = "\
    id, feed_title, title, text, image, url, summary, video_path, created_at";

/// Provides CRUD operations for stored entries.
pub struct EntryRepo;

impl EntryRepo {
    /// Insert every entry of `feed` in feed order inside one transaction.
    pub async fn save_feed(pool: &SqlitePool, feed: &Feed) -> Result<Vec<EntryRecord>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut saved = Vec::with_capacity(feed.entries.len());
        for entry in &feed.entries {
            let dto = CreateEntry::from_entry(Some(&feed.title), entry);
            saved.push(Self::create(&mut *tx, &dto).await?);
        }
        tx.commit().await?;

        tracing::debug!(feed = %feed.title, count = saved.len(), "Saved feed entries");
        Ok(saved)
    }

    /// List all entries in insertion order.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<EntryRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entries ORDER BY id");
        sqlx::query_as::<_, EntryRecord>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find an entry by its ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<EntryRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entries WHERE id = $1");
        sqlx::query_as::<_, EntryRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count stored entries and how many of them have a rendered video.
    pub async fn stats(pool: &SqlitePool) -> Result<EntryStats, sqlx::Error> {
        sqlx::query_as::<_, EntryStats>(
            "SELECT COUNT(*) AS total, COUNT(video_path) AS rendered FROM entries",
        )
        .fetch_one(pool)
        .await
    }

    /// Delete an entry by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert one entry on a pool or inside a transaction, returning the row.
    pub async fn create<'e, E>(executor: E, dto: &CreateEntry) -> Result<EntryRecord, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO entries \
                 (feed_title, title, text, image, url, summary, video_path, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntryRecord>(&query)
            .bind(&dto.feed_title)
            .bind(&dto.title)
            .bind(&dto.text)
            .bind(&dto.image)
            .bind(&dto.url)
            .bind(&dto.summary)
            .bind(&dto.video_path)
            .bind(chrono::Utc::now())
            .fetch_one(executor)
            .await
    }
}
