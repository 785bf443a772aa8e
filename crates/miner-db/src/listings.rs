//! Listing store and reconciliation.
//!
//! Records are reconciled by their natural key (see
//! [`miner_core::DedupKey`]): a record whose key already exists overwrites the
//! stored row's price, area and link, anything else becomes a new row. Both
//! cases are a single `INSERT … ON CONFLICT … DO UPDATE` statement, so
//! concurrent upserts of the same key cannot interleave.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use miner_core::ListingRecord;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

const LISTING_COLUMNS: &str = "id, title, kind, price, city, neighborhood, bedroom_count, \
     parking_count, bathroom_count, area_sqm, link, updated_at";

/// Title length bounds, in characters.
const TITLE_LEN: std::ops::RangeInclusive<usize> = 3..=100;
/// Kind length bounds, in characters.
pub const KIND_LEN: std::ops::RangeInclusive<usize> = 3..=10;
const MAX_LOCATION_LEN: usize = 50;
const MAX_LINK_LEN: usize = 500;

/// A listing as persisted, with its store identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredListing {
    /// Opaque row identity
    pub id: i64,
    /// The listing fields
    #[serde(flatten)]
    pub record: ListingRecord,
    /// When the row was last inserted or overwritten
    pub updated_at: DateTime<Utc>,
}

impl AsRef<ListingRecord> for StoredListing {
    fn as_ref(&self) -> &ListingRecord {
        &self.record
    }
}

/// Outcome of reconciling a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    /// Records inserted or updated
    pub saved: u32,
    /// Records rejected by validation or the database
    pub failed: u32,
}

/// Optional exact-match criteria for [`search`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Exact city
    pub city: Option<String>,
    /// Exact neighborhood
    pub neighborhood: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    pub max_price: Option<f64>,
}

/// Check a record against the store's field constraints.
///
/// # Errors
/// Returns `DatabaseError::Validation` naming the first violated constraint.
pub fn validate(record: &ListingRecord) -> Result<()> {
    let invalid = |msg: String| Err(DatabaseError::Validation(msg));

    let title_len = record.title.chars().count();
    if !TITLE_LEN.contains(&title_len) {
        return invalid(format!(
            "title must be {}-{} characters, got {title_len}",
            TITLE_LEN.start(),
            TITLE_LEN.end()
        ));
    }

    let kind_len = record.kind.chars().count();
    if !KIND_LEN.contains(&kind_len) {
        return invalid(format!(
            "kind must be {}-{} characters, got {kind_len}",
            KIND_LEN.start(),
            KIND_LEN.end()
        ));
    }

    if !(record.price.is_finite() && record.price > 0.0) {
        return invalid(format!("price must be greater than 0, got {}", record.price));
    }

    if record.city.chars().count() > MAX_LOCATION_LEN {
        return invalid(format!("city exceeds {MAX_LOCATION_LEN} characters"));
    }

    if record.neighborhood.chars().count() > MAX_LOCATION_LEN {
        return invalid(format!("neighborhood exceeds {MAX_LOCATION_LEN} characters"));
    }

    if record.link.chars().count() > MAX_LINK_LEN {
        return invalid(format!("link exceeds {MAX_LINK_LEN} characters"));
    }

    Ok(())
}

/// Insert `record`, or overwrite the row sharing its natural key.
///
/// Idempotent: upserting the same record twice leaves one row with the
/// record's values.
///
/// # Errors
/// Returns `DatabaseError::Validation` for records that violate the field
/// constraints, or `DatabaseError::Sqlx` if the statement fails.
pub async fn upsert(pool: &Pool<Sqlite>, record: &ListingRecord) -> Result<StoredListing> {
    validate(record)?;

    let now = Utc::now().to_rfc3339();
    let sql = format!(
        "INSERT INTO listings (title, kind, price, city, neighborhood, bedroom_count,
                               parking_count, bathroom_count, area_sqm, link, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (city, neighborhood, title, bedroom_count, parking_count, bathroom_count, kind)
         DO UPDATE SET price = excluded.price,
                       area_sqm = excluded.area_sqm,
                       link = excluded.link,
                       updated_at = excluded.updated_at
         RETURNING {LISTING_COLUMNS}"
    );

    let row = sqlx::query(&sql)
        .bind(&record.title)
        .bind(&record.kind)
        .bind(record.price)
        .bind(&record.city)
        .bind(&record.neighborhood)
        .bind(i64::from(record.bedroom_count))
        .bind(i64::from(record.parking_count))
        .bind(i64::from(record.bathroom_count))
        .bind(i64::from(record.area_sqm))
        .bind(&record.link)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await?;

    let stored = listing_from_row(&row)?;
    tracing::debug!(id = stored.id, key = %record.dedup_key(), "upserted listing");
    Ok(stored)
}

/// Reconcile every record, counting rather than propagating per-record failures.
pub async fn upsert_batch(pool: &Pool<Sqlite>, records: &[ListingRecord]) -> UpsertSummary {
    let mut summary = UpsertSummary::default();

    for record in records {
        match upsert(pool, record).await {
            Ok(_) => summary.saved += 1,
            Err(e) => {
                tracing::warn!(
                    key = %record.dedup_key(),
                    link = %record.link,
                    "failed to save listing: {}",
                    e
                );
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        saved = summary.saved,
        failed = summary.failed,
        "reconciled {} listings",
        records.len()
    );
    summary
}

/// Get a listing by id.
pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<StoredListing>> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;

    row.as_ref().map(listing_from_row).transpose()
}

/// Overwrite every field of listing `id`. Returns `None` when no such row
/// exists.
///
/// # Errors
/// Returns `DatabaseError::Validation` for invalid records and
/// `DatabaseError::Conflict` when another row already holds the record's
/// natural key.
pub async fn update(
    pool: &Pool<Sqlite>,
    id: i64,
    record: &ListingRecord,
) -> Result<Option<StoredListing>> {
    validate(record)?;

    let sql = format!(
        "UPDATE listings
         SET title = ?, kind = ?, price = ?, city = ?, neighborhood = ?, bedroom_count = ?,
             parking_count = ?, bathroom_count = ?, area_sqm = ?, link = ?, updated_at = ?
         WHERE id = ?
         RETURNING {LISTING_COLUMNS}"
    );

    let row = sqlx::query(&sql)
        .bind(&record.title)
        .bind(&record.kind)
        .bind(record.price)
        .bind(&record.city)
        .bind(&record.neighborhood)
        .bind(i64::from(record.bedroom_count))
        .bind(i64::from(record.parking_count))
        .bind(i64::from(record.bathroom_count))
        .bind(i64::from(record.area_sqm))
        .bind(&record.link)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::Conflict(format!(
                    "another listing already has key {}",
                    record.dedup_key()
                ))
            }
            other => DatabaseError::Sqlx(other),
        })?;

    let stored = row.as_ref().map(listing_from_row).transpose()?;
    if stored.is_some() {
        tracing::debug!(id, key = %record.dedup_key(), "updated listing");
    }
    Ok(stored)
}

/// Page through listings in id order.
pub async fn list(pool: &Pool<Sqlite>, offset: u32, limit: u32) -> Result<Vec<StoredListing>> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY id LIMIT ? OFFSET ?");
    let rows = sqlx::query(&sql)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(pool)
        .await?;

    rows.iter().map(listing_from_row).collect()
}

/// Every stored listing, in id order.
pub async fn all(pool: &Pool<Sqlite>) -> Result<Vec<StoredListing>> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY id");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(listing_from_row).collect()
}

/// Total number of stored listings.
pub async fn count(pool: &Pool<Sqlite>) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM listings")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Delete one listing. Returns whether a row was removed.
pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every listing. Returns the number of rows removed.
pub async fn delete_all(pool: &Pool<Sqlite>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM listings").execute(pool).await?;
    tracing::info!("Deleted {} listings", result.rows_affected());
    Ok(result.rows_affected())
}

/// Listings matching every given criterion; no criteria returns everything.
pub async fn search(pool: &Pool<Sqlite>, params: &SearchParams) -> Result<Vec<StoredListing>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {LISTING_COLUMNS} FROM listings WHERE 1 = 1"));

    if let Some(city) = &params.city {
        query.push(" AND city = ").push_bind(city.as_str());
    }
    if let Some(neighborhood) = &params.neighborhood {
        query.push(" AND neighborhood = ").push_bind(neighborhood.as_str());
    }
    if let Some(min_price) = params.min_price {
        query.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = params.max_price {
        query.push(" AND price <= ").push_bind(max_price);
    }
    query.push(" ORDER BY id");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(listing_from_row).collect()
}

fn listing_from_row(row: &SqliteRow) -> Result<StoredListing> {
    let updated_at: String = row.try_get("updated_at")?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode(format!("invalid updated_at '{updated_at}': {e}")))?;

    Ok(StoredListing {
        id: row.try_get("id")?,
        record: ListingRecord {
            title: row.try_get("title")?,
            kind: row.try_get("kind")?,
            price: row.try_get("price")?,
            city: row.try_get("city")?,
            neighborhood: row.try_get("neighborhood")?,
            bedroom_count: row.try_get("bedroom_count")?,
            parking_count: row.try_get("parking_count")?,
            bathroom_count: row.try_get("bathroom_count")?,
            area_sqm: row.try_get("area_sqm")?,
            link: row.try_get("link")?,
        },
        updated_at,
    })
}
