use crate::state::AppState;
use anyhow::{bail, Context, Result};
use miner_core::ListingRecord;
use miner_db::{listings, SearchParams, StoredListing};
use std::path::Path;

pub async fn list(state: &AppState, offset: u32, limit: u32) -> Result<Vec<StoredListing>> {
    Ok(listings::list(state.db.pool(), offset, limit).await?)
}

pub async fn get(state: &AppState, id: i64) -> Result<StoredListing> {
    listings::get(state.db.pool(), id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("listing not found: {id}"))
}

/// Replace every field of listing `id`.
pub async fn update(state: &AppState, id: i64, record: &ListingRecord) -> Result<StoredListing> {
    listings::update(state.db.pool(), id, record)
        .await?
        .ok_or_else(|| anyhow::anyhow!("listing not found: {id}"))
}

/// Load a listing record from a JSON file.
pub fn read_record(path: &Path) -> Result<ListingRecord> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid listing record in {}", path.display()))
}

pub async fn count(state: &AppState) -> Result<i64> {
    Ok(listings::count(state.db.pool()).await?)
}

pub async fn search(state: &AppState, params: &SearchParams) -> Result<Vec<StoredListing>> {
    if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
        if min > max {
            bail!("--min-price ({min}) is greater than --max-price ({max})");
        }
    }
    Ok(listings::search(state.db.pool(), params).await?)
}

pub async fn delete(state: &AppState, id: i64) -> Result<()> {
    if !listings::delete(state.db.pool(), id).await? {
        bail!("listing not found: {id}");
    }
    Ok(())
}

/// Remove every listing, returning how many were deleted.
pub async fn purge(state: &AppState, confirmed: bool) -> Result<u64> {
    if !confirmed {
        bail!("refusing to purge without --yes");
    }
    Ok(listings::delete_all(state.db.pool()).await?)
}
