use crate::state::AppState;
use anyhow::Result;
use miner_core::ExportFilter;
use miner_db::{listings, StoredListing};

/// Every stored listing passing `filter`. No survivors is an error naming the filters.
pub async fn export(state: &AppState, filter: &ExportFilter) -> Result<Vec<StoredListing>> {
    let stored = listings::all(state.db.pool()).await?;
    tracing::debug!(total = stored.len(), filters = %filter, "exporting listings");
    Ok(filter.apply(stored)?)
}

/// Filter built from the export command's flags.
pub fn build_filter(
    city: Option<String>,
    neighborhood: Option<String>,
    kind: Option<String>,
) -> ExportFilter {
    ExportFilter::new()
        .with_opt("city", city)
        .with_opt("neighborhood", neighborhood)
        .with_opt("kind", kind)
}
