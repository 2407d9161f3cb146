//! GeoJSON collection persistence
//!
//! Collections are written as a single UTF-8 JSON document; non-ASCII text is
//! stored verbatim, never `\u`-escaped. Writes overwrite in place and are not
//! atomic.

use crate::error::Result;
use crate::types::FeatureCollection;
use std::path::Path;

/// Write a collection to `path`, creating parent directories as needed
pub async fn save_collection(path: &Path, collection: &FeatureCollection) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec(collection)?;
    tokio::fs::write(path, bytes).await?;

    tracing::info!(
        path = %path.display(),
        features = collection.len(),
        "Saved collection"
    );
    Ok(())
}

/// Read a collection previously written by [`save_collection`]
pub async fn load_collection(path: &Path) -> Result<FeatureCollection> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
