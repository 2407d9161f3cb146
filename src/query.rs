//! Query parameter construction for the `{service}/{layer}/query` endpoint
//!
//! Two request shapes exist:
//! - **Count**: `f=json&returnCountOnly=true`, answered with `{"count": N}`
//! - **Page**: `f=geojson` with `resultOffset`/`resultRecordCount`, answered
//!   with a GeoJSON feature collection
//!
//! Both filter unconditionally (`where=1=1`) and spatially by intersection with
//! the run's envelope.

use crate::error::Result;
use crate::types::{Envelope, WGS84_WKID};

/// A single query against one layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerQuery<'a> {
    /// Count-only query
    Count {
        /// Spatial filter
        envelope: &'a Envelope,
    },
    /// One page of features
    Page {
        /// Spatial filter
        envelope: &'a Envelope,
        /// Zero-based record offset
        offset: u64,
        /// Records requested
        page_size: u32,
    },
}

impl<'a> LayerQuery<'a> {
    /// Count-only query for an envelope
    pub fn count(envelope: &'a Envelope) -> Self {
        LayerQuery::Count { envelope }
    }

    /// Page query starting at `offset`
    pub fn page(envelope: &'a Envelope, offset: u64, page_size: u32) -> Self {
        LayerQuery::Page {
            envelope,
            offset,
            page_size,
        }
    }

    fn envelope(&self) -> &Envelope {
        match self {
            LayerQuery::Count { envelope } | LayerQuery::Page { envelope, .. } => envelope,
        }
    }

    /// Query-string parameters, credential excluded
    pub fn params(&self) -> Result<Vec<(&'static str, String)>> {
        let envelope = self.envelope();
        let format = match self {
            LayerQuery::Count { .. } => "json",
            LayerQuery::Page { .. } => "geojson",
        };

        let mut params = vec![
            ("f", format.to_string()),
            ("where", "1=1".to_string()),
            ("geometry", serde_json::to_string(envelope)?),
            ("geometryType", "esriGeometryEnvelope".to_string()),
            ("inSR", envelope.spatial_reference.wkid.to_string()),
            ("spatialRel", "esriSpatialRelIntersects".to_string()),
        ];

        match *self {
            LayerQuery::Count { .. } => {
                params.push(("returnCountOnly", "true".to_string()));
            }
            LayerQuery::Page {
                offset, page_size, ..
            } => {
                params.extend([
                    ("outSR", WGS84_WKID.to_string()),
                    ("outFields", "*".to_string()),
                    ("returnGeometry", "true".to_string()),
                    ("resultOffset", offset.to_string()),
                    ("resultRecordCount", page_size.to_string()),
                ]);
            }
        }

        Ok(params)
    }
}
