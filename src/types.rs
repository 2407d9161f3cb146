//! Core types for msil-extract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Spatial reference identifier for WGS84
pub const WGS84_WKID: u32 = 4326;

/// Spatial reference of an [`Envelope`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    /// Well-known ID (e.g., 4326)
    pub wkid: u32,
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self { wkid: WGS84_WKID }
    }
}

/// Axis-aligned bounding box used as the spatial filter for every page of a run
///
/// Serializes to the ArcGIS envelope JSON the `geometry` query parameter expects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Western bound
    pub xmin: f64,
    /// Southern bound
    pub ymin: f64,
    /// Eastern bound
    pub xmax: f64,
    /// Northern bound
    pub ymax: f64,
    /// Coordinate reference system of the bounds
    #[serde(rename = "spatialReference", default)]
    pub spatial_reference: SpatialReference,
}

impl Envelope {
    /// Create a WGS84 envelope
    pub fn wgs84(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            spatial_reference: SpatialReference::default(),
        }
    }

    /// Whether the bounds describe a non-empty rectangle
    pub fn is_valid(&self) -> bool {
        [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite())
            && self.xmin < self.xmax
            && self.ymin < self.ymax
    }
}

/// Default extraction area: Japan and surrounding waters, generously padded
impl Default for Envelope {
    fn default() -> Self {
        Self::wgs84(100.0, -10.0, 170.0, 60.0)
    }
}

/// One queryable layer on the remote service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerRef {
    /// Service base URL (e.g., `https://api.msil.go.jp/island/v2/MapServer`)
    pub service_base: String,
    /// Layer index within the service
    pub layer: u32,
}

impl LayerRef {
    /// Create a new layer reference
    pub fn new(service_base: impl Into<String>, layer: u32) -> Self {
        Self {
            service_base: service_base.into(),
            layer,
        }
    }

    /// The layer's query endpoint: `{service_base}/{layer}/query`
    pub fn query_url(&self) -> String {
        format!("{}/{}/query", self.service_base.trim_end_matches('/'), self.layer)
    }
}

impl std::fmt::Display for LayerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} LAYER {}", self.service_base, self.layer)
    }
}

/// A GeoJSON feature, kept as the raw object the service returned
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(pub Map<String, Value>);

impl Feature {
    /// The feature's `properties` object, if present
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    /// Look up a single property value
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties().and_then(|p| p.get(key))
    }

    /// Insert or replace a property, creating `properties` when it is absent or null
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let props = self
            .0
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if !props.is_object() {
            *props = Value::Object(Map::new());
        }
        if let Value::Object(map) = props {
            map.insert(key.into(), value.into());
        }
    }
}

impl From<Map<String, Value>> for Feature {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Type tag of a [`FeatureCollection`]; GeoJSON only defines one value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    /// `"FeatureCollection"`
    #[default]
    FeatureCollection,
}

/// Ordered GeoJSON feature collection
///
/// No deduplication is ever performed: features appear in the order their
/// pages were received.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `"FeatureCollection"`
    #[serde(rename = "type", default)]
    pub kind: CollectionKind,
    /// Features in first-seen order
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection has no features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Append features, preserving their order
    pub fn extend(&mut self, features: impl IntoIterator<Item = Feature>) {
        self.features.extend(features);
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionKind::FeatureCollection,
            features,
        }
    }
}

/// Expected vs. actual feature counts for one data set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Count reported by the count-only query
    pub expected: u64,
    /// Features actually fetched by pagination
    pub actual: u64,
}

impl VerificationOutcome {
    /// Whether every expected feature was fetched
    pub fn is_match(&self) -> bool {
        self.expected == self.actual
    }

    /// Expected minus actual (positive when features are missing)
    ///
    /// Saturates at `i64::MAX` / `i64::MIN`.
    pub fn shortfall(&self) -> i64 {
        if self.expected >= self.actual {
            i64::try_from(self.expected - self.actual).unwrap_or(i64::MAX)
        } else {
            i64::try_from(self.actual - self.expected).map_or(i64::MIN, |d| -d)
        }
    }
}

/// Result of one count-verified fetch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetReport {
    /// Data set name
    pub name: String,
    /// File the collection was written to
    pub output: PathBuf,
    /// Count comparison
    pub verification: VerificationOutcome,
}

/// The combined depth-contour output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergedOutput {
    /// File the merged collection was written to
    pub path: PathBuf,
    /// Number of features in the merged collection
    pub features: u64,
}

/// Summary of a complete extraction run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// One report per data set, in run order (contour layers included)
    pub datasets: Vec<DatasetReport>,
    /// Merged contour output, if the plan has a contour group
    pub merged: Option<MergedOutput>,
}

impl RunSummary {
    /// Reports whose counts did not match
    pub fn mismatches(&self) -> impl Iterator<Item = &DatasetReport> {
        self.datasets.iter().filter(|r| !r.verification.is_match())
    }

    /// Whether every data set's counts matched
    pub fn all_verified(&self) -> bool {
        self.mismatches().next().is_none()
    }
}

/// Event emitted during an extraction run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A data set fetch is starting
    DatasetStarted {
        /// Data set name
        name: String,
        /// Layer being fetched
        layer: LayerRef,
    },

    /// The count-only query answered
    ExpectedCount {
        /// Data set name
        name: String,
        /// Reported count
        expected: u64,
    },

    /// One page was received
    PageFetched {
        /// Data set name
        name: String,
        /// Layer being fetched
        layer: LayerRef,
        /// Offset of this page
        offset: u64,
        /// Features in this page
        fetched: u64,
        /// Features accumulated so far, this page included
        total: u64,
        /// The service's `exceededTransferLimit` hint, when present
        #[serde(skip_serializing_if = "Option::is_none")]
        exceeded_transfer_limit: Option<bool>,
    },

    /// A collection was written to disk
    Saved {
        /// Output file
        path: PathBuf,
        /// Number of features written
        features: u64,
    },

    /// Expected and actual counts were compared
    Verified {
        /// Data set name
        name: String,
        /// Count reported by the service
        expected: u64,
        /// Count actually fetched
        actual: u64,
        /// Whether the counts agree
        matched: bool,
    },

    /// All data sets finished
    RunComplete {
        /// Number of data sets fetched
        datasets: usize,
        /// Number of data sets whose counts did not match
        mismatches: usize,
    },
}
