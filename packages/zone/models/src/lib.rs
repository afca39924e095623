#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Risk zone types for the Jharia coalfield subsidence service.
//!
//! Defines the fixed [`RiskLevel`] classification, the bilingual
//! [`Localized`] text wrapper used for every user-facing string, and the
//! [`RiskZone`] record as persisted by the zone store. The
//! [`descriptor`] module maps a risk level to its display color and
//! advisory text.

pub mod descriptor;
pub mod geometry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use descriptor::RiskDescriptor;
pub use geometry::{GeometryError, KM_PER_DEGREE, Position, Ring, ZoneGeometry};

/// Highest valid [`RiskZone::risk_score`].
pub const MAX_RISK_SCORE: u8 = 100;

/// A pair of English and Hindi values.
///
/// Every user-facing string in the API is carried in both languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Localized<T> {
    /// English value.
    pub en: T,
    /// Hindi value.
    pub hi: T,
}

impl<T> Localized<T> {
    /// Creates a new bilingual pair.
    #[must_use]
    pub const fn new(en: T, hi: T) -> Self {
        Self { en, hi }
    }

    /// Applies `f` to both language values.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Localized<U> {
        Localized {
            en: f(self.en),
            hi: f(self.hi),
        }
    }
}

impl Localized<String> {
    /// Builds an owned pair from string slices.
    #[must_use]
    pub fn text(en: &str, hi: &str) -> Self {
        Self::new(en.to_string(), hi.to_string())
    }
}

impl Localized<&str> {
    /// Converts a borrowed pair into an owned one.
    #[must_use]
    pub fn to_owned_text(&self) -> Localized<String> {
        Localized::new(self.en.to_string(), self.hi.to_string())
    }
}

/// Qualitative subsidence risk classification of a zone.
///
/// The set is fixed. No ordering is implied beyond how the levels are
/// displayed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    /// Significant recorded ground movement; evacuation may be advised.
    Critical,
    /// Active subsidence requiring regular monitoring.
    High,
    /// Some subsidence activity detected.
    Moderate,
    /// Minimal subsidence activity.
    Low,
    /// No meaningful subsidence.
    Stable,
    /// Ground is rising slightly.
    Uplifting,
}

impl RiskLevel {
    /// Returns all risk levels in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Critical,
            Self::High,
            Self::Moderate,
            Self::Low,
            Self::Stable,
            Self::Uplifting,
        ]
    }

    /// Display color and advisory text for this level.
    #[must_use]
    pub const fn descriptor(self) -> RiskDescriptor {
        RiskDescriptor::for_level(self)
    }
}

/// Start and end of the observation window behind a zone's rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementPeriod {
    /// First observation.
    pub start: DateTime<Utc>,
    /// Last observation.
    pub end: DateTime<Utc>,
}

/// Ground displacement figures derived from satellite monitoring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsidenceData {
    /// Mean subsidence rate (mm/year).
    pub average_rate: Option<f64>,
    /// Peak subsidence rate (mm/year).
    pub max_rate: Option<f64>,
    /// Total displacement over the measurement period (mm).
    pub cumulative_displacement: Option<f64>,
    /// Observation window.
    pub measurement_period: Option<MeasurementPeriod>,
    /// Where the figures come from (e.g. "Sentinel-1 `PSInSAR`").
    pub data_source: Option<String>,
}

/// `PS-InSAR` processing quality figures for a zone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Psinsar {
    /// Interferometric coherence (0-1).
    pub coherence: Option<f64>,
    /// Standard deviation of the LOS velocity (mm/year).
    pub velocity_std_dev: Option<f64>,
    /// Temporal baseline (days).
    pub temporal_baseline: Option<f64>,
    /// Spatial baseline (m).
    pub spatial_baseline: Option<f64>,
}

/// Cross-reference from a risk zone to the closest safe area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestSafeZone {
    /// Identifier of the safe zone.
    pub zone_id: String,
    /// Distance in kilometres.
    pub distance: Option<f64>,
    /// Display name.
    pub name: Option<Localized<String>>,
}

/// A polygon-tagged subsidence risk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskZone {
    /// Unique identifier (e.g. `alkusa_critical_01`).
    pub zone_id: String,
    /// Display name.
    pub zone_name: Localized<String>,
    /// Zone outline.
    pub geometry: ZoneGeometry,
    /// Risk classification.
    pub risk_level: RiskLevel,
    /// Informational score, 0-100.
    pub risk_score: u8,
    /// Displacement figures.
    pub subsidence_data: Option<SubsidenceData>,
    /// `PS-InSAR` quality figures.
    pub psinsar: Option<Psinsar>,
    /// Longer description of the zone.
    pub description: Option<Localized<String>>,
    /// Affected area in square kilometres.
    pub affected_area: Option<f64>,
    /// Estimated number of residents.
    pub estimated_population: Option<u32>,
    /// Advice for residents, one entry per line.
    pub safety_recommendations: Option<Localized<Vec<String>>>,
    /// Closest safe area.
    pub nearest_safe_zone: Option<NearestSafeZone>,
    /// BCCL administrative area label (e.g. "Area VIII").
    pub bccl_area: Option<String>,
    /// Inactive zones are hidden from every query.
    pub is_active: bool,
    /// When the zone data was last refreshed.
    pub last_updated: Option<DateTime<Utc>>,
}

impl RiskZone {
    /// Checks the record invariants enforced by the zone store.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneValidationError`] if the id is empty, the score is
    /// above [`MAX_RISK_SCORE`], or the geometry is malformed.
    pub fn validate(&self) -> Result<(), ZoneValidationError> {
        if self.zone_id.trim().is_empty() {
            return Err(ZoneValidationError::EmptyZoneId);
        }
        if self.risk_score > MAX_RISK_SCORE {
            return Err(ZoneValidationError::RiskScoreOutOfRange {
                zone_id: self.zone_id.clone(),
                score: self.risk_score,
            });
        }
        self.geometry
            .validate()
            .map_err(|source| ZoneValidationError::Geometry {
                zone_id: self.zone_id.clone(),
                source,
            })
    }

    /// Display color and advisory text for this zone's level.
    #[must_use]
    pub const fn descriptor(&self) -> RiskDescriptor {
        self.risk_level.descriptor()
    }
}

/// A [`RiskZone`] that breaks a store invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneValidationError {
    /// `zone_id` is blank.
    EmptyZoneId,
    /// `risk_score` is above [`MAX_RISK_SCORE`].
    RiskScoreOutOfRange {
        /// Offending zone.
        zone_id: String,
        /// The rejected score.
        score: u8,
    },
    /// The outline is malformed.
    Geometry {
        /// Offending zone.
        zone_id: String,
        /// What is wrong with it.
        source: GeometryError,
    },
}

impl std::fmt::Display for ZoneValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyZoneId => write!(f, "zone id must not be empty"),
            Self::RiskScoreOutOfRange { zone_id, score } => write!(
                f,
                "zone {zone_id}: risk score {score} out of range 0-{MAX_RISK_SCORE}"
            ),
            Self::Geometry { zone_id, source } => write!(f, "zone {zone_id}: {source}"),
        }
    }
}

impl std::error::Error for ZoneValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Geometry { source, .. } => Some(source),
            _ => None,
        }
    }
}
