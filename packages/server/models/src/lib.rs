#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the `JhariaWatch` risk server.
//!
//! Every response is wrapped in an [`ApiResponse`] envelope. Failures
//! carry an [`ApiError`] with a symbolic [`ErrorCode`] and a bilingual
//! message. These types are separate from the stored [`RiskZone`] so the
//! API contract can evolve on its own.

use chrono::{DateTime, Utc};
use jharia_watch_zone_models::{
    Localized, NearestSafeZone, Psinsar, RiskLevel, RiskZone, SubsidenceData,
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The `{success, data?, error?}` wrapper around every response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful payload.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Wraps a failure.
    #[must_use]
    pub const fn failure(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Symbolic error codes returned to clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A required query parameter was absent or empty.
    MissingParams,
    /// A query parameter was present but malformed or out of range.
    InvalidParams,
    /// The requested zone or route does not exist.
    NotFound,
    /// The store failed. Details are logged, never returned.
    ServerError,
    /// The client exceeded its request allowance for the current window.
    RateLimited,
}

/// A failure with a bilingual, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Message in English and Hindi.
    pub message: Localized<String>,
}

impl ApiError {
    /// Builds an error from a code and its English and Hindi messages.
    #[must_use]
    pub fn new(code: ErrorCode, en: &str, hi: &str) -> Self {
        Self {
            code,
            message: Localized::text(en, hi),
        }
    }

    /// `lat` or `lng` was absent or empty.
    #[must_use]
    pub fn missing_coordinates() -> Self {
        Self::new(
            ErrorCode::MissingParams,
            "Latitude and longitude required",
            "अक्षांश और देशांतर आवश्यक है",
        )
    }

    /// `lat` or `lng` was not a finite number within range.
    #[must_use]
    pub fn invalid_coordinates() -> Self {
        Self::new(
            ErrorCode::InvalidParams,
            "Latitude must be between -90 and 90 and longitude between -180 and 180",
            "अक्षांश -90 से 90 और देशांतर -180 से 180 के बीच होना चाहिए",
        )
    }

    /// `bounds` was not four ordered, finite numbers.
    #[must_use]
    pub fn invalid_bounds() -> Self {
        Self::new(
            ErrorCode::InvalidParams,
            "Bounds must be minLng,minLat,maxLng,maxLat",
            "सीमाएँ minLng,minLat,maxLng,maxLat प्रारूप में होनी चाहिए",
        )
    }

    /// No active zone has the requested id.
    #[must_use]
    pub fn zone_not_found() -> Self {
        Self::new(ErrorCode::NotFound, "Zone not found", "ज़ोन नहीं मिला")
    }

    /// No route matched the request path.
    #[must_use]
    pub fn route_not_found() -> Self {
        Self::new(ErrorCode::NotFound, "Route not found", "रूट नहीं मिला")
    }

    /// A store failure, with a message naming what the request was doing.
    #[must_use]
    pub fn server_error(en: &str, hi: &str) -> Self {
        Self::new(ErrorCode::ServerError, en, hi)
    }

    /// The client sent too many requests in the current window.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self::new(
            ErrorCode::RateLimited,
            "Too many requests",
            "बहुत सारे अनुरोध",
        )
    }
}

/// Query parameters for `GET /api/risk/check`.
///
/// Kept as raw strings so absent, empty and malformed values can be
/// reported with different codes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskCheckQueryParams {
    /// Latitude in decimal degrees.
    pub lat: Option<String>,
    /// Longitude in decimal degrees.
    pub lng: Option<String>,
}

/// Query parameters for `GET /api/risk/zones`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneQueryParams {
    /// Restrict to one risk level.
    pub risk_level: Option<String>,
    /// Bounding box as `minLng,minLat,maxLng,maxLat`.
    pub bounds: Option<String>,
}

/// The point that was assessed, echoed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckedLocation {
    /// `[lng, lat]`, `GeoJSON` order.
    pub coordinates: [f64; 2],
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// Identity and classification of the zone containing the point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    /// Zone identifier.
    pub zone_id: String,
    /// Bilingual zone name.
    pub zone_name: Localized<String>,
    /// The zone's classification.
    pub risk_level: RiskLevel,
    /// Informational score (0-100).
    pub risk_score: u8,
}

impl From<&RiskZone> for ZoneSummary {
    fn from(zone: &RiskZone) -> Self {
        Self {
            zone_id: zone.zone_id.clone(),
            zone_name: zone.zone_name.clone(),
            risk_level: zone.risk_level,
            risk_score: zone.risk_score,
        }
    }
}

/// Closest zone by centroid distance, reported when the point is in no
/// zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestRiskZone {
    /// Zone identifier.
    pub zone_id: String,
    /// Bilingual zone name.
    pub zone_name: Localized<String>,
    /// The zone's classification.
    pub risk_level: RiskLevel,
    /// Rounded to one decimal place.
    pub distance: f64,
    /// Always `"km"`.
    pub unit: String,
}

/// Risk verdict for a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Whether an active zone contains the point.
    pub is_in_risk_zone: bool,
    /// Level of the containing zone, or `stable` on a miss.
    pub risk_level: RiskLevel,
    /// Score of the containing zone, or `15` on a miss.
    pub risk_score: u8,
    /// Advisory text for [`Self::risk_level`].
    pub risk_description: Localized<String>,
    /// The containing zone, on a hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneSummary>,
    /// Displacement figures of the containing zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsidence_data: Option<SubsidenceData>,
    /// `PSInSAR` quality metrics of the containing zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psinsar: Option<Psinsar>,
    /// Closest zone, on a miss.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_risk_zone: Option<NearestRiskZone>,
}

/// Response body for `GET /api/risk/check`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCheckResponse {
    /// The assessed point.
    pub location: CheckedLocation,
    /// The verdict.
    pub risk_assessment: RiskAssessment,
    /// Advice for residents of the containing zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_recommendations: Option<Localized<Vec<String>>>,
    /// Suggested refuge for the containing zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_safe_zone: Option<NearestSafeZone>,
    /// Display color for the assessed level.
    pub color: String,
}

/// `properties` of one feature in the zone listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneFeatureProperties {
    /// Zone identifier.
    pub zone_id: String,
    /// Bilingual zone name.
    pub zone_name: Localized<String>,
    /// The zone's classification.
    pub risk_level: RiskLevel,
    /// Informational score (0-100).
    pub risk_score: u8,
    /// Average subsidence rate (mm/year).
    pub subsidence_rate: Option<f64>,
    /// Peak subsidence rate (mm/year).
    pub max_rate: Option<f64>,
    /// Total displacement over the measurement period (mm).
    pub cumulative_displacement: Option<f64>,
    /// Bilingual zone description.
    pub description: Option<Localized<String>>,
    /// Display color for the zone's level.
    pub color: String,
    /// Affected area (km²).
    pub affected_area: Option<f64>,
    /// Estimated number of residents.
    pub estimated_population: Option<u32>,
    /// BCCL administrative area label.
    pub bccl_area: Option<String>,
    /// `PSInSAR` quality metrics.
    pub psinsar: Option<Psinsar>,
}

impl From<&RiskZone> for ZoneFeatureProperties {
    fn from(zone: &RiskZone) -> Self {
        let subsidence = zone.subsidence_data.as_ref();
        Self {
            zone_id: zone.zone_id.clone(),
            zone_name: zone.zone_name.clone(),
            risk_level: zone.risk_level,
            risk_score: zone.risk_score,
            subsidence_rate: subsidence.and_then(|s| s.average_rate),
            max_rate: subsidence.and_then(|s| s.max_rate),
            cumulative_displacement: subsidence.and_then(|s| s.cumulative_displacement),
            description: zone.description.clone(),
            color: zone.descriptor().color.to_string(),
            affected_area: zone.affected_area,
            estimated_population: zone.estimated_population,
            bccl_area: zone.bccl_area.clone(),
            psinsar: zone.psinsar.clone(),
        }
    }
}

/// Summary attached to the zone listing as a `metadata` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCollectionMetadata {
    /// Number of features in the listing.
    pub total_zones: usize,
    /// Features at `critical`.
    pub critical_zones: usize,
    /// Features at `high`.
    pub high_zones: usize,
    /// Features at `moderate`.
    pub moderate_zones: usize,
    /// When the listing was produced.
    pub last_updated: DateTime<Utc>,
}

impl ZoneCollectionMetadata {
    /// Counts the listed zones, stamping the summary with `last_updated`.
    #[must_use]
    pub fn for_zones<'a>(
        zones: impl IntoIterator<Item = &'a RiskZone>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let counts = RiskLevelCounts::from_levels(zones.into_iter().map(|z| z.risk_level));
        Self {
            total_zones: counts.total(),
            critical_zones: counts.critical,
            high_zones: counts.high,
            moderate_zones: counts.moderate,
            last_updated,
        }
    }
}

/// Response body for `GET /api/risk/zones/{zoneId}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDetailResponse {
    /// The full zone record.
    pub zone: RiskZone,
    /// Display color for the zone's level.
    pub color: String,
}

/// Active zone count per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskLevelCounts {
    /// Zones at `critical`.
    pub critical: usize,
    /// Zones at `high`.
    pub high: usize,
    /// Zones at `moderate`.
    pub moderate: usize,
    /// Zones at `low`.
    pub low: usize,
    /// Zones at `stable`.
    pub stable: usize,
    /// Zones at `uplifting`.
    pub uplifting: usize,
}

impl RiskLevelCounts {
    /// Tallies each level in `levels`.
    #[must_use]
    pub fn from_levels(levels: impl IntoIterator<Item = RiskLevel>) -> Self {
        let mut counts = Self::default();
        for level in levels {
            let slot = match level {
                RiskLevel::Critical => &mut counts.critical,
                RiskLevel::High => &mut counts.high,
                RiskLevel::Moderate => &mut counts.moderate,
                RiskLevel::Low => &mut counts.low,
                RiskLevel::Stable => &mut counts.stable,
                RiskLevel::Uplifting => &mut counts.uplifting,
            };
            *slot += 1;
        }
        counts
    }

    /// Sum across every level.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low + self.stable + self.uplifting
    }
}

/// Response body for `GET /api/risk/statistics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStatistics {
    /// Number of active zones.
    pub total_zones: usize,
    /// Active zones per level.
    pub by_risk_level: RiskLevelCounts,
    /// Sum of affected areas (km²).
    pub total_affected_area: f64,
    /// Sum of estimated residents.
    pub total_population_at_risk: u64,
    /// Highest `maxRate` across zones, `0` when there are none.
    pub max_subsidence_rate: f64,
    /// Mean `averageRate` across zones, `0` when there are none.
    pub avg_subsidence_rate: f64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `"healthy"` while the process can answer.
    pub status: String,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started.
    pub uptime: f64,
    /// `"connected"` when the store answered, `"disconnected"` otherwise.
    pub database: String,
    /// Service version.
    pub version: String,
}
