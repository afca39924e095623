//! Builds response payloads from stored zones.
//!
//! Everything here is pure: handlers fetch active zones, then hand them
//! to these functions to shape the JSON body.

use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, JsonObject};
use jharia_watch_server_models::{
    CheckedLocation, NearestRiskZone, RiskAssessment, RiskCheckResponse, RiskLevelCounts,
    RiskStatistics, ZoneCollectionMetadata, ZoneFeatureProperties, ZoneSummary,
};
use jharia_watch_spatial::{ZoneIndex, to_geojson_geometry};
use jharia_watch_zone_models::{RiskLevel, RiskZone};

/// Score reported for points outside every zone.
pub const OUTSIDE_ZONE_SCORE: u8 = 15;

/// Unit of [`NearestRiskZone::distance`].
pub const DISTANCE_UNIT: &str = "km";

/// Assesses the risk at a point.
///
/// A containing zone yields its own level, score and attributes. A miss
/// falls back to the stable advisory with the nearest zone attached, if
/// any zone exists at all.
#[must_use]
pub fn assess(index: &ZoneIndex, lat: f64, lng: f64) -> RiskCheckResponse {
    let location = CheckedLocation {
        coordinates: [lng, lat],
        lat,
        lng,
    };

    if let Some(zone) = index.containing(lat, lng) {
        let descriptor = zone.descriptor();
        return RiskCheckResponse {
            location,
            risk_assessment: RiskAssessment {
                is_in_risk_zone: true,
                risk_level: zone.risk_level,
                risk_score: zone.risk_score,
                risk_description: descriptor.description.to_owned_text(),
                zone: Some(ZoneSummary::from(zone)),
                subsidence_data: zone.subsidence_data.clone(),
                psinsar: zone.psinsar.clone(),
                nearest_risk_zone: None,
            },
            safety_recommendations: zone.safety_recommendations.clone(),
            nearest_safe_zone: zone.nearest_safe_zone.clone(),
            color: descriptor.color.to_string(),
        };
    }

    let descriptor = RiskLevel::Stable.descriptor();
    let nearest_risk_zone = index.nearest(lat, lng).map(|nearest| NearestRiskZone {
        zone_id: nearest.zone.zone_id.clone(),
        zone_name: nearest.zone.zone_name.clone(),
        risk_level: nearest.zone.risk_level,
        distance: nearest.distance_km,
        unit: DISTANCE_UNIT.to_string(),
    });

    RiskCheckResponse {
        location,
        risk_assessment: RiskAssessment {
            is_in_risk_zone: false,
            risk_level: RiskLevel::Stable,
            risk_score: OUTSIDE_ZONE_SCORE,
            risk_description: descriptor.description.to_owned_text(),
            zone: None,
            subsidence_data: None,
            psinsar: None,
            nearest_risk_zone,
        },
        safety_recommendations: None,
        nearest_safe_zone: None,
        color: descriptor.color.to_string(),
    }
}

/// Aggregates counts, areas, population and rates over `zones`.
///
/// Missing figures count as zero. With no zones the rates are `0`.
#[must_use]
pub fn statistics(zones: &[RiskZone]) -> RiskStatistics {
    let by_risk_level = RiskLevelCounts::from_levels(zones.iter().map(|z| z.risk_level));

    let total_affected_area: f64 = zones.iter().filter_map(|z| z.affected_area).sum();
    let total_population_at_risk: u64 = zones
        .iter()
        .filter_map(|z| z.estimated_population)
        .map(u64::from)
        .sum();

    let max_rate = |z: &RiskZone| z.subsidence_data.as_ref().and_then(|s| s.max_rate);
    let average_rate = |z: &RiskZone| z.subsidence_data.as_ref().and_then(|s| s.average_rate);

    let max_subsidence_rate = zones
        .iter()
        .map(|z| max_rate(z).unwrap_or(0.0))
        .reduce(f64::max)
        .unwrap_or(0.0);

    let avg_subsidence_rate = if zones.is_empty() {
        0.0
    } else {
        let total: f64 = zones.iter().filter_map(average_rate).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = zones.len() as f64;
        total / count
    };

    RiskStatistics {
        total_zones: zones.len(),
        by_risk_level,
        total_affected_area,
        total_population_at_risk,
        max_subsidence_rate,
        avg_subsidence_rate,
    }
}

/// Renders zones as a `GeoJSON` `FeatureCollection` with a `metadata`
/// member summarising the selection.
///
/// # Errors
///
/// Returns an error if feature properties fail to serialize.
pub fn zone_collection(
    zones: &[&RiskZone],
    generated_at: DateTime<Utc>,
) -> Result<FeatureCollection, serde_json::Error> {
    let features = zones
        .iter()
        .map(|zone| zone_feature(zone))
        .collect::<Result<Vec<_>, _>>()?;

    let metadata = ZoneCollectionMetadata::for_zones(zones.iter().copied(), generated_at);
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("metadata".to_string(), serde_json::to_value(metadata)?);

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    })
}

fn zone_feature(zone: &RiskZone) -> Result<Feature, serde_json::Error> {
    let properties = match serde_json::to_value(ZoneFeatureProperties::from(zone))? {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(to_geojson_geometry(&zone.geometry)),
        id: None,
        properties,
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use jharia_watch_database::seed::fixture_zones;

    use super::*;

    fn jharia() -> ZoneIndex {
        ZoneIndex::new(fixture_zones(Utc::now()))
    }

    #[test]
    fn point_inside_alkusa_is_critical() {
        let response = assess(&jharia(), 23.767, 86.396);
        let assessment = &response.risk_assessment;

        assert!(assessment.is_in_risk_zone);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.risk_score, 95);
        assert_eq!(
            assessment.zone.as_ref().unwrap().zone_id,
            "alkusa_critical_01"
        );
        assert!(assessment.nearest_risk_zone.is_none());
        assert_eq!(response.color, "#dc2626");
        assert_eq!(response.location.coordinates, [86.396, 23.767]);
        assert_eq!(
            response.nearest_safe_zone.as_ref().unwrap().zone_id,
            "dhanbad_safe_01"
        );
        assert_eq!(response.safety_recommendations.unwrap().en.len(), 4);
    }

    #[test]
    fn far_point_falls_back_to_stable_with_nearest_zone() {
        let response = assess(&jharia(), 23.90, 86.60);
        let assessment = &response.risk_assessment;

        assert!(!assessment.is_in_risk_zone);
        assert_eq!(assessment.risk_level, RiskLevel::Stable);
        assert_eq!(assessment.risk_score, OUTSIDE_ZONE_SCORE);
        assert!(assessment.zone.is_none());
        assert_eq!(response.color, "#16a34a");
        assert_eq!(
            assessment.risk_description,
            RiskLevel::Stable.descriptor().description.to_owned_text()
        );

        let nearest = assessment.nearest_risk_zone.as_ref().unwrap();
        assert_eq!(nearest.zone_id, "bera_dobari_high_01");
        assert_eq!(nearest.risk_level, RiskLevel::High);
        assert!((nearest.distance - 24.3).abs() < 1e-9);
        assert_eq!(nearest.unit, "km");
    }

    #[test]
    fn miss_with_no_zones_has_no_nearest() {
        let response = assess(&ZoneIndex::new(Vec::new()), 23.8, 86.4);
        assert!(!response.risk_assessment.is_in_risk_zone);
        assert!(response.risk_assessment.nearest_risk_zone.is_none());
    }

    #[test]
    fn statistics_over_fixtures() {
        let stats = statistics(&fixture_zones(Utc::now()));

        assert_eq!(stats.total_zones, 10);
        assert_eq!(stats.by_risk_level.critical, 3);
        assert_eq!(stats.by_risk_level.high, 3);
        assert_eq!(stats.by_risk_level.moderate, 3);
        assert_eq!(stats.by_risk_level.low, 1);
        assert_eq!(stats.by_risk_level.uplifting, 0);
        assert_eq!(stats.total_population_at_risk, 47_500);
        assert!((stats.total_affected_area - 4.34).abs() < 1e-9);
        assert!((stats.max_subsidence_rate - 29.0).abs() < 1e-9);
        assert!((stats.avg_subsidence_rate - 13.7).abs() < 1e-9);
    }

    #[test]
    fn statistics_over_nothing_are_zero() {
        let stats = statistics(&[]);
        assert_eq!(stats.total_zones, 0);
        assert!(stats.max_subsidence_rate.abs() < f64::EPSILON);
        assert!(stats.avg_subsidence_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn collection_carries_properties_and_metadata() {
        let zones = fixture_zones(Utc::now());
        let selected: Vec<&RiskZone> = zones.iter().collect();
        let collection = zone_collection(&selected, Utc::now()).unwrap();

        assert_eq!(collection.features.len(), 10);
        let metadata = &collection.foreign_members.as_ref().unwrap()["metadata"];
        assert_eq!(metadata["totalZones"], 10);
        assert_eq!(metadata["criticalZones"], 3);
        assert_eq!(metadata["highZones"], 3);
        assert_eq!(metadata["moderateZones"], 3);

        let alkusa = collection
            .features
            .iter()
            .find(|f| f.properties.as_ref().unwrap()["zoneId"] == "alkusa_critical_01")
            .unwrap();
        let props = alkusa.properties.as_ref().unwrap();
        assert_eq!(props["color"], "#dc2626");
        assert_eq!(props["subsidenceRate"], 27.0);
        assert_eq!(props["bcclArea"], "Area VIII");
        assert!(alkusa.geometry.is_some());
    }
}
