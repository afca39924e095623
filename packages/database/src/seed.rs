//! Baseline Jharia coalfield risk zones.
//!
//! Each fixture is a square around a surveyed center. Figures come from
//! the 2018-2021 Sentinel-1 `PSInSAR` analysis of the coalfield.

use chrono::{DateTime, NaiveDate, Utc};
use jharia_watch_zone_models::{
    Localized, MeasurementPeriod, NearestSafeZone, Psinsar, RiskLevel, RiskZone, SubsidenceData,
    ZoneGeometry,
};
use switchy_database::Database;

use crate::{DbError, queries};

struct Fixture {
    zone_id: &'static str,
    name: (&'static str, &'static str),
    center: (f64, f64),
    size_km: f64,
    risk_level: RiskLevel,
    risk_score: u8,
    /// Average, max, and cumulative displacement.
    rates: (f64, f64, f64),
    data_source: &'static str,
    /// Coherence, velocity std-dev, temporal and spatial baselines.
    psinsar: (f64, f64, f64, f64),
    description: (&'static str, &'static str),
    affected_area: f64,
    estimated_population: u32,
    safety: Option<(&'static [&'static str], &'static [&'static str])>,
    nearest_safe_zone: Option<(&'static str, f64, &'static str, &'static str)>,
    bccl_area: &'static str,
}

const PSINSAR_SOURCE: &str = "Sentinel-1 PSInSAR";

const FIXTURES: &[Fixture] = &[
    Fixture {
        zone_id: "alkusa_critical_01",
        name: (
            "Alkusa Critical Zone - East of Shankar Road",
            "अल्कुसा क्रिटिकल ज़ोन - शंकर रोड के पूर्व",
        ),
        center: (23.767, 86.396),
        size_km: 0.5,
        risk_level: RiskLevel::Critical,
        risk_score: 95,
        rates: (27.0, 29.0, 90.0),
        data_source: "Sentinel-1 PSInSAR (2018-2021)",
        psinsar: (0.85, 2.1, 1095.0, 120.0),
        description: (
            "Critical subsidence zone over Alkusa opencast mine overburden dump. PSInSAR analysis shows maximum LOS velocity of -29 mm/year. High risk of sudden ground collapse.",
            "अल्कुसा ओपनकास्ट खदान के ऊपर क्रिटिकल धंसाव क्षेत्र। PSInSAR विश्लेषण -29 मिमी/वर्ष की अधिकतम LOS वेग दर्शाता है।",
        ),
        affected_area: 0.44,
        estimated_population: 5000,
        safety: Some((
            &[
                "Avoid staying in this area if possible",
                "Regular building inspection required every 3 months",
                "Keep emergency evacuation kit ready",
                "Report any new cracks immediately via app",
            ],
            &[
                "यदि संभव हो तो इस क्षेत्र में रहने से बचें",
                "हर 3 महीने में नियमित भवन निरीक्षण आवश्यक",
                "आपातकालीन निकासी किट तैयार रखें",
                "ऐप के माध्यम से किसी भी नई दरार की तुरंत रिपोर्ट करें",
            ],
        )),
        nearest_safe_zone: Some((
            "dhanbad_safe_01",
            5.2,
            "Dhanbad City Center",
            "धनबाद शहर केंद्र",
        )),
        bccl_area: "Area VIII",
    },
    Fixture {
        zone_id: "ena_critical_01",
        name: ("Ena Colliery Critical Zone", "एना कोलियरी क्रिटिकल ज़ोन"),
        center: (23.758, 86.401),
        size_km: 0.4,
        risk_level: RiskLevel::Critical,
        risk_score: 90,
        rates: (28.0, 28.0, 85.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.82, 2.5, 1095.0, 115.0),
        description: (
            "Critical zone near Ena Colliery with active subsidence. Multiple PS points showing consistent downward movement.",
            "एना कोलियरी के पास सक्रिय धंसाव वाला क्रिटिकल ज़ोन। कई PS बिंदु लगातार नीचे की ओर गति दिखा रहे हैं।",
        ),
        affected_area: 0.35,
        estimated_population: 3500,
        safety: Some((
            &[
                "Evacuate if building shows cracks",
                "Avoid heavy construction work",
                "Report ground subsidence immediately",
            ],
            &[
                "यदि भवन में दरारें दिखें तो निकासी करें",
                "भारी निर्माण कार्य से बचें",
                "जमीन धंसने की तुरंत रिपोर्ट करें",
            ],
        )),
        nearest_safe_zone: None,
        bccl_area: "Area VIII",
    },
    Fixture {
        zone_id: "tisra_critical_01",
        name: (
            "Tisra - Jayrampur Critical Zone",
            "तिसरा - जयरामपुर क्रिटिकल ज़ोन",
        ),
        center: (23.715, 86.434),
        size_km: 0.45,
        risk_level: RiskLevel::Critical,
        risk_score: 88,
        rates: (22.0, 25.0, 70.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.78, 3.0, 1095.0, 125.0),
        description: (
            "Critical subsidence zone at B.R. Company Jayrampur Colliery area in Tisra. Historical mining activities have weakened ground stability.",
            "तिसरा में B.R. कंपनी जयरामपुर कोलियरी क्षेत्र में क्रिटिकल धंसाव ज़ोन।",
        ),
        affected_area: 0.4,
        estimated_population: 4200,
        safety: Some((
            &[
                "Monitor building foundations regularly",
                "Report unusual ground sounds",
                "Know emergency contact numbers",
            ],
            &[
                "नियमित रूप से भवन की नींव की निगरानी करें",
                "असामान्य जमीन की आवाजों की रिपोर्ट करें",
                "आपातकालीन संपर्क नंबर जानें",
            ],
        )),
        nearest_safe_zone: None,
        bccl_area: "Area IX",
    },
    Fixture {
        zone_id: "bera_dobari_high_01",
        name: ("Bera-Dobari High Risk Zone", "बेरा-डोबारी उच्च जोखिम ज़ोन"),
        center: (23.758, 86.435),
        size_km: 0.5,
        risk_level: RiskLevel::High,
        risk_score: 78,
        rates: (18.0, 28.0, 87.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.80, 2.8, 1095.0, 118.0),
        description: (
            "High risk zone with variable subsidence rates. Dobari Opencast area shows significant deformation.",
            "परिवर्तनीय धंसाव दरों वाला उच्च जोखिम क्षेत्र।",
        ),
        affected_area: 0.55,
        estimated_population: 6000,
        safety: Some((
            &[
                "Regular structural assessments recommended",
                "Avoid heavy vehicle parking near buildings",
            ],
            &[
                "नियमित संरचनात्मक मूल्यांकन की सिफारिश",
                "भवनों के पास भारी वाहन पार्किंग से बचें",
            ],
        )),
        nearest_safe_zone: None,
        bccl_area: "Area IX",
    },
    Fixture {
        zone_id: "bastacola_high_01",
        name: ("Bastacola High Risk Zone", "बस्ताकोला उच्च जोखिम ज़ोन"),
        center: (23.745, 86.420),
        size_km: 0.4,
        risk_level: RiskLevel::High,
        risk_score: 72,
        rates: (10.0, 15.0, 30.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.83, 1.8, 1095.0, 110.0),
        description: (
            "High risk zone with moderate subsidence. Ongoing monitoring recommended.",
            "मध्यम धंसाव के साथ उच्च जोखिम क्षेत्र। निरंतर निगरानी की सिफारिश।",
        ),
        affected_area: 0.35,
        estimated_population: 4000,
        safety: None,
        nearest_safe_zone: None,
        bccl_area: "Area IX",
    },
    Fixture {
        zone_id: "ck_siding_high_01",
        name: ("CK-Siding High Risk Zone", "CK-साइडिंग उच्च जोखिम ज़ोन"),
        center: (23.730, 86.410),
        size_km: 0.4,
        risk_level: RiskLevel::High,
        risk_score: 70,
        rates: (15.0, 21.0, 60.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.79, 2.2, 1095.0, 112.0),
        description: (
            "High risk zone near CK-Siding railway area. Underground voids present.",
            "CK-साइडिंग रेलवे क्षेत्र के पास उच्च जोखिम क्षेत्र।",
        ),
        affected_area: 0.3,
        estimated_population: 3000,
        safety: None,
        nearest_safe_zone: None,
        bccl_area: "Area IX",
    },
    Fixture {
        zone_id: "jeenagora_moderate_01",
        name: ("Jeenagora Moderate Risk Zone", "जीनगोरा मध्यम जोखिम ज़ोन"),
        center: (23.702, 86.452),
        size_km: 0.5,
        risk_level: RiskLevel::Moderate,
        risk_score: 55,
        rates: (5.0, 8.0, 20.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.86, 1.2, 1095.0, 105.0),
        description: (
            "Moderate risk zone near BCCL Hospital. Slow but consistent subsidence detected.",
            "BCCL अस्पताल के पास मध्यम जोखिम क्षेत्र।",
        ),
        affected_area: 0.5,
        estimated_population: 5500,
        safety: None,
        nearest_safe_zone: None,
        bccl_area: "Area X",
    },
    Fixture {
        zone_id: "jorapokhar_moderate_01",
        name: (
            "Jorapokhar - Begariya More Moderate Zone",
            "जोरापोखर - बेगरिया मोड़ मध्यम ज़ोन",
        ),
        center: (23.699, 86.427),
        size_km: 0.45,
        risk_level: RiskLevel::Moderate,
        risk_score: 50,
        rates: (4.0, 7.0, 15.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.88, 1.0, 1095.0, 100.0),
        description: (
            "Moderate risk zone at Begariya More junction in Jorapokhar.",
            "जोरापोखर में बेगरिया मोड़ जंक्शन पर मध्यम जोखिम क्षेत्र।",
        ),
        affected_area: 0.4,
        estimated_population: 4500,
        safety: None,
        nearest_safe_zone: None,
        bccl_area: "Area IX",
    },
    Fixture {
        zone_id: "kusunda_low_01",
        name: ("Kusunda Low Risk Zone", "कुसुंडा निम्न जोखिम ज़ोन"),
        center: (23.780, 86.410),
        size_km: 0.6,
        risk_level: RiskLevel::Low,
        risk_score: 30,
        rates: (2.0, 4.0, 8.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.91, 0.8, 1095.0, 95.0),
        description: (
            "Low risk zone with minimal subsidence. PSInSAR shows stable ground conditions.",
            "न्यूनतम धंसाव वाला निम्न जोखिम क्षेत्र।",
        ),
        affected_area: 0.7,
        estimated_population: 8000,
        safety: None,
        nearest_safe_zone: None,
        bccl_area: "Area VIII",
    },
    Fixture {
        zone_id: "lodna_moderate_01",
        name: ("Lodna Colliery Moderate Zone", "लोदना कोलियरी मध्यम ज़ोन"),
        center: (23.724, 86.438),
        size_km: 0.4,
        risk_level: RiskLevel::Moderate,
        risk_score: 52,
        rates: (6.0, 10.0, 25.0),
        data_source: PSINSAR_SOURCE,
        psinsar: (0.84, 1.5, 1095.0, 108.0),
        description: (
            "Moderate risk zone around Lodna Colliery. Some ground instability detected.",
            "लोदना कोलियरी के आसपास मध्यम जोखिम क्षेत्र।",
        ),
        affected_area: 0.35,
        estimated_population: 3800,
        safety: None,
        nearest_safe_zone: None,
        bccl_area: "Area IX",
    },
];

impl Fixture {
    fn to_zone(&self, now: DateTime<Utc>) -> RiskZone {
        let (lat, lng) = self.center;
        let (average_rate, max_rate, cumulative_displacement) = self.rates;
        let (coherence, velocity_std_dev, temporal_baseline, spatial_baseline) = self.psinsar;

        RiskZone {
            zone_id: self.zone_id.to_string(),
            zone_name: Localized::text(self.name.0, self.name.1),
            geometry: ZoneGeometry::square(lat, lng, self.size_km),
            risk_level: self.risk_level,
            risk_score: self.risk_score,
            subsidence_data: Some(SubsidenceData {
                average_rate: Some(average_rate),
                max_rate: Some(max_rate),
                cumulative_displacement: Some(cumulative_displacement),
                measurement_period: measurement_period(),
                data_source: Some(self.data_source.to_string()),
            }),
            psinsar: Some(Psinsar {
                coherence: Some(coherence),
                velocity_std_dev: Some(velocity_std_dev),
                temporal_baseline: Some(temporal_baseline),
                spatial_baseline: Some(spatial_baseline),
            }),
            description: Some(Localized::text(self.description.0, self.description.1)),
            affected_area: Some(self.affected_area),
            estimated_population: Some(self.estimated_population),
            safety_recommendations: self.safety.map(|(en, hi)| {
                Localized::new(
                    en.iter().map(ToString::to_string).collect(),
                    hi.iter().map(ToString::to_string).collect(),
                )
            }),
            nearest_safe_zone: self
                .nearest_safe_zone
                .map(|(zone_id, distance, en, hi)| NearestSafeZone {
                    zone_id: zone_id.to_string(),
                    distance: Some(distance),
                    name: Some(Localized::text(en, hi)),
                }),
            bccl_area: Some(self.bccl_area.to_string()),
            is_active: true,
            last_updated: Some(now),
        }
    }
}

/// The 2018-2021 observation window shared by every fixture.
fn measurement_period() -> Option<MeasurementPeriod> {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let end = NaiveDate::from_ymd_opt(2021, 12, 31)?.and_hms_opt(0, 0, 0)?;
    Some(MeasurementPeriod {
        start: start.and_utc(),
        end: end.and_utc(),
    })
}

/// Builds the baseline zones, stamped with `now` as their last update.
#[must_use]
pub fn fixture_zones(now: DateTime<Utc>) -> Vec<RiskZone> {
    FIXTURES.iter().map(|f| f.to_zone(now)).collect()
}

/// Replaces every stored zone with the baseline fixtures.
///
/// # Errors
///
/// Returns [`DbError`] if clearing or inserting fails.
pub async fn reseed(db: &dyn Database) -> Result<u64, DbError> {
    log::info!("Starting zone seed...");
    let cleared = queries::delete_all_zones(db).await?;
    log::info!("Cleared {cleared} existing zones");

    let inserted = queries::insert_zones(db, &fixture_zones(Utc::now())).await?;
    log::info!("Inserted {inserted} risk zones");

    Ok(inserted)
}

/// Seeds the baseline fixtures only if the store holds no zones.
///
/// Returns the number of zones inserted (zero if the store was already
/// populated).
///
/// # Errors
///
/// Returns [`DbError`] if counting or inserting fails.
pub async fn seed_if_empty(db: &dyn Database) -> Result<u64, DbError> {
    let count = queries::count_zones(db).await?;
    if count > 0 {
        log::info!("Store has {count} risk zones, skipping seed");
        return Ok(0);
    }

    log::info!("No zones found, seeding store...");
    reseed(db).await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::db::open_db;

    #[test]
    fn fixtures_are_valid_and_unique() {
        let zones = fixture_zones(Utc::now());
        assert_eq!(zones.len(), 10);

        for zone in &zones {
            zone.validate().unwrap();
        }

        let ids: BTreeSet<&str> = zones.iter().map(|z| z.zone_id.as_str()).collect();
        assert_eq!(ids.len(), zones.len());
    }

    #[test]
    fn alkusa_is_a_half_kilometre_square() {
        let zones = fixture_zones(Utc::now());
        let alkusa = zones
            .iter()
            .find(|z| z.zone_id == "alkusa_critical_01")
            .unwrap();
        assert_eq!(alkusa.risk_level, RiskLevel::Critical);

        let ring = alkusa.geometry.first_outer_ring().unwrap();
        let half_width = ring[1][0] - 86.396;
        assert!((half_width - 0.0045).abs() < 1e-4);
        assert_eq!(
            alkusa.nearest_safe_zone.as_ref().unwrap().zone_id,
            "dhanbad_safe_01"
        );
    }

    #[tokio::test]
    async fn seed_if_empty_runs_once() {
        let path = std::env::temp_dir().join(format!(
            "jharia_watch_seed_{}.db",
            uuid::Uuid::new_v4()
        ));
        let db = open_db(&path).await.unwrap();

        assert_eq!(seed_if_empty(db.as_ref()).await.unwrap(), 10);
        assert_eq!(seed_if_empty(db.as_ref()).await.unwrap(), 0);

        queries::set_zone_active(db.as_ref(), "kusunda_low_01", false)
            .await
            .unwrap();
        assert_eq!(reseed(db.as_ref()).await.unwrap(), 10);
        assert!(
            queries::get_active_zone(db.as_ref(), "kusunda_low_01")
                .await
                .unwrap()
                .is_some()
        );

        let _ = std::fs::remove_file(path);
    }
}
