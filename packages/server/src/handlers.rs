//! HTTP handler functions for the risk API.

use actix_web::{HttpResponse, http::StatusCode, web};
use chrono::Utc;
use jharia_watch_database::queries;
use jharia_watch_server_models::{
    ApiError, ApiHealth, ApiResponse, ErrorCode, RiskCheckQueryParams, ZoneDetailResponse,
    ZoneQueryParams,
};
use jharia_watch_spatial::{BoundingBox, ZoneIndex};
use jharia_watch_zone_models::{RiskLevel, RiskZone};

use crate::{AppState, assessment};

/// `GET /api/health`
///
/// Always `200` while the process answers; store reachability is
/// reported in `database`.
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let connected = match state.db.query_raw_params("SELECT 1", &[]).await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Health check query failed: {e}");
            false
        }
    };

    HttpResponse::Ok().json(ApiHealth {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/risk/check?lat=&lng=`
///
/// Assesses the subsidence risk at a point.
pub async fn risk_check(
    state: web::Data<AppState>,
    params: web::Query<RiskCheckQueryParams>,
) -> HttpResponse {
    let (lat, lng) = match parse_coordinates(&params) {
        Ok(point) => point,
        Err(error) => return error_response(error),
    };

    match queries::list_active_zones(state.db.as_ref(), None).await {
        Ok(zones) => {
            let index = ZoneIndex::new(zones);
            HttpResponse::Ok().json(ApiResponse::ok(assessment::assess(&index, lat, lng)))
        }
        Err(e) => {
            log::error!("Failed to check risk at ({lat}, {lng}): {e}");
            error_response(ApiError::server_error(
                "Failed to check risk",
                "जोखिम जांच में विफल",
            ))
        }
    }
}

/// `GET /api/risk/zones?riskLevel=&bounds=`
///
/// Lists active zones as a `GeoJSON` `FeatureCollection`.
pub async fn zones(
    state: web::Data<AppState>,
    params: web::Query<ZoneQueryParams>,
) -> HttpResponse {
    let bounds = match non_empty(params.bounds.as_deref()) {
        Some(s) => match parse_bounds(s) {
            Some(bbox) => Some(bbox),
            None => return error_response(ApiError::invalid_bounds()),
        },
        None => None,
    };

    let result = match parse_level_filter(params.risk_level.as_deref()) {
        LevelFilter::Unknown => Ok(Vec::new()),
        LevelFilter::Any => queries::list_active_zones(state.db.as_ref(), None).await,
        LevelFilter::Only(level) => {
            queries::list_active_zones(state.db.as_ref(), Some(level)).await
        }
    };

    let zones = match result {
        Ok(zones) => zones,
        Err(e) => {
            log::error!("Failed to fetch zones: {e}");
            return zones_error();
        }
    };

    let index = ZoneIndex::new(zones);
    let selected: Vec<&RiskZone> = match bounds {
        Some(bbox) => index.within_bounds(bbox),
        None => index.zones().iter().collect(),
    };

    match assessment::zone_collection(&selected, Utc::now()) {
        Ok(collection) => HttpResponse::Ok().json(ApiResponse::ok(collection)),
        Err(e) => {
            log::error!("Failed to render zones: {e}");
            zones_error()
        }
    }
}

/// `GET /api/risk/zones/{zoneId}`
pub async fn zone_detail(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let zone_id = path.into_inner();

    match queries::get_active_zone(state.db.as_ref(), &zone_id).await {
        Ok(Some(zone)) => {
            let color = zone.descriptor().color.to_string();
            HttpResponse::Ok().json(ApiResponse::ok(ZoneDetailResponse { zone, color }))
        }
        Ok(None) => error_response(ApiError::zone_not_found()),
        Err(e) => {
            log::error!("Failed to fetch zone {zone_id}: {e}");
            error_response(ApiError::server_error(
                "Failed to fetch zone details",
                "ज़ोन विवरण प्राप्त करने में विफल",
            ))
        }
    }
}

/// `GET /api/risk/statistics`
pub async fn statistics(state: web::Data<AppState>) -> HttpResponse {
    match queries::list_active_zones(state.db.as_ref(), None).await {
        Ok(zones) => HttpResponse::Ok().json(ApiResponse::ok(assessment::statistics(&zones))),
        Err(e) => {
            log::error!("Failed to fetch statistics: {e}");
            error_response(ApiError::server_error(
                "Failed to fetch statistics",
                "आंकड़े प्राप्त करने में विफल",
            ))
        }
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> HttpResponse {
    error_response(ApiError::route_not_found())
}

fn zones_error() -> HttpResponse {
    error_response(ApiError::server_error(
        "Failed to fetch zones",
        "ज़ोन प्राप्त करने में विफल",
    ))
}

fn error_response(error: ApiError) -> HttpResponse {
    HttpResponse::build(status_for(error.code)).json(ApiResponse::failure(error))
}

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::MissingParams | ErrorCode::InvalidParams => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Reads `lat`/`lng`, distinguishing absent values from malformed ones.
fn parse_coordinates(params: &RiskCheckQueryParams) -> Result<(f64, f64), ApiError> {
    let (Some(lat), Some(lng)) = (
        non_empty(params.lat.as_deref()),
        non_empty(params.lng.as_deref()),
    ) else {
        return Err(ApiError::missing_coordinates());
    };

    let lat = parse_degrees(lat, 90.0).ok_or_else(ApiError::invalid_coordinates)?;
    let lng = parse_degrees(lng, 180.0).ok_or_else(ApiError::invalid_coordinates)?;

    Ok((lat, lng))
}

fn parse_degrees(s: &str, limit: f64) -> Option<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}

/// Parses a bounds string `"minLng,minLat,maxLng,maxLat"` into a
/// [`BoundingBox`].
fn parse_bounds(s: &str) -> Option<BoundingBox> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;

    let [west, south, east, north] = parts[..] else {
        return None;
    };

    let finite = parts.iter().all(|v| v.is_finite());
    (finite && west <= east && south <= north).then(|| BoundingBox::new(west, south, east, north))
}

enum LevelFilter {
    Any,
    Only(RiskLevel),
    /// Names no known level, so nothing can match.
    Unknown,
}

fn parse_level_filter(value: Option<&str>) -> LevelFilter {
    match non_empty(value) {
        None => LevelFilter::Any,
        Some(s) => s.parse().map_or(LevelFilter::Unknown, LevelFilter::Only),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    use actix_web::{App, test};
    use jharia_watch_database::{db::open_db, seed};

    use super::*;

    async fn seeded_state() -> (web::Data<AppState>, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "jharia_watch_server_{}.db",
            uuid::Uuid::new_v4()
        ));
        let db = open_db(&path).await.unwrap();
        seed::reseed(db.as_ref()).await.unwrap();
        let state = AppState {
            db: Arc::from(db),
            started_at: Instant::now(),
        };
        (web::Data::new(state), path)
    }

    async fn get(state: &web::Data<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(crate::configure)
                .default_service(web::to(not_found)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[::core::prelude::v1::test]
    fn coordinates_missing_vs_invalid() {
        let params = |lat: Option<&str>, lng: Option<&str>| RiskCheckQueryParams {
            lat: lat.map(str::to_string),
            lng: lng.map(str::to_string),
        };

        let missing = parse_coordinates(&params(None, Some("86.4"))).unwrap_err();
        assert_eq!(missing.code, ErrorCode::MissingParams);
        let empty = parse_coordinates(&params(Some(""), Some("86.4"))).unwrap_err();
        assert_eq!(empty.code, ErrorCode::MissingParams);

        for (lat, lng) in [("abc", "86.4"), ("91", "86.4"), ("23.7", "-181"), ("NaN", "86.4")] {
            let err = parse_coordinates(&params(Some(lat), Some(lng))).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidParams, "{lat},{lng}");
        }

        assert_eq!(
            parse_coordinates(&params(Some(" 23.767"), Some("86.396 "))).unwrap(),
            (23.767, 86.396)
        );
    }

    #[::core::prelude::v1::test]
    fn bounds_parsing() {
        let bbox = parse_bounds("86.38, 23.75, 86.41, 23.775").unwrap();
        assert!((bbox.west - 86.38).abs() < f64::EPSILON);
        assert!((bbox.north - 23.775).abs() < f64::EPSILON);

        assert!(parse_bounds("86.38,23.75,86.41").is_none());
        assert!(parse_bounds("86.38,23.75,86.41,23.775,1").is_none());
        assert!(parse_bounds("86.38,x,86.41,23.775").is_none());
        assert!(parse_bounds("86.41,23.75,86.38,23.775").is_none());
    }

    #[::core::prelude::v1::test]
    fn level_filter_parsing() {
        assert!(matches!(parse_level_filter(None), LevelFilter::Any));
        assert!(matches!(parse_level_filter(Some("")), LevelFilter::Any));
        assert!(matches!(
            parse_level_filter(Some("critical")),
            LevelFilter::Only(RiskLevel::Critical)
        ));
        assert!(matches!(
            parse_level_filter(Some("severe")),
            LevelFilter::Unknown
        ));
    }

    #[actix_web::test]
    async fn check_inside_alkusa() {
        let (state, path) = seeded_state().await;

        let (status, body) = get(&state, "/api/risk/check?lat=23.767&lng=86.396").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let data = &body["data"];
        assert_eq!(data["location"]["coordinates"], serde_json::json!([86.396, 23.767]));
        assert_eq!(data["riskAssessment"]["isInRiskZone"], true);
        assert_eq!(data["riskAssessment"]["zone"]["zoneId"], "alkusa_critical_01");
        assert_eq!(data["riskAssessment"]["riskLevel"], "critical");
        assert_eq!(data["riskAssessment"]["subsidenceData"]["maxRate"], 29.0);
        assert_eq!(data["nearestSafeZone"]["zoneId"], "dhanbad_safe_01");
        assert_eq!(data["color"], "#dc2626");

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn check_far_point_reports_nearest_zone() {
        let (state, path) = seeded_state().await;

        let (status, body) = get(&state, "/api/risk/check?lat=23.90&lng=86.60").await;
        assert_eq!(status, StatusCode::OK);

        let assessment = &body["data"]["riskAssessment"];
        assert_eq!(assessment["isInRiskZone"], false);
        assert_eq!(assessment["riskLevel"], "stable");
        assert_eq!(assessment["riskScore"], 15);
        assert!(assessment.get("zone").is_none());
        assert_eq!(
            assessment["nearestRiskZone"]["zoneId"],
            "bera_dobari_high_01"
        );
        assert_eq!(assessment["nearestRiskZone"]["distance"], 24.3);
        assert_eq!(assessment["nearestRiskZone"]["unit"], "km");
        assert_eq!(body["data"]["color"], "#16a34a");

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn check_rejects_bad_coordinates() {
        let (state, path) = seeded_state().await;

        let (status, body) = get(&state, "/api/risk/check?lat=23.767").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "MISSING_PARAMS");
        assert_eq!(
            body["error"]["message"]["en"],
            "Latitude and longitude required"
        );

        let (status, body) = get(&state, "/api/risk/check?lat=123&lng=86.4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PARAMS");

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn zones_listing_and_filters() {
        let (state, path) = seeded_state().await;

        let (status, body) = get(&state, "/api/risk/zones").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "FeatureCollection");
        assert_eq!(body["data"]["features"].as_array().unwrap().len(), 10);
        assert_eq!(body["data"]["metadata"]["totalZones"], 10);
        assert_eq!(body["data"]["metadata"]["criticalZones"], 3);
        assert_eq!(
            body["data"]["features"][0]["geometry"]["type"],
            "Polygon"
        );

        let (_, body) = get(&state, "/api/risk/zones?riskLevel=low").await;
        let features = body["data"]["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["zoneId"], "kusunda_low_01");
        assert_eq!(features[0]["properties"]["color"], "#65a30d");

        let (status, body) = get(&state, "/api/risk/zones?riskLevel=severe").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["features"].as_array().unwrap().len(), 0);

        let (_, body) = get(&state, "/api/risk/zones?bounds=86.38,23.75,86.41,23.775").await;
        let ids: Vec<&str> = body["data"]["features"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["properties"]["zoneId"].as_str())
            .collect();
        assert_eq!(ids, vec!["alkusa_critical_01", "ena_critical_01"]);

        let (status, body) = get(&state, "/api/risk/zones?bounds=1,2,3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PARAMS");

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn inactive_zones_are_hidden() {
        let (state, path) = seeded_state().await;
        assert!(
            queries::set_zone_active(state.db.as_ref(), "alkusa_critical_01", false)
                .await
                .unwrap()
        );

        let (_, body) = get(&state, "/api/risk/zones").await;
        assert_eq!(body["data"]["features"].as_array().unwrap().len(), 9);
        assert!(
            body["data"]["features"]
                .as_array()
                .unwrap()
                .iter()
                .all(|f| f["properties"]["zoneId"] != "alkusa_critical_01")
        );

        let (status, _) = get(&state, "/api/risk/zones/alkusa_critical_01").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get(&state, "/api/risk/check?lat=23.767&lng=86.396").await;
        assert_eq!(body["data"]["riskAssessment"]["isInRiskZone"], false);

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn zone_detail_and_not_found() {
        let (state, path) = seeded_state().await;

        let (status, body) = get(&state, "/api/risk/zones/tisra_critical_01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["zone"]["zoneId"], "tisra_critical_01");
        assert_eq!(body["data"]["zone"]["riskLevel"], "critical");
        assert_eq!(body["data"]["color"], "#dc2626");

        let (status, body) = get(&state, "/api/risk/zones/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"]["hi"], "ज़ोन नहीं मिला");

        let (status, body) = get(&state, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"]["en"], "Route not found");

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn statistics_and_health() {
        let (state, path) = seeded_state().await;

        let (status, body) = get(&state, "/api/risk/statistics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalZones"], 10);
        assert_eq!(body["data"]["byRiskLevel"]["high"], 3);
        assert_eq!(body["data"]["totalPopulationAtRisk"], 47_500);
        assert_eq!(body["data"]["maxSubsidenceRate"], 29.0);

        let (status, body) = get(&state, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
        assert!(
            body["timestamp"]
                .as_str()
                .unwrap()
                .parse::<chrono::DateTime<Utc>>()
                .is_ok()
        );

        let _ = std::fs::remove_file(path);
    }

    #[::core::prelude::v1::test]
    fn error_codes_map_to_statuses() {
        assert_eq!(status_for(ErrorCode::MissingParams), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorCode::ServerError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(ErrorCode::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[actix_web::test]
    async fn store_failures_return_generic_server_errors() {
        let (state, path) = seeded_state().await;
        state.db.exec_raw("DROP TABLE risk_zones").await.unwrap();

        for (uri, en, hi) in [
            (
                "/api/risk/check?lat=23.767&lng=86.396",
                "Failed to check risk",
                "जोखिम जांच में विफल",
            ),
            (
                "/api/risk/zones",
                "Failed to fetch zones",
                "ज़ोन प्राप्त करने में विफल",
            ),
            (
                "/api/risk/zones/x",
                "Failed to fetch zone details",
                "ज़ोन विवरण प्राप्त करने में विफल",
            ),
            (
                "/api/risk/statistics",
                "Failed to fetch statistics",
                "आंकड़े प्राप्त करने में विफल",
            ),
        ] {
            let (status, body) = get(&state, uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body["success"], false, "{uri}");
            assert_eq!(body["error"]["code"], "SERVER_ERROR", "{uri}");
            assert_eq!(body["error"]["message"]["en"], en, "{uri}");
            assert_eq!(body["error"]["message"]["hi"], hi, "{uri}");

            let raw = body.to_string();
            assert!(!raw.contains("no such table"), "{uri}: {raw}");
            assert!(!raw.contains("risk_zones"), "{uri}: {raw}");
        }

        let (status, body) = get(&state, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let _ = std::fs::remove_file(path);
    }
}
