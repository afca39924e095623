#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index over risk zones.
//!
//! Built from the active zones returned by the zone store, backed by an
//! R-tree of zone envelopes. Answers the three geometric questions the
//! risk API asks:
//!
//! - which zone contains a point ([`ZoneIndex::containing`])
//! - which zone centroid is closest to a point ([`ZoneIndex::nearest`])
//! - which zones lie entirely inside a bounding box
//!   ([`ZoneIndex::within_bounds`])

use geo::{Coord, Intersects, LineString, MultiPolygon, Polygon};
use jharia_watch_zone_models::{KM_PER_DEGREE, Position, RiskZone, ZoneGeometry};
use rstar::{AABB, RTree, RTreeObject};

/// A zone outline stored in the R-tree, pointing back into
/// [`ZoneIndex::zones`].
struct ZoneEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
    shape: MultiPolygon<f64>,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    fn to_aabb(self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.west, self.south], [self.east, self.north])
    }
}

/// The zone whose centroid is closest to a query point.
#[derive(Debug, Clone, Copy)]
pub struct NearestZone<'a> {
    /// The closest zone.
    pub zone: &'a RiskZone,
    /// Approximate distance in kilometres, rounded to one decimal.
    pub distance_km: f64,
}

/// Active risk zones with an R-tree over their outlines.
///
/// Zones are held in ascending `zone_id` order. That order is the
/// tie-break for overlapping zones and for equidistant centroids.
pub struct ZoneIndex {
    zones: Vec<RiskZone>,
    tree: RTree<ZoneEntry>,
}

impl ZoneIndex {
    /// Builds the index. Inactive zones are dropped.
    #[must_use]
    pub fn new(zones: impl IntoIterator<Item = RiskZone>) -> Self {
        let mut zones: Vec<RiskZone> = zones.into_iter().filter(|z| z.is_active).collect();
        zones.sort_by(|a, b| a.zone_id.cmp(&b.zone_id));

        let entries: Vec<ZoneEntry> = zones
            .iter()
            .enumerate()
            .filter_map(|(index, zone)| {
                let shape = to_multi_polygon(&zone.geometry);
                let Some(envelope) = compute_envelope(&shape) else {
                    log::warn!("Zone {} has no usable outline, skipping", zone.zone_id);
                    return None;
                };
                Some(ZoneEntry {
                    index,
                    envelope,
                    shape,
                })
            })
            .collect();

        log::debug!("Indexed {} of {} active zones", entries.len(), zones.len());

        Self {
            zones,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Active zones in `zone_id` order.
    #[must_use]
    pub fn zones(&self) -> &[RiskZone] {
        &self.zones
    }

    /// Number of active zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether there are no active zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Finds the zone containing the point. Points on a zone boundary
    /// count as contained.
    ///
    /// When zones overlap, the one with the smallest `zone_id` wins.
    #[must_use]
    pub fn containing(&self, lat: f64, lng: f64) -> Option<&RiskZone> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.shape.intersects(&point))
            .map(|entry| entry.index)
            .min()
            .map(|index| &self.zones[index])
    }

    /// Finds the zone whose centroid is closest to the point.
    ///
    /// Centroids come from [`ring_centroid`] over each zone's first
    /// outer ring and distances from [`centroid_distance_km`]. Returns
    /// `None` when no zone has a usable ring.
    #[must_use]
    pub fn nearest(&self, lat: f64, lng: f64) -> Option<NearestZone<'_>> {
        let mut best: Option<(&RiskZone, f64)> = None;

        for zone in &self.zones {
            let Some(centroid) = zone.geometry.first_outer_ring().and_then(ring_centroid) else {
                continue;
            };
            let distance = centroid_distance_km(centroid, lat, lng);
            match best {
                Some((_, current)) if distance >= current => {}
                _ => best = Some((zone, distance)),
            }
        }

        best.map(|(zone, distance)| NearestZone {
            zone,
            distance_km: round_to_tenth(distance),
        })
    }

    /// Zones whose outline lies entirely inside `bbox`, in `zone_id`
    /// order.
    #[must_use]
    pub fn within_bounds(&self, bbox: BoundingBox) -> Vec<&RiskZone> {
        let mut indices: Vec<usize> = self
            .tree
            .locate_in_envelope(&bbox.to_aabb())
            .map(|entry| entry.index)
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.zones[i]).collect()
    }
}

/// Mean of a ring's vertices, closing vertex included.
///
/// This is a vertex average rather than an area centroid. Each term is
/// divided before it is summed so results match the figures already
/// published for the seeded zones.
#[must_use]
pub fn ring_centroid(ring: &[Position]) -> Option<Position> {
    if ring.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = ring.len() as f64;
    Some(
        ring.iter()
            .fold([0.0, 0.0], |acc, p| [acc[0] + p[0] / n, acc[1] + p[1] / n]),
    )
}

/// Planar distance in degree space scaled by 111 km per degree.
///
/// Only meaningful over the few kilometres of the coalfield.
#[must_use]
#[allow(clippy::imprecise_flops)]
pub fn centroid_distance_km(centroid: Position, lat: f64, lng: f64) -> f64 {
    ((centroid[0] - lng).powi(2) + (centroid[1] - lat).powi(2)).sqrt() * KM_PER_DEGREE
}

/// Rounds to one decimal place.
#[must_use]
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Converts a zone outline into a [`geo::Geometry`], keeping the
/// polygon/multipolygon distinction.
#[must_use]
pub fn to_geo_geometry(geometry: &ZoneGeometry) -> geo::Geometry<f64> {
    match geometry {
        ZoneGeometry::Polygon { coordinates } => to_polygon(coordinates).map_or_else(
            || geo::Geometry::MultiPolygon(MultiPolygon::new(Vec::new())),
            geo::Geometry::Polygon,
        ),
        ZoneGeometry::MultiPolygon { .. } => geo::Geometry::MultiPolygon(to_multi_polygon(geometry)),
    }
}

/// Converts a zone outline into a `GeoJSON` geometry for map clients.
#[must_use]
pub fn to_geojson_geometry(geometry: &ZoneGeometry) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(&to_geo_geometry(geometry)))
}

fn to_multi_polygon(geometry: &ZoneGeometry) -> MultiPolygon<f64> {
    MultiPolygon::new(
        geometry
            .polygons()
            .into_iter()
            .filter_map(to_polygon)
            .collect(),
    )
}

fn to_polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let (outer, holes) = rings.split_first()?;
    if outer.is_empty() {
        return None;
    }
    Some(Polygon::new(
        to_line_string(outer),
        holes.iter().map(|ring| to_line_string(ring)).collect(),
    ))
}

fn to_line_string(ring: &[Position]) -> LineString<f64> {
    ring.iter().map(|&[x, y]| Coord { x, y }).collect()
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    use geo::BoundingRect;

    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
