//! `GeoJSON`-shaped zone outlines.
//!
//! Serializes as a `GeoJSON` geometry object (`{"type": "Polygon",
//! "coordinates": [...]}`), so the stored form can be handed to map
//! clients unchanged.

use serde::{Deserialize, Serialize};

/// `[longitude, latitude]` in decimal degrees.
pub type Position = [f64; 2];

/// A closed sequence of positions (first == last).
pub type Ring = Vec<Position>;

/// Kilometres per degree used by the square fixture builder and the
/// nearest-zone approximation.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Minimum number of positions in a closed ring.
const MIN_RING_POSITIONS: usize = 4;

/// Outline of a risk zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ZoneGeometry {
    /// A single polygon: outer ring followed by optional holes.
    Polygon {
        /// Rings of the polygon.
        coordinates: Vec<Ring>,
    },
    /// Several polygons, each an outer ring followed by optional holes.
    MultiPolygon {
        /// Polygons, each a list of rings.
        coordinates: Vec<Vec<Ring>>,
    },
}

impl ZoneGeometry {
    /// Axis-aligned square around a center, `size_km / 111` degrees from
    /// the center to each edge.
    #[must_use]
    pub fn square(center_lat: f64, center_lng: f64, size_km: f64) -> Self {
        let offset = size_km / KM_PER_DEGREE;
        Self::Polygon {
            coordinates: vec![vec![
                [center_lng - offset, center_lat - offset],
                [center_lng + offset, center_lat - offset],
                [center_lng + offset, center_lat + offset],
                [center_lng - offset, center_lat + offset],
                [center_lng - offset, center_lat - offset],
            ]],
        }
    }

    /// The polygons of this outline, each as a slice of rings.
    #[must_use]
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Self::Polygon { coordinates } => vec![coordinates.as_slice()],
            Self::MultiPolygon { coordinates } => coordinates.iter().map(Vec::as_slice).collect(),
        }
    }

    /// Outer ring of the first polygon, if any.
    #[must_use]
    pub fn first_outer_ring(&self) -> Option<&[Position]> {
        let ring = match self {
            Self::Polygon { coordinates } => coordinates.first(),
            Self::MultiPolygon { coordinates } => coordinates.first().and_then(|p| p.first()),
        };
        ring.map(Vec::as_slice)
    }

    /// Checks that there is at least one polygon and that every ring is
    /// closed, finite, and long enough.
    ///
    /// # Errors
    ///
    /// Returns the first [`GeometryError`] found.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let polygons = self.polygons();
        if polygons.is_empty() {
            return Err(GeometryError::Empty);
        }

        for (polygon, rings) in polygons.into_iter().enumerate() {
            if rings.is_empty() {
                return Err(GeometryError::EmptyPolygon { polygon });
            }
            for (ring, positions) in rings.iter().enumerate() {
                if positions.len() < MIN_RING_POSITIONS {
                    return Err(GeometryError::TooFewPositions {
                        polygon,
                        ring,
                        count: positions.len(),
                    });
                }
                if positions.iter().flatten().any(|c| !c.is_finite()) {
                    return Err(GeometryError::NonFinite { polygon, ring });
                }
                if positions.first() != positions.last() {
                    return Err(GeometryError::UnclosedRing { polygon, ring });
                }
            }
        }

        Ok(())
    }
}

/// A malformed [`ZoneGeometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// No polygons at all.
    Empty,
    /// A polygon with no rings.
    EmptyPolygon {
        /// Polygon index.
        polygon: usize,
    },
    /// A ring shorter than four positions.
    TooFewPositions {
        /// Polygon index.
        polygon: usize,
        /// Ring index within the polygon.
        ring: usize,
        /// Number of positions found.
        count: usize,
    },
    /// A ring containing NaN or infinite coordinates.
    NonFinite {
        /// Polygon index.
        polygon: usize,
        /// Ring index within the polygon.
        ring: usize,
    },
    /// A ring whose last position differs from its first.
    UnclosedRing {
        /// Polygon index.
        polygon: usize,
        /// Ring index within the polygon.
        ring: usize,
    },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "geometry has no polygons"),
            Self::EmptyPolygon { polygon } => write!(f, "polygon {polygon} has no rings"),
            Self::TooFewPositions {
                polygon,
                ring,
                count,
            } => write!(
                f,
                "ring {ring} of polygon {polygon} has {count} positions, expected at least {MIN_RING_POSITIONS}"
            ),
            Self::NonFinite { polygon, ring } => {
                write!(f, "ring {ring} of polygon {polygon} has non-finite coordinates")
            }
            Self::UnclosedRing { polygon, ring } => {
                write!(f, "ring {ring} of polygon {polygon} is not closed")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_is_closed_and_centered() {
        let geometry = ZoneGeometry::square(23.767, 86.396, 0.5);
        assert!(geometry.validate().is_ok());

        let ring = geometry.first_outer_ring().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());

        let half_width = 0.5 / 111.0;
        assert!((ring[0][0] - (86.396 - half_width)).abs() < 1e-12);
        assert!((ring[2][1] - (23.767 + half_width)).abs() < 1e-12);
    }

    #[test]
    fn serializes_as_geojson_geometry() {
        let geometry = ZoneGeometry::square(0.0, 0.0, 111.0);
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(value["type"], "Polygon");
        assert_eq!(value["coordinates"][0][0], serde_json::json!([-1.0, -1.0]));

        let parsed: ZoneGeometry = serde_json::from_value(serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
        }))
        .unwrap();
        assert_eq!(parsed.polygons().len(), 1);
        assert_eq!(parsed.first_outer_ring().unwrap().len(), 4);
    }

    #[test]
    fn validate_reports_malformed_rings() {
        let empty = ZoneGeometry::MultiPolygon {
            coordinates: Vec::new(),
        };
        assert_eq!(empty.validate(), Err(GeometryError::Empty));

        let no_rings = ZoneGeometry::Polygon {
            coordinates: Vec::new(),
        };
        assert_eq!(
            no_rings.validate(),
            Err(GeometryError::EmptyPolygon { polygon: 0 })
        );

        let short = ZoneGeometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]],
        };
        assert_eq!(
            short.validate(),
            Err(GeometryError::TooFewPositions {
                polygon: 0,
                ring: 0,
                count: 3
            })
        );

        let open = ZoneGeometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
        };
        assert_eq!(
            open.validate(),
            Err(GeometryError::UnclosedRing {
                polygon: 0,
                ring: 0
            })
        );

        let nan = ZoneGeometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0], [0.0, 0.0]]],
        };
        assert_eq!(
            nan.validate(),
            Err(GeometryError::NonFinite {
                polygon: 0,
                ring: 0
            })
        );
    }
}
