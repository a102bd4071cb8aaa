use geo::BoundingRect;
use serde::Serialize;

use crate::district::DistrictFeature;
use crate::records::PointRecord;

/// Axis-aligned box in latitude/longitude order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn point(lat: f64, lon: f64) -> Self {
        Self {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        }
    }

    pub fn union(self, other: BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lat: self.min_lat.min(other.min_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lat: self.max_lat.max(other.max_lat),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// Midpoint as `[lat, lon]`.
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        ]
    }

    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains_point(other.min_lat, other.min_lon) && self.contains_point(other.max_lat, other.max_lon)
    }

    /// Leaflet's `[[south, west], [north, east]]`.
    pub fn as_leaflet(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lon], [self.max_lat, self.max_lon]]
    }
}

fn merge(acc: Option<BoundingBox>, next: BoundingBox) -> Option<BoundingBox> {
    Some(match acc {
        Some(acc) => acc.union(next),
        None => next,
    })
}

/// Envelope of every district polygon. The geometry is x = lon, y = lat, so
/// the rect's axes are swapped on the way out.
pub fn geometry_bounds(districts: &[DistrictFeature]) -> Option<BoundingBox> {
    districts
        .iter()
        .filter_map(|district| district.geometry.bounding_rect())
        .map(|rect| BoundingBox {
            min_lat: rect.min().y,
            min_lon: rect.min().x,
            max_lat: rect.max().y,
            max_lon: rect.max().x,
        })
        .fold(None, merge)
}

pub fn point_bounds<R: PointRecord>(records: &[R]) -> Option<BoundingBox> {
    records
        .iter()
        .map(|record| BoundingBox::point(record.lat(), record.lon()))
        .fold(None, merge)
}

/// Union of the district box with whichever point sources are present.
pub fn overall_bounds(
    districts: Option<BoundingBox>,
    survivors: Option<BoundingBox>,
    monsters: Option<BoundingBox>,
) -> Option<BoundingBox> {
    [districts, survivors, monsters]
        .into_iter()
        .flatten()
        .fold(None, merge)
}
