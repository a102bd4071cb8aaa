//! Equal-area projections and the district area stage.
//!
//! Area is always measured on an equal-area plane: geometries are projected
//! forward, measured, then projected back to longitude/latitude for display.
//! Formulas follow Snyder, "Map Projections: A Working Manual" (USGS 1395).
//! EPSG:5070 sits on GRS80 and EPSG:6933 on WGS84.

use geo::{Area, MapCoords, MultiPolygon};
use serde::{Deserialize, Serialize};

use crate::district::DistrictFeature;

/// Square metres per square kilometre.
pub const SQ_METRES_PER_SQ_KM: f64 = 1e6;

const MAX_LATITUDE_ITERATIONS: usize = 16;
const LATITUDE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres.
    pub a: f64,
    /// First eccentricity squared.
    pub e2: f64,
}

impl Ellipsoid {
    pub const GRS80: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        e2: 0.006_694_380_022_90,
    };
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        e2: 0.006_694_379_990_14,
    };
    pub const CLARKE_1866: Ellipsoid = Ellipsoid {
        a: 6_378_206.4,
        e2: 0.006_768_66,
    };

    fn e(&self) -> f64 {
        self.e2.sqrt()
    }

    /// Snyder's q, the authalic latitude function (eq. 3-12).
    fn q(&self, phi: f64) -> f64 {
        let e = self.e();
        let sin_phi = phi.sin();
        let e_sin = e * sin_phi;
        (1.0 - self.e2)
            * (sin_phi / (1.0 - e_sin * e_sin) - (1.0 / (2.0 * e)) * ((1.0 - e_sin) / (1.0 + e_sin)).ln())
    }

    /// Snyder's m (eq. 14-15).
    fn m(&self, phi: f64) -> f64 {
        let sin_phi = phi.sin();
        phi.cos() / (1.0 - self.e2 * sin_phi * sin_phi).sqrt()
    }

    /// Invert q for the geodetic latitude by fixed-point iteration (eq. 3-16).
    fn latitude_from_q(&self, q: f64) -> f64 {
        let e = self.e();
        let q_pole = self.q(std::f64::consts::FRAC_PI_2);
        if (q.abs() - q_pole).abs() < 1e-12 {
            return std::f64::consts::FRAC_PI_2.copysign(q);
        }
        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..MAX_LATITUDE_ITERATIONS {
            let sin_phi = phi.sin();
            let e_sin = e * sin_phi;
            let one_minus = 1.0 - e_sin * e_sin;
            let delta = one_minus * one_minus / (2.0 * phi.cos())
                * (q / (1.0 - self.e2) - sin_phi / one_minus
                    + (1.0 / (2.0 * e)) * ((1.0 - e_sin) / (1.0 + e_sin)).ln());
            phi += delta;
            if delta.abs() < LATITUDE_TOLERANCE {
                break;
            }
        }
        phi
    }
}

pub trait EqualAreaProjection: Send + Sync {
    fn name(&self) -> &'static str;
    /// Degrees of longitude/latitude to planar metres.
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);
    /// Planar metres back to degrees of longitude/latitude.
    fn inverse(&self, x: f64, y: f64) -> (f64, f64);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// EPSG:5070, NAD83 / Conus Albers.
    #[default]
    ConusAlbers,
    /// EPSG:6933, WGS 84 / NSIDC EASE-Grid 2.0 Global.
    CylindricalEqualArea,
}

impl ProjectionKind {
    pub fn build(self) -> Box<dyn EqualAreaProjection> {
        match self {
            ProjectionKind::ConusAlbers => Box::new(AlbersEqualArea::conus()),
            ProjectionKind::CylindricalEqualArea => Box::new(CylindricalEqualArea::global()),
        }
    }
}

/// Albers conic equal-area, ellipsoidal form.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    ellipsoid: Ellipsoid,
    lon0: f64,
    n: f64,
    c: f64,
    rho0: f64,
}

impl AlbersEqualArea {
    pub fn new(ellipsoid: Ellipsoid, lat0_deg: f64, lon0_deg: f64, lat1_deg: f64, lat2_deg: f64) -> Self {
        let (phi0, phi1, phi2) = (lat0_deg.to_radians(), lat1_deg.to_radians(), lat2_deg.to_radians());
        let (m1, m2) = (ellipsoid.m(phi1), ellipsoid.m(phi2));
        let (q0, q1, q2) = (ellipsoid.q(phi0), ellipsoid.q(phi1), ellipsoid.q(phi2));
        let n = if (phi1 - phi2).abs() < 1e-12 {
            phi1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = ellipsoid.a * (c - n * q0).sqrt() / n;
        Self {
            ellipsoid,
            lon0: lon0_deg.to_radians(),
            n,
            c,
            rho0,
        }
    }

    /// Parameters of EPSG:5070.
    pub fn conus() -> Self {
        Self::new(Ellipsoid::GRS80, 23.0, -96.0, 29.5, 45.5)
    }
}

impl EqualAreaProjection for AlbersEqualArea {
    fn name(&self) -> &'static str {
        "EPSG:5070"
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let q = self.ellipsoid.q(lat.to_radians());
        let rho = self.ellipsoid.a * (self.c - self.n * q).max(0.0).sqrt() / self.n;
        let theta = self.n * (lon.to_radians() - self.lon0);
        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dy = self.rho0 - y;
        let rho = (x * x + dy * dy).sqrt().copysign(self.n);
        let theta = if self.n < 0.0 {
            (-x).atan2(-dy)
        } else {
            x.atan2(dy)
        };
        let q = (self.c - (rho * self.n / self.ellipsoid.a).powi(2)) / self.n;
        let lat = self.ellipsoid.latitude_from_q(q);
        let lon = self.lon0 + theta / self.n;
        (lon.to_degrees(), lat.to_degrees())
    }
}

/// Lambert cylindrical equal-area, ellipsoidal form.
#[derive(Debug, Clone)]
pub struct CylindricalEqualArea {
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
}

impl CylindricalEqualArea {
    pub fn new(ellipsoid: Ellipsoid, standard_parallel_deg: f64, lon0_deg: f64) -> Self {
        Self {
            ellipsoid,
            lon0: lon0_deg.to_radians(),
            k0: ellipsoid.m(standard_parallel_deg.to_radians()),
        }
    }

    /// Parameters of EPSG:6933.
    pub fn global() -> Self {
        Self::new(Ellipsoid::WGS84, 30.0, 0.0)
    }
}

impl EqualAreaProjection for CylindricalEqualArea {
    fn name(&self) -> &'static str {
        "EPSG:6933"
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let a = self.ellipsoid.a;
        let x = a * self.k0 * (lon.to_radians() - self.lon0);
        let y = a * self.ellipsoid.q(lat.to_radians()) / (2.0 * self.k0);
        (x, y)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.ellipsoid.a;
        let lat = self.ellipsoid.latitude_from_q(2.0 * y * self.k0 / a);
        let lon = self.lon0 + x / (a * self.k0);
        (lon.to_degrees(), lat.to_degrees())
    }
}

pub fn project(geometry: &MultiPolygon<f64>, projection: &dyn EqualAreaProjection) -> MultiPolygon<f64> {
    geometry.map_coords(|coord| {
        let (x, y) = projection.forward(coord.x, coord.y);
        geo::coord! { x: x, y: y }
    })
}

pub fn unproject(geometry: &MultiPolygon<f64>, projection: &dyn EqualAreaProjection) -> MultiPolygon<f64> {
    geometry.map_coords(|coord| {
        let (lon, lat) = projection.inverse(coord.x, coord.y);
        geo::coord! { x: lon, y: lat }
    })
}

/// Area of a lon/lat geometry in square kilometres, measured on the given
/// equal-area plane.
pub fn area_sqkm(geometry: &MultiPolygon<f64>, projection: &dyn EqualAreaProjection) -> f64 {
    project(geometry, projection).unsigned_area() / SQ_METRES_PER_SQ_KM
}

/// Set `area_sqkm` on every district and replace its geometry with the
/// round-tripped lon/lat geometry used for display.
pub fn measure_areas(
    mut districts: Vec<DistrictFeature>,
    projection: &dyn EqualAreaProjection,
) -> Vec<DistrictFeature> {
    for district in &mut districts {
        let planar = project(&district.geometry, projection);
        district.area_sqkm = Some(planar.unsigned_area() / SQ_METRES_PER_SQ_KM);
        district.geometry = unproject(&planar, projection);
    }
    districts
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, GeodesicArea};
    use serde_json::Map;

    fn cell(lon: f64, lat: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: lon, y: lat),
            (x: lon + size, y: lat),
            (x: lon + size, y: lat + size),
            (x: lon, y: lat + size),
        ]])
    }

    fn relative_gap(a: f64, b: f64) -> f64 {
        (a - b).abs() / b.abs().max(f64::MIN_POSITIVE)
    }

    #[test]
    fn albers_origin_maps_to_zero() {
        let albers = AlbersEqualArea::conus();
        let (x, y) = albers.forward(-96.0, 23.0);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6, "got ({x}, {y})");
    }

    #[test]
    fn albers_matches_snyder_worked_example() {
        // USGS 1395, p. 292: Clarke 1866, 35N 75W.
        let albers = AlbersEqualArea::new(Ellipsoid::CLARKE_1866, 23.0, -96.0, 29.5, 45.5);
        let (x, y) = albers.forward(-75.0, 35.0);
        assert!((x - 1_885_472.7).abs() < 0.1, "x = {x}");
        assert!((y - 1_535_925.0).abs() < 0.1, "y = {y}");

        let (lon, lat) = albers.inverse(x, y);
        assert!((lon + 75.0).abs() < 1e-9 && (lat - 35.0).abs() < 1e-9);
    }

    #[test]
    fn frames_use_their_datum_ellipsoids() {
        assert_eq!(AlbersEqualArea::conus().ellipsoid, Ellipsoid::GRS80);
        let cylindrical = CylindricalEqualArea::global();
        assert_eq!(cylindrical.ellipsoid, Ellipsoid::WGS84);
        // Lambert cylindrical scales the equator by cos(30) on a near-sphere.
        let (x, _) = cylindrical.forward(1.0, 0.0);
        let expected = 6_378_137.0 * 1.0_f64.to_radians() * 30.0_f64.to_radians().cos();
        assert!(relative_gap(x, expected) < 2e-3, "x = {x}");
    }

    #[test]
    fn projections_round_trip_within_tolerance() {
        let samples = [(-96.0, 23.0), (-120.5, 47.25), (-75.0, 35.0), (12.5, -33.9), (151.2, 60.0)];
        for kind in [ProjectionKind::ConusAlbers, ProjectionKind::CylindricalEqualArea] {
            let projection = kind.build();
            for &(lon, lat) in &samples {
                let (x, y) = projection.forward(lon, lat);
                let (lon2, lat2) = projection.inverse(x, y);
                assert!((lon - lon2).abs() < 1e-9, "{} lon {lon} -> {lon2}", projection.name());
                assert!((lat - lat2).abs() < 1e-9, "{} lat {lat} -> {lat2}", projection.name());
            }
        }
    }

    #[test]
    fn area_is_independent_of_the_equal_area_frame() {
        let district = cell(-100.0, 40.0, 0.25);
        let albers = area_sqkm(&district, &AlbersEqualArea::conus());
        let cylindrical = area_sqkm(&district, &CylindricalEqualArea::global());
        let geodesic = district.geodesic_area_unsigned() / SQ_METRES_PER_SQ_KM;

        assert!(relative_gap(albers, cylindrical) < 1e-3, "{albers} vs {cylindrical}");
        assert!(relative_gap(albers, geodesic) < 1e-3, "{albers} vs {geodesic}");
    }

    #[test]
    fn one_degree_cell_at_forty_north() {
        // A 1x1 degree cell at 40N is roughly 9,400 km2.
        let area = area_sqkm(&cell(-100.0, 40.0, 1.0), &AlbersEqualArea::conus());
        assert!((9_300.0..9_500.0).contains(&area), "area = {area}");
    }

    #[test]
    fn measure_areas_sets_area_and_keeps_display_coordinates() {
        let geometry = cell(-101.0, 38.0, 0.5);
        let district = DistrictFeature::new(Some("Alpha".into()), geometry.clone(), Map::new());
        let measured = measure_areas(vec![district], &AlbersEqualArea::conus());

        let area = measured[0].area_sqkm.unwrap();
        assert!(area > 2_300.0 && area < 2_550.0, "area = {area}");
        let before = geometry.0[0].exterior().coords();
        let after = measured[0].geometry.0[0].exterior().coords();
        for (a, b) in before.zip(after) {
            assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
        }
    }
}
