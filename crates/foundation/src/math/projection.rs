//! Map projections understood by the 2D model.
//!
//! Geometry is converted to geographic longitude/latitude (EPSG:4326)
//! before it reaches the scene, so every projection only has to provide a
//! forward and inverse transform to and from degrees.

use crate::Extent;

use super::geodesy::WGS84_A;

/// Transform between projected `[x, y]` and `[lon, lat]` degrees.
pub type TransformFn = fn([f64; 2]) -> [f64; 2];

/// Latitude limit of the spherical mercator square.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    /// Geographic longitude/latitude in degrees.
    Epsg4326,
    /// Spherical (web) mercator in meters.
    Epsg3857,
    /// Any other projection with user-supplied transforms.
    Custom {
        code: &'static str,
        to_lon_lat: TransformFn,
        from_lon_lat: TransformFn,
    },
}

impl Projection {
    pub fn code(&self) -> &'static str {
        match self {
            Projection::Epsg4326 => "EPSG:4326",
            Projection::Epsg3857 => "EPSG:3857",
            Projection::Custom { code, .. } => code,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Projection::Epsg4326)
    }

    /// Projected coordinate to `[lon, lat]` in degrees.
    pub fn to_lon_lat(&self, xy: [f64; 2]) -> [f64; 2] {
        match self {
            Projection::Epsg4326 => xy,
            Projection::Epsg3857 => mercator_to_lon_lat(xy),
            Projection::Custom { to_lon_lat, .. } => to_lon_lat(xy),
        }
    }

    /// `[lon, lat]` in degrees to a projected coordinate.
    pub fn from_lon_lat(&self, lon_lat: [f64; 2]) -> [f64; 2] {
        match self {
            Projection::Epsg4326 => lon_lat,
            Projection::Epsg3857 => lon_lat_to_mercator(lon_lat),
            Projection::Custom { from_lon_lat, .. } => from_lon_lat(lon_lat),
        }
    }

    /// Transforms an extent to geographic degrees by projecting its corners.
    pub fn extent_to_lon_lat(&self, extent: &Extent) -> Extent {
        let mut out = Extent::empty();
        for corner in extent.corners() {
            let [lon, lat] = self.to_lon_lat(corner);
            out.extend(lon, lat);
        }
        out
    }
}

pub fn mercator_to_lon_lat(xy: [f64; 2]) -> [f64; 2] {
    let lon = (xy[0] / WGS84_A).to_degrees();
    let lat = (2.0 * (xy[1] / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    [lon, lat]
}

pub fn lon_lat_to_mercator(lon_lat: [f64; 2]) -> [f64; 2] {
    let lat = lon_lat[1].clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
    let x = WGS84_A * lon_lat[0].to_radians();
    let y = WGS84_A * (std::f64::consts::FRAC_PI_4 + lat.to_radians() * 0.5).tan().ln();
    [x, y]
}

#[cfg(test)]
mod tests {
    use super::{Projection, lon_lat_to_mercator, mercator_to_lon_lat};
    use crate::Extent;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn mercator_round_trips_through_degrees() {
        let xy = lon_lat_to_mercator([7.4474, 46.948]);
        let back = mercator_to_lon_lat(xy);
        assert_close(back[0], 7.4474, 1e-9);
        assert_close(back[1], 46.948, 1e-9);
    }

    #[test]
    fn mercator_world_edge_is_antimeridian() {
        let [lon, lat] = Projection::Epsg3857.to_lon_lat([20_037_508.342_789_244, 0.0]);
        assert_close(lon, 180.0, 1e-9);
        assert_close(lat, 0.0, 1e-9);
    }

    #[test]
    fn custom_projection_uses_supplied_transforms() {
        fn halve(xy: [f64; 2]) -> [f64; 2] {
            [xy[0] * 0.5, xy[1] * 0.5]
        }
        fn double(xy: [f64; 2]) -> [f64; 2] {
            [xy[0] * 2.0, xy[1] * 2.0]
        }
        let proj = Projection::Custom {
            code: "TEST:2",
            to_lon_lat: halve,
            from_lon_lat: double,
        };
        assert_eq!(proj.to_lon_lat([10.0, 4.0]), [5.0, 2.0]);
        assert_eq!(proj.from_lon_lat([5.0, 2.0]), [10.0, 4.0]);
        assert_eq!(proj.code(), "TEST:2");
    }

    #[test]
    fn extent_transform_covers_all_corners() {
        let e = Projection::Epsg4326.extent_to_lon_lat(&Extent::from_array([-10.0, -5.0, 10.0, 5.0]));
        assert_eq!(e, Extent::from_array([-10.0, -5.0, 10.0, 5.0]));
    }
}
