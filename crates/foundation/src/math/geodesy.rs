use super::Ecef;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Longitude/latitude in degrees and height above the ellipsoid in meters
/// to the scene frame.
pub fn lon_lat_to_ecef(lon_deg: f64, lat_deg: f64, height_m: f64) -> Ecef {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    // Prime vertical radius of curvature.
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    Ecef::new(
        (n + height_m) * cos_lat * cos_lon,
        (n + height_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + height_m) * sin_lat,
    )
}

#[cfg(test)]
mod tests {
    use super::{WGS84_A, WGS84_F, lon_lat_to_ecef};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_and_prime_meridian_lie_on_the_x_axis() {
        let p = lon_lat_to_ecef(0.0, 0.0, 0.0);
        assert_close(p.x, WGS84_A, 1e-6);
        assert_close(p.y, 0.0, 1e-6);
        assert_close(p.z, 0.0, 1e-6);
    }

    #[test]
    fn ninety_east_lies_on_the_y_axis() {
        let p = lon_lat_to_ecef(90.0, 0.0, 0.0);
        assert_close(p.x, 0.0, 1e-6);
        assert_close(p.y, WGS84_A, 1e-6);
    }

    #[test]
    fn heights_push_outwards() {
        let ground = lon_lat_to_ecef(0.0, 0.0, 0.0);
        let raised = lon_lat_to_ecef(0.0, 0.0, 120.0);
        assert_close(raised.x - ground.x, 120.0, 1e-6);
    }

    #[test]
    fn the_pole_sits_on_the_minor_axis() {
        let p = lon_lat_to_ecef(0.0, 90.0, 0.0);
        assert_close(p.z, WGS84_A * (1.0 - WGS84_F), 1e-6);
        assert_close(p.x, 0.0, 1e-6);
    }
}
