//! Great-circle distance on a spherical Earth.

use geo::Coord;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two longitude/latitude pairs.
///
/// # Examples
///
/// ```
/// use gems_core::haversine_km;
///
/// let one_degree = haversine_km(0.0, 0.0, 0.0, 1.0);
/// assert!((one_degree - 111.19).abs() < 0.01);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the haversine formula is floating-point trigonometry"
)]
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let half_d_phi = (lat2 - lat1).to_radians() / 2.0;
    let half_d_lambda = (lon2 - lon1).to_radians() / 2.0;
    let a = half_d_phi.sin().powi(2) + phi1.cos() * phi2.cos() * half_d_lambda.sin().powi(2);
    // Rounding can push `a` fractionally past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let central_angle = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * central_angle
}

/// [`haversine_km`] for coordinates with `x = longitude` and `y = latitude`.
#[must_use]
pub fn distance_km(a: Coord, b: Coord) -> f64 {
    haversine_km(a.x, a.y, b.x, b.y)
}
