//! Great-circle math on WGS84 coordinates.
//!
//! All angles are in degrees, all distances in meters. These are pure
//! functions shared by the track model and the frame sequencer.

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Returns the great-circle distance in meters between two coordinates.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_M`].
#[inline]
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    // Rounding can push `a` a hair above 1 for antipodal points
    EARTH_RADIUS_M * 2.0 * a.sqrt().min(1.0).asin()
}

/// Returns the initial bearing (forward azimuth) from the first coordinate
/// towards the second.
///
/// The result is normalized to `[0, 360)`, where 0 = North, 90 = East.
/// Identical points yield exactly 0.
#[inline]
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Normalizes an angle in degrees to `[0, 360)`.
#[inline]
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid may return exactly 360.0 for tiny negative inputs
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Returns the signed angular distance from `from` to `to` along the shorter
/// arc, in the range `(-180, 180]`.
///
/// Adding the result to `from` (and normalizing) yields `to`.
#[inline]
pub fn angle_delta(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Linearly interpolates between two bearings along the shorter arc.
///
/// `t` is the interpolation factor in `[0, 1]`.
#[inline]
pub fn interpolate_bearing(from: f64, to: f64, t: f64) -> f64 {
    normalize_bearing(from + angle_delta(from, to) * t)
}
