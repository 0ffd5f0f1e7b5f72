//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and the standard slippy-map tile scheme used by web map tile servers.

mod types;

pub use types::{
    CoordError, TileKey, TilePosition, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to a position in tile space.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
///
/// # Returns
///
/// The tile containing the coordinate and the fractional offset within it,
/// or an error if inputs are invalid.
#[inline]
pub fn to_tile_position(lat: f64, lon: f64, zoom: u8) -> Result<TilePosition, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);

    let fx = (lon + 180.0) / 360.0 * n;

    // Web Mercator projection
    let lat_rad = lat * PI / 180.0;
    let fy = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    // lon = 180 lands exactly on the grid edge; keep it in the last column
    let max_index = n - 1.0;
    let x = fx.floor().min(max_index);
    let y = fy.floor().clamp(0.0, max_index);

    Ok(TilePosition {
        key: TileKey::new(x as u32, y as u32, zoom),
        frac_x: (fx - x).clamp(0.0, 1.0 - f64::EPSILON),
        frac_y: (fy - y).clamp(0.0, 1.0 - f64::EPSILON),
    })
}

/// Converts geographic coordinates to the containing tile key.
#[inline]
pub fn to_tile_key(lat: f64, lon: f64, zoom: u8) -> Result<TileKey, CoordError> {
    to_tile_position(lat, lon, zoom).map(|p| p.key)
}

/// Converts a tile key back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileKey) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let pos = to_tile_position(40.7128, -74.0060, 16).unwrap();
        assert_eq!(pos.key.y, 24640);
        assert_eq!(pos.key.x, 19295);
        assert_eq!(pos.key.zoom, 16);
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        let pos = to_tile_position(40.0, 100.0, 0).unwrap();
        assert_eq!(pos.key, TileKey::new(0, 0, 0));
    }

    #[test]
    fn test_fraction_matches_pixel_offset() {
        // The equator / prime meridian sits exactly on a tile corner at zoom 1
        let pos = to_tile_position(0.0, 0.0, 1).unwrap();
        assert_eq!(pos.key, TileKey::new(1, 1, 1));
        assert!(pos.frac_x.abs() < 1e-9);
        assert!(pos.frac_y.abs() < 1e-9);
        assert_eq!(pos.pixel(512, 512), (0, 0));

        // A quarter of the way into the eastern half at zoom 0
        let pos = to_tile_position(0.0, 90.0, 0).unwrap();
        assert!((pos.frac_x - 0.75).abs() < 1e-9);
        assert_eq!(pos.pixel(512, 512), (384, 256));
    }

    #[test]
    fn test_antimeridian_stays_in_grid() {
        let pos = to_tile_position(0.0, 180.0, 3).unwrap();
        assert_eq!(pos.key.x, 7);
        assert!(pos.key.is_valid());
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_position(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile_position(0.0, 0.0, 23);
        assert!(matches!(result, Err(CoordError::InvalidZoom(23))));
    }

    #[test]
    fn test_tile_to_lat_lon_northwest_corner() {
        let tile = TileKey::new(19295, 24640, 16);
        let (lat, lon) = tile_to_lat_lon(&tile);

        assert!((lat - 40.713).abs() < 0.01);
        assert!((lon - (-74.007)).abs() < 0.01);
    }

    #[test]
    fn test_neighbor_wraps_columns() {
        let key = TileKey::new(0, 3, 3);
        assert_eq!(key.neighbor(-1, 0), Some(TileKey::new(7, 3, 3)));
        assert_eq!(key.neighbor(1, 1), Some(TileKey::new(1, 4, 3)));
    }

    #[test]
    fn test_neighbor_rows_do_not_wrap() {
        let top = TileKey::new(2, 0, 2);
        assert_eq!(top.neighbor(0, -1), None);
        let bottom = TileKey::new(2, 3, 2);
        assert_eq!(bottom.neighbor(0, 1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TileKey::new(5, 6, 7).to_string(), "7/5/6");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_position_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=22
            ) {
                let pos = to_tile_position(lat, lon, zoom)?;
                let max_tile = 1u32 << zoom;
                prop_assert!(pos.key.x < max_tile);
                prop_assert!(pos.key.y < max_tile);
                prop_assert!((0.0..1.0).contains(&pos.frac_x));
                prop_assert!((0.0..1.0).contains(&pos.frac_y));
            }

            #[test]
            fn test_roundtrip_within_one_tile(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let key = to_tile_key(lat, lon, zoom)?;
                let (clat, clon) = tile_to_lat_lon(&key);
                let tile_size = 360.0 / 2.0_f64.powi(zoom as i32);
                prop_assert!((clon - lon).abs() < tile_size);
                prop_assert!((clat - lat).abs() < tile_size);
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lon1 in -180.0..-90.0_f64,
                lon2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                let k1 = to_tile_key(lat, lon1, zoom)?;
                let k2 = to_tile_key(lat, lon2, zoom)?;
                prop_assert!(k1.x < k2.x);
            }
        }
    }
}
