//! Geographic computations.
//!
//! Pure functions for great-circle distance, bearings and nearest-point
//! lookups on a path. All coordinates are WGS84 (lon/lat in degrees) and
//! all distances are in miles. Inputs are not range-checked.

use serde::{Deserialize, Serialize};

/// Earth radius in miles used by the haversine formula.
const EARTH_RADIUS_MI: f64 = 3956.0;

/// A geographic coordinate without altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

/// Ordered list of coordinates in travel order.
pub type Path = Vec<Coordinate>;

/// The eight compass labels used in spoken instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompassDirection {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl CompassDirection {
    const ALL: [CompassDirection; 8] = [
        CompassDirection::North,
        CompassDirection::Northeast,
        CompassDirection::East,
        CompassDirection::Southeast,
        CompassDirection::South,
        CompassDirection::Southwest,
        CompassDirection::West,
        CompassDirection::Northwest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CompassDirection::North => "north",
            CompassDirection::Northeast => "northeast",
            CompassDirection::East => "east",
            CompassDirection::Southeast => "southeast",
            CompassDirection::South => "south",
            CompassDirection::Southwest => "southwest",
            CompassDirection::West => "west",
            CompassDirection::Northwest => "northwest",
        }
    }
}

impl std::fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Haversine distance between two coordinates in miles.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_MI * h.sqrt().asin()
}

/// Initial bearing from `a` to `b` in degrees [0, 360), clockwise from north.
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let mut deg = y.atan2(x).to_degrees();
    if deg < 0.0 {
        deg += 360.0;
    }
    // tiny negative values round up to exactly 360.0
    if deg >= 360.0 {
        deg -= 360.0;
    }
    deg
}

/// Map a bearing to one of eight compass labels.
pub fn compass_direction(bearing_deg: f64) -> CompassDirection {
    let index = (bearing_deg / 45.0).round().rem_euclid(8.0) as usize;
    CompassDirection::ALL[index % 8]
}

/// Sum of segment lengths along a path, in miles.
pub fn path_length(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Index of the path point closest to `position`. None for an empty path.
///
/// Ties resolve to the earliest index.
pub fn nearest_index(position: &Coordinate, path: &[Coordinate]) -> Option<usize> {
    path.iter()
        .enumerate()
        .map(|(i, p)| (i, distance(position, p)))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

/// Distance from `position` to the nearest point on the path polyline,
/// in miles.
///
/// A single-point path measures to that point; an empty path yields
/// infinity.
pub fn distance_to_path(position: &Coordinate, path: &[Coordinate]) -> f64 {
    match path {
        [] => f64::INFINITY,
        [only] => distance(position, only),
        _ => path
            .windows(2)
            .map(|w| distance(position, &project_on_segment(position, &w[0], &w[1])))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Project a point onto the segment A-B.
///
/// Uses a planar approximation scaled by latitude cosine, which is
/// accurate enough for road-scale segments.
fn project_on_segment(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> Coordinate {
    let cos_lat = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lon - a.lon) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lon - a.lon) * cos_lat;
    let py = p.lat - a.lat;

    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < 1e-20 {
        return *a;
    }

    let t = ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0);
    interpolate(a, b, t)
}

/// Linear interpolation between two coordinates, `t` in [0, 1].
pub fn interpolate(a: &Coordinate, b: &Coordinate, t: f64) -> Coordinate {
    Coordinate {
        lon: a.lon + t * (b.lon - a.lon),
        lat: a.lat + t * (b.lat - a.lat),
    }
}
