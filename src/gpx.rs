//! GPX input.
//!
//! Reads a planned route (`<rte>`) or, failing that, a recorded track
//! (`<trk>`) from GPX 1.1 data and turns it into a navigation path.
//! Elevation and waypoints are ignored.

use std::io::Read;

use serde::Serialize;

use crate::error::NavError;
use crate::geo::{Coordinate, Path};
use crate::route::{Route, TrafficLevel};

/// A named path extracted from GPX data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpxPath {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: Path,
}

fn to_coordinate(wp: &gpx::Waypoint) -> Coordinate {
    let point = wp.point();
    Coordinate::new(point.x(), point.y())
}

/// Read the first non-empty route, or the first non-empty track with all
/// of its segments joined.
pub fn read_path<R: Read>(reader: R) -> Result<GpxPath, NavError> {
    let gpx = gpx::read(reader).map_err(|e| NavError::Gpx(e.to_string()))?;

    let from_route = gpx
        .routes
        .iter()
        .find(|r| !r.points.is_empty())
        .map(|r| GpxPath {
            name: r.name.clone(),
            path: r.points.iter().map(to_coordinate).collect(),
        });

    let found = from_route.or_else(|| {
        gpx.tracks.iter().find_map(|t| {
            let path: Path = t
                .segments
                .iter()
                .flat_map(|seg| seg.points.iter())
                .map(to_coordinate)
                .collect();
            (!path.is_empty()).then(|| GpxPath {
                name: t.name.clone(),
                path,
            })
        })
    });

    let found = found.ok_or(NavError::EmptyPath)?;
    log::debug!(
        "GPX path {:?} with {} points",
        found.name.as_deref().unwrap_or("<unnamed>"),
        found.path.len()
    );
    Ok(found)
}

/// Read GPX data and build a `Route` with derived totals.
pub fn read_route<R: Read>(reader: R, id: &str) -> Result<Route, NavError> {
    let GpxPath { name, path } = read_path(reader)?;
    let name = name.unwrap_or_else(|| "GPX route".to_string());
    Ok(Route::from_path(id, name, path, TrafficLevel::Light))
}

/// Read GPX bytes and return the path as JSON. Convenience wrapper for JNI.
pub fn path_to_json(data: &[u8]) -> Result<String, NavError> {
    Ok(serde_json::to_string(&read_path(data)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_AND_TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Morning drive</name>
    <trkseg>
      <trkpt lat="40.7128" lon="-74.0060"><ele>10</ele></trkpt>
      <trkpt lat="40.7200" lon="-74.0000"></trkpt>
    </trkseg>
  </trk>
  <rte>
    <name>Planned</name>
    <rtept lat="40.0" lon="-74.5"></rtept>
    <rtept lat="40.1" lon="-74.4"></rtept>
    <rtept lat="40.2" lon="-74.4"></rtept>
  </rte>
</gpx>"#;

    const TRACK_ONLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Two segments</name>
    <trkseg>
      <trkpt lat="40.0" lon="-74.0"></trkpt>
      <trkpt lat="40.1" lon="-74.0"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="40.2" lon="-74.0"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn route_is_preferred_over_track() {
        let found = read_path(ROUTE_AND_TRACK.as_bytes()).unwrap();
        assert_eq!(found.name.as_deref(), Some("Planned"));
        assert_eq!(found.path.len(), 3);
        assert_eq!(found.path[0], Coordinate::new(-74.5, 40.0));
    }

    #[test]
    fn track_segments_are_joined() {
        let found = read_path(TRACK_ONLY.as_bytes()).unwrap();
        assert_eq!(found.name.as_deref(), Some("Two segments"));
        assert_eq!(found.path.len(), 3);
        assert!((found.path[2].lat - 40.2).abs() < 1e-9);
    }

    #[test]
    fn empty_gpx_is_an_error() {
        let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
</gpx>"#;
        assert!(matches!(read_path(empty.as_bytes()), Err(NavError::EmptyPath)));
    }

    #[test]
    fn invalid_xml_is_an_error() {
        assert!(matches!(read_path(&b"not xml at all"[..]), Err(NavError::Gpx(_))));
    }

    #[test]
    fn read_route_derives_totals() {
        let route = read_route(ROUTE_AND_TRACK.as_bytes(), "gpx-1").unwrap();
        assert_eq!(route.id, "gpx-1");
        assert_eq!(route.name, "Planned");
        assert!(route.distance_miles > 10.0 && route.distance_miles < 20.0,
            "got {:.2}", route.distance_miles);
        assert!(route.duration_mins > 0);
    }

    #[test]
    fn path_json_shape() {
        let json = path_to_json(TRACK_ONLY.as_bytes()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["path"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(value["path"][0]["lon"], -74.0);
    }
}
