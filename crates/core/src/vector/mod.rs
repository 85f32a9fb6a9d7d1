//! GeoJSON reading and writing for boundary polygons and seed points

use crate::crs::CRS;
use crate::error::{Error, Result};
use geo_types::{Geometry, MultiPolygon, Point, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde_json::json;

/// Parse GeoJSON text (a geometry, feature or feature collection)
pub fn parse_geojson(text: &str) -> Result<GeoJson> {
    Ok(text.parse::<GeoJson>()?)
}

/// Every geometry in a GeoJSON document, converted to `geo-types`
pub fn geometries(geojson: &GeoJson) -> Result<Vec<Geometry<f64>>> {
    let values: Vec<&geojson::Value> = match geojson {
        GeoJson::Geometry(g) => vec![&g.value],
        GeoJson::Feature(f) => f.geometry.iter().map(|g| &g.value).collect(),
        GeoJson::FeatureCollection(fc) => fc
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(|g| &g.value)
            .collect(),
    };

    values
        .into_iter()
        .map(|v| Geometry::<f64>::try_from(v.clone()).map_err(Error::from))
        .collect()
}

/// The polygonal content of a GeoJSON document.
///
/// A single polygon is returned as-is; several polygons (or any
/// multipolygon) are gathered into one `MultiPolygon`. Non-polygonal
/// geometries are rejected.
pub fn polygonal_from_geojson(geojson: &GeoJson) -> Result<Geometry<f64>> {
    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    let mut multi = false;

    for geometry in geometries(geojson)? {
        match geometry {
            Geometry::Polygon(p) => polygons.push(p),
            Geometry::MultiPolygon(mp) => {
                multi = true;
                polygons.extend(mp.0);
            }
            other => {
                return Err(Error::InvalidGeometry(format!(
                    "expected polygon geometry, found {}",
                    geometry_kind(&other)
                )))
            }
        }
    }

    match polygons.len() {
        0 => Err(Error::InvalidGeometry("no polygon geometry found".into())),
        1 if !multi => Ok(Geometry::Polygon(polygons.remove(0))),
        _ => Ok(Geometry::MultiPolygon(MultiPolygon(polygons))),
    }
}

/// Point and multipoint vertices of a GeoJSON document
pub fn points_from_geojson(geojson: &GeoJson) -> Result<Vec<Point<f64>>> {
    let mut points = Vec::new();
    for geometry in geometries(geojson)? {
        match geometry {
            Geometry::Point(p) => points.push(p),
            Geometry::MultiPoint(mp) => points.extend(mp.0),
            other => {
                return Err(Error::InvalidGeometry(format!(
                    "expected point geometry, found {}",
                    geometry_kind(&other)
                )))
            }
        }
    }
    Ok(points)
}

/// CRS declared by a legacy `"crs"` member, if any.
///
/// Understands `EPSG:xxxx` and `urn:ogc:def:crs:EPSG::xxxx` names, plus the
/// OGC CRS84 alias for WGS84.
pub fn crs_from_geojson(geojson: &GeoJson) -> Option<CRS> {
    let members = match geojson {
        GeoJson::FeatureCollection(fc) => fc.foreign_members.as_ref(),
        GeoJson::Feature(f) => f.foreign_members.as_ref(),
        GeoJson::Geometry(g) => g.foreign_members.as_ref(),
    }?;

    let name = members.get("crs")?.get("properties")?.get("name")?.as_str()?;
    if name.ends_with("CRS84") {
        return Some(CRS::wgs84());
    }
    let code = name.rsplit(':').next()?;
    code.parse::<u32>().ok().map(CRS::from_epsg)
}

/// Wrap geometries into a FeatureCollection, one feature each
pub fn to_feature_collection<'a, I>(geometries: I, crs: Option<&CRS>) -> GeoJson
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    let features = geometries
        .into_iter()
        .map(|g| Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(g))),
            id: None,
            properties: Some(JsonObject::new()),
            foreign_members: None,
        })
        .collect();

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: crs.and_then(crs_member),
    })
}

fn crs_member(crs: &CRS) -> Option<JsonObject> {
    let code = crs.epsg()?;
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({
            "type": "name",
            "properties": {"name": format!("urn:ogc:def:crs:EPSG::{}", code)}
        }),
    );
    Some(members)
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32610"}},
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[4,0],[4,4],[0,4],[0,0]]]}
        }]
    }"#;

    #[test]
    fn test_polygon_from_feature_collection() {
        let gj = parse_geojson(SQUARE).unwrap();
        assert!(matches!(polygonal_from_geojson(&gj).unwrap(), Geometry::Polygon(_)));
        assert_eq!(crs_from_geojson(&gj), Some(CRS::from_epsg(32610)));
    }

    #[test]
    fn test_points_rejected_as_boundary() {
        let gj = parse_geojson(r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#).unwrap();
        assert!(polygonal_from_geojson(&gj).is_err());
        assert_eq!(points_from_geojson(&gj).unwrap(), vec![Point::new(1.0, 2.0)]);
        assert_eq!(crs_from_geojson(&gj), None);
    }

    #[test]
    fn test_feature_collection_roundtrip() {
        let gj = parse_geojson(SQUARE).unwrap();
        let geom = polygonal_from_geojson(&gj).unwrap();
        let out = to_feature_collection([&geom], Some(&CRS::from_epsg(32610)));
        let reparsed = parse_geojson(&out.to_string()).unwrap();
        assert_eq!(polygonal_from_geojson(&reparsed).unwrap(), geom);
        assert_eq!(crs_from_geojson(&reparsed), Some(CRS::from_epsg(32610)));
    }
}
