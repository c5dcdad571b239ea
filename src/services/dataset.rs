use geo::Point;
use geojson::{GeoJson, Geometry, JsonValue, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading the node dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    #[error("Feature {feature} has no geometry")]
    MissingGeometry { feature: usize },

    #[error("Feature {feature} has unsupported geometry type {kind}")]
    UnsupportedGeometry { feature: usize, kind: &'static str },

    #[error("Feature {feature} has an incomplete or non-finite coordinate")]
    InvalidCoordinate { feature: usize },

    #[error("Dataset contains no points")]
    Empty,
}

/// Node coordinates loaded from a GeoJSON file
#[derive(Debug, Clone)]
pub struct PointSet {
    pub points: Vec<Point<f64>>,
    /// Top-level `crs` member of the source document, echoed in responses
    pub crs: Option<JsonValue>,
}

impl PointSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Reads the node dataset from disk
///
/// The file is read again on every call so edits to the dataset are picked
/// up without restarting the service.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    path: PathBuf,
}

impl DatasetLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<PointSet, DatasetError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| DatasetError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        let set = parse_point_set(&contents)?;
        tracing::debug!("Loaded {} nodes from {}", set.len(), self.path.display());
        Ok(set)
    }
}

/// Parse a GeoJSON document of Point / MultiPoint features
///
/// Accepts a FeatureCollection, a single Feature or a bare Geometry.
/// MultiPoint geometries contribute each of their positions in order.
pub fn parse_point_set(contents: &str) -> Result<PointSet, DatasetError> {
    let geojson = contents.parse::<GeoJson>()?;

    let mut points = Vec::new();
    let crs = match geojson {
        GeoJson::FeatureCollection(collection) => {
            for (feature, item) in collection.features.iter().enumerate() {
                let geometry = item
                    .geometry
                    .as_ref()
                    .ok_or(DatasetError::MissingGeometry { feature })?;
                collect_points(geometry, feature, &mut points)?;
            }
            collection
                .foreign_members
                .as_ref()
                .and_then(|members| members.get("crs"))
                .cloned()
        }
        GeoJson::Feature(item) => {
            let geometry = item
                .geometry
                .as_ref()
                .ok_or(DatasetError::MissingGeometry { feature: 0 })?;
            collect_points(geometry, 0, &mut points)?;
            item.foreign_members
                .as_ref()
                .and_then(|members| members.get("crs"))
                .cloned()
        }
        GeoJson::Geometry(geometry) => {
            collect_points(&geometry, 0, &mut points)?;
            None
        }
    };

    if points.is_empty() {
        return Err(DatasetError::Empty);
    }

    Ok(PointSet { points, crs })
}

fn collect_points(
    geometry: &Geometry,
    feature: usize,
    out: &mut Vec<Point<f64>>,
) -> Result<(), DatasetError> {
    match &geometry.value {
        Value::Point(position) => out.push(to_point(position, feature)?),
        Value::MultiPoint(positions) => {
            for position in positions {
                out.push(to_point(position, feature)?);
            }
        }
        other => {
            return Err(DatasetError::UnsupportedGeometry {
                feature,
                kind: geometry_kind(other),
            })
        }
    }
    Ok(())
}

fn to_point(position: &[f64], feature: usize) -> Result<Point<f64>, DatasetError> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Point::new(*x, *y)),
        _ => Err(DatasetError::InvalidCoordinate { feature }),
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
