use crate::core::{FitReport, RigidTransform, Termination};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fit quality reported alongside the matched nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitSummary {
    pub fit_id: Uuid,
    pub num_points: usize,
    /// Sum of squared distances at the returned parameters
    pub cost: f64,
    pub rms_distance: f64,
    pub success: bool,
    pub termination: Termination,
    pub iterations: usize,
    pub evaluations: usize,
    pub params: TransformParams,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransformParams {
    pub scale: f64,
    pub rotation: f64,
    pub tx: f64,
    pub ty: f64,
}

impl From<RigidTransform> for TransformParams {
    fn from(t: RigidTransform) -> Self {
        Self {
            scale: t.scale,
            rotation: t.rotation,
            tx: t.tx,
            ty: t.ty,
        }
    }
}

impl FitSummary {
    pub fn from_report(fit_id: Uuid, report: &FitReport) -> Self {
        let opt = &report.optimization;
        Self {
            fit_id,
            num_points: report.matches.len(),
            cost: opt.cost,
            rms_distance: report.rms_distance,
            success: opt.success,
            termination: opt.termination,
            iterations: opt.iterations,
            evaluations: opt.evaluations,
            params: opt.transform.into(),
        }
    }
}

/// Matched nodes as a GeoJSON FeatureCollection of Points
///
/// Features follow curve order and carry `curveIndex` / `nodeIndex`
/// properties. The source dataset's `crs` member, when present, is copied
/// onto the collection together with a `fit` member holding the summary.
pub fn build_feature_collection(
    report: &FitReport,
    summary: &FitSummary,
    crs: Option<&JsonValue>,
) -> Result<FeatureCollection, serde_json::Error> {
    let features = report
        .matches
        .iter()
        .map(|m| {
            let mut properties = JsonObject::new();
            properties.insert("curveIndex".to_string(), m.curve_index.into());
            properties.insert("nodeIndex".to_string(), m.node_index.into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![m.point.x(), m.point.y()]))),
                id: Some(Id::Number(m.curve_index.into())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut members = JsonObject::new();
    if let Some(crs) = crs {
        members.insert("crs".to_string(), crs.clone());
    }
    members.insert("fit".to_string(), serde_json::to_value(summary)?);

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(members),
    })
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
