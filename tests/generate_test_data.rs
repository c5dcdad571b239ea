/// Test data generator for Heart Fit
///
/// Writes a synthetic bicycle-parking dataset as a GeoJSON FeatureCollection
/// of Point features clustered around Bavarian towns, for running the
/// service locally without the real node export.
///
/// Run: cargo run --bin generate-test-data [output-path] [node-count]

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use std::fs::File;
use std::io::{BufWriter, Write};

const DEFAULT_OUTPUT: &str = "public/bavaria_bike_nodes.geojson";
const DEFAULT_NODE_COUNT: usize = 5000;

const TOWNS: &[(&str, f64, f64)] = &[
    ("Munich", 11.5820, 48.1351),
    ("Nuremberg", 11.0767, 49.4521),
    ("Augsburg", 10.8978, 48.3705),
    ("Regensburg", 12.1016, 49.0134),
    ("Ingolstadt", 11.4250, 48.7665),
    ("Würzburg", 9.9534, 49.7913),
    ("Fürth", 10.9887, 49.4771),
    ("Erlangen", 11.0046, 49.5897),
    ("Bamberg", 10.8978, 49.8988),
    ("Bayreuth", 11.5783, 49.9456),
    ("Landshut", 12.1512, 48.5442),
    ("Passau", 13.4319, 48.5667),
    ("Rosenheim", 12.1289, 47.8561),
    ("Kempten", 10.3153, 47.7267),
];

/// Deterministic linear congruential generator so datasets are reproducible
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let count: usize = match args.next() {
        Some(n) => n.parse()?,
        None => DEFAULT_NODE_COUNT,
    };

    let mut rng = Lcg(0x5eed_cafe);
    let mut features = Vec::with_capacity(count);

    for i in 0..count {
        // Most nodes sit in towns, the rest are spread across the state
        let (lon, lat, town) = if rng.next_f64() < 0.85 {
            let (name, lon, lat) = TOWNS[rng.index(TOWNS.len())];
            let radius = rng.range(0.0, 0.08);
            let angle = rng.range(0.0, std::f64::consts::TAU);
            (lon + radius * angle.cos(), lat + radius * angle.sin() * 0.66, Some(name))
        } else {
            (rng.range(9.0, 13.8), rng.range(47.3, 50.5), None)
        };

        let mut properties = JsonObject::new();
        properties.insert("amenity".to_string(), "bicycle_parking".into());
        properties.insert("osm_id".to_string(), (100_000_000 + i as u64).into());
        if let Some(town) = town {
            properties.insert("town".to_string(), town.into());
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        serde_json::json!({
            "type": "name",
            "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" }
        }),
    );

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(members),
    };

    if let Some(parent) = std::path::Path::new(&output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(&output)?);
    serde_json::to_writer(&mut writer, &collection)?;
    writer.flush()?;

    println!("Created {} with {} nodes", output, count);
    Ok(())
}
