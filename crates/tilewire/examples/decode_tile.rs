//! Simple decoder to inspect vector tile files.

use std::fs;

use tilewire::{GeomType, GeometryHandler, Point, Tile, ValueView};

fn format_value(v: ValueView<'_>) -> String {
    match v {
        ValueView::String(s) => {
            let preview: String = s.chars().take(60).collect();
            if s.len() > 60 {
                format!("\"{}...\"", preview)
            } else {
                format!("\"{}\"", preview)
            }
        }
        ValueView::Float(v) => format!("{}f", v),
        ValueView::Double(v) => format!("{}", v),
        ValueView::Int(v) => format!("{}", v),
        ValueView::Uint(v) => format!("{}u", v),
        ValueView::Sint(v) => format!("{}s", v),
        ValueView::Bool(b) => format!("{}", b),
    }
}

#[derive(Default)]
struct CountPoints {
    points: usize,
    parts: usize,
}

impl GeometryHandler for CountPoints {
    fn begin(&mut self, _count: u32) {
        self.parts += 1;
    }
    fn point(&mut self, _point: Point) {
        self.points += 1;
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tile.mvt".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let tile = Tile::new(&data);

    for (i, layer) in tile.layers().enumerate() {
        let layer = match layer {
            Ok(layer) => layer,
            Err(e) => {
                eprintln!("[{}] skipping malformed layer: {}", i, e);
                continue;
            }
        };

        println!("\n=== Layer {} ===", i);
        println!("Name: {}", layer.name());
        println!("Version: {}", layer.version());
        println!("Extent: {}", layer.extent());

        let mut points = 0;
        let mut linestrings = 0;
        let mut polygons = 0;
        let mut unknown = 0;
        let mut total = 0;
        for feature in layer.features() {
            let Ok(feature) = feature else {
                eprintln!("  malformed feature, stopping layer scan");
                break;
            };
            total += 1;
            match feature.geom_type() {
                GeomType::Point => points += 1,
                GeomType::Linestring => linestrings += 1,
                GeomType::Polygon => polygons += 1,
                GeomType::Unknown => unknown += 1,
            }
        }
        println!(
            "Features: {} ({} point, {} linestring, {} polygon, {} unknown)",
            total, points, linestrings, polygons, unknown
        );

        // Show first few features in detail
        for (j, feature) in layer.features().take(5).enumerate() {
            let Ok(feature) = feature else { break };
            let mut counter = CountPoints::default();
            let geometry = match feature.decode_geometry(&mut counter) {
                Ok(()) => format!("{} part(s), {} point(s)", counter.parts, counter.points),
                Err(e) => format!("bad geometry: {}", e),
            };
            println!(
                "  [{}] id={} type={:?} geometry: {}",
                j,
                feature.id(),
                feature.geom_type(),
                geometry
            );
            for property in feature.properties().take(8) {
                match property {
                    Ok(property) => {
                        println!("        {} = {}", property.key, format_value(property.value));
                    }
                    Err(e) => {
                        println!("        <malformed property: {}>", e);
                        break;
                    }
                }
            }
        }
    }
}
