//! Benchmark for tilewire serialization and decoding.
//!
//! Builds a synthetic multi-layer tile (no external data needed), then
//! times encoding, full decode traversal, and geometry decoding.

use std::time::Instant;

use tilewire::{
    FeatureBuilder, GeometryHandler, KeyIndex, LayerBuilder, Point, PropertyValue, Tile,
    TileBuilder, ValueIndex,
};

const POI_COUNT: u64 = 50_000;
const ROAD_COUNT: u64 = 10_000;
const DISTINCT_NAMES: u64 = 500;

fn build_poi_layer() -> LayerBuilder {
    let mut layer = LayerBuilder::new("pois");
    let mut keys: KeyIndex = KeyIndex::new();
    let mut values: ValueIndex = ValueIndex::new();

    for i in 0..POI_COUNT {
        let name_key = keys.index(&mut layer, "name");
        let rank_key = keys.index(&mut layer, "rank");
        let name = values.index(
            &mut layer,
            &PropertyValue::String(format!("poi-{}", i % DISTINCT_NAMES)),
        );
        let rank = values.index(&mut layer, &PropertyValue::Uint(i % 10));

        let mut feature = FeatureBuilder::point().with_id(i);
        feature
            .add_point(((i % 4096) as i32, ((i * 7) % 4096) as i32))
            .expect("point geometry");
        feature.add_property_indexed(name_key, name).expect("tag");
        feature.add_property_indexed(rank_key, rank).expect("tag");
        feature.commit(&mut layer).expect("commit");
    }
    layer
}

fn build_road_layer() -> LayerBuilder {
    let mut layer = LayerBuilder::new("roads");
    let mut keys: KeyIndex = KeyIndex::new();
    let mut values: ValueIndex = ValueIndex::new();

    for i in 0..ROAD_COUNT {
        let class_key = keys.index(&mut layer, "class");
        let class = values.index(
            &mut layer,
            &PropertyValue::String(format!("class-{}", i % 8)),
        );

        let x = (i % 4000) as i32;
        let y = ((i * 13) % 4000) as i32;
        let mut feature = FeatureBuilder::linestring().with_id(i);
        feature
            .add_linestring(&[(x, y), (x + 50, y + 20), (x + 90, y + 90)])
            .expect("line geometry");
        feature.add_property_indexed(class_key, class).expect("tag");
        feature.commit(&mut layer).expect("commit");
    }
    layer
}

#[derive(Default)]
struct CountPoints {
    points: u64,
}

impl GeometryHandler for CountPoints {
    fn point(&mut self, _point: Point) {
        self.points += 1;
    }
}

fn main() {
    println!("=== Build ===");
    let start = Instant::now();
    let mut tile = TileBuilder::new();
    tile.add_layer(build_poi_layer());
    tile.add_layer(build_road_layer());
    let build_time = start.elapsed();
    println!(
        "Built {} features in {:.1} ms",
        POI_COUNT + ROAD_COUNT,
        build_time.as_secs_f64() * 1000.0
    );

    println!("\n=== Serialize ===");
    let start = Instant::now();
    let data = tile.serialize();
    let serialize_time = start.elapsed();
    println!(
        "Serialized {} bytes in {:.1} ms ({:.1} MB/s)",
        data.len(),
        serialize_time.as_secs_f64() * 1000.0,
        data.len() as f64 / serialize_time.as_secs_f64() / 1e6
    );

    println!("\n=== Decode traversal ===");
    let start = Instant::now();
    let mut features = 0u64;
    let mut properties = 0u64;
    let mut string_bytes = 0u64;
    let view = Tile::new(&data);
    for layer in view.layers() {
        let layer = layer.expect("layer");
        for feature in layer.features() {
            let feature = feature.expect("feature");
            features += 1;
            for property in feature.properties() {
                let property = property.expect("property");
                properties += 1;
                if let Ok(s) = property.value.string_value() {
                    string_bytes += s.len() as u64;
                }
            }
        }
    }
    let decode_time = start.elapsed();
    println!(
        "Visited {} features / {} properties ({} string bytes) in {:.1} ms ({:.1} MB/s)",
        features,
        properties,
        string_bytes,
        decode_time.as_secs_f64() * 1000.0,
        data.len() as f64 / decode_time.as_secs_f64() / 1e6
    );

    println!("\n=== Geometry decode ===");
    let start = Instant::now();
    let mut counter = CountPoints::default();
    for layer in view.layers() {
        let layer = layer.expect("layer");
        for feature in layer.features() {
            feature
                .expect("feature")
                .decode_geometry(&mut counter)
                .expect("geometry");
        }
    }
    let geom_time = start.elapsed();
    println!(
        "Decoded {} points in {:.1} ms",
        counter.points,
        geom_time.as_secs_f64() * 1000.0
    );
}
