//! End-to-end round-trips through the public API: build a tile, decode
//! it, and check that names, ids, geometry points, and property
//! key/value mappings survive unchanged.

use std::collections::BTreeMap;

use tilewire::{
    apply_visitor, decode_point_geometry, FeatureBuilder, GeomType, GeometryHandler, IntoPoint,
    KeyIndex, LayerBuilder, Point, PropertyValue, ProtocolError, Tile, TileBuilder, ValueIndex,
    ValueVisitor,
};

#[derive(Debug, Default)]
struct PointHandler {
    data: Vec<Point>,
}

impl GeometryHandler for PointHandler {
    fn begin(&mut self, count: u32) {
        self.data.reserve(count as usize);
    }

    fn point(&mut self, point: Point) {
        self.data.push(point);
    }
}

struct Stringify;

impl ValueVisitor for Stringify {
    type Output = String;

    fn visit_string(&mut self, value: &str) -> String {
        value.to_string()
    }
    fn visit_float(&mut self, value: f32) -> String {
        value.to_string()
    }
    fn visit_double(&mut self, value: f64) -> String {
        value.to_string()
    }
    fn visit_int(&mut self, value: i64) -> String {
        value.to_string()
    }
    fn visit_uint(&mut self, value: u64) -> String {
        value.to_string()
    }
    fn visit_sint(&mut self, value: i64) -> String {
        value.to_string()
    }
    fn visit_bool(&mut self, value: bool) -> String {
        value.to_string()
    }
}

/// Builds a single-layer tile with one point feature carrying the given
/// properties, then hands it to the check.
fn build_point_tile(properties: &[(&str, PropertyValue)]) -> Vec<u8> {
    let mut layer = LayerBuilder::new("points");
    let mut feature = FeatureBuilder::point().with_id(1);
    feature.add_point((10, 10)).unwrap();
    for (key, value) in properties {
        feature.add_property(key, value.clone()).unwrap();
    }
    feature.commit(&mut layer).unwrap();

    let mut tile = TileBuilder::new();
    tile.add_layer(layer);
    tile.serialize()
}

#[test]
fn value_variants_roundtrip_through_visitor() {
    let cases: Vec<(PropertyValue, &str)> = vec![
        (PropertyValue::from("foo"), "foo"),
        (PropertyValue::Float(1.5), "1.5"),
        (PropertyValue::Double(1.25), "1.25"),
        (PropertyValue::Int(42), "42"),
        (PropertyValue::Uint(99), "99"),
        (PropertyValue::Sint(-42), "-42"),
        (PropertyValue::Bool(true), "true"),
    ];

    for (value, expected) in cases {
        let data = build_point_tile(&[("v", value.clone())]);
        let tile = Tile::new(&data);
        let layer = tile.layers().next().unwrap().unwrap();
        let feature = layer.features().next().unwrap().unwrap();
        let property = feature.properties().next().unwrap().unwrap();

        assert_eq!(property.value.kind(), value.kind());
        assert_eq!(apply_visitor(&mut Stringify, property.value), expected);
    }
}

#[test]
fn property_map_scenario() {
    let data = build_point_tile(&[
        ("foo", PropertyValue::from("bar")),
        ("x", PropertyValue::from("y")),
        ("abc", PropertyValue::from("def")),
    ]);

    let tile = Tile::new(&data);
    let layers: Vec<_> = tile.layers().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name(), "points");

    let features: Vec<_> = layers[0]
        .features()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].num_properties().unwrap(), 3);

    let mut map = BTreeMap::new();
    for property in features[0].properties() {
        let property = property.unwrap();
        map.insert(
            property.key.to_string(),
            property.value.string_value().unwrap().to_string(),
        );
    }
    assert_eq!(map.len(), 3);
    assert_eq!(map["foo"], "bar");
    assert_eq!(map["x"], "y");
    assert_eq!(map["abc"], "def");
}

#[derive(Debug, Clone, Copy)]
struct MyPoint {
    p1: i64,
    p2: i64,
}

impl IntoPoint for MyPoint {
    fn into_point(self) -> Point {
        Point::new(self.p1 as i32, self.p2 as i32)
    }
}

#[test]
fn point_builder_accepts_any_point_representation() {
    let mut variants: Vec<FeatureBuilder> = Vec::new();

    let mut by_tuple = FeatureBuilder::point().with_id(17);
    by_tuple.add_point((10, 20)).unwrap();
    variants.push(by_tuple);

    let mut by_point = FeatureBuilder::point().with_id(17);
    by_point.add_point(Point::new(10, 20)).unwrap();
    variants.push(by_point);

    let mut by_custom = FeatureBuilder::point().with_id(17);
    by_custom.add_point(MyPoint { p1: 10, p2: 20 }).unwrap();
    variants.push(by_custom);

    for mut feature in variants {
        let mut layer = LayerBuilder::new("test");
        feature.commit(&mut layer).unwrap();
        let mut tile = TileBuilder::new();
        tile.add_layer(layer);
        let data = tile.serialize();

        let tile = Tile::new(&data);
        let layer = tile.layers().next().unwrap().unwrap();
        assert_eq!(layer.name(), "test");
        assert_eq!(layer.version(), 2);
        assert_eq!(layer.extent(), 4096);

        let feature = layer.features().next().unwrap().unwrap();
        assert_eq!(feature.id(), 17);
        assert_eq!(feature.geom_type(), GeomType::Point);

        let mut handler = PointHandler::default();
        decode_point_geometry(feature.geometry(), &mut handler).unwrap();
        assert_eq!(handler.data, vec![Point::new(10, 20)]);
    }
}

#[test]
fn value_index_variants_resolve_identically() {
    // One feature per indexing strategy; all must decode to sint 12.
    let strategies: Vec<Box<dyn Fn(&mut LayerBuilder) -> u32>> = vec![
        Box::new(|layer| layer.add_value(&PropertyValue::Sint(12))),
        Box::new(|layer| {
            let mut index: ValueIndex = ValueIndex::new();
            index.index(layer, &PropertyValue::Sint(12))
        }),
        Box::new(|layer| {
            let mut index: ValueIndex<BTreeMap<Vec<u8>, u32>> = ValueIndex::new();
            index.index(layer, &PropertyValue::Sint(12))
        }),
    ];

    for strategy in strategies {
        let mut layer = LayerBuilder::new("test");
        let key = layer.add_key("some_key");
        let value = strategy(&mut layer);

        let mut feature = FeatureBuilder::point().with_id(17);
        feature.add_point((10, 20)).unwrap();
        feature.add_property_indexed(key, value).unwrap();
        feature.commit(&mut layer).unwrap();

        let mut tile = TileBuilder::new();
        tile.add_layer(layer);
        let data = tile.serialize();

        let tile = Tile::new(&data);
        let layer = tile.layers().next().unwrap().unwrap();
        let feature = layer.features().next().unwrap().unwrap();
        assert_eq!(feature.id(), 17);
        let property = feature.properties().next().unwrap().unwrap();
        assert_eq!(property.key, "some_key");
        assert_eq!(property.value.sint_value().unwrap(), 12);
    }
}

#[test]
fn dedup_indexes_share_table_slots_across_features() {
    let mut layer = LayerBuilder::new("trees");
    let mut keys: KeyIndex = KeyIndex::new();
    let mut values: ValueIndex = ValueIndex::new();

    for i in 0..4 {
        let key = keys.index(&mut layer, "species");
        let value = values.index(&mut layer, &PropertyValue::from("oak"));
        let mut feature = FeatureBuilder::point().with_id(i);
        feature.add_point((i as i32, i as i32)).unwrap();
        feature.add_property_indexed(key, value).unwrap();
        feature.commit(&mut layer).unwrap();
    }
    assert_eq!(layer.key_count(), 1);
    assert_eq!(layer.value_count(), 1);

    let mut tile = TileBuilder::new();
    tile.add_layer(layer);
    let data = tile.serialize();

    let tile = Tile::new(&data);
    let layer = tile.layers().next().unwrap().unwrap();
    for feature in layer.features() {
        let property = feature.unwrap().properties().next().unwrap().unwrap();
        assert_eq!(property.key, "species");
        assert_eq!(property.value.string_value().unwrap(), "oak");
    }
    // Exactly one slot in each table
    assert_eq!(layer.key(0).unwrap(), "species");
    assert!(matches!(
        layer.key(1),
        Err(ProtocolError::IndexOutOfRange { table: "keys", index: 1, size: 1 })
    ));
    assert!(matches!(
        layer.value(1),
        Err(ProtocolError::IndexOutOfRange { table: "values", index: 1, size: 1 })
    ));
}

#[test]
fn linestring_roundtrip_preserves_cursor_across_segments() {
    let mut layer = LayerBuilder::new("roads");
    let mut feature = FeatureBuilder::linestring().with_id(3);
    feature
        .add_linestring(&[(2, 2), (4, 4), (6, 6)])
        .unwrap();
    feature.add_linestring(&[(7, 1), (10, 1)]).unwrap();
    feature.commit(&mut layer).unwrap();

    let mut tile = TileBuilder::new();
    tile.add_layer(layer);
    let data = tile.serialize();

    #[derive(Default)]
    struct Segments {
        parts: Vec<Vec<Point>>,
    }
    impl GeometryHandler for Segments {
        fn begin(&mut self, _count: u32) {
            self.parts.push(Vec::new());
        }
        fn point(&mut self, point: Point) {
            self.parts.last_mut().unwrap().push(point);
        }
    }

    let tile = Tile::new(&data);
    let layer = tile.layers().next().unwrap().unwrap();
    let feature = layer.features().next().unwrap().unwrap();
    assert_eq!(feature.geom_type(), GeomType::Linestring);

    let mut handler = Segments::default();
    feature.decode_geometry(&mut handler).unwrap();
    assert_eq!(
        handler.parts,
        vec![
            vec![Point::new(2, 2), Point::new(4, 4), Point::new(6, 6)],
            vec![Point::new(7, 1), Point::new(10, 1)],
        ]
    );
}

#[test]
fn polygon_roundtrip_with_inner_ring() {
    let mut layer = LayerBuilder::new("buildings");
    let mut feature = FeatureBuilder::polygon();
    feature
        .add_ring(&[(0, 0), (100, 0), (100, 100), (0, 100)])
        .unwrap();
    feature
        .add_ring(&[(20, 20), (20, 40), (40, 40), (40, 20)])
        .unwrap();
    feature.commit(&mut layer).unwrap();

    let mut tile = TileBuilder::new();
    tile.add_layer(layer);
    let data = tile.serialize();

    #[derive(Default)]
    struct Rings {
        rings: Vec<Vec<Point>>,
        closes: u32,
    }
    impl GeometryHandler for Rings {
        fn begin(&mut self, _count: u32) {
            self.rings.push(Vec::new());
        }
        fn point(&mut self, point: Point) {
            self.rings.last_mut().unwrap().push(point);
        }
        fn close(&mut self) {
            self.closes += 1;
        }
    }

    let tile = Tile::new(&data);
    let layer = tile.layers().next().unwrap().unwrap();
    let feature = layer.features().next().unwrap().unwrap();
    assert_eq!(feature.geom_type(), GeomType::Polygon);

    let mut handler = Rings::default();
    feature.decode_geometry(&mut handler).unwrap();
    assert_eq!(handler.closes, 2);
    assert_eq!(handler.rings.len(), 2);
    assert_eq!(
        handler.rings[0],
        vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ]
    );
    assert_eq!(
        handler.rings[1],
        vec![
            Point::new(20, 20),
            Point::new(20, 40),
            Point::new(40, 40),
            Point::new(40, 20),
        ]
    );
}

#[test]
fn multiple_layers_with_distinct_extents() {
    let mut tile = TileBuilder::new();

    let mut roads = LayerBuilder::new("roads").with_extent(8192);
    let mut road = FeatureBuilder::linestring();
    road.add_linestring(&[(0, 0), (500, 500)]).unwrap();
    road.commit(&mut roads).unwrap();
    tile.add_layer(roads);

    let mut pois = LayerBuilder::new("pois");
    let mut poi = FeatureBuilder::point().with_id(9);
    poi.add_point((128, 128)).unwrap();
    poi.add_property("amenity", PropertyValue::from("cafe"))
        .unwrap();
    poi.commit(&mut pois).unwrap();
    tile.add_layer(pois);

    let data = tile.serialize();
    let tile = Tile::new(&data);
    let layers: Vec<_> = tile.layers().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].name(), "roads");
    assert_eq!(layers[0].extent(), 8192);
    assert_eq!(layers[1].name(), "pois");
    assert_eq!(layers[1].extent(), 4096);

    let poi = layers[1].features().next().unwrap().unwrap();
    assert_eq!(poi.id(), 9);
    let property = poi.properties().next().unwrap().unwrap();
    assert_eq!((property.key, property.value.string_value().unwrap()), ("amenity", "cafe"));
}

#[test]
fn feature_ids_and_unset_id() {
    let mut layer = LayerBuilder::new("mixed");
    let mut with_id = FeatureBuilder::point().with_id(u64::MAX);
    with_id.add_point((1, 1)).unwrap();
    with_id.commit(&mut layer).unwrap();

    let mut without_id = FeatureBuilder::point();
    without_id.add_point((2, 2)).unwrap();
    without_id.commit(&mut layer).unwrap();

    let mut tile = TileBuilder::new();
    tile.add_layer(layer);
    let data = tile.serialize();

    let tile = Tile::new(&data);
    let layer = tile.layers().next().unwrap().unwrap();
    let ids: Vec<u64> = layer
        .features()
        .map(|f| f.map(|f| f.id()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(ids, vec![u64::MAX, 0]);
}
