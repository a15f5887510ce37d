use kinegraph::TimelineDocument;
use kinegraph::model::SegmentValue;

#[test]
fn json_fixture_validates() {
    let s = include_str!("data/explainer_demo.json");
    let doc: TimelineDocument = serde_json::from_str(s).unwrap();
    doc.validate().unwrap();
}

#[test]
fn json_fixture_parses_expected_shapes() {
    let s = include_str!("data/explainer_demo.json");
    let doc: TimelineDocument = serde_json::from_str(s).unwrap();

    assert_eq!(doc.duration_frames(), 240);
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.edges[0].endpoint_alias(), "api-db");

    let drift = &doc.tracks[2].segments[0];
    assert!(matches!(drift.from, SegmentValue::Point(p) if p.x == 600.0 && p.y == 200.0));

    let draw = &doc.tracks[1].segments[0];
    assert!(matches!(draw.from, SegmentValue::Number(n) if n == 400.0));
}
