use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::{
    camera::CameraState,
    core::{Affine, FrameIndex, Point},
    error::{KinegraphError, KinegraphResult},
    lifecycle::{self, Lifecycle},
    model::{ElementKind, SegmentValue, TimelineDocument},
    path::{self, PathReveal},
    scene::{SceneGraph, SceneItem},
    tracks,
};

/// Resolved render state of one element at one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub opacity: f64,
    pub transform: Affine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dashoffset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathReveal>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, SegmentValue>,
}

/// Complete output for one frame: the element map plus the distinguished
/// camera pose and its stage view transform. Element transforms do not
/// include the view; the rendering surface applies `view` to the whole
/// scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameState {
    pub frame: FrameIndex,
    pub camera: CameraState,
    pub view: Affine,
    pub elements: BTreeMap<String, ElementState>,
}

impl FrameState {
    pub fn to_json(&self) -> KinegraphResult<String> {
        serde_json::to_string(self).map_err(|e| KinegraphError::serde(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> KinegraphResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| KinegraphError::serde(e.to_string()))
    }
}

pub struct Evaluator;

impl Evaluator {
    /// Validate, then resolve the full frame state. Pure in `(doc, frame)`;
    /// any frame may be requested in any order.
    #[tracing::instrument(skip(doc))]
    pub fn eval_frame(doc: &TimelineDocument, frame: FrameIndex) -> KinegraphResult<FrameState> {
        doc.validate()?;
        Ok(Self::eval_frame_unchecked(doc, frame))
    }

    /// Frame evaluation without re-validating the document. Range drivers
    /// validate once up front and call this in their loop.
    pub fn eval_frame_unchecked(doc: &TimelineDocument, frame: FrameIndex) -> FrameState {
        let time = doc.fps.frames_to_secs(frame.0);
        let scene = SceneGraph::build(&doc.events);
        let lifecycles = lifecycle::resolve(&doc.events);

        let overlay = tracks::resolve_camera_overlay(&doc.tracks, time);
        let camera = CameraState::compose(&doc.camera_events, time).with_overlay(&overlay);
        let view = camera.view_transform(&doc.stage);

        let mut elements = BTreeMap::new();

        // Static diagram entities, unless an event redeclares the id.
        for node in &doc.nodes {
            if scene.get(&node.id).is_some() {
                continue;
            }
            let lc = resolved_lifecycle(&lifecycles, &node.id);
            if !lc.visible_at(time) {
                continue;
            }
            let (state, _) = assemble(
                doc,
                &[node.id.as_str()],
                lc,
                node.position(),
                Affine::IDENTITY,
                time,
            );
            elements.insert(node.id.clone(), state);
        }

        for edge in &doc.edges {
            if scene.get(&edge.id).is_some() {
                continue;
            }
            let alias = edge.endpoint_alias();
            let lc = resolved_lifecycle(&lifecycles, &edge.id);
            if !lc.visible_at(time) {
                continue;
            }
            let (state, _) = assemble(
                doc,
                &[edge.id.as_str(), alias.as_str()],
                lc,
                Point::ZERO,
                Affine::IDENTITY,
                time,
            );
            elements.insert(edge.id.clone(), state);
        }

        // Event-declared forest, parents before children. An invisible
        // item hides its whole subtree.
        let node_positions: BTreeMap<&str, Point> = doc
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.position()))
            .collect();
        let mut stack: SmallVec<[(usize, Affine); 8]> =
            scene.roots().map(|i| (i, Affine::IDENTITY)).collect();
        while let Some((idx, parent_world)) = stack.pop() {
            let item = &scene.items()[idx];
            let lc = resolved_lifecycle(&lifecycles, &item.id);
            if !lc.visible_at(time) {
                continue;
            }

            // Children carry local offsets; only roots may fall back to a
            // diagram node's absolute placement.
            let fallback = item
                .static_position()
                .or_else(|| {
                    if scene.parent_of(idx).is_none() {
                        node_positions.get(item.id.as_str()).copied()
                    } else {
                        None
                    }
                })
                .unwrap_or(Point::ZERO);

            let (mut state, world) =
                assemble(doc, &[item.id.as_str()], lc, fallback, parent_world, time);
            if item.kind == ElementKind::Arrow {
                state.path = arrow_reveal(item, state.stroke_dashoffset, lc, time);
            }
            elements.insert(item.id.clone(), state);

            for &child in scene.children_of(idx) {
                stack.push((child, world));
            }
        }

        FrameState {
            frame,
            camera,
            view,
            elements,
        }
    }
}

fn resolved_lifecycle(lifecycles: &BTreeMap<String, Lifecycle>, id: &str) -> Lifecycle {
    lifecycles.get(id).copied().unwrap_or_else(Lifecycle::unbounded)
}

/// Resolve one element's state. Returns the state and the world transform
/// its children compose under.
fn assemble(
    doc: &TimelineDocument,
    keys: &[&str],
    lc: Lifecycle,
    fallback_position: Point,
    parent_world: Affine,
    time: f64,
) -> (ElementState, Affine) {
    let props = tracks::resolve_properties(&doc.tracks, keys, time);

    let mut opacity = props.number_or("opacity", 1.0);
    if let Some(fade) = lc.fade_opacity(time, doc.fps) {
        opacity = fade;
    }
    let opacity = opacity.clamp(0.0, 1.0);

    let position = props.point("position").unwrap_or(fallback_position);
    let scale = props.number_or("scale", 1.0)
        * lc.scale_in_factor(time, doc.fps)
        * tracks::breathing_factor(&doc.tracks, keys, time, doc.fps)
        * props.number_or("zoom", 1.0);
    let transform = parent_world * Affine::translate(position.to_vec2()) * Affine::scale(scale);

    let stroke_dashoffset = props.number("strokeDashoffset");

    let mut extra = props.into_map();
    for consumed in ["opacity", "scale", "position", "zoom", "strokeDashoffset"] {
        extra.remove(consumed);
    }

    let state = ElementState {
        opacity,
        transform,
        stroke_dashoffset,
        path: None,
        props: extra,
    };
    (state, transform)
}

/// Arc-length reveal for an arrow item. Progress comes from a resolved
/// dash offset against the path length when a track drives one, else
/// linearly over the arrow's own `[appear, appear + duration]` window.
fn arrow_reveal(
    item: &SceneItem,
    stroke_dashoffset: Option<f64>,
    lc: Lifecycle,
    time: f64,
) -> Option<PathReveal> {
    let points: Vec<Point> = match (&item.path, item.from, item.to) {
        (Some(path), _, _) => path.clone(),
        (None, Some(from), Some(to)) => vec![from, to],
        _ => return None,
    };
    let total = path::total_length(&points);
    let progress = match stroke_dashoffset {
        Some(dash) if total > 0.0 => 1.0 - dash / total,
        _ => match item.duration {
            Some(duration) if duration > 0.0 => (time - lc.appear) / duration,
            _ => 1.0,
        },
    };
    path::reveal(&points, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Fps, Stage};
    use crate::model::{
        AnimationSegment, AnimationTrack, EventAction, Node, TimelineEvent, TrackKind, VisualStyle,
    };

    fn style() -> VisualStyle {
        VisualStyle {
            width: 100.0,
            height: 60.0,
            shape: "rect".to_string(),
            background_color: "#0f172a".to_string(),
            border_color: "#38bdf8".to_string(),
            border_width: 1.0,
            border_radius: 8.0,
        }
    }

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_string(),
            icon: "server".to_string(),
            x,
            y,
            visual_style: style(),
        }
    }

    fn seg(t0: f64, t1: f64, property: &str, from: SegmentValue, to: SegmentValue) -> AnimationSegment {
        AnimationSegment {
            t0,
            t1,
            property: property.to_string(),
            from,
            to,
            easing: "linear".to_string(),
        }
    }

    fn track(kind: TrackKind, target: &str, segments: Vec<AnimationSegment>) -> AnimationTrack {
        AnimationTrack {
            id: format!("track-{target}"),
            kind,
            target_id: target.to_string(),
            segments,
        }
    }

    fn ev(id: &str, kind: ElementKind, action: EventAction, time: f64) -> TimelineEvent {
        TimelineEvent {
            element_id: id.to_string(),
            kind,
            action,
            time,
            duration: None,
            from: None,
            to: None,
            path: None,
            children: vec![],
            content: None,
            asset: None,
            props: BTreeMap::new(),
        }
    }

    fn basic_doc() -> TimelineDocument {
        TimelineDocument {
            version: None,
            fps: Fps::new(30, 1).unwrap(),
            stage: Stage {
                width: 800,
                height: 600,
                background_color: None,
            },
            total_duration: 10.0,
            nodes: vec![node("n1", 400.0, 300.0)],
            edges: vec![],
            events: vec![],
            tracks: vec![track(
                TrackKind::Node,
                "n1",
                vec![seg(
                    0.5,
                    1.5,
                    "opacity",
                    SegmentValue::Number(0.0),
                    SegmentValue::Number(1.0),
                )],
            )],
            camera_events: vec![],
        }
    }

    #[test]
    fn flat_node_uses_static_position_and_track_opacity() {
        let doc = basic_doc();
        let state = Evaluator::eval_frame(&doc, FrameIndex(30)).unwrap();
        let n1 = &state.elements["n1"];
        assert_eq!(n1.opacity, 0.5);
        assert_eq!(n1.transform.as_coeffs(), [1.0, 0.0, 0.0, 1.0, 400.0, 300.0]);
        assert_eq!(n1.stroke_dashoffset, None);
    }

    #[test]
    fn event_element_presence_follows_lifecycle() {
        let mut doc = basic_doc();
        doc.events = vec![
            ev("badge", ElementKind::Icon, EventAction::Appear, 1.0),
            ev("badge", ElementKind::Icon, EventAction::Disappear, 2.0),
        ];
        let at = |frame: u64| {
            Evaluator::eval_frame_unchecked(&doc, FrameIndex(frame))
                .elements
                .contains_key("badge")
        };
        assert!(!at(15)); // t = 0.5
        assert!(at(30)); // t = 1.0
        assert!(at(45)); // t = 1.5
        assert!(!at(60)); // t = 2.0, window is half-open
    }

    #[test]
    fn fade_overlay_overwrites_track_opacity() {
        let mut doc = basic_doc();
        doc.nodes = vec![];
        doc.tracks = vec![];
        doc.events = vec![ev("badge", ElementKind::Icon, EventAction::Appear, 0.0)];

        let opacity_at = |frame: u64| {
            Evaluator::eval_frame_unchecked(&doc, FrameIndex(frame)).elements["badge"].opacity
        };
        assert_eq!(opacity_at(0), 0.0);
        let mid = opacity_at(10);
        assert!(mid > 0.0 && mid < 1.0);
        // Fade window is exactly 20 frames; past it the track default holds.
        assert_eq!(opacity_at(20), 1.0);
    }

    #[test]
    fn opacity_is_clamped_for_every_frame() {
        let mut doc = basic_doc();
        doc.tracks = vec![track(
            TrackKind::Node,
            "n1",
            vec![seg(
                0.0,
                2.0,
                "opacity",
                SegmentValue::Number(-0.5),
                SegmentValue::Number(1.5),
            )],
        )];
        for frame in 0..90 {
            let state = Evaluator::eval_frame_unchecked(&doc, FrameIndex(frame));
            let opacity = state.elements["n1"].opacity;
            assert!((0.0..=1.0).contains(&opacity), "frame {frame}: {opacity}");
        }
    }

    #[test]
    fn dash_offset_and_extra_props_pass_through() {
        let mut doc = basic_doc();
        doc.tracks.push(track(
            TrackKind::Node,
            "n1",
            vec![
                seg(
                    0.0,
                    2.0,
                    "strokeDashoffset",
                    SegmentValue::Number(150.0),
                    SegmentValue::Number(0.0),
                ),
                seg(
                    0.0,
                    2.0,
                    "color",
                    SegmentValue::Text("#1e293b".to_string()),
                    SegmentValue::Text("#dc2626".to_string()),
                ),
            ],
        ));
        let state = Evaluator::eval_frame_unchecked(&doc, FrameIndex(45));
        let n1 = &state.elements["n1"];
        assert_eq!(n1.stroke_dashoffset, Some(37.5));
        assert_eq!(
            n1.props.get("color"),
            Some(&SegmentValue::Text("#dc2626".to_string()))
        );
        assert!(!n1.props.contains_key("opacity"));
    }

    #[test]
    fn camera_events_never_surface_as_elements() {
        let mut doc = basic_doc();
        doc.events = vec![ev("camera", ElementKind::Camera, EventAction::Animate, 0.0)];
        let state = Evaluator::eval_frame_unchecked(&doc, FrameIndex(10));
        assert!(!state.elements.contains_key("camera"));
    }

    #[test]
    fn out_of_range_frames_still_resolve() {
        let doc = basic_doc();
        let state = Evaluator::eval_frame(&doc, FrameIndex(100_000)).unwrap();
        assert_eq!(state.elements["n1"].opacity, 1.0);
    }

    #[test]
    fn eval_frame_rejects_invalid_documents() {
        let mut doc = basic_doc();
        doc.total_duration = 0.0;
        assert!(Evaluator::eval_frame(&doc, FrameIndex(0)).is_err());
    }

    #[test]
    fn identical_inputs_produce_identical_json() {
        let mut doc = basic_doc();
        doc.events = vec![ev("badge", ElementKind::Icon, EventAction::Appear, 0.5)];
        let a = Evaluator::eval_frame_unchecked(&doc, FrameIndex(40)).to_json().unwrap();
        let b = Evaluator::eval_frame_unchecked(&doc, FrameIndex(40)).to_json().unwrap();
        assert_eq!(a, b);
    }
}
