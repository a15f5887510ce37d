use std::collections::BTreeMap;

use crate::{
    core::{Fps, Point, Stage},
    error::{KinegraphError, KinegraphResult},
};

/// Immutable root of a timeline: scene entities, events, and animation
/// tracks. Parsed once per render request and shared read-only by every
/// frame evaluation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub fps: Fps,
    pub stage: Stage,
    #[serde(default)]
    pub total_duration: f64, // seconds
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    #[serde(default)]
    pub tracks: Vec<AnimationTrack>,
    #[serde(default)]
    pub camera_events: Vec<CameraEvent>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub x: f64,
    pub y: f64,
    pub visual_style: VisualStyle,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualStyle {
    pub width: f64,
    pub height: f64,
    pub shape: String,
    pub background_color: String,
    pub border_color: String,
    pub border_width: f64,
    pub border_radius: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub from: String, // node id
    pub to: String,   // node id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub path: Vec<Point>,
    pub edge_style: EdgeStyle,
    pub path_length: f64, // precomputed polyline length
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke_color: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_style: Option<String>,
    pub arrow_style: String,
}

/// One entry of the flat event list. Events both declare scene elements
/// (icons, text, arrows, groups) and key their lifecycle.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub element_id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub action: EventAction,
    pub time: f64, // seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>, // only meaningful for groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Icon,
    Text,
    Arrow,
    AnimatedIcon,
    Shape,
    Group,
    Camera,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Appear,
    Animate,
    Disappear,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationTrack {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub target_id: String,
    pub segments: Vec<AnimationSegment>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Node,
    Edge,
    Camera,
    Arrow,
    Particle,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimationSegment {
    pub t0: f64, // seconds, t0 <= t1
    pub t1: f64,
    pub property: String,
    pub from: SegmentValue,
    pub to: SegmentValue,
    pub easing: String, // resolved by Easing::parse at evaluation
}

/// Segment endpoint value. Documents carry these untyped; the untagged
/// representation dispatches on JSON shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SegmentValue {
    Number(f64),
    Point(Point),
    Text(String),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraEvent {
    #[serde(rename = "type")]
    pub kind: CameraAction,
    pub time: f64, // seconds
    pub duration: f64,
    pub to: CameraTarget,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraAction {
    Pan,
    Zoom,
}

/// Partial camera goal. Unset fields hold their previous value.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CameraTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl TimelineDocument {
    pub fn from_json(json: &str) -> KinegraphResult<Self> {
        serde_json::from_str(json).map_err(|e| KinegraphError::serde(e.to_string()))
    }

    /// Frame count covering the document's full duration.
    pub fn duration_frames(&self) -> u64 {
        self.fps.secs_to_frames_round(self.total_duration)
    }

    /// Structural checks on a parsed document. Evaluation assumes these
    /// have passed; callers that validate upstream may skip this.
    pub fn validate(&self) -> KinegraphResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(KinegraphError::validation("fps must have num>0 and den>0"));
        }
        if self.stage.width == 0 || self.stage.height == 0 {
            return Err(KinegraphError::validation("stage width/height must be > 0"));
        }
        if self.total_duration <= 0.0 {
            return Err(KinegraphError::validation(
                "totalDuration must be > 0 seconds",
            ));
        }

        for track in &self.tracks {
            for (index, seg) in track.segments.iter().enumerate() {
                if seg.t0 > seg.t1 {
                    return Err(KinegraphError::animation(format!(
                        "track '{}' segment {} has invalid window (t0 > t1)",
                        track.id, index
                    )));
                }
                if std::mem::discriminant(&seg.from) != std::mem::discriminant(&seg.to) {
                    return Err(KinegraphError::animation(format!(
                        "track '{}' segment {} mixes value kinds ({} vs {})",
                        track.id,
                        index,
                        seg.from.kind_name(),
                        seg.to.kind_name()
                    )));
                }
            }
        }

        // Dangling targets are skipped at evaluation time, not fatal.
        let known = self.known_element_ids();
        for track in &self.tracks {
            if track.kind == TrackKind::Camera {
                continue;
            }
            if !known.contains(track.target_id.as_str()) {
                tracing::warn!(
                    track = %track.id,
                    target = %track.target_id,
                    "track targets an element not present in the document"
                );
            }
        }

        Ok(())
    }

    fn known_element_ids(&self) -> std::collections::BTreeSet<String> {
        let mut ids = std::collections::BTreeSet::new();
        for node in &self.nodes {
            ids.insert(node.id.clone());
        }
        for edge in &self.edges {
            ids.insert(edge.id.clone());
            ids.insert(edge.endpoint_alias());
        }
        for event in &self.events {
            ids.insert(event.element_id.clone());
        }
        ids
    }
}

impl Node {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Edge {
    /// Generated documents sometimes address an edge's tracks by the
    /// composite "{from}-{to}" id instead of the edge id.
    pub fn endpoint_alias(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}

impl TimelineEvent {
    pub fn prop_number(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Static placement declared on the event itself (`props.x`/`props.y`).
    pub fn prop_position(&self) -> Option<Point> {
        match (self.prop_number("x"), self.prop_number("y")) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

impl SegmentValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Point(_) => "point",
            Self::Text(_) => "text",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Self::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}
