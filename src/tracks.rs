use std::collections::BTreeMap;

use crate::{
    core::{Fps, Point},
    ease::Easing,
    model::{AnimationTrack, SegmentValue, TrackKind},
};

/// Idle oscillation a node settles into after its entry animation.
pub const BREATHING_PERIOD_FRAMES: f64 = 120.0;
pub const BREATHING_PEAK: f64 = 1.02;

/// Property values resolved for one element at one instant.
///
/// Missing keys are not an error; callers supply the neutral default at
/// the read site (`number_or("opacity", 1.0)`), keeping "no track found"
/// distinct from a track that resolved to zero.
#[derive(Clone, Debug, Default)]
pub struct ResolvedProps(BTreeMap<String, SegmentValue>);

impl ResolvedProps {
    pub fn get(&self, key: &str) -> Option<&SegmentValue> {
        self.0.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(SegmentValue::as_number)
    }

    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    pub fn point(&self, key: &str) -> Option<Point> {
        self.0.get(key).and_then(SegmentValue::as_point)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(SegmentValue::as_text)
    }

    pub fn into_map(self) -> BTreeMap<String, SegmentValue> {
        self.0
    }
}

fn targets(track: &AnimationTrack, keys: &[&str]) -> bool {
    keys.iter().any(|k| track.target_id == *k)
}

/// Merge every non-camera track addressing `target_keys` into one property
/// map at `time`. Tracks and segments are folded in declaration order with
/// a shallow last-wins overwrite per property name, so independent tracks
/// may drive, say, opacity and position of the same element.
pub fn resolve_properties(
    tracks: &[AnimationTrack],
    target_keys: &[&str],
    time: f64,
) -> ResolvedProps {
    let mut props = BTreeMap::new();
    for track in tracks {
        if track.kind == TrackKind::Camera || !targets(track, target_keys) {
            continue;
        }
        for seg in &track.segments {
            props.insert(seg.property.clone(), seg.value_at(time));
        }
    }
    ResolvedProps(props)
}

/// Camera-kind tracks never surface as scene elements; their resolved
/// `cameraPosition`/`zoom`/`opacity` overlay the event-composed camera
/// state instead.
pub fn resolve_camera_overlay(tracks: &[AnimationTrack], time: f64) -> ResolvedProps {
    let mut props = BTreeMap::new();
    for track in tracks {
        if track.kind != TrackKind::Camera {
            continue;
        }
        for seg in &track.segments {
            props.insert(seg.property.clone(), seg.value_at(time));
        }
    }
    ResolvedProps(props)
}

/// Multiplicative idle scale for a node element: once the element's entry
/// opacity segment has finished, scale cycles 1 -> 1.02 -> 1 over 120
/// frames, each half eased in-out. Unity before the entry completes or
/// when no opacity segment drives the element.
pub fn breathing_factor(
    tracks: &[AnimationTrack],
    target_keys: &[&str],
    time: f64,
    fps: Fps,
) -> f64 {
    let mut anim_end: Option<f64> = None;
    for track in tracks {
        if track.kind != TrackKind::Node || !targets(track, target_keys) {
            continue;
        }
        if let Some(seg) = track.segments.iter().find(|s| s.property == "opacity") {
            anim_end = Some(seg.t1);
        }
    }
    let Some(end_secs) = anim_end else {
        return 1.0;
    };

    let frame = time * fps.as_f64();
    let end_frame = end_secs * fps.as_f64();
    if frame <= end_frame {
        return 1.0;
    }

    let half = BREATHING_PERIOD_FRAMES / 2.0;
    let cycle_frame = (frame - end_frame).rem_euclid(BREATHING_PERIOD_FRAMES);
    let swell = BREATHING_PEAK - 1.0;
    if cycle_frame < half {
        1.0 + swell * Easing::EaseInOut.apply(cycle_frame / half)
    } else {
        BREATHING_PEAK - swell * Easing::EaseInOut.apply((cycle_frame - half) / half)
    }
}
