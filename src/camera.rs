use crate::{
    core::{Affine, Stage, Vec2},
    ease::ease_in_out_cubic,
    model::CameraEvent,
    tracks::ResolvedProps,
};

/// Camera pose: stage-space focus offset and magnification. Opacity is
/// carried only when a camera track drives it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraState {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            opacity: None,
        }
    }
}

impl CameraState {
    /// Fold pan/zoom events into the pose at `time`.
    ///
    /// Events are taken chronologically (stable for ties, so document
    /// order breaks them). An event whose window has passed snaps the
    /// state to its targets; inside the window each declared field eases
    /// in-out-cubic from the previously folded value; fields absent from
    /// `to` hold. A zero-duration event snaps at its start time.
    pub fn compose(events: &[CameraEvent], time: f64) -> Self {
        let mut ordered: Vec<&CameraEvent> = events.iter().collect();
        ordered.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut state = Self::default();
        for event in ordered {
            if time < event.time {
                break;
            }
            if event.duration <= 0.0 || time >= event.time + event.duration {
                if let Some(x) = event.to.x {
                    state.x = x;
                }
                if let Some(y) = event.to.y {
                    state.y = y;
                }
                if let Some(scale) = event.to.scale {
                    state.scale = scale;
                }
                continue;
            }
            let p = ease_in_out_cubic((time - event.time) / event.duration);
            if let Some(x) = event.to.x {
                state.x += (x - state.x) * p;
            }
            if let Some(y) = event.to.y {
                state.y += (y - state.y) * p;
            }
            if let Some(scale) = event.to.scale {
                state.scale += (scale - state.scale) * p;
            }
        }
        state
    }

    /// Field-wise overwrite from camera-kind tracks, applied after event
    /// folding.
    pub fn with_overlay(mut self, overlay: &ResolvedProps) -> Self {
        if let Some(position) = overlay.point("cameraPosition") {
            self.x = position.x;
            self.y = position.y;
        }
        if let Some(zoom) = overlay.number("zoom") {
            self.scale = zoom;
        }
        if let Some(opacity) = overlay.number("opacity") {
            self.opacity = Some(opacity);
        }
        self
    }

    /// Stage view affine: zoom about the stage center, then shift by
    /// `(w/2 - x, h/2 - y)`. A pose focused on the stage center at unit
    /// scale is the identity.
    pub fn view_transform(&self, stage: &Stage) -> Affine {
        let center = stage.center().to_vec2();
        let shift = Vec2::new(center.x - self.x, center.y - self.y);
        Affine::translate(center + shift) * Affine::scale(self.scale) * Affine::translate(-center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point;
    use crate::model::{CameraAction, CameraTarget};

    fn pan(time: f64, duration: f64, x: f64, y: f64) -> CameraEvent {
        CameraEvent {
            kind: CameraAction::Pan,
            time,
            duration,
            to: CameraTarget {
                x: Some(x),
                y: Some(y),
                scale: None,
            },
        }
    }

    fn zoom(time: f64, duration: f64, scale: f64) -> CameraEvent {
        CameraEvent {
            kind: CameraAction::Zoom,
            time,
            duration,
            to: CameraTarget {
                x: None,
                y: None,
                scale: Some(scale),
            },
        }
    }

    fn stage() -> Stage {
        Stage {
            width: 800,
            height: 600,
            background_color: None,
        }
    }

    #[test]
    fn initial_pose_is_neutral() {
        let state = CameraState::compose(&[], 0.0);
        assert_eq!(state, CameraState::default());
    }

    #[test]
    fn pending_events_leave_the_pose_untouched() {
        let state = CameraState::compose(&[pan(1.0, 2.0, 100.0, 50.0)], 0.5);
        assert_eq!((state.x, state.y, state.scale), (0.0, 0.0, 1.0));
    }

    #[test]
    fn window_midpoint_is_eased_halfway() {
        // In-out cubic passes through exactly 0.5 at the midpoint.
        let state = CameraState::compose(&[pan(1.0, 2.0, 100.0, 50.0)], 2.0);
        assert_eq!(state.x, 50.0);
        assert_eq!(state.y, 25.0);
    }

    #[test]
    fn early_window_lags_linear_progress() {
        let state = CameraState::compose(&[pan(1.0, 2.0, 100.0, 50.0)], 1.5);
        assert_eq!(state.x, 6.25);
        assert_eq!(state.y, 3.125);
    }

    #[test]
    fn finished_events_snap_to_their_targets() {
        let state = CameraState::compose(&[pan(1.0, 2.0, 100.0, 50.0)], 99.0);
        assert_eq!((state.x, state.y, state.scale), (100.0, 50.0, 1.0));
    }

    #[test]
    fn unset_fields_hold_previous_values() {
        let events = vec![pan(0.0, 1.0, 100.0, 50.0), zoom(2.0, 1.0, 2.0)];
        let state = CameraState::compose(&events, 10.0);
        assert_eq!((state.x, state.y, state.scale), (100.0, 50.0, 2.0));
    }

    #[test]
    fn zero_duration_snaps_at_start_time() {
        let events = vec![zoom(1.0, 0.0, 3.0)];
        assert_eq!(CameraState::compose(&events, 0.999).scale, 1.0);
        assert_eq!(CameraState::compose(&events, 1.0).scale, 3.0);
    }

    #[test]
    fn events_fold_chronologically_not_by_declaration() {
        let events = vec![pan(5.0, 1.0, 200.0, 0.0), pan(1.0, 0.0, 100.0, 0.0)];
        let state = CameraState::compose(&events, 2.0);
        assert_eq!(state.x, 100.0);
    }

    #[test]
    fn later_windows_blend_from_the_folded_state() {
        let events = vec![pan(0.0, 1.0, 100.0, 0.0), pan(2.0, 1.0, 0.0, 0.0)];
        let state = CameraState::compose(&events, 2.5);
        assert_eq!(state.x, 50.0);
    }

    #[test]
    fn overlay_overwrites_fields() {
        use crate::model::{AnimationSegment, AnimationTrack, SegmentValue, TrackKind};

        let tracks = vec![AnimationTrack {
            id: "cam".to_string(),
            kind: TrackKind::Camera,
            target_id: "camera".to_string(),
            segments: vec![
                AnimationSegment {
                    t0: 0.0,
                    t1: 1.0,
                    property: "cameraPosition".to_string(),
                    from: SegmentValue::Point(Point::new(0.0, 0.0)),
                    to: SegmentValue::Point(Point::new(80.0, 60.0)),
                    easing: "linear".to_string(),
                },
                AnimationSegment {
                    t0: 0.0,
                    t1: 1.0,
                    property: "zoom".to_string(),
                    from: SegmentValue::Number(1.0),
                    to: SegmentValue::Number(1.5),
                    easing: "linear".to_string(),
                },
            ],
        }];
        let overlay = crate::tracks::resolve_camera_overlay(&tracks, 1.0);
        let state = CameraState::compose(&[pan(0.0, 0.0, 10.0, 20.0)], 1.0).with_overlay(&overlay);
        assert_eq!((state.x, state.y, state.scale), (80.0, 60.0, 1.5));
        assert_eq!(state.opacity, None);
    }

    #[test]
    fn empty_overlay_is_a_no_op() {
        let base = CameraState::compose(&[pan(0.0, 0.0, 10.0, 20.0)], 1.0);
        let overlay = crate::tracks::resolve_camera_overlay(&[], 1.0);
        assert_eq!(base.with_overlay(&overlay), base);
    }

    #[test]
    fn centered_unit_pose_is_identity() {
        let state = CameraState {
            x: 400.0,
            y: 300.0,
            scale: 1.0,
            opacity: None,
        };
        assert_eq!(
            state.view_transform(&stage()).as_coeffs(),
            Affine::IDENTITY.as_coeffs()
        );
    }

    #[test]
    fn unit_scale_pan_recenters_the_focus_point() {
        let state = CameraState {
            x: 500.0,
            y: 300.0,
            scale: 1.0,
            opacity: None,
        };
        let vt = state.view_transform(&stage());
        assert_eq!(vt * Point::new(500.0, 300.0), Point::new(400.0, 300.0));
    }

    #[test]
    fn centered_zoom_scales_about_the_stage_center() {
        let state = CameraState {
            x: 400.0,
            y: 300.0,
            scale: 2.0,
            opacity: None,
        };
        let vt = state.view_transform(&stage());
        assert_eq!(vt * Point::new(400.0, 300.0), Point::new(400.0, 300.0));
        assert_eq!(vt * Point::new(0.0, 0.0), Point::new(-400.0, -300.0));
    }
}
