use std::collections::BTreeMap;

use crate::{
    core::Fps,
    ease::Easing,
    model::{EventAction, TimelineEvent},
};

/// Entry/exit overlays run over a fixed window of frames regardless of fps.
pub const FADE_WINDOW_FRAMES: f64 = 20.0;
/// Starting scale for the entry pop of event-driven elements.
pub const SCALE_IN_FROM: f64 = 0.8;

/// Visibility window of one element plus its entry/exit overlays.
///
/// `fades` is false for elements that exist only in the static scene
/// (nodes/edges without events); their visibility is wholly track-driven.
#[derive(Clone, Copy, Debug)]
pub struct Lifecycle {
    pub appear: f64, // seconds
    pub disappear: Option<f64>,
    pub fades: bool,
}

impl Lifecycle {
    pub fn unbounded() -> Self {
        Self {
            appear: 0.0,
            disappear: None,
            fades: false,
        }
    }

    /// Half-open window: `[appear, disappear)`.
    pub fn visible_at(&self, time: f64) -> bool {
        time >= self.appear && self.disappear.is_none_or(|d| time < d)
    }

    /// Opacity inside a fade window, `None` when no fade applies. Fade-out
    /// is checked first and wins when the windows overlap.
    pub fn fade_opacity(&self, time: f64, fps: Fps) -> Option<f64> {
        if !self.fades {
            return None;
        }
        let window = FADE_WINDOW_FRAMES * fps.frame_duration_secs();

        if let Some(disappear) = self.disappear {
            let fade_out_start = disappear - window;
            if time >= fade_out_start && time < disappear {
                let p = (time - fade_out_start) / window;
                return Some(1.0 - Easing::EaseIn.apply(p));
            }
        }

        if time < self.appear + window {
            let p = (time - self.appear) / window;
            return Some(Easing::EaseOut.apply(p));
        }

        None
    }

    /// Entry scale pop, 0.8 toward 1.0 with overshoot, over the fade-in
    /// window. 1.0 once the window has passed.
    pub fn scale_in_factor(&self, time: f64, fps: Fps) -> f64 {
        if !self.fades {
            return 1.0;
        }
        let window = FADE_WINDOW_FRAMES * fps.frame_duration_secs();
        if time < self.appear + window {
            let p = (time - self.appear) / window;
            SCALE_IN_FROM + (1.0 - SCALE_IN_FROM) * Easing::BackOut.apply(p)
        } else {
            1.0
        }
    }
}

/// Scan the event list into per-element lifecycles. The first
/// appear/animate for an id sets its appear time, the first disappear its
/// disappear time; an element with only a disappear appears at t=0.
pub fn resolve(events: &[TimelineEvent]) -> BTreeMap<String, Lifecycle> {
    #[derive(Default)]
    struct Pending {
        appear: Option<f64>,
        disappear: Option<f64>,
    }

    let mut pending: BTreeMap<String, Pending> = BTreeMap::new();
    for event in events {
        let slot = pending.entry(event.element_id.clone()).or_default();
        match event.action {
            EventAction::Appear | EventAction::Animate => {
                if slot.appear.is_none() {
                    slot.appear = Some(event.time);
                }
            }
            EventAction::Disappear => {
                if slot.disappear.is_none() {
                    slot.disappear = Some(event.time);
                }
            }
        }
    }

    pending
        .into_iter()
        .map(|(id, p)| {
            (
                id,
                Lifecycle {
                    appear: p.appear.unwrap_or(0.0),
                    disappear: p.disappear,
                    fades: true,
                },
            )
        })
        .collect()
}
