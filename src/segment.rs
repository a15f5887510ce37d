use crate::{
    core::Point,
    ease::Easing,
    model::{AnimationSegment, SegmentValue},
};

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl AnimationSegment {
    /// Resolve the segment's value at `time` seconds.
    ///
    /// Outside `[t0, t1]` the boundary value is returned verbatim, easing
    /// untouched. Inside, numeric and point endpoints blend linearly on the
    /// eased progress; text endpoints switch discretely at the temporal
    /// midpoint of the window.
    pub fn value_at(&self, time: f64) -> SegmentValue {
        if time < self.t0 {
            return self.from.clone();
        }
        if time > self.t1 {
            return self.to.clone();
        }

        let span = self.t1 - self.t0;
        if span <= 0.0 {
            // Zero-duration window: instantaneous step to the target.
            return self.to.clone();
        }
        let progress = (time - self.t0) / span;

        match (&self.from, &self.to) {
            (SegmentValue::Number(a), SegmentValue::Number(b)) => {
                let eased = Easing::parse(&self.easing).apply(progress);
                SegmentValue::Number(<f64 as Lerp>::lerp(a, b, eased))
            }
            (SegmentValue::Point(a), SegmentValue::Point(b)) => {
                let eased = Easing::parse(&self.easing).apply(progress);
                SegmentValue::Point(<Point as Lerp>::lerp(a, b, eased))
            }
            (SegmentValue::Text(a), SegmentValue::Text(b)) => {
                if time <= self.t0 + span / 2.0 {
                    SegmentValue::Text(a.clone())
                } else {
                    SegmentValue::Text(b.clone())
                }
            }
            // Mismatched kinds cannot blend; step at the window start.
            _ => self.to.clone(),
        }
    }
}
