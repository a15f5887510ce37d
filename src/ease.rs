/// Named easing curve resolved from a timeline easing string.
///
/// Documents address curves by name ("ease-in-out", "easeInOutQuint",
/// "cubic-bezier(0.65, 0, 0.35, 1)", "back"). Parsing never fails: an
/// unrecognized name degrades to [`Easing::EaseInOut`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
    BackOut,
}

impl Default for Easing {
    fn default() -> Self {
        Self::EaseInOut
    }
}

impl Easing {
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.contains("cubic-bezier") {
            return parse_bezier_params(name)
                .map(|[x1, y1, x2, y2]| Self::CubicBezier { x1, y1, x2, y2 })
                .unwrap_or_default();
        }
        match name {
            "linear" => Self::Linear,
            "ease" => Self::Ease,
            "ease-in" | "easeIn" => Self::EaseIn,
            "ease-out" | "easeOut" => Self::EaseOut,
            "ease-in-out" | "easeInOut" => Self::EaseInOut,
            // Aliases emitted by timeline generators.
            "easeInOutQuad" => Self::CubicBezier {
                x1: 0.45,
                y1: 0.0,
                x2: 0.55,
                y2: 1.0,
            },
            "easeInOutCubic" => Self::CubicBezier {
                x1: 0.65,
                y1: 0.0,
                x2: 0.35,
                y2: 1.0,
            },
            "easeInOutQuint" => Self::CubicBezier {
                x1: 0.86,
                y1: 0.0,
                x2: 0.07,
                y2: 1.0,
            },
            "back" | "backOut" | "ease-out-back" | "easeOutBack" => Self::BackOut,
            _ => Self::default(),
        }
    }

    /// Evaluate the curve at `t`. Input is clamped to [0,1]; output is not
    /// (overshoot curves may leave the unit interval).
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier_ease(t, 0.25, 0.1, 0.25, 1.0),
            Self::EaseIn => cubic_bezier_ease(t, 0.42, 0.0, 1.0, 1.0),
            Self::EaseOut => cubic_bezier_ease(t, 0.0, 0.0, 0.58, 1.0),
            Self::EaseInOut => cubic_bezier_ease(t, 0.42, 0.0, 0.58, 1.0),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier_ease(t, x1, y1, x2, y2),
            Self::BackOut => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
            }
        }
    }
}

/// Extract `[x1, y1, x2, y2]` from a `cubic-bezier(...)` parameter list.
fn parse_bezier_params(name: &str) -> Option<[f64; 4]> {
    let open = name.find('(')?;
    let close = name[open..].find(')')? + open;
    let inner = &name[open + 1..close];

    let mut params = [0.0f64; 4];
    let mut count = 0usize;
    for piece in inner.split(',') {
        if count >= 4 {
            return None;
        }
        params[count] = piece.trim().parse().ok()?;
        count += 1;
    }
    (count == 4).then_some(params)
}

fn cubic_bezier_ease(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    // CSS cubic-bezier: given x in [0,1], solve u such that bx(u)=x, then return by(u).
    fn sample_curve(a1: f64, a2: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        3.0 * omt * omt * t * a1 + 3.0 * omt * t * t * a2 + t * t * t
    }
    fn sample_curve_derivative(a1: f64, a2: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        3.0 * omt * omt * a1 + 6.0 * omt * t * (a2 - a1) + 3.0 * t * t * (1.0 - a2)
    }

    // Newton-Raphson with bisection fallback (fixed iterations, no adaptive loops).
    let mut t = x;
    for _ in 0..8 {
        let x_t = sample_curve(x1, x2, t) - x;
        let d = sample_curve_derivative(x1, x2, t);
        if d.abs() < 1e-7 {
            break;
        }
        t = (t - x_t / d).clamp(0.0, 1.0);
    }

    // Refine with a few bisection steps to avoid edge cases.
    let mut lo = 0.0;
    let mut hi = 1.0;
    for _ in 0..8 {
        let x_t = sample_curve(x1, x2, t);
        if x_t < x {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }

    sample_curve(y1, y2, t)
}

/// Closed-form ease-in-out cubic, used for camera folding where the curve is
/// fixed rather than document-supplied.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
