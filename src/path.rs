use crate::core::Point;

/// Per-segment drawn state of a polyline reveal at one frame.
///
/// `drawn[i]` is the fraction of segment `i` (between points `i` and `i+1`)
/// covered so far, measured along cumulative arc length so reveal speed is
/// constant in screen-space distance across unequal segments.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathReveal {
    pub drawn: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrowhead: Option<Arrowhead>,
}

/// Tip marker for the final segment of a revealed path.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrowhead {
    pub position: Point,
    pub angle_rad: f64,
}

/// Total Euclidean length of a polyline.
pub fn total_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Reveal state of `points` at `progress` in [0,1]. Returns `None` for
/// degenerate paths (fewer than two points).
///
/// The arrowhead is attached only once overall progress exceeds 50%; its
/// position is the path's end point and its angle follows the final
/// segment's direction.
pub fn reveal(points: &[Point], progress: f64) -> Option<PathReveal> {
    if points.len() < 2 {
        return None;
    }
    let progress = progress.clamp(0.0, 1.0);
    let total = total_length(points);
    let traveled = total * progress;

    let mut drawn = Vec::with_capacity(points.len() - 1);
    let mut covered = 0.0;
    for w in points.windows(2) {
        let len = w[0].distance(w[1]);
        let fraction = if len > 0.0 {
            ((traveled - covered) / len).clamp(0.0, 1.0)
        } else if traveled >= covered {
            1.0
        } else {
            0.0
        };
        drawn.push(fraction);
        covered += len;
    }

    let arrowhead = (progress > 0.5).then(|| {
        let tip = points[points.len() - 1];
        let base = points[points.len() - 2];
        Arrowhead {
            position: tip,
            angle_rad: (tip.y - base.y).atan2(tip.x - base.x),
        }
    });

    Some(PathReveal { drawn, arrowhead })
}
