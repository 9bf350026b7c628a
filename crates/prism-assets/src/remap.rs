/// Tracks which control points have already received a per-control-point
/// value during one pass over the polygon corners.
///
/// A control point can be visited by many corners; only the first visit
/// assigns, so every later visit sees the value already in place.
#[derive(Debug, Clone)]
pub struct ControlPointTracker {
    seen: Vec<bool>,
    unique: usize,
}

impl ControlPointTracker {
    pub fn new(control_points: usize) -> Self {
        Self {
            seen: vec![false; control_points],
            unique: 0,
        }
    }

    /// Mark `control_point` as seen. Returns `true` on the first visit, which
    /// is the one that should write the value. Out-of-range control points
    /// are never first.
    pub fn first_visit(&mut self, control_point: usize) -> bool {
        match self.seen.get_mut(control_point) {
            Some(seen) if !*seen => {
                *seen = true;
                self.unique += 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_seen(&self, control_point: usize) -> bool {
        self.seen.get(control_point).copied().unwrap_or(false)
    }

    /// Number of distinct control points visited so far.
    pub fn unique_count(&self) -> usize {
        self.unique
    }
}
