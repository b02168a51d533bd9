use crate::dynamics::state::{DroneState, FLOOR_HEIGHT};

// ---------------------------------------------------------------------------
// Advisory events
// ---------------------------------------------------------------------------

/// Kinds of advisory events. None of them stop the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OutOfBounds,
    ExcessiveTilt,
    GroundContact,
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: DroneState,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive states and report transitions into
/// their condition.
pub trait EventDetector {
    fn check(&mut self, prev: &DroneState, current: &DroneState) -> Option<EventKind>;

    fn reset(&mut self) {}
}

/// Fires when the drone leaves a horizontal disc around the origin.
pub struct BoundaryDetector {
    pub max_distance: f64, // m
}

impl BoundaryDetector {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }
}

impl EventDetector for BoundaryDetector {
    fn check(&mut self, prev: &DroneState, current: &DroneState) -> Option<EventKind> {
        if prev.horizontal_distance() <= self.max_distance
            && current.horizontal_distance() > self.max_distance
        {
            Some(EventKind::OutOfBounds)
        } else {
            None
        }
    }
}

/// Fires when |roll| or |pitch| crosses above a bound.
pub struct TiltDetector {
    pub max_tilt: f64, // rad
}

impl TiltDetector {
    pub fn new(max_tilt: f64) -> Self {
        Self { max_tilt }
    }
}

impl EventDetector for TiltDetector {
    fn check(&mut self, prev: &DroneState, current: &DroneState) -> Option<EventKind> {
        if prev.tilt() <= self.max_tilt && current.tilt() > self.max_tilt {
            Some(EventKind::ExcessiveTilt)
        } else {
            None
        }
    }
}

/// Fires on touchdown: altitude reaching the floor clamp from above.
pub struct GroundContactDetector;

pub(crate) fn on_floor(state: &DroneState) -> bool {
    state.position.y <= FLOOR_HEIGHT + 1e-9
}

impl EventDetector for GroundContactDetector {
    fn check(&mut self, prev: &DroneState, current: &DroneState) -> Option<EventKind> {
        if !on_floor(prev) && on_floor(current) {
            Some(EventKind::GroundContact)
        } else {
            None
        }
    }
}

/// Current advisory flags, recomputed every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Advisory {
    pub out_of_bounds: bool,
    pub excessive_tilt: bool,
    pub grounded: bool,
}

impl Advisory {
    pub fn evaluate(state: &DroneState, max_distance: f64, max_tilt: f64) -> Self {
        Self {
            out_of_bounds: state.horizontal_distance() > max_distance,
            excessive_tilt: state.tilt() > max_tilt,
            grounded: on_floor(state),
        }
    }

    pub fn any(&self) -> bool {
        self.out_of_bounds || self.excessive_tilt || self.grounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn at(x: f64, y: f64, z: f64) -> DroneState {
        DroneState::at_rest(Vector3::new(x, y, z))
    }

    #[test]
    fn boundary_fires_on_exit_only() {
        let mut det = BoundaryDetector::new(10.0);
        assert_eq!(det.check(&at(9.9, 2.0, 0.0), &at(10.1, 2.0, 0.0)), Some(EventKind::OutOfBounds));
        assert_eq!(det.check(&at(10.1, 2.0, 0.0), &at(10.2, 2.0, 0.0)), None);
        assert_eq!(det.check(&at(10.1, 2.0, 0.0), &at(9.0, 2.0, 0.0)), None);
    }

    #[test]
    fn tilt_uses_larger_of_roll_and_pitch() {
        let mut det = TiltDetector::new(0.5);
        let level = at(0.0, 2.0, 0.0);
        let mut tipped = level.clone();
        tipped.rotation = Vector3::new(0.1, -0.6, 2.0);
        assert_eq!(det.check(&level, &tipped), Some(EventKind::ExcessiveTilt));
        // Yaw alone never counts
        tipped.rotation = Vector3::new(0.0, 0.0, 3.0);
        assert_eq!(det.check(&level, &tipped), None);
    }

    #[test]
    fn ground_contact_on_touchdown() {
        let mut det = GroundContactDetector;
        assert_eq!(det.check(&at(0.0, 0.2, 0.0), &at(0.0, FLOOR_HEIGHT, 0.0)), Some(EventKind::GroundContact));
        assert_eq!(det.check(&at(0.0, FLOOR_HEIGHT, 0.0), &at(0.0, FLOOR_HEIGHT, 0.0)), None);
    }

    #[test]
    fn advisory_flags() {
        let a = Advisory::evaluate(&at(30.0, FLOOR_HEIGHT, 0.0), 20.0, 1.0);
        assert!(a.out_of_bounds && a.grounded && !a.excessive_tilt);
        assert!(!Advisory::evaluate(&at(0.0, 2.0, 0.0), 20.0, 1.0).any());
    }
}
