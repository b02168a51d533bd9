use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Three-axis PID with derivative-on-measurement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidTerms {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Holds only the integrator; gains are supplied per call so they can be
/// retuned between calls without touching the accumulated state.
#[derive(Debug, Clone)]
pub struct VectorPid {
    integral: Vector3<f64>,
    integral_limit: f64,
}

impl VectorPid {
    pub fn new(integral_limit: f64) -> Self {
        Self {
            integral: Vector3::zeros(),
            integral_limit: integral_limit.abs(),
        }
    }

    /// `rate` is the measured rate of the controlled quantity; the D term acts
    /// on its negative so setpoint jumps produce no derivative kick.
    pub fn update(
        &mut self,
        terms: PidTerms,
        error: Vector3<f64>,
        rate: Vector3<f64>,
        dt: f64,
    ) -> Vector3<f64> {
        self.integral += error * dt;
        // Anti-windup: clamp integral per axis
        let limit = self.integral_limit;
        self.integral.apply(|v| *v = v.clamp(-limit, limit));

        error * terms.kp + self.integral * terms.ki - rate * terms.kd
    }

    pub fn integral(&self) -> Vector3<f64> {
        self.integral
    }

    pub fn integral_limit(&self) -> f64 {
        self.integral_limit
    }

    pub fn set_integral_limit(&mut self, limit: f64) {
        self.integral_limit = limit.abs();
        let limit = self.integral_limit;
        self.integral.apply(|v| *v = v.clamp(-limit, limit));
    }

    pub fn reset(&mut self) {
        self.integral = Vector3::zeros();
    }
}

/// Uniformly rescale `v` so its norm does not exceed `max`.
pub fn cap_norm(v: Vector3<f64>, max: f64) -> Vector3<f64> {
    let n = v.norm();
    if n > max && n > 0.0 {
        v * (max / n)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P_ONLY: PidTerms = PidTerms { kp: 1.0, ki: 0.0, kd: 0.0 };

    #[test]
    fn pid_proportional() {
        let mut pid = VectorPid::new(1.0);
        let out = pid.update(P_ONLY, Vector3::new(0.5, -0.25, 0.0), Vector3::zeros(), 0.01);
        assert!((out - Vector3::new(0.5, -0.25, 0.0)).norm() < 1e-10, "Pure P should output Kp * error");
    }

    #[test]
    fn pid_integral_accumulates() {
        let mut pid = VectorPid::new(10.0);
        let terms = PidTerms { kp: 0.0, ki: 1.0, kd: 0.0 };
        pid.update(terms, Vector3::x(), Vector3::zeros(), 0.1);
        let out = pid.update(terms, Vector3::x(), Vector3::zeros(), 0.1);
        assert!((out.x - 0.2).abs() < 1e-10, "Integral should accumulate");
    }

    #[test]
    fn integral_is_clamped() {
        let mut pid = VectorPid::new(0.5);
        for _ in 0..10_000 {
            pid.update(P_ONLY, Vector3::new(3.0, -3.0, 1.0), Vector3::zeros(), 0.01);
        }
        let i = pid.integral();
        assert_eq!(i, Vector3::new(0.5, -0.5, 0.5));
    }

    #[test]
    fn derivative_acts_on_measurement() {
        let mut pid = VectorPid::new(1.0);
        let terms = PidTerms { kp: 0.0, ki: 0.0, kd: 2.0 };
        let out = pid.update(terms, Vector3::new(100.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), 0.01);
        assert!((out.x + 2.0).abs() < 1e-12);
    }

    #[test]
    fn cap_norm_rescales_uniformly() {
        let v = cap_norm(Vector3::new(3.0, 4.0, 0.0), 1.0);
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert!((v.x / v.y - 0.75).abs() < 1e-12);
        assert_eq!(cap_norm(Vector3::new(0.1, 0.0, 0.0), 1.0), Vector3::new(0.1, 0.0, 0.0));
    }
}
