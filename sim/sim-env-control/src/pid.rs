//! PID controllers.
//!
//! [`PidController`] drives a single scalar towards its target;
//! [`IndependentPidController`] runs one PID per dimension of a state
//! vector without coupling between dimensions.
//!
//! One control step with state `x`:
//!
//! ```text
//! e  = target - x
//! Δe = e - e_prev        (0 on the first step after a reset)
//! I  = I + e
//! u  = kp·e + ki·I + kd·Δe
//! ```

use nalgebra::DVector;
use sim_env::ControlError;

/// Default proportional gain.
pub const DEFAULT_KP: f64 = 1.0;
/// Default integral gain.
pub const DEFAULT_KI: f64 = 0.1;
/// Default derivative gain.
pub const DEFAULT_KD: f64 = 0.0;

/// Scalar PID controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    target: f64,
    integral: f64,
    prev_error: Option<f64>,
}

impl Default for PidController {
    fn default() -> Self {
        Self::new(DEFAULT_KP, DEFAULT_KI, DEFAULT_KD)
    }
}

impl PidController {
    /// Create a controller with the given gains and target 0.
    #[must_use]
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            target: 0.0,
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Set the target. The accumulated state is reset only if the target
    /// actually changes.
    pub fn set_target(&mut self, target: f64) {
        if target != self.target {
            self.target = target;
            self.reset();
        }
    }

    /// Current target.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether `state` is within `threshold` of the target.
    #[must_use]
    pub fn is_target_satisfied(&self, state: f64, threshold: f64) -> bool {
        (state - self.target).abs() < threshold
    }

    /// Compute the control output for the current state.
    pub fn control(&mut self, state: f64) -> f64 {
        let error = self.target - state;
        let delta = self.prev_error.map_or(0.0, |prev| error - prev);
        self.integral += error;
        self.prev_error = Some(error);
        self.kp * error + self.ki * self.integral + self.kd * delta
    }

    /// Clear the integral and the previous error.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }

    /// Set all three gains.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Set the proportional gain.
    pub fn set_kp(&mut self, kp: f64) {
        self.kp = kp;
    }

    /// Set the integral gain.
    pub fn set_ki(&mut self, ki: f64) {
        self.ki = ki;
    }

    /// Set the derivative gain.
    pub fn set_kd(&mut self, kd: f64) {
        self.kd = kd;
    }

    /// Gains as `(kp, ki, kd)`.
    #[must_use]
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }
}

/// One independent PID per state dimension.
///
/// Every vector argument must match the state dimension set with
/// [`set_state_dimension`](Self::set_state_dimension).
#[derive(Debug, Clone, PartialEq)]
pub struct IndependentPidController {
    pids: Vec<PidController>,
    defaults: (f64, f64, f64),
}

impl Default for IndependentPidController {
    fn default() -> Self {
        Self::new(DEFAULT_KP, DEFAULT_KI, DEFAULT_KD)
    }
}

impl IndependentPidController {
    /// Create a controller of dimension 0 whose entries get the given
    /// default gains.
    #[must_use]
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            pids: Vec::new(),
            defaults: (kp, ki, kd),
        }
    }

    /// Create a controller of the given dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize, kp: f64, ki: f64, kd: f64) -> Self {
        let mut controller = Self::new(kp, ki, kd);
        controller.set_state_dimension(dimension);
        controller
    }

    /// Current state dimension.
    #[must_use]
    pub fn state_dimension(&self) -> usize {
        self.pids.len()
    }

    /// Resize to `dimension` entries and reset every entry. New entries get
    /// the default gains; existing entries keep theirs.
    pub fn set_state_dimension(&mut self, dimension: usize) {
        let (kp, ki, kd) = self.defaults;
        self.pids.resize_with(dimension, || PidController::new(kp, ki, kd));
        self.reset();
    }

    /// Set the per-entry targets.
    pub fn set_target(&mut self, target: &DVector<f64>) -> Result<(), ControlError> {
        self.check("target", target.len())?;
        for (pid, &t) in self.pids.iter_mut().zip(target.iter()) {
            pid.set_target(t);
        }
        Ok(())
    }

    /// Current targets.
    #[must_use]
    pub fn target(&self) -> DVector<f64> {
        DVector::from_iterator(self.pids.len(), self.pids.iter().map(PidController::target))
    }

    /// Whether every entry of `state` is within `threshold` of its target.
    pub fn is_target_satisfied(
        &self,
        state: &DVector<f64>,
        threshold: f64,
    ) -> Result<bool, ControlError> {
        self.check("state", state.len())?;
        Ok(self
            .pids
            .iter()
            .zip(state.iter())
            .all(|(pid, &x)| pid.is_target_satisfied(x, threshold)))
    }

    /// Compute one output per entry.
    pub fn control(&mut self, state: &DVector<f64>) -> Result<DVector<f64>, ControlError> {
        self.check("state", state.len())?;
        Ok(DVector::from_iterator(
            self.pids.len(),
            self.pids.iter_mut().zip(state.iter()).map(|(pid, &x)| pid.control(x)),
        ))
    }

    /// Reset every entry.
    pub fn reset(&mut self) {
        self.pids.iter_mut().for_each(PidController::reset);
    }

    /// Set the same gains on every entry and make them the defaults for
    /// entries added later.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.defaults = (kp, ki, kd);
        for pid in &mut self.pids {
            pid.set_gains(kp, ki, kd);
        }
    }

    /// Set per-entry gains.
    pub fn set_gains_per_dof(
        &mut self,
        kps: &DVector<f64>,
        kis: &DVector<f64>,
        kds: &DVector<f64>,
    ) -> Result<(), ControlError> {
        self.check("kps", kps.len())?;
        self.check("kis", kis.len())?;
        self.check("kds", kds.len())?;
        for (i, pid) in self.pids.iter_mut().enumerate() {
            pid.set_gains(kps[i], kis[i], kds[i]);
        }
        Ok(())
    }

    /// Set per-entry proportional gains.
    pub fn set_kps(&mut self, kps: &DVector<f64>) -> Result<(), ControlError> {
        self.check("kps", kps.len())?;
        self.apply(kps, PidController::set_kp);
        Ok(())
    }

    /// Set per-entry integral gains.
    pub fn set_kis(&mut self, kis: &DVector<f64>) -> Result<(), ControlError> {
        self.check("kis", kis.len())?;
        self.apply(kis, PidController::set_ki);
        Ok(())
    }

    /// Set per-entry derivative gains.
    pub fn set_kds(&mut self, kds: &DVector<f64>) -> Result<(), ControlError> {
        self.check("kds", kds.len())?;
        self.apply(kds, PidController::set_kd);
        Ok(())
    }

    /// Set the proportional gain of every entry.
    pub fn set_kp(&mut self, kp: f64) {
        self.defaults.0 = kp;
        self.pids.iter_mut().for_each(|pid| pid.set_kp(kp));
    }

    /// Set the integral gain of every entry.
    pub fn set_ki(&mut self, ki: f64) {
        self.defaults.1 = ki;
        self.pids.iter_mut().for_each(|pid| pid.set_ki(ki));
    }

    /// Set the derivative gain of every entry.
    pub fn set_kd(&mut self, kd: f64) {
        self.defaults.2 = kd;
        self.pids.iter_mut().for_each(|pid| pid.set_kd(kd));
    }

    /// The scalar controllers, one per entry.
    #[must_use]
    pub fn entries(&self) -> &[PidController] {
        &self.pids
    }

    fn apply(&mut self, values: &DVector<f64>, set: fn(&mut PidController, f64)) {
        for (pid, &v) in self.pids.iter_mut().zip(values.iter()) {
            set(pid, v);
        }
    }

    fn check(&self, what: &str, len: usize) -> Result<(), ControlError> {
        ControlError::check_len(what, self.pids.len(), len)
    }
}
