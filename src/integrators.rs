use log::{debug, info, warn};
use na::DVector;

use crate::{
    dynamics::Dynamics,
    error::{SimulationError, SingularMatrixError},
    types::Float,
};

/// Generalized coordinates `q` and their paired speeds `u`.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneralizedState {
    pub q: DVector<Float>,
    pub u: DVector<Float>,
}

impl GeneralizedState {
    pub fn new(q: DVector<Float>, u: DVector<Float>) -> Self {
        GeneralizedState { q, u }
    }

    /// Angles given in degrees and rates in degrees per second.
    pub fn from_degrees(angles: &[Float], rates: &[Float]) -> Self {
        GeneralizedState {
            q: DVector::from_iterator(angles.len(), angles.iter().map(|a| a.to_radians())),
            u: DVector::from_iterator(rates.len(), rates.iter().map(|r| r.to_radians())),
        }
    }

    pub fn dof(&self) -> usize {
        self.q.len()
    }

    /// [q0, u0, q1, u1, ...]
    pub fn interleaved(&self) -> DVector<Float> {
        DVector::from_fn(2 * self.q.len(), |i, _| {
            if i % 2 == 0 {
                self.q[i / 2]
            } else {
                self.u[i / 2]
            }
        })
    }

    pub fn from_interleaved(y: &DVector<Float>) -> Self {
        let n = y.len() / 2;
        GeneralizedState {
            q: DVector::from_fn(n, |i, _| y[2 * i]),
            u: DVector::from_fn(n, |i, _| y[2 * i + 1]),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.q.iter().chain(self.u.iter()).all(|x| x.is_finite())
    }
}

/// States sampled every `dt`, sample k at time `k * dt`.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub dt: Float,
    pub states: Vec<GeneralizedState>,
}

impl Trajectory {
    pub fn new(dt: Float, initial: GeneralizedState) -> Self {
        Trajectory {
            dt,
            states: vec![initial],
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> &GeneralizedState {
        &self.states[0]
    }

    pub fn last(&self) -> &GeneralizedState {
        &self.states[self.states.len() - 1]
    }

    pub fn times(&self) -> Vec<Float> {
        (0..self.states.len())
            .map(|k| k as Float * self.dt)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneralizedState> {
        self.states.iter()
    }
}

/// Upper bound on samples reserved up front; longer runs grow as they go.
const MAX_PREALLOCATED_SAMPLES: usize = 1 << 16;

/// Time derivative of the interleaved state [q0, u0, q1, u1, ...].
///
/// Angle entries are the rates. Rate entries are the accelerations from the
/// dynamics with `damping[i] * u` subtracted from each joint; base
/// coordinates are not damped. `integrate` checks the state and damping
/// lengths against the model before the first call.
pub(crate) fn derivatives<D: Dynamics + ?Sized>(
    dynamics: &D,
    t: Float,
    state: &GeneralizedState,
    damping: &[Float],
) -> Result<DVector<Float>, SingularMatrixError> {
    let udot = dynamics.accelerations(t, &state.q, &state.u)?;
    let base = dynamics.num_base_coordinates();

    let mut dydt = DVector::zeros(2 * state.dof());
    for i in 0..state.dof() {
        let b = if i >= base { damping[i - base] } else { 0.0 };
        dydt[2 * i] = state.u[i];
        dydt[2 * i + 1] = udot[i] - b * state.u[i];
    }
    Ok(dydt)
}

/// Explicit Euler step:
///     y(k+1) = y(k) + dt * dy/dt(k)
pub fn euler_step(y: &DVector<Float>, dydt: &DVector<Float>, dt: Float) -> DVector<Float> {
    y + dydt * dt
}

fn validate<D: Dynamics + ?Sized>(
    dynamics: &D,
    initial: &GeneralizedState,
    damping: &[Float],
    dt: Float,
) -> Result<(), SimulationError> {
    if initial.q.len() != dynamics.dof() || initial.u.len() != dynamics.dof() {
        return Err(SimulationError::invalid(format!(
            "initial state has {} coordinates and {} speeds, the model has {}",
            initial.q.len(),
            initial.u.len(),
            dynamics.dof()
        )));
    }
    if !initial.is_finite() {
        return Err(SimulationError::invalid("initial state must be finite"));
    }
    if damping.len() != dynamics.num_joints() {
        return Err(SimulationError::invalid(format!(
            "{} damping coefficients for {} joints",
            damping.len(),
            dynamics.num_joints()
        )));
    }
    if let Some(b) = damping.iter().find(|b| !(b.is_finite() && **b >= 0.0)) {
        return Err(SimulationError::invalid(format!(
            "damping coefficients must be non-negative, got {}",
            b
        )));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(SimulationError::invalid(format!(
            "time step must be positive, got {}",
            dt
        )));
    }
    Ok(())
}

/// Integrate the dynamics from `initial` over `steps` fixed steps of `dt`
/// with explicit Euler, returning `steps + 1` samples.
///
/// Explicit Euler is first-order: energy drifts over long horizons, and `dt`
/// must stay well below the fastest natural period or the oscillation
/// amplitude grows visibly.
///
/// If the equations cannot be solved at some step, or the update leaves the
/// finite range, the run stops and the error carries the trajectory up to the
/// last valid sample.
pub fn integrate<D: Dynamics + ?Sized>(
    dynamics: &D,
    initial: &GeneralizedState,
    damping: &[Float],
    dt: Float,
    steps: usize,
) -> Result<Trajectory, SimulationError> {
    validate(dynamics, initial, damping, dt)?;

    info!(
        "integrating {} coordinates over {} steps of {} s",
        dynamics.dof(),
        steps,
        dt
    );

    let log_interval = (steps / 10).max(1);
    let mut trajectory = Trajectory::new(dt, initial.clone());
    trajectory.states.reserve(steps.min(MAX_PREALLOCATED_SAMPLES));

    for step in 0..steps {
        let t = step as Float * dt;
        let state = trajectory.last();

        let dydt = match derivatives(dynamics, t, state, damping) {
            Ok(dydt) => dydt,
            Err(source) => {
                warn!("singular mass matrix at step {} (t = {:.4} s)", step, t);
                return Err(SimulationError::SingularConfiguration {
                    step,
                    time: t,
                    trajectory: Box::new(trajectory),
                    source,
                });
            }
        };

        let next = GeneralizedState::from_interleaved(&euler_step(&state.interleaved(), &dydt, dt));
        if !next.is_finite() {
            warn!("state diverged at step {} (t = {:.4} s)", step, t);
            return Err(SimulationError::Diverged {
                step,
                time: t,
                trajectory: Box::new(trajectory),
            });
        }
        trajectory.states.push(next);

        if (step + 1) % log_interval == 0 {
            debug!("step {}/{}, t = {:.3} s", step + 1, steps, t + dt);
        }
    }

    info!("integration finished with {} samples", trajectory.len());
    Ok(trajectory)
}
