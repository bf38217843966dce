use na::DVector;
use thiserror::Error;

use crate::{integrators::Trajectory, types::Float};

/// Errors surfaced by chain construction, equation assembly, integration and
/// projection.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Raised eagerly, before any integration step runs.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The equations of motion could not be solved at `step`. `trajectory`
    /// holds every sample up to and including the last valid one.
    #[error("singular configuration at step {step} (t = {time:.4} s): {source}")]
    SingularConfiguration {
        step: usize,
        time: Float,
        trajectory: Box<Trajectory>,
        #[source]
        source: SingularMatrixError,
    },

    /// The explicit Euler update at `step` left the finite range, usually
    /// because `dt` is too large for the fastest mode of the chain.
    /// `trajectory` holds every sample up to and including the last finite one.
    #[error("state diverged at step {step} (t = {time:.4} s), reduce the time step")]
    Diverged {
        step: usize,
        time: Float,
        trajectory: Box<Trajectory>,
    },
}

impl SimulationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SimulationError::InvalidConfiguration(message.into())
    }
}

/// The mass matrix (or a closed-form denominator) is not invertible at `q`.
#[derive(Debug, Error)]
#[error("failed to solve M(q) u_dot = F(q, u) at q = {:?}", .q.as_slice())]
pub struct SingularMatrixError {
    pub q: DVector<Float>,
}

impl SingularMatrixError {
    pub fn at(q: &DVector<Float>) -> Self {
        SingularMatrixError { q: q.clone() }
    }
}
