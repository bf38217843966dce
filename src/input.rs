use serde::{Deserialize, Serialize};

use crate::types::Float;

/// Scalar external force as a function of time.
pub trait InputForce {
    fn force(&self, t: Float) -> Float;
}

impl<F> InputForce for F
where
    F: Fn(Float) -> Float,
{
    fn force(&self, t: Float) -> Float {
        self(t)
    }
}

/// Input force profiles that can be given in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalForce {
    #[default]
    None,
    Constant {
        magnitude: Float,
    },
    /// Zero before `start`, `magnitude` afterwards.
    Step {
        magnitude: Float,
        start: Float,
    },
    /// `magnitude` on [start, end), zero elsewhere.
    Pulse {
        magnitude: Float,
        start: Float,
        end: Float,
    },
    /// `amplitude * sin(2π frequency t + phase)`
    Sinusoid {
        amplitude: Float,
        frequency: Float,
        #[serde(default)]
        phase: Float,
    },
}

impl InputForce for ExternalForce {
    fn force(&self, t: Float) -> Float {
        match self {
            ExternalForce::None => 0.0,
            ExternalForce::Constant { magnitude } => *magnitude,
            ExternalForce::Step { magnitude, start } => {
                if t >= *start {
                    *magnitude
                } else {
                    0.0
                }
            }
            ExternalForce::Pulse {
                magnitude,
                start,
                end,
            } => {
                if t >= *start && t < *end {
                    *magnitude
                } else {
                    0.0
                }
            }
            ExternalForce::Sinusoid {
                amplitude,
                frequency,
                phase,
            } => amplitude * (crate::TWO_PI * frequency * t + phase).sin(),
        }
    }
}
