//! Simulation parameters loaded from TOML.
//!
//! ```toml
//! gravity = 9.8
//! dt = 0.01
//! duration = 15.0
//!
//! [[links]]
//! mass = 5.75
//! length = 1.0
//! damping = 0.1
//! initial_angle_deg = 30.0
//!
//! [cart]
//! mass = 1.0
//!
//! [input]
//! kind = "pulse"
//! magnitude = 10.0
//! start = 0.0
//! end = 0.5
//! ```

use std::{fs::read_to_string, path::Path};

use na::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    chain::ChainParameters, error::SimulationError, input::ExternalForce,
    integrators::GeneralizedState, types::Float, GRAVITY,
};

/// An error that occurs while loading a configuration file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot load the configuration file: {0}")]
    FileLoadError(std::io::Error),

    #[error("cannot read the configuration file: {0}")]
    DeserialiseError(toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub mass: Float,
    pub length: Float,
    /// Rotational damping of the joint, applied as `u_dot -= damping * u`
    #[serde(default)]
    pub damping: Float,
    #[serde(default)]
    pub initial_angle_deg: Float,
    #[serde(default)]
    pub initial_rate_deg: Float,
}

impl LinkConfig {
    pub fn new(mass: Float, length: Float, damping: Float, initial_angle_deg: Float) -> Self {
        LinkConfig {
            mass,
            length,
            damping,
            initial_angle_deg,
            initial_rate_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartConfig {
    pub mass: Float,
    #[serde(default)]
    pub initial_position: Float,
    #[serde(default)]
    pub initial_velocity: Float,
}

/// Everything needed to run one simulation. Without a `[cart]` table the
/// links hang from a fixed pivot at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub gravity: Float,
    pub dt: Float,
    /// Number of integration steps. Takes precedence over `duration`.
    pub steps: Option<usize>,
    pub duration: Float,
    pub links: Vec<LinkConfig>,
    pub cart: Option<CartConfig>,
    pub input: ExternalForce,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            gravity: GRAVITY,
            dt: 0.01,
            steps: None,
            duration: 15.0,
            links: vec![
                LinkConfig::new(5.75, 1.0, 0.1, 30.0),
                LinkConfig::new(2.0, 0.75, 0.1, -10.0),
                LinkConfig::new(1.75, 0.5, 0.1, 10.0),
            ],
            cart: None,
            input: ExternalForce::None,
        }
    }
}

impl SimulationConfig {
    /// The default links on a 1 kg cart, shoved by a short pulse.
    pub fn cart_chain() -> Self {
        SimulationConfig {
            cart: Some(CartConfig {
                mass: 1.0,
                initial_position: 0.0,
                initial_velocity: 0.0,
            }),
            input: ExternalForce::Pulse {
                magnitude: 10.0,
                start: 0.0,
                end: 0.5,
            },
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, LoadError> {
        toml::from_str(s).map_err(LoadError::DeserialiseError)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let s = read_to_string(path).map_err(LoadError::FileLoadError)?;
        SimulationConfig::from_toml_str(&s)
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn masses(&self) -> Vec<Float> {
        self.links.iter().map(|l| l.mass).collect()
    }

    pub fn lengths(&self) -> Vec<Float> {
        self.links.iter().map(|l| l.length).collect()
    }

    pub fn damping(&self) -> Vec<Float> {
        self.links.iter().map(|l| l.damping).collect()
    }

    /// Parameters for the cart chain, if a cart is configured
    pub fn chain_parameters(&self) -> Option<ChainParameters> {
        self.cart.as_ref().map(|cart| {
            ChainParameters::new(cart.mass, self.masses(), self.lengths(), self.gravity)
        })
    }

    /// `steps` if given, otherwise `duration / dt` rounded to the nearest step.
    pub fn num_steps(&self) -> Result<usize, SimulationError> {
        if let Some(steps) = self.steps {
            return Ok(steps);
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimulationError::invalid(format!(
                "dt must be finite and positive, got {}",
                self.dt
            )));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(SimulationError::invalid(format!(
                "duration must be finite and non-negative, got {}",
                self.duration
            )));
        }
        let steps = (self.duration / self.dt).round();
        if steps >= usize::MAX as Float {
            return Err(SimulationError::invalid(format!(
                "{} s at {} s per step is too many steps",
                self.duration, self.dt
            )));
        }
        Ok(steps as usize)
    }

    /// Initial state in radians. With a cart, its position and velocity come
    /// first.
    pub fn initial_state(&self) -> GeneralizedState {
        let angles: Vec<Float> = self.links.iter().map(|l| l.initial_angle_deg).collect();
        let rates: Vec<Float> = self.links.iter().map(|l| l.initial_rate_deg).collect();
        let joints = GeneralizedState::from_degrees(&angles, &rates);

        match &self.cart {
            None => joints,
            Some(cart) => {
                let n = joints.dof() + 1;
                let q = DVector::from_fn(n, |i, _| {
                    if i == 0 {
                        cart.initial_position
                    } else {
                        joints.q[i - 1]
                    }
                });
                let u = DVector::from_fn(n, |i, _| {
                    if i == 0 {
                        cart.initial_velocity
                    } else {
                        joints.u[i - 1]
                    }
                });
                GeneralizedState::new(q, u)
            }
        }
    }
}
