use log::{info, warn};
use na::Vector2;

use crate::{
    config::SimulationConfig,
    dynamics::{CartChain, Dynamics},
    energy::{cart_chain_energy, triple_pendulum_energy},
    error::SimulationError,
    input::ExternalForce,
    integrators::{integrate, GeneralizedState, Trajectory},
    projection::{project, Mount},
    triple_pendulum::TriplePendulum,
    types::Float,
};

/// The model a configuration describes.
pub enum Scenario {
    /// Three links hanging from a fixed pivot at the origin.
    FixedBase(TriplePendulum),
    /// N links on a cart.
    Cart(CartChain),
}

impl Scenario {
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimulationError> {
        match config.chain_parameters() {
            Some(parameters) => Ok(Scenario::Cart(CartChain::new(
                &parameters,
                Box::new(config.input.clone()),
            )?)),
            None => {
                let (masses, lengths) = match (
                    <[Float; 3]>::try_from(config.masses()),
                    <[Float; 3]>::try_from(config.lengths()),
                ) {
                    (Ok(masses), Ok(lengths)) => (masses, lengths),
                    _ => {
                        return Err(SimulationError::invalid(format!(
                            "a fixed pivot takes exactly 3 links, got {}; add a [cart] for other chains",
                            config.num_links()
                        )))
                    }
                };
                if config.input != ExternalForce::None {
                    warn!("input force is ignored without a cart");
                }
                Ok(Scenario::FixedBase(TriplePendulum::new(
                    masses,
                    lengths,
                    config.gravity,
                )?))
            }
        }
    }

    pub fn dynamics(&self) -> &dyn Dynamics {
        match self {
            Scenario::FixedBase(pendulum) => pendulum,
            Scenario::Cart(chain) => chain,
        }
    }

    pub fn mount(&self) -> Mount {
        match self {
            Scenario::FixedBase(_) => Mount::Pivot(Vector2::zeros()),
            Scenario::Cart(chain) => Mount::Cart(chain.chain().base_axis()),
        }
    }

    pub fn lengths(&self) -> Vec<Float> {
        match self {
            Scenario::FixedBase(pendulum) => pendulum.lengths.to_vec(),
            Scenario::Cart(chain) => chain.chain().parameters().lengths.clone(),
        }
    }

    /// Total mechanical energy
    pub fn energy(&self, state: &GeneralizedState) -> Float {
        match self {
            Scenario::FixedBase(pendulum) => triple_pendulum_energy(pendulum, state),
            Scenario::Cart(chain) => cart_chain_energy(chain, state),
        }
    }
}

/// What a renderer needs from one run.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    pub trajectory: Trajectory,
    pub times: Vec<Float>,
    /// Tip positions indexed `[link][sample]`
    pub tips: Vec<Vec<Vector2<Float>>>,
    pub energies: Vec<Float>,
}

impl SimulationResult {
    pub fn num_samples(&self) -> usize {
        self.trajectory.len()
    }

    /// Final minus initial total energy
    pub fn energy_drift(&self) -> Float {
        match (self.energies.first(), self.energies.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Build the model, integrate it and project the result.
pub fn run(config: &SimulationConfig) -> Result<SimulationResult, SimulationError> {
    let scenario = Scenario::from_config(config)?;
    let steps = config.num_steps()?;
    let initial = config.initial_state();

    info!(
        "simulating {} links ({}) for {} steps",
        config.num_links(),
        match scenario {
            Scenario::FixedBase(_) => "fixed pivot",
            Scenario::Cart(_) => "cart",
        },
        steps
    );

    let trajectory = integrate(
        scenario.dynamics(),
        &initial,
        &config.damping(),
        config.dt,
        steps,
    )?;

    let tips = project(&trajectory, &scenario.lengths(), scenario.mount())?;
    let energies = trajectory.iter().map(|s| scenario.energy(s)).collect();

    Ok(SimulationResult {
        times: trajectory.times(),
        trajectory,
        tips,
        energies,
    })
}

#[cfg(test)]
mod simulate_tests {
    use na::vector;

    use crate::{
        assert_close, assert_vec_close,
        config::{CartConfig, LinkConfig},
        PI,
    };

    use super::*;

    #[test]
    fn reference_scenario() {
        // Arrange
        let config = SimulationConfig::default();

        // Act
        let result = run(&config).unwrap();

        // Assert
        assert_eq!(result.num_samples(), 1501);
        assert_eq!(result.times.len(), 1501);
        assert_eq!(result.tips.len(), 3);
        assert!(result.tips.iter().all(|link| link.len() == 1501));
        assert_close!(result.times[1500], 15.0, 1e-9);

        let (s, c) = ((PI / 6.0).sin(), (PI / 6.0).cos());
        assert_vec_close!(result.tips[0][0], vector![s, -c], 1e-15);

        // link 1 keeps its length throughout
        for tip in result.tips[0].iter() {
            assert_close!(tip.norm(), 1.0, 1e-12);
        }
    }

    #[test]
    fn cart_chain_moves_with_input() {
        let config = SimulationConfig {
            duration: 1.0,
            ..SimulationConfig::cart_chain()
        };

        let result = run(&config).unwrap();

        assert_eq!(result.num_samples(), 101);
        let x = &result.trajectory.last().q;
        assert!(x[0] > 0.0, "cart did not move: {}", x[0]);
        // tip 1 hangs from the cart
        let tip = result.tips[0][100];
        assert_close!((tip - vector![x[0], 0.0]).norm(), 1.0, 1e-12);
    }

    #[test]
    fn damped_cart_chain_loses_energy() {
        let config = SimulationConfig {
            dt: 0.001,
            duration: 5.0,
            links: vec![
                LinkConfig::new(1.0, 1.0, 2.0, 60.0),
                LinkConfig::new(1.0, 1.0, 2.0, 0.0),
            ],
            cart: Some(CartConfig {
                mass: 1000.0,
                initial_position: 0.0,
                initial_velocity: 0.0,
            }),
            ..Default::default()
        };

        let result = run(&config).unwrap();

        assert!(result.energy_drift() < 0.0);
    }

    #[test]
    fn zero_steps() {
        let config = SimulationConfig {
            steps: Some(0),
            ..Default::default()
        };

        let result = run(&config).unwrap();

        assert_eq!(result.num_samples(), 1);
        assert_eq!(result.trajectory.first(), &config.initial_state());
        assert_eq!(result.energy_drift(), 0.0);
    }

    #[test]
    fn zero_length_is_rejected() {
        let mut config = SimulationConfig::default();
        config.links[1].length = 0.0;

        assert!(matches!(
            run(&config),
            Err(SimulationError::InvalidConfiguration(_))
        ));

        config.cart = SimulationConfig::cart_chain().cart;
        assert!(matches!(
            run(&config),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn fixed_pivot_needs_three_links() {
        let mut config = SimulationConfig::default();
        config.links.pop();

        assert!(matches!(
            Scenario::from_config(&config),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }
}
