use std::{env, error::Error};

use log::{error, info, warn};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use pendulum_chain::{config::SimulationConfig, error::SimulationError, simulate::run};

/// Run an N-link chain hanging from a cart pushed along x
///
///          _________
///         |____o____|  --> f
///               \
///                o
///                |
///                o
///
/// Pass a TOML file to override the defaults. Prints one CSV row per sample:
/// t, x_cart, x1, y1, ..., xN, yN
pub fn main() -> Result<(), Box<dyn Error>> {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let config = match env::args().nth(1) {
        Some(path) => {
            info!("loading {}", path);
            SimulationConfig::load(path)?
        }
        None => SimulationConfig::cart_chain(),
    };
    if config.cart.is_none() {
        warn!("no [cart] in the configuration, the links hang from a fixed pivot");
    }

    let result = match run(&config) {
        Ok(result) => result,
        Err(SimulationError::SingularConfiguration {
            step, trajectory, ..
        }) => {
            error!(
                "singular mass matrix at step {}, {} samples were computed",
                step,
                trajectory.len()
            );
            return Err("simulation stopped early".into());
        }
        Err(SimulationError::Diverged { step, .. }) => {
            error!("state diverged at step {}, try a smaller dt", step);
            return Err("simulation stopped early".into());
        }
        Err(e) => return Err(e.into()),
    };

    let header: Vec<String> = (1..=result.tips.len())
        .flat_map(|i| [format!("x{}", i), format!("y{}", i)])
        .collect();
    println!("t,x_cart,{}", header.join(","));
    for (k, (t, state)) in result.times.iter().zip(result.trajectory.iter()).enumerate() {
        let row: Vec<String> = result
            .tips
            .iter()
            .map(|link| format!("{},{}", link[k].x, link[k].y))
            .collect();
        let x_cart = if config.cart.is_some() { state.q[0] } else { 0.0 };
        println!("{},{},{}", t, x_cart, row.join(","));
    }

    let energies = &result.energies;
    info!(
        "energy: initial {:.6} J, final {:.6} J, drift {:.6} J",
        energies[0],
        energies[energies.len() - 1],
        result.energy_drift()
    );
    Ok(())
}
