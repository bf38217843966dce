use std::{env, error::Error};

use log::{error, info};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use pendulum_chain::{config::SimulationConfig, simulate::run};

/// Run the damped triple pendulum hanging from a fixed pivot
///
///              o  pivot
///               \
///                o
///                |
///                 o
///                  \
///                   o
///
/// Pass a TOML file to override the defaults. Prints one CSV row per sample:
/// t, x1, y1, x2, y2, x3, y3
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
        None => SimulationConfig::default(),
    };

    let result = run(&config).map_err(|e| {
        error!("{}", e);
        e
    })?;

    let header: Vec<String> = (1..=result.tips.len())
        .flat_map(|i| [format!("x{}", i), format!("y{}", i)])
        .collect();
    println!("t,{}", header.join(","));
    for (k, t) in result.times.iter().enumerate() {
        let row: Vec<String> = result
            .tips
            .iter()
            .map(|link| format!("{},{}", link[k].x, link[k].y))
            .collect();
        println!("{},{}", t, row.join(","));
    }

    info!("energy drift: {:.6} J", result.energy_drift());
    Ok(())
}
