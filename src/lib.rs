#![allow(non_snake_case)]

use types::Float;
pub extern crate nalgebra as na;

pub mod chain;
pub mod config;
pub mod dynamics;
pub mod energy;
pub mod equations;
pub mod error;
pub mod forces;
pub mod input;
pub mod integrators;
pub mod projection;
pub mod simulate;
pub mod triple_pendulum;
pub mod types;
pub mod util;

pub const GRAVITY: Float = 9.8;

pub const PI: Float = std::f64::consts::PI;
pub const TWO_PI: Float = 2.0 * PI;
