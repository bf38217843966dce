use na::Vector2;

use crate::{chain::KinematicChain, types::Float};

/// Force applied at a point of the chain, `constant + f * gain`, where `f` is
/// the scalar external input at the current time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedForce {
    pub point: usize,
    pub constant: Vector2<Float>,
    pub gain: Vector2<Float>,
}

impl AppliedForce {
    /// Weight of a point mass, pointing down.
    pub fn gravity(point: usize, mass: Float, gravity: Float) -> Self {
        AppliedForce {
            point,
            constant: Vector2::new(0.0, -mass * gravity),
            gain: Vector2::zeros(),
        }
    }

    /// External input acting along `axis`.
    pub fn input(point: usize, axis: Vector2<Float>) -> Self {
        AppliedForce {
            point,
            constant: Vector2::zeros(),
            gain: axis,
        }
    }

    /// Sum of two forces on the same point.
    pub fn with(self, other: AppliedForce) -> Self {
        debug_assert_eq!(self.point, other.point);
        AppliedForce {
            point: self.point,
            constant: self.constant + other.constant,
            gain: self.gain + other.gain,
        }
    }

    pub fn eval(&self, f: Float) -> Vector2<Float> {
        self.constant + self.gain * f
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForceSpec {
    pub forces: Vec<AppliedForce>,
}

impl ForceSpec {
    pub fn new(forces: Vec<AppliedForce>) -> Self {
        ForceSpec { forces }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppliedForce> {
        self.forces.iter()
    }
}

/// Gravity on every point, plus the external input along the cart axis on the
/// cart and on every link tip.
///
/// Note: pushing every tip with the same input is unusual, normally only the
/// cart is actuated. It is kept to reproduce the reference cart-chain model.
pub fn gravity_and_input(chain: &KinematicChain) -> ForceSpec {
    let g = chain.parameters().gravity;
    let axis = chain.base_axis();

    let forces = chain
        .links()
        .iter()
        .enumerate()
        .map(|(point, link)| {
            AppliedForce::gravity(point, link.mass, g).with(AppliedForce::input(point, axis))
        })
        .collect();

    ForceSpec::new(forces)
}
