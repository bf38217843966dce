use log::debug;
use na::{DVector, Vector2};

use crate::{error::SimulationError, types::Float};

/// A planar unit direction whose value depends on at most one generalized
/// coordinate. Every position and velocity in the chain is a weighted sum of
/// these, which keeps the derivation of the equations of motion closed form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Basis {
    /// Constant direction in the inertial frame.
    Fixed(Vector2<Float>),
    /// Link axis of the frame rotated by `q[coordinate]`: (sin q, -cos q).
    /// A link at angle zero hangs straight down.
    Radial(usize),
    /// ẑ × radial: (cos q, sin q).
    Tangential(usize),
}

impl Basis {
    pub fn eval(&self, q: &DVector<Float>) -> Vector2<Float> {
        match self {
            Basis::Fixed(axis) => *axis,
            Basis::Radial(c) => Vector2::new(q[*c].sin(), -q[*c].cos()),
            Basis::Tangential(c) => Vector2::new(q[*c].cos(), q[*c].sin()),
        }
    }

    /// Closed-form dot product of two basis directions.
    pub fn dot(&self, other: &Basis, q: &DVector<Float>) -> Float {
        match (self, other) {
            (Basis::Fixed(a), Basis::Fixed(b)) => a.dot(b),
            (Basis::Fixed(a), Basis::Radial(j)) | (Basis::Radial(j), Basis::Fixed(a)) => {
                a.x * q[*j].sin() - a.y * q[*j].cos()
            }
            (Basis::Fixed(a), Basis::Tangential(j)) | (Basis::Tangential(j), Basis::Fixed(a)) => {
                a.x * q[*j].cos() + a.y * q[*j].sin()
            }
            (Basis::Radial(i), Basis::Radial(j)) | (Basis::Tangential(i), Basis::Tangential(j)) => {
                (q[*i] - q[*j]).cos()
            }
            (Basis::Radial(i), Basis::Tangential(j)) => (q[*i] - q[*j]).sin(),
            (Basis::Tangential(i), Basis::Radial(j)) => (q[*j] - q[*i]).sin(),
        }
    }

    /// ẑ × self, returned as (sign, basis).
    pub fn quarter_turn(&self) -> (Float, Basis) {
        match self {
            Basis::Fixed(a) => (1.0, Basis::Fixed(Vector2::new(-a.y, a.x))),
            Basis::Radial(c) => (1.0, Basis::Tangential(*c)),
            Basis::Tangential(c) => (-1.0, Basis::Radial(*c)),
        }
    }

    /// Rate of change of the direction per unit rate of its coordinate,
    /// returned as (sign, basis, coordinate). `None` for fixed directions.
    pub fn derivative(&self) -> Option<(Float, Basis, usize)> {
        match self {
            Basis::Fixed(_) => None,
            Basis::Radial(c) => Some((1.0, Basis::Tangential(*c), *c)),
            Basis::Tangential(c) => Some((-1.0, Basis::Radial(*c), *c)),
        }
    }
}

/// One summand of a point's position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PositionTerm {
    /// `q[coordinate] * axis`
    Slide { coordinate: usize, axis: Vector2<Float> },
    /// `coefficient * basis(q)`
    Arm { coefficient: Float, basis: Basis },
}

impl PositionTerm {
    pub fn eval(&self, q: &DVector<Float>) -> Vector2<Float> {
        match self {
            PositionTerm::Slide { coordinate, axis } => axis * q[*coordinate],
            PositionTerm::Arm { coefficient, basis } => basis.eval(q) * *coefficient,
        }
    }
}

/// One summand of a point's velocity: `coefficient * u[speed] * basis(q)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityTerm {
    pub speed: usize,
    pub coefficient: Float,
    pub basis: Basis,
}

/// Frame rotated about the out-of-plane axis by `q[coordinate]` relative to
/// the inertial frame, with angular rate `u[speed]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub coordinate: usize,
    pub speed: usize,
}

/// A point of the chain. `parent` is the index of the point it is located
/// from; the base point has none.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub parent: Option<usize>,
    pub position: Vec<PositionTerm>,
    pub velocity: Vec<VelocityTerm>,
}

impl Point {
    /// Partial velocity with respect to `u[speed]`, or `None` when the point
    /// does not depend on that speed.
    pub fn partial_velocity(&self, speed: usize) -> Option<(Float, Basis)> {
        self.velocity
            .iter()
            .find(|term| term.speed == speed)
            .map(|term| (term.coefficient, term.basis))
    }

    pub fn position_at(&self, q: &DVector<Float>) -> Vector2<Float> {
        self.position
            .iter()
            .fold(Vector2::zeros(), |acc, term| acc + term.eval(q))
    }

    pub fn velocity_at(&self, q: &DVector<Float>, u: &DVector<Float>) -> Vector2<Float> {
        self.velocity.iter().fold(Vector2::zeros(), |acc, term| {
            acc + term.basis.eval(q) * (term.coefficient * u[term.speed])
        })
    }

    /// Locate a new point `length` along `frame`'s link axis from this one and
    /// give it the velocity of this point plus ω × r.
    fn locate_new(&self, index: usize, frame: &Frame, length: Float) -> Point {
        let arm = Basis::Radial(frame.coordinate);

        let mut position = self.position.clone();
        position.push(PositionTerm::Arm {
            coefficient: length,
            basis: arm,
        });

        let (sign, swept) = arm.quarter_turn();
        let mut velocity = self.velocity.clone();
        velocity.push(VelocityTerm {
            speed: frame.speed,
            coefficient: sign * length,
            basis: swept,
        });

        Point {
            parent: Some(index),
            position,
            velocity,
        }
    }
}

/// Kinematic closure `d(q[coordinate])/dt - u[speed] = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicDifferential {
    pub coordinate: usize,
    pub speed: usize,
}

impl KinematicDifferential {
    pub fn residual(&self, qdot: &DVector<Float>, u: &DVector<Float>) -> Float {
        qdot[self.coordinate] - u[self.speed]
    }
}

/// A body of the chain. The base (cart) has no length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub mass: Float,
    pub length: Option<Float>,
    pub joint: usize,
}

/// Physical constants of a cart chain.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainParameters {
    pub cart_mass: Float,
    pub masses: Vec<Float>,
    pub lengths: Vec<Float>,
    pub gravity: Float,
}

impl ChainParameters {
    pub fn new(cart_mass: Float, masses: Vec<Float>, lengths: Vec<Float>, gravity: Float) -> Self {
        ChainParameters {
            cart_mass,
            masses,
            lengths,
            gravity,
        }
    }

    /// `n` identical links on a cart.
    pub fn uniform(n: usize, cart_mass: Float, mass: Float, length: Float, gravity: Float) -> Self {
        ChainParameters::new(cart_mass, vec![mass; n], vec![length; n], gravity)
    }

    pub fn num_links(&self) -> usize {
        self.masses.len()
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let n = self.masses.len();
        if n < 1 {
            return Err(SimulationError::invalid(
                "a chain needs at least one link",
            ));
        }
        if self.lengths.len() != n {
            return Err(SimulationError::invalid(format!(
                "{} link masses but {} link lengths",
                n,
                self.lengths.len()
            )));
        }
        if !(self.cart_mass.is_finite() && self.cart_mass > 0.0) {
            return Err(SimulationError::invalid(format!(
                "cart mass must be positive, got {}",
                self.cart_mass
            )));
        }
        for (i, (m, l)) in self.masses.iter().zip(self.lengths.iter()).enumerate() {
            if !(m.is_finite() && *m > 0.0) {
                return Err(SimulationError::invalid(format!(
                    "link {} mass must be positive, got {}",
                    i + 1,
                    m
                )));
            }
            if !(l.is_finite() && *l > 0.0) {
                return Err(SimulationError::invalid(format!(
                    "link {} length must be positive, got {}",
                    i + 1,
                    l
                )));
            }
        }
        if !self.gravity.is_finite() {
            return Err(SimulationError::invalid("gravity must be finite"));
        }
        Ok(())
    }
}

/// Cart plus N pendulum links. Index 0 of `links`, `points` and the
/// generalized coordinates is the cart; index i is link i.
#[derive(Clone, Debug)]
pub struct KinematicChain {
    parameters: ChainParameters,
    base_axis: Vector2<Float>,
    links: Vec<Link>,
    frames: Vec<Frame>,
    points: Vec<Point>,
    closures: Vec<KinematicDifferential>,
}

impl KinematicChain {
    pub fn parameters(&self) -> &ChainParameters {
        &self.parameters
    }

    pub fn base_axis(&self) -> Vector2<Float> {
        self.base_axis
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn closures(&self) -> &[KinematicDifferential] {
        &self.closures
    }

    /// N, the number of pendulum links.
    pub fn num_links(&self) -> usize {
        self.links.len() - 1
    }

    /// N + 1: the cart translation plus one angle per link.
    pub fn num_coordinates(&self) -> usize {
        self.closures.len()
    }

    pub fn point_masses(&self) -> Vec<Float> {
        self.links.iter().map(|link| link.mass).collect()
    }

    pub fn positions(&self, q: &DVector<Float>) -> Vec<Vector2<Float>> {
        self.points.iter().map(|p| p.position_at(q)).collect()
    }

    pub fn velocities(&self, q: &DVector<Float>, u: &DVector<Float>) -> Vec<Vector2<Float>> {
        self.points.iter().map(|p| p.velocity_at(q, u)).collect()
    }
}

/// Build the chain link by link, each frame and tip from its predecessor.
pub fn build_chain(
    parameters: &ChainParameters,
    base_axis: Vector2<Float>,
) -> Result<KinematicChain, SimulationError> {
    parameters.validate()?;
    if !(base_axis.iter().all(|x| x.is_finite()) && base_axis.norm() > 0.0) {
        return Err(SimulationError::invalid(format!(
            "base axis must be a finite non-zero vector, got ({}, {})",
            base_axis.x, base_axis.y
        )));
    }

    let n = parameters.num_links();

    let mut links = vec![Link {
        mass: parameters.cart_mass,
        length: None,
        joint: 0,
    }];
    let mut frames = vec![];
    let mut points = vec![Point {
        parent: None,
        position: vec![PositionTerm::Slide {
            coordinate: 0,
            axis: base_axis,
        }],
        velocity: vec![VelocityTerm {
            speed: 0,
            coefficient: 1.0,
            basis: Basis::Fixed(base_axis),
        }],
    }];
    let mut closures = vec![KinematicDifferential {
        coordinate: 0,
        speed: 0,
    }];

    for i in 1..=n {
        let mass = parameters.masses[i - 1];
        let length = parameters.lengths[i - 1];

        let frame = Frame {
            coordinate: i,
            speed: i,
        };
        let tip = points[i - 1].locate_new(i - 1, &frame, length);

        links.push(Link {
            mass,
            length: Some(length),
            joint: i,
        });
        frames.push(frame);
        points.push(tip);
        closures.push(KinematicDifferential {
            coordinate: i,
            speed: i,
        });
    }

    debug!(
        "built kinematic chain: {} links, {} coordinates",
        n,
        closures.len()
    );

    Ok(KinematicChain {
        parameters: parameters.clone(),
        base_axis,
        links,
        frames,
        points,
        closures,
    })
}
