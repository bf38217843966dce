use itertools::izip;
use log::debug;
use na::{DMatrix, DVector, Vector2};

use crate::{
    chain::{Basis, KinematicChain, KinematicDifferential},
    dynamics::solve_accelerations,
    error::{SimulationError, SingularMatrixError},
    forces::ForceSpec,
    types::Float,
};

/// `coefficient * (a . b)(q)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassTerm {
    pub coefficient: Float,
    pub a: Basis,
    pub b: Basis,
}

/// `coefficient * u[speeds.0] * u[speeds.1] * (a . b)(q)`, the velocity
/// product (centripetal/Coriolis) part of the forcing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityProductTerm {
    pub coefficient: Float,
    pub speeds: (usize, usize),
    pub a: Basis,
    pub b: Basis,
}

/// `(constant + f * gain) . basis(q)`, an applied force projected onto a
/// partial velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedTerm {
    pub constant: Vector2<Float>,
    pub gain: Vector2<Float>,
    pub basis: Basis,
}

/// Equations of motion in the form
///     M(q) u_dot = F(q, u, f)
/// held as merged closed-form terms, so evaluating them at a state is pure
/// arithmetic.
#[derive(Clone, Debug)]
pub struct EquationsOfMotion {
    n: usize,
    mass: Vec<Vec<Vec<MassTerm>>>,
    velocity_products: Vec<Vec<VelocityProductTerm>>,
    applied: Vec<Vec<AppliedTerm>>,
}

impl EquationsOfMotion {
    /// Number of generalized speeds.
    pub fn dof(&self) -> usize {
        self.n
    }

    pub fn mass_terms(&self, row: usize, col: usize) -> &[MassTerm] {
        &self.mass[row][col]
    }

    pub fn velocity_product_terms(&self, row: usize) -> &[VelocityProductTerm] {
        &self.velocity_products[row]
    }

    pub fn applied_terms(&self, row: usize) -> &[AppliedTerm] {
        &self.applied[row]
    }

    /// Total number of merged terms, a measure of the derivation's size.
    pub fn num_terms(&self) -> usize {
        let mass: usize = self.mass.iter().flatten().map(|terms| terms.len()).sum();
        let velocity: usize = self.velocity_products.iter().map(|t| t.len()).sum();
        let applied: usize = self.applied.iter().map(|t| t.len()).sum();
        mass + velocity + applied
    }

    pub fn mass_matrix(&self, q: &DVector<Float>) -> DMatrix<Float> {
        DMatrix::from_fn(self.n, self.n, |row, col| {
            self.mass[row][col]
                .iter()
                .map(|term| term.coefficient * term.a.dot(&term.b, q))
                .sum()
        })
    }

    pub fn forcing(&self, q: &DVector<Float>, u: &DVector<Float>, f: Float) -> DVector<Float> {
        DVector::from_fn(self.n, |row, _| {
            let velocity: Float = self.velocity_products[row]
                .iter()
                .map(|term| {
                    term.coefficient * u[term.speeds.0] * u[term.speeds.1] * term.a.dot(&term.b, q)
                })
                .sum();
            let applied: Float = self.applied[row]
                .iter()
                .map(|term| {
                    let force = term.constant + term.gain * f;
                    Basis::Fixed(force).dot(&term.basis, q)
                })
                .sum();
            velocity + applied
        })
    }

    /// Solve for the generalized accelerations at the given state and input.
    pub fn accelerations(
        &self,
        q: &DVector<Float>,
        u: &DVector<Float>,
        f: Float,
    ) -> Result<DVector<Float>, SingularMatrixError> {
        let mass_matrix = self.mass_matrix(q);
        let forcing = self.forcing(q, u, f);
        solve_accelerations(&mass_matrix, &forcing, q)
    }
}

fn merge_mass(terms: &mut Vec<MassTerm>, new: MassTerm) {
    if let Some(existing) = terms.iter_mut().find(|t| t.a == new.a && t.b == new.b) {
        existing.coefficient += new.coefficient;
    } else {
        terms.push(new);
    }
}

fn merge_velocity_product(terms: &mut Vec<VelocityProductTerm>, new: VelocityProductTerm) {
    if let Some(existing) = terms
        .iter_mut()
        .find(|t| t.speeds == new.speeds && t.a == new.a && t.b == new.b)
    {
        existing.coefficient += new.coefficient;
    } else {
        terms.push(new);
    }
}

fn merge_applied(terms: &mut Vec<AppliedTerm>, new: AppliedTerm) {
    if let Some(existing) = terms.iter_mut().find(|t| t.basis == new.basis) {
        existing.constant += new.constant;
        existing.gain += new.gain;
    } else {
        terms.push(new);
    }
}

/// Derive the equations of motion of the chain with Kane's method.
///
/// For every point k of mass m_k and every generalized speed r with partial
/// velocity c_r b_r, the generalized inertia force m_k a_k . c_r b_r splits
/// into the coefficients of the accelerations (mass matrix) and velocity
/// products, which move to the right hand side together with the generalized
/// applied forces F_k . c_r b_r.
///
/// Runs once; the result is evaluated at every integration step.
pub fn assemble_equations(
    chain: &KinematicChain,
    forces: &ForceSpec,
    masses: &[Float],
    closures: &[KinematicDifferential],
) -> Result<EquationsOfMotion, SimulationError> {
    let n = chain.num_coordinates();
    let points = chain.points();

    if masses.len() != points.len() {
        return Err(SimulationError::invalid(format!(
            "{} point masses for {} points",
            masses.len(),
            points.len()
        )));
    }
    if let Some(m) = masses.iter().find(|m| !(m.is_finite() && **m >= 0.0)) {
        return Err(SimulationError::invalid(format!(
            "point masses must be finite and non-negative, got {}",
            m
        )));
    }
    if closures.len() != n {
        return Err(SimulationError::invalid(format!(
            "{} kinematic closures for {} coordinates",
            closures.len(),
            n
        )));
    }

    // speed paired with each coordinate
    let mut speed_of = vec![None; n];
    for closure in closures {
        if closure.coordinate >= n || closure.speed >= n {
            return Err(SimulationError::invalid(format!(
                "closure {:?} out of range for {} coordinates",
                closure, n
            )));
        }
        if speed_of[closure.coordinate].replace(closure.speed).is_some() {
            return Err(SimulationError::invalid(format!(
                "coordinate {} has more than one closure",
                closure.coordinate
            )));
        }
    }
    let speed_of: Vec<usize> = speed_of.into_iter().flatten().collect();

    if let Some(force) = forces.iter().find(|force| force.point >= points.len()) {
        return Err(SimulationError::invalid(format!(
            "force attached to point {} but the chain has {} points",
            force.point,
            points.len()
        )));
    }

    let mut mass = vec![vec![vec![]; n]; n];
    let mut velocity_products = vec![vec![]; n];
    let mut applied = vec![vec![]; n];

    for (point, m) in izip!(points.iter(), masses.iter()) {
        for partial in point.velocity.iter() {
            let row = partial.speed;

            for term in point.velocity.iter() {
                // Acceleration of the point along the speed's own direction
                merge_mass(
                    &mut mass[row][term.speed],
                    MassTerm {
                        coefficient: m * partial.coefficient * term.coefficient,
                        a: partial.basis,
                        b: term.basis,
                    },
                );

                // Rotation of the direction itself, moved to the right hand side
                if let Some((sign, rate_basis, coordinate)) = term.basis.derivative() {
                    merge_velocity_product(
                        &mut velocity_products[row],
                        VelocityProductTerm {
                            coefficient: -m * partial.coefficient * term.coefficient * sign,
                            speeds: (term.speed, speed_of[coordinate]),
                            a: rate_basis,
                            b: partial.basis,
                        },
                    );
                }
            }
        }
    }

    for force in forces.iter() {
        for partial in points[force.point].velocity.iter() {
            merge_applied(
                &mut applied[partial.speed],
                AppliedTerm {
                    constant: force.constant * partial.coefficient,
                    gain: force.gain * partial.coefficient,
                    basis: partial.basis,
                },
            );
        }
    }

    let equations = EquationsOfMotion {
        n,
        mass,
        velocity_products,
        applied,
    };
    debug!(
        "assembled equations of motion: {} speeds, {} merged terms",
        n,
        equations.num_terms()
    );

    Ok(equations)
}
