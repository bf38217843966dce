use na::{DMatrix, DVector, Vector2};

use crate::{
    chain::{build_chain, ChainParameters, KinematicChain},
    equations::{assemble_equations, EquationsOfMotion},
    error::{SimulationError, SingularMatrixError},
    forces::gravity_and_input,
    input::InputForce,
    types::Float,
};

/// A model that produces generalized accelerations for a state.
pub trait Dynamics {
    /// Number of generalized coordinates (and speeds).
    fn dof(&self) -> usize;

    /// Number of leading coordinates that are not joints and carry no
    /// damping, e.g. the cart translation.
    fn num_base_coordinates(&self) -> usize {
        0
    }

    fn num_joints(&self) -> usize {
        self.dof() - self.num_base_coordinates()
    }

    /// Generalized accelerations u_dot at time `t`.
    fn accelerations(
        &self,
        t: Float,
        q: &DVector<Float>,
        u: &DVector<Float>,
    ) -> Result<DVector<Float>, SingularMatrixError>;
}

/// Solves the dynamics equation:
///     M(q) u_dot = F(q, u)
pub fn solve_accelerations(
    mass_matrix: &DMatrix<Float>,
    forcing: &DVector<Float>,
    q: &DVector<Float>,
) -> Result<DVector<Float>, SingularMatrixError> {
    match mass_matrix.clone().lu().solve(forcing) {
        Some(udot) if udot.iter().all(|x| x.is_finite()) => Ok(udot),
        _ => Err(SingularMatrixError::at(q)),
    }
}

/// N-link pendulum chain on a cart, driven by an external horizontal input.
pub struct CartChain {
    chain: KinematicChain,
    equations: EquationsOfMotion,
    input: Box<dyn InputForce>,
}

impl CartChain {
    /// Build the chain along the horizontal axis, with gravity on every point
    /// and the input on the cart and every tip.
    pub fn new(
        parameters: &ChainParameters,
        input: Box<dyn InputForce>,
    ) -> Result<Self, SimulationError> {
        let chain = build_chain(parameters, Vector2::x())?;
        let forces = gravity_and_input(&chain);
        let equations =
            assemble_equations(&chain, &forces, &chain.point_masses(), chain.closures())?;
        Ok(CartChain::from_parts(chain, equations, input))
    }

    pub fn from_parts(
        chain: KinematicChain,
        equations: EquationsOfMotion,
        input: Box<dyn InputForce>,
    ) -> Self {
        CartChain {
            chain,
            equations,
            input,
        }
    }

    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    pub fn equations(&self) -> &EquationsOfMotion {
        &self.equations
    }

    pub fn input(&self, t: Float) -> Float {
        self.input.force(t)
    }
}

impl Dynamics for CartChain {
    fn dof(&self) -> usize {
        self.equations.dof()
    }

    fn num_base_coordinates(&self) -> usize {
        1
    }

    fn accelerations(
        &self,
        t: Float,
        q: &DVector<Float>,
        u: &DVector<Float>,
    ) -> Result<DVector<Float>, SingularMatrixError> {
        self.equations.accelerations(q, u, self.input(t))
    }
}

#[cfg(test)]
mod dynamics_tests {
    use na::{dmatrix, dvector};

    use crate::{assert_close, assert_vec_close, input::ExternalForce};

    use super::*;

    #[test]
    fn solve_accelerations_diagonal() {
        let M = dmatrix![2.0, 0.0; 0.0, 4.0];
        let F = dvector![1.0, 1.0];

        let udot = solve_accelerations(&M, &F, &dvector![0.0, 0.0]).unwrap();

        assert_vec_close!(udot, dvector![0.5, 0.25], 1e-12);
    }

    #[test]
    fn solve_accelerations_singular() {
        let M = dmatrix![1.0, 2.0; 2.0, 4.0];
        let F = dvector![1.0, 1.0];

        assert!(solve_accelerations(&M, &F, &dvector![0.0, 0.0]).is_err());
    }

    /// Pushing a chain hanging at rest accelerates the cart along the push.
    #[test]
    fn constant_push_accelerates_cart() {
        // Arrange
        let parameters = ChainParameters::uniform(2, 1.0, 1.0, 1.0, 9.8);
        let model = CartChain::new(
            &parameters,
            Box::new(ExternalForce::Constant { magnitude: 3.0 }),
        )
        .unwrap();
        let zeros = DVector::zeros(3);

        // Act
        let udot = model.accelerations(0.0, &zeros, &zeros).unwrap();

        // Assert
        // every point is pushed with the same force, so the whole chain
        // translates rigidly: a = 3 f / (m0 + m1 + m2)
        assert_close!(udot[0], 3.0, 1e-12);
        assert_close!(udot[1], 0.0, 1e-12);
        assert_close!(udot[2], 0.0, 1e-12);
        assert_eq!(model.num_base_coordinates(), 1);
        assert_eq!(model.num_joints(), 2);
    }

    #[test]
    fn time_varying_input_is_evaluated_at_t() {
        let parameters = ChainParameters::uniform(1, 1.0, 1.0, 1.0, 9.8);
        let model = CartChain::new(&parameters, Box::new(|t: Float| if t > 1.0 { 2.0 } else { 0.0 }))
            .unwrap();
        let zeros = DVector::zeros(2);

        let before = model.accelerations(0.5, &zeros, &zeros).unwrap();
        let after = model.accelerations(1.5, &zeros, &zeros).unwrap();

        assert_close!(before[0], 0.0, 1e-12);
        assert_close!(after[0], 2.0, 1e-12);
    }
}
