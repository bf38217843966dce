use itertools::izip;
use na::Vector2;

use crate::{
    dynamics::CartChain, integrators::GeneralizedState, triple_pendulum::TriplePendulum,
    types::Float,
};

/// Kinetic energy of a cart chain, 1/2 u^T M(q) u
pub fn cart_chain_kinetic_energy(model: &CartChain, state: &GeneralizedState) -> Float {
    let M = model.equations().mass_matrix(&state.q);
    0.5 * state.u.dot(&(M * &state.u))
}

/// Gravitational potential energy of a cart chain, zero at the cart's height
pub fn cart_chain_potential_energy(model: &CartChain, state: &GeneralizedState) -> Float {
    let chain = model.chain();
    let g = chain.parameters().gravity;
    izip!(chain.positions(&state.q), chain.point_masses())
        .map(|(p, m)| m * g * p.y)
        .sum()
}

/// Compute cart chain total energy
pub fn cart_chain_energy(model: &CartChain, state: &GeneralizedState) -> Float {
    cart_chain_kinetic_energy(model, state) + cart_chain_potential_energy(model, state)
}

/// Bob positions and velocities of the fixed-base triple pendulum
fn triple_pendulum_points(
    model: &TriplePendulum,
    state: &GeneralizedState,
) -> Vec<(Vector2<Float>, Vector2<Float>)> {
    let mut p = Vector2::zeros();
    let mut v = Vector2::zeros();
    izip!(model.lengths.iter(), state.q.iter(), state.u.iter())
        .map(|(l, q, u)| {
            p += Vector2::new(q.sin(), -q.cos()) * *l;
            v += Vector2::new(q.cos(), q.sin()) * (l * u);
            (p, v)
        })
        .collect()
}

/// Compute triple pendulum total energy, treating the links as point masses at
/// their tips
pub fn triple_pendulum_energy(model: &TriplePendulum, state: &GeneralizedState) -> Float {
    let points = triple_pendulum_points(model, state);
    izip!(points.iter(), model.masses.iter())
        .map(|((p, v), m)| 0.5 * m * v.norm_squared() + m * model.gravity * p.y)
        .sum()
}

#[cfg(test)]
mod energy_tests {
    use na::dvector;

    use crate::{assert_close, chain::ChainParameters, input::ExternalForce};

    use super::*;

    #[test]
    fn cart_chain_energy_by_hand() {
        // Arrange
        let (m0, m1, l, g) = (2.0, 1.0, 0.5, 9.8);
        let parameters = ChainParameters::new(m0, vec![m1], vec![l], g);
        let model = CartChain::new(&parameters, Box::new(ExternalForce::None)).unwrap();

        let theta: Float = 0.3;
        let (x_dot, theta_dot) = (1.0, 2.0);
        let state = GeneralizedState::new(dvector![0.7, theta], dvector![x_dot, theta_dot]);

        // Act
        let energy = cart_chain_energy(&model, &state);

        // Assert
        let bob_velocity = Vector2::new(x_dot + l * theta.cos() * theta_dot, l * theta.sin() * theta_dot);
        let expected = 0.5 * m0 * x_dot * x_dot + 0.5 * m1 * bob_velocity.norm_squared()
            - m1 * g * l * theta.cos();
        assert_close!(energy, expected, 1e-12);
    }

    #[test]
    fn triple_pendulum_hanging_at_rest() {
        let model = TriplePendulum::new([1.0, 2.0, 3.0], [1.0, 1.0, 1.0], 10.0).unwrap();
        let state = GeneralizedState::new(dvector![0., 0., 0.], dvector![0., 0., 0.]);

        let energy = triple_pendulum_energy(&model, &state);

        // heights -1, -2, -3
        assert_close!(energy, -10.0 * (1.0 + 4.0 + 9.0), 1e-12);
    }

    /// The cart chain with a pinned-down cart and the triple pendulum describe
    /// the same bobs, so their energies agree.
    #[test]
    fn energies_agree_without_cart_motion() {
        let parameters = ChainParameters::new(1.0, vec![5.75, 2.0, 1.75], vec![1.0, 0.75, 0.5], 9.8);
        let chain = CartChain::new(&parameters, Box::new(ExternalForce::None)).unwrap();
        let triple = TriplePendulum::new([5.75, 2.0, 1.75], [1.0, 0.75, 0.5], 9.8).unwrap();

        let q = dvector![0.4, -0.2, 1.1];
        let u = dvector![0.3, 1.5, -0.8];
        let on_cart = GeneralizedState::new(dvector![0.0, q[0], q[1], q[2]], dvector![0.0, u[0], u[1], u[2]]);

        assert_close!(
            cart_chain_energy(&chain, &on_cart),
            triple_pendulum_energy(&triple, &GeneralizedState::new(q, u)),
            1e-10
        );
    }
}
