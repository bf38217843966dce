use na::Vector2;

use crate::{
    error::SimulationError,
    integrators::{GeneralizedState, Trajectory},
    types::Float,
};

/// What the first link hangs from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mount {
    /// Fixed pivot; the state holds only link angles.
    Pivot(Vector2<Float>),
    /// Cart sliding along the given axis; the first coordinate is the cart
    /// position and the remaining ones are link angles.
    Cart(Vector2<Float>),
}

impl Mount {
    fn num_base_coordinates(&self) -> usize {
        match self {
            Mount::Pivot(_) => 0,
            Mount::Cart(_) => 1,
        }
    }
}

/// Tip position of every link for one sample, in chain order.
pub fn project_state(
    state: &GeneralizedState,
    lengths: &[Float],
    mount: Mount,
) -> Result<Vec<Vector2<Float>>, SimulationError> {
    let base = mount.num_base_coordinates();
    if state.q.len() != lengths.len() + base {
        return Err(SimulationError::invalid(format!(
            "{} coordinates cannot describe {} links on {:?}",
            state.q.len(),
            lengths.len(),
            mount
        )));
    }

    let origin = match mount {
        Mount::Pivot(pivot) => pivot,
        Mount::Cart(axis) => axis * state.q[0],
    };

    Ok(lengths
        .iter()
        .zip(state.q.iter().skip(base))
        .scan(origin, |tip, (l, theta)| {
            *tip += Vector2::new(l * theta.sin(), -l * theta.cos());
            Some(*tip)
        })
        .collect())
}

/// Project a trajectory into one (x, y) sequence per link, indexed
/// `[link][sample]`.
pub fn project(
    trajectory: &Trajectory,
    lengths: &[Float],
    mount: Mount,
) -> Result<Vec<Vec<Vector2<Float>>>, SimulationError> {
    let samples = trajectory
        .iter()
        .map(|state| project_state(state, lengths, mount))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((0..lengths.len())
        .map(|link| samples.iter().map(|tips| tips[link]).collect())
        .collect())
}

#[cfg(test)]
mod projection_tests {
    use na::{dvector, vector};

    use crate::{
        assert_vec_close,
        chain::{build_chain, ChainParameters},
    };

    use super::*;

    #[test]
    fn first_sample_of_reference_scenario() {
        // Arrange
        let initial = GeneralizedState::from_degrees(&[30., -10., 10.], &[0., 0., 0.]);
        let trajectory = Trajectory::new(0.01, initial);
        let lengths = [1.0, 0.75, 0.5];

        // Act
        let tips = project(&trajectory, &lengths, Mount::Pivot(Vector2::zeros())).unwrap();

        // Assert
        let (s, c) = (30f64.to_radians().sin(), 30f64.to_radians().cos());
        assert_eq!(tips.len(), 3);
        assert_eq!(tips[0].len(), 1);
        assert_vec_close!(tips[0][0], vector![s, -c], 1e-15);

        let t2 = (-10f64).to_radians();
        assert_vec_close!(
            tips[1][0],
            vector![s + 0.75 * t2.sin(), -c - 0.75 * t2.cos()],
            1e-15
        );
    }

    #[test]
    fn cart_mount_starts_at_cart_position() {
        let state = GeneralizedState::new(dvector![2.0, 0.0, PI_2], dvector![0., 0., 0.]);

        let tips = project_state(&state, &[1.0, 0.5], Mount::Cart(Vector2::x())).unwrap();

        assert_vec_close!(tips[0], vector![2.0, -1.0], 1e-12);
        assert_vec_close!(tips[1], vector![2.5, -1.0], 1e-12);
    }

    const PI_2: Float = std::f64::consts::FRAC_PI_2;

    /// The projection agrees with the chain's own point positions, whatever
    /// the cart's axis.
    #[test]
    fn matches_chain_positions() {
        let parameters = ChainParameters::new(1.0, vec![1.0, 2.0, 3.0], vec![0.4, 0.9, 1.3], 9.8);
        let state = GeneralizedState::new(dvector![-0.6, 0.3, 2.0, -1.2], dvector![0., 0., 0., 0.]);

        for axis in [Vector2::x(), vector![0.6, 0.8], vector![-1.0, 0.5]] {
            let chain = build_chain(&parameters, axis).unwrap();

            let tips = project_state(&state, &parameters.lengths, Mount::Cart(chain.base_axis()))
                .unwrap();
            let positions = chain.positions(&state.q);

            for (tip, point) in tips.iter().zip(positions.iter().skip(1)) {
                assert_vec_close!(tip, point, 1e-12);
            }
        }
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let state = GeneralizedState::new(dvector![0.1, 0.2], dvector![0., 0.]);

        assert!(project_state(&state, &[1.0, 1.0], Mount::Cart(Vector2::x())).is_err());
        assert!(project_state(&state, &[1.0], Mount::Pivot(Vector2::zeros())).is_err());
    }
}
