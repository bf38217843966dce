use pendulum_chain::{
    assert_close, assert_vec_close,
    chain::ChainParameters,
    config::SimulationConfig,
    dynamics::{CartChain, Dynamics},
    error::SimulationError,
    input::ExternalForce,
    integrators::{integrate, GeneralizedState},
    na::{dvector, vector, Vector2},
    projection::{project, Mount},
    simulate::run,
    triple_pendulum::TriplePendulum,
    types::Float,
};

#[test]
fn triple_pendulum_reference_run() {
    // Arrange
    let pendulum = TriplePendulum::new([5.75, 2.0, 1.75], [1.0, 0.75, 0.5], 9.8).unwrap();
    let initial = GeneralizedState::from_degrees(&[30., -10., 10.], &[0., 0., 0.]);

    // Act
    let trajectory = integrate(&pendulum, &initial, &[0.1, 0.1, 0.1], 0.01, 1500).unwrap();
    let tips = project(&trajectory, &pendulum.lengths, Mount::Pivot(Vector2::zeros())).unwrap();

    // Assert
    assert_eq!(trajectory.len(), 1501);
    assert_vec_close!(
        trajectory.first().interleaved(),
        dvector![
            30f64.to_radians(),
            0.,
            (-10f64).to_radians(),
            0.,
            10f64.to_radians(),
            0.
        ],
        1e-15
    );
    assert!(trajectory.iter().all(|s| s.is_finite()));

    let theta: Float = 30f64.to_radians();
    assert_vec_close!(tips[0][0], vector![theta.sin(), -theta.cos()], 1e-15);
}

#[test]
fn library_pipeline_matches_manual_pipeline() {
    let config = SimulationConfig::default();
    let pendulum = TriplePendulum::new([5.75, 2.0, 1.75], [1.0, 0.75, 0.5], 9.8).unwrap();

    let result = run(&config).unwrap();
    let trajectory = integrate(
        &pendulum,
        &config.initial_state(),
        &config.damping(),
        config.dt,
        1500,
    )
    .unwrap();

    assert_eq!(result.trajectory, trajectory);
}

#[test]
fn cart_chain_from_toml() {
    // Arrange
    let config = SimulationConfig::from_toml_str(
        r#"
        dt = 0.005
        duration = 2.0

        [[links]]
        mass = 1.0
        length = 1.0
        damping = 0.05
        initial_angle_deg = 20.0

        [[links]]
        mass = 1.0
        length = 1.0

        [[links]]
        mass = 1.0
        length = 1.0

        [[links]]
        mass = 1.0
        length = 1.0

        [cart]
        mass = 2.0

        [input]
        kind = "sinusoid"
        amplitude = 1.0
        frequency = 0.5
        "#,
    )
    .unwrap();

    // Act
    let result = run(&config).unwrap();

    // Assert
    assert_eq!(result.num_samples(), 401);
    assert_eq!(result.tips.len(), 4);
    for (k, state) in result.trajectory.iter().enumerate() {
        let cart = vector![state.q[0], 0.0];
        assert_close!((result.tips[0][k] - cart).norm(), 1.0, 1e-9);
        for i in 1..4 {
            assert_close!((result.tips[i][k] - result.tips[i - 1][k]).norm(), 1.0, 1e-9);
        }
    }
}

#[test]
fn zero_length_fails_before_integrating() {
    let parameters = ChainParameters::new(1.0, vec![1.0, 1.0], vec![1.0, 0.0], 9.8);

    let result = CartChain::new(&parameters, Box::new(ExternalForce::None));

    assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
}

#[test]
fn cart_pole_mass_matrix() {
    // Arrange
    let (m_cart, m, l) = (2.0, 0.5, 0.8);
    let parameters = ChainParameters::new(m_cart, vec![m], vec![l], 9.8);
    let model = CartChain::new(&parameters, Box::new(ExternalForce::None)).unwrap();
    let theta: Float = 0.4;

    // Act
    let mass_matrix = model.equations().mass_matrix(&dvector![0.0, theta]);

    // Assert
    assert_eq!(model.dof(), 2);
    assert_close!(mass_matrix[(0, 0)], m_cart + m, 1e-12);
    assert_close!(mass_matrix[(0, 1)], m * l * theta.cos(), 1e-12);
    assert_close!(mass_matrix[(1, 0)], m * l * theta.cos(), 1e-12);
    assert_close!(mass_matrix[(1, 1)], m * l * l, 1e-12);
}
