use na::DVector;

use crate::{
    dynamics::Dynamics,
    error::{SimulationError, SingularMatrixError},
    types::Float,
};

/// Manual writing out of the equations of motion of a triple pendulum hanging
/// from a fixed pivot, with point masses at the link tips and angles measured
/// from the downward vertical.
///
/// Links 1 and 2 follow the double pendulum equations. Link 3's acceleration
/// reuses the upper-link row of a double pendulum made of links 2 and 3
/// (without its ω3² term): it does not feed back into link 2, and near the
/// vertical it pushes link 3 away instead of restoring it. This looks like a
/// derivation slip, but it is the behavior being reproduced; use `CartChain`
/// for the fully coupled equations.
#[derive(Clone, Debug, PartialEq)]
pub struct TriplePendulum {
    pub masses: [Float; 3],
    pub lengths: [Float; 3],
    pub gravity: Float,
}

impl TriplePendulum {
    pub fn new(
        masses: [Float; 3],
        lengths: [Float; 3],
        gravity: Float,
    ) -> Result<Self, SimulationError> {
        for (i, (m, l)) in masses.iter().zip(lengths.iter()).enumerate() {
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
        if !gravity.is_finite() {
            return Err(SimulationError::invalid("gravity must be finite"));
        }

        Ok(TriplePendulum {
            masses,
            lengths,
            gravity,
        })
    }

    #[rustfmt::skip]
    pub fn dynamics(&self, q: &DVector<Float>, u: &DVector<Float>) -> Result<DVector<Float>, SingularMatrixError> {
        let [M1, M2, M3] = self.masses;
        let [L1, L2, _L3] = self.lengths;
        let G = self.gravity;

        let (t1, t2, t3) = (q[0], q[1], q[2]);
        let (w1, w2) = (u[0], u[1]);

        let delta = t2 - t1;
        let (sd, cd) = (delta.sin(), delta.cos());
        let den1 = (M1 + M2) * L1 - M2 * L1 * cd * cd;
        let den2 = (L2 / L1) * den1;

        let delta2 = t3 - t2;
        let (sd2, cd2) = (delta2.sin(), delta2.cos());
        let den3 = (M2 + M3) * L2 - M3 * L2 * cd2 * cd2;

        if [den1, den2, den3].iter().any(|d| !d.is_finite() || d.abs() < Float::EPSILON) {
            return Err(SingularMatrixError::at(q));
        }

        let a1 = (M2 * L1 * w1 * w1 * sd * cd
                + M2 * G * t2.sin() * cd
                + M2 * L2 * w2 * w2 * sd
                - (M1 + M2) * G * t1.sin())
            / den1;

        let a2 = (-M2 * L2 * w2 * w2 * sd * cd
                + (M1 + M2) * G * t1.sin() * cd
                - (M1 + M2) * L1 * w1 * w1 * sd
                - (M1 + M2) * G * t2.sin())
            / den2;

        let a3 = (M3 * L2 * w2 * w2 * sd2 * cd2
                + M3 * G * t3.sin() * cd2
                - (M2 + M3) * G * t2.sin())
            / den3;

        let udot = DVector::from_vec(vec![a1, a2, a3]);
        if udot.iter().all(|x| x.is_finite()) {
            Ok(udot)
        } else {
            Err(SingularMatrixError::at(q))
        }
    }
}

impl Dynamics for TriplePendulum {
    fn dof(&self) -> usize {
        3
    }

    fn accelerations(
        &self,
        _t: Float,
        q: &DVector<Float>,
        u: &DVector<Float>,
    ) -> Result<DVector<Float>, SingularMatrixError> {
        self.dynamics(q, u)
    }
}
