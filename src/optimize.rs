//! Bounded Levenberg-Marquardt least squares fitting of peak shape models.
//!
//! The solver always terminates within its iteration budget and reports how it ended
//! with a [`FitStatus`]. Callers decide what to do with anything but
//! [`FitStatus::Converged`].
use nalgebra::{DMatrix, DVector};

use crate::shape::{PeakShapeKind, PeakShapeModel, Sech2PeakShape, ShapeModel};

/// How a least squares fit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    /// The step size fell below tolerance, or no step could reduce the cost any further
    Converged,
    /// The iteration budget ran out first
    IterationLimitReached,
    /// The normal equations could not be solved
    Degenerate,
}

/// The outcome of a least squares fit
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFitResult {
    /// The best parameters seen
    pub params: DVector<f64>,
    /// Half the sum of squared residuals at `params`
    pub loss: f64,
    pub iterations: usize,
    pub status: FitStatus,
}

impl ModelFitResult {
    pub fn converged(&self) -> bool {
        self.status == FitStatus::Converged
    }
}

/// A nonlinear least squares problem over a dense parameter vector
pub trait LeastSquaresProblem {
    /// Model minus observation, one entry per data point or penalty term
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// The derivative of each residual with respect to each parameter
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;

    /// Move `params` back into the feasible region
    fn project(&self, _params: &mut DVector<f64>) {}
}

/// Hyperparameters for [`LevenbergMarquardt`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardt {
    pub max_iter: usize,
    /// Converged when every step component is below `eps_abs + eps_rel * |param|`
    pub eps_abs: f64,
    pub eps_rel: f64,
    /// The initial damping factor
    pub damping: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iter: 100,
            eps_abs: 1e-5,
            eps_rel: 1e-5,
            damping: 1e-3,
        }
    }
}

const MAX_DAMPING_ATTEMPTS: usize = 10;

fn half_squared_norm(v: &DVector<f64>) -> f64 {
    v.norm_squared() / 2.0
}

impl LevenbergMarquardt {
    pub fn new(max_iter: usize, eps_abs: f64, eps_rel: f64) -> Self {
        Self {
            max_iter,
            eps_abs,
            eps_rel,
            ..Default::default()
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Solve `(JᵀJ + μ·diag(JᵀJ)) δ = -Jᵀr`
    fn step(jtj: &DMatrix<f64>, gradient: &DVector<f64>, mu: f64) -> Option<DVector<f64>> {
        let mut a = jtj.clone();
        for i in 0..a.nrows() {
            a[(i, i)] += mu * jtj[(i, i)].max(1e-12);
        }
        let rhs = -gradient;
        let delta = match a.clone().cholesky() {
            Some(decomp) => Some(decomp.solve(&rhs)),
            None => a.lu().solve(&rhs),
        };
        delta.filter(|d| d.iter().all(|v| v.is_finite()))
    }

    pub fn minimize<P: LeastSquaresProblem>(&self, problem: &P, initial: DVector<f64>) -> ModelFitResult {
        let mut params = initial;
        problem.project(&mut params);
        let mut residuals = problem.residuals(&params);
        let mut loss = half_squared_norm(&residuals);
        let mut mu = self.damping;

        if !loss.is_finite() {
            return ModelFitResult {
                params,
                loss,
                iterations: 0,
                status: FitStatus::Degenerate,
            };
        }

        for it in 1..=self.max_iter {
            let jac = problem.jacobian(&params);
            let jac_t = jac.transpose();
            let jtj = &jac_t * &jac;
            let gradient = &jac_t * &residuals;
            if jtj.iter().any(|v| !v.is_finite()) || jtj.diagonal().iter().any(|v| *v <= 0.0) {
                log::trace!("{it}: A parameter has no influence on the residuals");
                return ModelFitResult {
                    params,
                    loss,
                    iterations: it,
                    status: FitStatus::Degenerate,
                };
            }

            let mut improved = false;
            for _ in 0..MAX_DAMPING_ATTEMPTS {
                let delta = match Self::step(&jtj, &gradient, mu) {
                    Some(delta) => delta,
                    None => {
                        log::trace!("{it}: Normal equations are singular");
                        return ModelFitResult {
                            params,
                            loss,
                            iterations: it,
                            status: FitStatus::Degenerate,
                        };
                    }
                };
                let mut candidate = &params + &delta;
                problem.project(&mut candidate);
                let candidate_residuals = problem.residuals(&candidate);
                let candidate_loss = half_squared_norm(&candidate_residuals);
                if !candidate_loss.is_finite() || candidate_loss >= loss {
                    mu *= 10.0;
                    continue;
                }

                let small_step = candidate
                    .iter()
                    .zip(params.iter())
                    .all(|(new, old)| (new - old).abs() < self.eps_abs + self.eps_rel * new.abs());
                log::trace!("{it}: Loss {loss:0.6} -> {candidate_loss:0.6}, damping {mu:0.3e}");
                params = candidate;
                residuals = candidate_residuals;
                loss = candidate_loss;
                mu = (mu / 10.0).max(1e-12);
                improved = true;

                if small_step {
                    return ModelFitResult {
                        params,
                        loss,
                        iterations: it,
                        status: FitStatus::Converged,
                    };
                }
                break;
            }
            if !improved {
                log::trace!("{it}: No step reduced the loss, stopping at {loss:0.6}");
                return ModelFitResult {
                    params,
                    loss,
                    iterations: it,
                    status: FitStatus::Converged,
                };
            }
        }
        ModelFitResult {
            params,
            loss,
            iterations: self.max_iter,
            status: FitStatus::IterationLimitReached,
        }
    }
}

/// A single shape's density at `x`, followed by its partial derivatives with
/// respect to height, width and position
#[inline]
fn shape_derivatives(kind: PeakShapeKind, height: f64, width: f64, position: f64, x: f64) -> (f64, f64, f64, f64) {
    let dx = x - position;
    let z = width * dx;
    match kind {
        PeakShapeKind::Sech2 => {
            let (s, t) = Sech2PeakShape::sech2_tanh(z);
            let value = height * s;
            (value, s, -2.0 * height * s * t * dx, 2.0 * height * s * t * width)
        }
        PeakShapeKind::Lorentzian => {
            let q = 1.0 / (1.0 + z * z);
            let value = height * q;
            let dz = -2.0 * height * z * q * q;
            (value, q, dz * dx, -dz * width)
        }
    }
}

/// The summed intensity of `models` at `x`
#[inline]
pub fn summed_density(models: &[ShapeModel], x: f64) -> f64 {
    models.iter().map(|m| m.density(x)).sum()
}

/// Penalty weights pulling parameters back towards their starting values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Penalties {
    pub position: f64,
    pub left_width: f64,
    pub right_width: f64,
}

/// Several peaks of one shape kind sharing left and right width parameters, fit
/// jointly to one stretch of signal.
///
/// The parameter vector is `[λₗ, λᵣ, h₁, x₁, h₂, x₂, …]`.
#[derive(Debug, Clone)]
pub struct MultiPeakProblem {
    pub kind: PeakShapeKind,
    pub mz_array: Vec<f64>,
    pub intensity_array: Vec<f64>,
    pub n_peaks: usize,
    pub penalties: Penalties,
    /// The starting parameters the penalty terms are measured against
    pub reference: DVector<f64>,
}

impl MultiPeakProblem {
    pub fn new(
        kind: PeakShapeKind,
        mz_array: Vec<f64>,
        intensity_array: Vec<f64>,
        reference: DVector<f64>,
        penalties: Penalties,
    ) -> Self {
        let n_peaks = reference.len().saturating_sub(2) / 2;
        Self {
            kind,
            mz_array,
            intensity_array,
            n_peaks,
            penalties,
            reference,
        }
    }

    pub fn n_params(&self) -> usize {
        2 + 2 * self.n_peaks
    }

    fn penalty_rows(&self) -> usize {
        let mut rows = 0;
        if self.penalties.position > 0.0 {
            rows += self.n_peaks;
        }
        if self.penalties.left_width > 0.0 {
            rows += 1;
        }
        if self.penalties.right_width > 0.0 {
            rows += 1;
        }
        rows
    }

    /// The individual peak models encoded in `params`
    pub fn models(&self, params: &DVector<f64>) -> Vec<ShapeModel> {
        (0..self.n_peaks)
            .map(|i| {
                ShapeModel::from_kind(
                    self.kind,
                    params[2 + 2 * i],
                    params[3 + 2 * i],
                    params[0],
                    params[1],
                )
            })
            .collect()
    }
}

impl LeastSquaresProblem for MultiPeakProblem {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let n = self.mz_array.len();
        let mut out = DVector::zeros(n + self.penalty_rows());
        let models = self.models(params);
        for (row, (x, y)) in self.mz_array.iter().zip(self.intensity_array.iter()).enumerate() {
            out[row] = summed_density(&models, *x) - y;
        }
        let mut row = n;
        if self.penalties.position > 0.0 {
            for i in 0..self.n_peaks {
                out[row] = self.penalties.position * (params[3 + 2 * i] - self.reference[3 + 2 * i]);
                row += 1;
            }
        }
        if self.penalties.left_width > 0.0 {
            out[row] = self.penalties.left_width * (params[0] - self.reference[0]);
            row += 1;
        }
        if self.penalties.right_width > 0.0 {
            out[row] = self.penalties.right_width * (params[1] - self.reference[1]);
        }
        out
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let n = self.mz_array.len();
        let mut jac = DMatrix::zeros(n + self.penalty_rows(), self.n_params());
        for (row, x) in self.mz_array.iter().enumerate() {
            for i in 0..self.n_peaks {
                let (height, position) = (params[2 + 2 * i], params[3 + 2 * i]);
                let left = *x <= position;
                let width = if left { params[0] } else { params[1] };
                let (_, d_height, d_width, d_position) =
                    shape_derivatives(self.kind, height, width, position, *x);
                jac[(row, if left { 0 } else { 1 })] += d_width;
                jac[(row, 2 + 2 * i)] = d_height;
                jac[(row, 3 + 2 * i)] = d_position;
            }
        }
        let mut row = n;
        if self.penalties.position > 0.0 {
            for i in 0..self.n_peaks {
                jac[(row, 3 + 2 * i)] = self.penalties.position;
                row += 1;
            }
        }
        if self.penalties.left_width > 0.0 {
            jac[(row, 0)] = self.penalties.left_width;
            row += 1;
        }
        if self.penalties.right_width > 0.0 {
            jac[(row, 1)] = self.penalties.right_width;
        }
        jac
    }

    fn project(&self, params: &mut DVector<f64>) {
        params[0] = params[0].max(1e-6);
        params[1] = params[1].max(1e-6);
        for i in 0..self.n_peaks {
            params[2 + 2 * i] = params[2 + 2 * i].max(0.0);
        }
    }
}

/// One peak with its own height, widths and position, fit to its raw samples.
///
/// The parameter vector is `[h, λₗ, λᵣ, x₀]`.
#[derive(Debug, Clone)]
pub struct SingleShapeProblem<'a> {
    pub kind: PeakShapeKind,
    pub mz_array: &'a [f64],
    pub intensity_array: &'a [f32],
    pub penalties: Penalties,
    pub reference: DVector<f64>,
}

impl<'a> SingleShapeProblem<'a> {
    pub fn new(model: &ShapeModel, mz_array: &'a [f64], intensity_array: &'a [f32], penalties: Penalties) -> Self {
        Self {
            kind: model.kind(),
            mz_array,
            intensity_array,
            penalties,
            reference: Self::encode(model),
        }
    }

    pub fn encode(model: &ShapeModel) -> DVector<f64> {
        DVector::from_vec(vec![
            model.height(),
            model.left_width(),
            model.right_width(),
            model.position(),
        ])
    }

    pub fn decode(&self, params: &DVector<f64>) -> ShapeModel {
        ShapeModel::from_kind(self.kind, params[0], params[3], params[1], params[2])
    }

    const PENALTY_ROWS: usize = 3;
}

impl<'a> LeastSquaresProblem for SingleShapeProblem<'a> {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let n = self.mz_array.len();
        let model = self.decode(params);
        let mut out = DVector::zeros(n + Self::PENALTY_ROWS);
        for (row, (x, y)) in self.mz_array.iter().zip(self.intensity_array.iter()).enumerate() {
            out[row] = model.density(*x) - *y as f64;
        }
        out[n] = self.penalties.position * (params[3] - self.reference[3]);
        out[n + 1] = self.penalties.left_width * (params[1] - self.reference[1]);
        out[n + 2] = self.penalties.right_width * (params[2] - self.reference[2]);
        out
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let n = self.mz_array.len();
        let mut jac = DMatrix::zeros(n + Self::PENALTY_ROWS, 4);
        let (height, position) = (params[0], params[3]);
        for (row, x) in self.mz_array.iter().enumerate() {
            let left = *x <= position;
            let width = if left { params[1] } else { params[2] };
            let (_, d_height, d_width, d_position) =
                shape_derivatives(self.kind, height, width, position, *x);
            jac[(row, 0)] = d_height;
            jac[(row, if left { 1 } else { 2 })] = d_width;
            jac[(row, 3)] = d_position;
        }
        jac[(n, 3)] = self.penalties.position;
        jac[(n + 1, 1)] = self.penalties.left_width;
        jac[(n + 2, 2)] = self.penalties.right_width;
        jac
    }

    fn project(&self, params: &mut DVector<f64>) {
        params[0] = params[0].max(0.0);
        params[1] = params[1].max(1e-6);
        params[2] = params[2].max(1e-6);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shape::LorentzianPeakShape;
    use crate::test_data::{grid, sech2_signal, SECH2_HWHM};
    use nalgebra::dvector;

    /// Fit `y = a·exp(b·x)`
    struct Exponential {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Exponential {
        fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x
                    .iter()
                    .zip(self.y.iter())
                    .map(|(x, y)| params[0] * (params[1] * x).exp() - y),
            )
        }

        fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_fn(self.x.len(), 2, |i, j| {
                let e = (params[1] * self.x[i]).exp();
                if j == 0 {
                    e
                } else {
                    params[0] * self.x[i] * e
                }
            })
        }
    }

    #[test_log::test]
    fn test_exponential() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|x| 3.0 * (0.5 * x).exp()).collect();
        let problem = Exponential { x, y };
        let result = LevenbergMarquardt::new(100, 1e-10, 1e-10).minimize(&problem, dvector![1.0, 0.1]);
        assert!(result.converged(), "{result:?}");
        assert!((result.params[0] - 3.0).abs() < 1e-6);
        assert!((result.params[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_iteration_limit() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|x| 3.0 * (0.5 * x).exp()).collect();
        let problem = Exponential { x, y };
        let result = LevenbergMarquardt::new(1, 1e-12, 1e-12).minimize(&problem, dvector![1.0, 0.1]);
        assert_eq!(result.status, FitStatus::IterationLimitReached);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_degenerate() {
        // The second parameter never influences the residuals
        struct Flat;
        impl LeastSquaresProblem for Flat {
            fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
                dvector![params[0] - 1.0]
            }
            fn jacobian(&self, _params: &DVector<f64>) -> DMatrix<f64> {
                DMatrix::from_row_slice(1, 2, &[0.0, 0.0])
            }
        }
        let result = LevenbergMarquardt::default().minimize(&Flat, dvector![0.0, 0.0]);
        assert_eq!(result.status, FitStatus::Degenerate);
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let mz = grid(499.6, 500.6, 0.01);
        let intensity: Vec<f64> = sech2_signal(&mz, &[(500.0, 1000.0), (500.2, 800.0)], 0.3)
            .into_iter()
            .map(|y| y as f64)
            .collect();
        for kind in [PeakShapeKind::Sech2, PeakShapeKind::Lorentzian] {
            let params = dvector![6.0, 5.0, 900.0, 500.033, 700.0, 500.187];
            let problem = MultiPeakProblem::new(
                kind,
                mz.clone(),
                intensity.clone(),
                params.clone(),
                Penalties { position: 1.0, left_width: 2.0, right_width: 0.0 },
            );
            let jac = problem.jacobian(&params);
            for j in 0..params.len() {
                let h = 1e-7 * params[j].abs().max(1.0);
                let mut up = params.clone();
                up[j] += h;
                let mut down = params.clone();
                down[j] -= h;
                let numeric = (problem.residuals(&up) - problem.residuals(&down)) / (2.0 * h);
                for i in 0..numeric.len() {
                    let tol = 1e-4 * numeric[i].abs().max(1.0);
                    assert!(
                        (jac[(i, j)] - numeric[i]).abs() < tol.max(1e-2),
                        "{kind} row {i} col {j}: {} vs {}",
                        jac[(i, j)],
                        numeric[i]
                    );
                }
            }
        }
    }

    #[test]
    fn test_summed_density_matches_residuals() {
        let mz = grid(499.6, 500.6, 0.01);
        let intensity: Vec<f64> = sech2_signal(&mz, &[(500.0, 1000.0), (500.2, 800.0)], 0.3)
            .into_iter()
            .map(|y| y as f64)
            .collect();
        let params = dvector![6.0, 5.0, 900.0, 500.033, 700.0, 500.187];
        let problem = MultiPeakProblem::new(
            PeakShapeKind::Sech2,
            mz.clone(),
            intensity.clone(),
            params.clone(),
            Penalties::default(),
        );
        let models = problem.models(&params);
        assert_eq!(models.len(), 2);
        let residuals = problem.residuals(&params);
        assert_eq!(residuals.len(), mz.len());
        for (i, (x, y)) in mz.iter().zip(intensity.iter()).enumerate() {
            let expected = models[0].density(*x) + models[1].density(*x);
            assert!((summed_density(&models, *x) - expected).abs() < 1e-9);
            assert!((residuals[i] - (expected - y)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_shape_refinement() {
        let mz = grid(499.7, 500.3, 0.005);
        let intensity = sech2_signal(&mz, &[(500.0, 1000.0)], 0.2);
        let lambda = 2.0 * SECH2_HWHM / 0.2;
        let start: ShapeModel = Sech2PeakShape::new(900.0, 500.01, lambda * 1.2, lambda * 0.9).into();
        let problem = SingleShapeProblem::new(&start, &mz, &intensity, Penalties::default());
        let result = LevenbergMarquardt::new(400, 1e-8, 1e-8).minimize(&problem, SingleShapeProblem::encode(&start));
        assert!(result.converged());
        let fitted = problem.decode(&result.params);
        assert!((fitted.height() - 1000.0).abs() < 0.1);
        assert!((fitted.position() - 500.0).abs() < 1e-5);
        assert!((fitted.full_width_at_half_max() - 0.2).abs() < 1e-4);

        let lorentzian: ShapeModel = LorentzianPeakShape::new(1.0, 2.0, 3.0, 4.0).into();
        let encoded = SingleShapeProblem::encode(&lorentzian);
        let problem = SingleShapeProblem::new(&lorentzian, &mz, &intensity, Penalties::default());
        assert_eq!(problem.decode(&encoded), lorentzian);
    }
}
