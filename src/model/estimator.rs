//! Binary classifiers behind a small trait, persisted as a tagged enum.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ForecastError;

pub trait Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ForecastError>;

    /// Probability of the positive class for one encoded row.
    fn predict_proba(&self, row: ArrayView1<f64>) -> f64;

    fn n_features(&self) -> usize;
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// L2-regularized logistic regression fitted by batch gradient descent.
///
/// Weights start at zero, so fitting is deterministic for a given input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    learning_rate: f64,
    max_iter: usize,
    l2: f64,
    tolerance: f64,
    weights: Array1<f64>,
    bias: f64,
    iterations: usize,
}

impl LogisticRegression {
    pub fn new(learning_rate: f64, max_iter: usize, l2: f64) -> Self {
        Self {
            learning_rate,
            max_iter,
            l2,
            tolerance: 1e-7,
            weights: Array1::zeros(0),
            bias: 0.0,
            iterations: 0,
        }
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn log_loss(y: &Array1<f64>, p: &Array1<f64>) -> f64 {
        let eps = 1e-15;
        -y.iter()
            .zip(p.iter())
            .map(|(&y, &p)| {
                let p = p.clamp(eps, 1.0 - eps);
                y * p.ln() + (1.0 - y) * (1.0 - p).ln()
            })
            .sum::<f64>()
            / y.len() as f64
    }
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ForecastError> {
        if x.nrows() == 0 {
            return Err(ForecastError::InsufficientTrainingData("no training rows".into()));
        }
        if x.nrows() != y.len() {
            return Err(ForecastError::Internal(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let n = x.nrows() as f64;
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        let mut previous = f64::INFINITY;
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let p = (x.dot(&weights) + bias).mapv(sigmoid);
            let errors = &p - y;
            let dw = x.t().dot(&errors) / n + &weights * self.l2;
            let db = errors.sum() / n;

            weights = weights - dw * self.learning_rate;
            bias -= self.learning_rate * db;

            let loss = Self::log_loss(y, &p);
            if (previous - loss).abs() < self.tolerance {
                break;
            }
            previous = loss;
        }

        debug!(iterations, loss = previous, "Fitted logistic regression");
        self.weights = weights;
        self.bias = bias;
        self.iterations = iterations;
        Ok(())
    }

    fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        sigmoid(row.dot(&self.weights) + self.bias)
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }
}

/// Every estimator kind an artifact can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedEstimator {
    LogisticRegression(LogisticRegression),
}

impl TrainedEstimator {
    fn inner(&self) -> &dyn Estimator {
        match self {
            Self::LogisticRegression(m) => m,
        }
    }

    pub fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        self.inner().predict_proba(row)
    }

    pub fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![[-2.0, 0.1], [-1.5, 0.0], [-1.0, -0.2], [1.0, 0.1], [1.5, 0.0], [2.0, -0.1]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_learns_separable_data() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(0.5, 500, 0.0);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.n_features(), 2);
        assert!(model.predict_proba(x.row(0)) < 0.5);
        assert!(model.predict_proba(x.row(5)) > 0.5);
        assert!(model.weights()[0] > 0.0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable();
        let mut a = LogisticRegression::new(0.1, 100, 0.01);
        let mut b = LogisticRegression::new(0.1, 100, 0.01);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_l2_shrinks_weights() {
        let (x, y) = separable();
        let mut free = LogisticRegression::new(0.5, 300, 0.0);
        let mut shrunk = LogisticRegression::new(0.5, 300, 1.0);
        free.fit(&x, &y).unwrap();
        shrunk.fit(&x, &y).unwrap();
        assert!(shrunk.weights()[0].abs() < free.weights()[0].abs());
    }

    #[test]
    fn test_rejects_empty_and_misaligned_input() {
        let mut model = LogisticRegression::new(0.1, 10, 0.0);
        assert!(matches!(
            model.fit(&Array2::zeros((0, 3)), &Array1::zeros(0)),
            Err(ForecastError::InsufficientTrainingData(_))
        ));
        assert!(model.fit(&Array2::zeros((2, 3)), &Array1::zeros(3)).is_err());
    }

    #[test]
    fn test_tagged_serialization() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(0.1, 50, 0.0);
        model.fit(&x, &y).unwrap();
        let trained = TrainedEstimator::LogisticRegression(model);
        let json = serde_json::to_value(&trained).unwrap();
        assert_eq!(json["kind"], "logistic_regression");
        let back: TrainedEstimator = serde_json::from_value(json).unwrap();
        assert_eq!(back.n_features(), 2);
    }
}
