//! Regression solvers for the predictive analytics engine.
//!
//! [`LinearModel`] solves the normal equations directly with Gaussian
//! elimination; the design matrices here are small (a handful of measurement
//! features), so numerical sophistication beyond partial pivoting buys
//! nothing. [`LogisticModel`] fits by batch gradient descent and expects its
//! inputs to be standardized with a [`Scaler`] first.

/// Gradient-descent iteration count used by the analytics engine.
pub const LOGISTIC_ITERATIONS: usize = 500;
/// Gradient-descent learning rate used by the analytics engine.
pub const LOGISTIC_LEARNING_RATE: f64 = 0.1;

/// Ordinary least-squares linear model with an intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    /// One coefficient per feature column, in input order.
    pub coefficients: Vec<f64>,
    /// Coefficient of determination on the training rows.
    pub r_squared: f64,
    /// Root mean squared error on the training rows.
    pub rmse: f64,
}

impl LinearModel {
    /// Fits by solving the normal equations `XᵀX β = Xᵀy`.
    ///
    /// Returns `None` when the row count does not match `y`, there are fewer
    /// rows than parameters, a row has the wrong width, or the system is
    /// singular (collinear or constant features).
    ///
    /// # Examples
    ///
    /// ```
    /// use fissura_stats::regression::LinearModel;
    ///
    /// let rows = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
    /// let y = [3.0, 5.0, 7.0, 9.0];
    /// let model = LinearModel::fit(&rows, &y).unwrap();
    /// assert!((model.intercept - 1.0).abs() < 1e-9);
    /// assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], y: &[f64]) -> Option<Self> {
        let n = rows.len();
        let k = rows.first()?.len();
        if n != y.len() || n < k + 1 || rows.iter().any(|r| r.len() != k) {
            return None;
        }

        // Normal equations over the augmented design [1 | X].
        let p = k + 1;
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, &yi) in rows.iter().zip(y) {
            let augmented = augment(row);
            for i in 0..p {
                xty[i] += augmented[i] * yi;
                for j in 0..p {
                    xtx[i][j] += augmented[i] * augmented[j];
                }
            }
        }
        let beta = solve(&mut xtx, &mut xty)?;

        let mean_y = y.iter().sum::<f64>() / (n as f64);
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (row, &yi) in rows.iter().zip(y) {
            let fitted = beta[0] + dot(&beta[1..], row);
            ss_res += (yi - fitted).powi(2);
            ss_tot += (yi - mean_y).powi(2);
        }
        let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Some(Self {
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
            r_squared,
            rmse: (ss_res / (n as f64)).sqrt(),
        })
    }

    /// Predicted response for one feature row.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept + dot(&self.coefficients, features)
    }
}

/// Binary logistic model fit by batch gradient descent.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticModel {
    /// Fits with `iterations` full-batch gradient steps of size
    /// `learning_rate`. Features should be standardized first.
    ///
    /// Returns `None` on empty input, mismatched lengths, or ragged rows.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[bool],
        iterations: usize,
        learning_rate: f64,
    ) -> Option<Self> {
        let n = rows.len();
        let k = rows.first()?.len();
        if n != labels.len() || rows.iter().any(|r| r.len() != k) {
            return None;
        }

        let mut intercept = 0.0;
        let mut weights = vec![0.0; k];
        let len = n as f64;
        for _ in 0..iterations {
            let mut grad_intercept = 0.0;
            let mut grad = vec![0.0; k];
            for (row, &label) in rows.iter().zip(labels) {
                let target = if label { 1.0 } else { 0.0 };
                let error = sigmoid(intercept + dot(&weights, row)) - target;
                grad_intercept += error;
                for (g, &feature) in grad.iter_mut().zip(row) {
                    *g += error * feature;
                }
            }
            intercept -= learning_rate * grad_intercept / len;
            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= learning_rate * g / len;
            }
        }

        Some(Self {
            intercept,
            coefficients: weights,
        })
    }

    /// Probability of the positive class for one feature row.
    #[must_use]
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.intercept + dot(&self.coefficients, features))
    }

    /// Hard classification at the 0.5 threshold.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> bool {
        self.predict_proba(features) >= 0.5
    }
}

/// Per-column standardization fitted on training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
}

impl Scaler {
    /// Fits means and standard deviations per column. Constant columns get a
    /// unit standard deviation so transforming them centers without dividing
    /// by zero. Returns `None` on empty or ragged input.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fit(rows: &[Vec<f64>]) -> Option<Self> {
        let k = rows.first()?.len();
        if rows.iter().any(|r| r.len() != k) {
            return None;
        }
        let n = rows.len() as f64;
        let mut means = vec![0.0; k];
        for row in rows {
            for (m, &v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let mut std_devs = vec![0.0; k];
        for row in rows {
            for ((s, m), &v) in std_devs.iter_mut().zip(&means).zip(row) {
                *s += (v - *m).powi(2) / n;
            }
        }
        for s in &mut std_devs {
            *s = s.sqrt();
            if *s <= 0.0 {
                *s = 1.0;
            }
        }
        Some(Self { means, std_devs })
    }

    /// Standardizes one row in place-order: `(v - mean) / std_dev`.
    #[must_use]
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.std_devs)
            .map(|((&v, &m), &s)| (v - m) / s)
            .collect()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

fn augment(row: &[f64]) -> Vec<f64> {
    let mut augmented = Vec::with_capacity(row.len() + 1);
    augmented.push(1.0);
    augmented.extend_from_slice(row);
    augmented
}

/// Solves `A x = b` in place by Gaussian elimination with partial pivoting.
/// Returns `None` when a pivot is (numerically) zero.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let p = b.len();
    for col in 0..p {
        let pivot_row = (col..p).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot_row][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..p {
            let factor = a[row][col] / a[col][col];
            for k in col..p {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; p];
    for col in (0..p).rev() {
        let tail: f64 = ((col + 1)..p).map(|k| a[col][k] * x[k]).sum();
        x[col] = (b[col] - tail) / a[col][col];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_fit_recovers_exact_plane() {
        // y = 1 + 2·a - 3·b, noiseless.
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
        ];
        let y: Vec<f64> = rows.iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();
        let model = LinearModel::fit(&rows, &y).unwrap();
        assert!((model.intercept - 1.0).abs() < 1e-9);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients[1] + 3.0).abs() < 1e-9);
        assert!((model.r_squared - 1.0).abs() < 1e-9);
        assert!(model.rmse < 1e-9);
    }

    #[test]
    fn collinear_features_are_rejected() {
        let rows = vec![
            vec![1.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 6.0],
            vec![4.0, 8.0],
        ];
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(LinearModel::fit(&rows, &y), None);
    }

    #[test]
    fn too_few_rows_are_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        assert_eq!(LinearModel::fit(&rows, &[1.0, 2.0]), None);
    }

    #[test]
    fn logistic_separates_a_clean_threshold() {
        let rows: Vec<Vec<f64>> = (-10..=10).map(|i| vec![f64::from(i)]).collect();
        let labels: Vec<bool> = (-10..=10).map(|i| i > 0).collect();
        let scaler = Scaler::fit(&rows).unwrap();
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();
        let model =
            LogisticModel::fit(&scaled, &labels, LOGISTIC_ITERATIONS, LOGISTIC_LEARNING_RATE)
                .unwrap();
        assert!(model.predict(&scaler.transform(&[8.0])));
        assert!(!model.predict(&scaler.transform(&[-8.0])));
        assert!(model.predict_proba(&scaler.transform(&[9.0])) > 0.7);
    }

    #[test]
    fn scaler_guards_constant_columns() {
        let rows = vec![vec![5.0, 1.0], vec![5.0, 2.0], vec![5.0, 3.0]];
        let scaler = Scaler::fit(&rows).unwrap();
        let out = scaler.transform(&[5.0, 2.0]);
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
    }
}
