use nalgebra::*;
use thiserror::Error;

/// Heavy-tailed multivariate Student-t density, evaluated via the Cholesky factor
/// of the (degrees-of-freedom scaled) scale matrix.
pub mod studentt;

pub use studentt::*;

/// Multivariate normal density, which is the limit of the Student-t
/// as the degrees of freedom grow.
pub mod multinormal;

pub use multinormal::*;

/// Default floor added to the diagonal of a scale matrix that
/// could not be decomposed as informed.
pub const MIN_REGULARIZATION : f64 = 1e-7;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DensityError {

    #[error("\"covariances\" must be symmetric positive-definite")]
    InvalidCovariance,

    #[error("Points have {points} columns, but mean vector has {mean} entries")]
    DimensionMismatch { points : usize, mean : usize },

    #[error("Scale matrix must be square (informed {rows}x{cols})")]
    NonSquareScale { rows : usize, cols : usize },

    #[error("Scale matrix has dimension {scale}, but mean vector has {mean} entries")]
    ScaleMismatch { scale : usize, mean : usize },

    #[error("Degrees of freedom must be finite and positive (informed {0})")]
    InvalidFreedom(f64)

}

/// Lower-triangular factor L of a positive-definite scale matrix S = L L^T.
/// Holds the log-determinant of S, which is read from the factor diagonal
/// instead of being evaluated from S directly. Shapes are validated by check_dims
/// before a factor is built.
#[derive(Debug, Clone)]
pub(crate) struct ScaleFactor {

    lower : DMatrix<f64>,

    log_det : f64

}

impl ScaleFactor {

    /// Decomposes the informed scale matrix. If the decomposition fails,
    /// it is attempted a single time more after adding min_reg to the diagonal.
    pub fn new(scale : &DMatrix<f64>, min_reg : f64) -> Result<Self, DensityError> {
        let lower = match lower_factor(scale.clone()) {
            Some(lower) => lower,
            None => {
                tracing::debug!(min_reg, dim = scale.nrows(), "Scale matrix not decomposable; retrying with regularized diagonal");
                let p = scale.nrows();
                let reg = scale + DMatrix::<f64>::identity(p, p).scale(min_reg);
                lower_factor(reg).ok_or(DensityError::InvalidCovariance)?
            }
        };
        let log_det = 2. * lower.diagonal().iter().map(|d| d.ln() ).sum::<f64>();
        Ok(Self { lower, log_det })
    }

    /// Log-determinant of the decomposed matrix (2 * sum(log(diag(L)))).
    pub fn log_det(&self) -> f64 {
        self.log_det
    }

    /// Solves L z_i = (x_i - mu) for each row x_i of x, and returns the squared
    /// norms |z_i|^2 (the Mahalanobis distances of the rows with respect to the decomposed matrix).
    pub fn squared_residuals(&self, x : DMatrixSlice<'_, f64>, mu : &DVector<f64>) -> Result<DVector<f64>, DensityError> {
        let mut centered = x.transpose();
        for mut col in centered.column_iter_mut() {
            col -= mu;
        }
        let z = self.lower.solve_lower_triangular(&centered)
            .ok_or(DensityError::InvalidCovariance)?;
        Ok(DVector::from_iterator(z.ncols(), z.column_iter().map(|c| c.norm_squared() )))
    }

}

/// Cholesky factor of m, if the decomposition yields a factor with a strictly positive
/// and finite diagonal.
fn lower_factor(m : DMatrix<f64>) -> Option<DMatrix<f64>> {
    let lower = Cholesky::new(m)?.unpack();
    if lower.diagonal().iter().all(|d| d.is_finite() && *d > 0.0 ) {
        Some(lower)
    } else {
        None
    }
}

/// Shape checks shared by the density evaluators, run before the scale matrix is decomposed.
fn check_dims(x : &DMatrixSlice<'_, f64>, mu : &DVector<f64>, sigma : &DMatrix<f64>) -> Result<(), DensityError> {
    if !sigma.is_square() {
        return Err(DensityError::NonSquareScale { rows : sigma.nrows(), cols : sigma.ncols() });
    }
    if sigma.nrows() != mu.nrows() {
        return Err(DensityError::ScaleMismatch { scale : sigma.nrows(), mean : mu.nrows() });
    }
    if x.ncols() != mu.nrows() {
        return Err(DensityError::DimensionMismatch { points : x.ncols(), mean : mu.nrows() });
    }
    Ok(())
}

#[test]
fn scale_factor_log_det() {
    let s = DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 3.0]);
    let factor = ScaleFactor::new(&s, MIN_REGULARIZATION).unwrap();
    assert!((factor.log_det() - 8.0f64.ln()).abs() < 1E-12);
    let rebuilt = &factor.lower * factor.lower.transpose();
    assert!((rebuilt - s).abs().max() < 1E-12);
}

#[test]
fn scale_factor_regularizes_singular() {
    // Positive semi-definite, but singular.
    let s = DMatrix::from_row_slice(2, 2, &[2.0, 2.0, 2.0, 2.0]);
    let factor = ScaleFactor::new(&s, MIN_REGULARIZATION).unwrap();
    assert!(factor.log_det().is_finite());
    assert!(factor.lower.diagonal().iter().all(|d| *d > 0.0 ));
}

#[test]
fn scale_factor_rejects_indefinite() {
    let s = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
    assert_eq!(ScaleFactor::new(&s, MIN_REGULARIZATION).unwrap_err(), DensityError::InvalidCovariance);
    let zero = DMatrix::zeros(3, 3);
    assert!(ScaleFactor::new(&zero, MIN_REGULARIZATION).is_ok());
}

#[test]
fn squared_residuals_identity() {
    let s = DMatrix::identity(2, 2);
    let factor = ScaleFactor::new(&s, MIN_REGULARIZATION).unwrap();
    let x = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 3.0, 4.0]);
    let mu = DVector::from_column_slice(&[0.0, 0.0]);
    let sq = factor.squared_residuals(x.slice((0, 0), x.shape()), &mu).unwrap();
    assert!((sq[0] - 2.0).abs() < 1E-12);
    assert!((sq[1] - 25.0).abs() < 1E-12);
}
