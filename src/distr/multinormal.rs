use nalgebra::*;
use super::*;
use std::f64::consts::PI;

/// Log-density of the multivariate normal N(mu; sigma) at each row of x, evaluated
/// through the Cholesky factor of sigma (with the same regularized retry as the Student-t).
pub fn log_multinormal_pdf(
    x : DMatrixSlice<'_, f64>,
    mu : &DVector<f64>,
    sigma : &DMatrix<f64>,
    min_reg : f64
) -> Result<DVector<f64>, DensityError> {
    check_dims(&x, mu, sigma)?;
    let p = mu.nrows() as f64;
    let sigma_chol = ScaleFactor::new(sigma, min_reg)?;
    let mahalanobis = sigma_chol.squared_residuals(x, mu)?;
    let log_part = -0.5 * p * (2. * PI).ln() - 0.5 * sigma_chol.log_det();
    Ok(mahalanobis.map(|m| log_part - 0.5 * m ))
}

pub fn multinormal_pdf(
    x : DMatrixSlice<'_, f64>,
    mu : &DVector<f64>,
    sigma : &DMatrix<f64>
) -> Result<DVector<f64>, DensityError> {
    let log_p = log_multinormal_pdf(x, mu, sigma, MIN_REGULARIZATION)?;
    Ok(log_p.map(|lp| lp.exp() ))
}
