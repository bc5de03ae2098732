use nalgebra::*;
use super::*;
use special::Gamma;
use std::f64::consts::PI;

fn ln_gamma(x : f64) -> f64 {
    Gamma::ln_gamma(x).0
}

/// Evaluates the log-density of a multivariate Student-t distribution with location mu (p),
/// scale matrix sigma (p x p) and nu degrees of freedom at each row of x (n x p).
///
/// The evaluation never inverts sigma, nor takes its determinant directly: the Cholesky
/// factor L of (nu * sigma) gives both the log-determinant (2 * sum(log(diag(L)))) and the scaled
/// Mahalanobis distances |z_i|^2, where L z_i = x_i - mu. If (nu * sigma) cannot be decomposed, the
/// decomposition is attempted again with min_reg added to its diagonal. If that fails as well,
/// DensityError::InvalidCovariance is returned.
///
/// log p(x_i) = lgamma((nu + p)/2) - lgamma(nu/2) - (p/2) log(nu pi) - (1/2) log|sigma|
///     - ((nu + p)/2) log(1 + |z_i|^2)
///
/// The terms are combined with these signs rather than as -norm - inner - log|nu sigma|,
/// which is not a normalized density and does not converge to the normal as nu grows.
pub fn log_multivariate_t_pdf(
    x : DMatrixSlice<'_, f64>,
    mu : &DVector<f64>,
    sigma : &DMatrix<f64>,
    nu : f64,
    min_reg : f64
) -> Result<DVector<f64>, DensityError> {
    check_dims(&x, mu, sigma)?;
    if !nu.is_finite() || nu <= 0.0 {
        return Err(DensityError::InvalidFreedom(nu));
    }
    let p = mu.nrows() as f64;
    let covar_chol = ScaleFactor::new(&sigma.scale(nu), min_reg)?;
    let covar_log_det = covar_chol.log_det();
    let covar_solve = covar_chol.squared_residuals(x, mu)?;
    let norm = ln_gamma((nu + p) / 2.) - ln_gamma(nu / 2.) - 0.5 * p * (nu * PI).ln();

    // log|nu sigma| = p log(nu) + log|sigma|
    let half_log_det = 0.5 * (covar_log_det - p * nu.ln());
    Ok(covar_solve.map(|sq| {
        let inner = -(nu + p) * 0.5 * sq.ln_1p();
        norm + inner - half_log_det
    }))
}

/// Multivariate Student-t density at each row of x. Points far into the tails
/// might underflow to zero.
pub fn multivariate_t_pdf(
    x : DMatrixSlice<'_, f64>,
    mu : &DVector<f64>,
    sigma : &DMatrix<f64>,
    nu : f64
) -> Result<DVector<f64>, DensityError> {
    let log_p = log_multivariate_t_pdf(x, mu, sigma, nu, MIN_REGULARIZATION)?;
    Ok(log_p.map(|lp| lp.exp() ))
}
