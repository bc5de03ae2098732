/// Log-density evaluators for the multivariate Student-t and normal distributions, built on
/// the Cholesky factor of the scale matrix (with a single regularized retry for near-singular scales).
pub mod distr;

/// Raw input arrays, shape-validated training sets and their partition by class label;
/// CSV loading of tables.
pub mod sample;

/// Generative classifier (Gaussian discriminant analysis) estimating per-class priors,
/// means and covariances by maximum likelihood.
pub mod fit;
