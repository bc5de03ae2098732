use serde::{Serialize, Deserialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use crate::sample::InvalidInput;

/// Generative classifier that estimates one distribution per class from
/// partitioned training data.
pub mod discriminant;

pub use discriminant::*;

/// Strategies available to estimate class parameters. Only maximum likelihood
/// is realized. The remaining strategies (MAP estimate with conjugate priors,
/// posterior mean point estimates and fully Bayesian fitting) are recognized
/// configuration values, but fitting with them computes no estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitMethod {
    MLE,
    MAP,
    Mean,
    Bayes
}

impl FitMethod {

    /// Whether fitting with this method actually computes estimates.
    pub fn is_realized(&self) -> bool {
        matches!(self, FitMethod::MLE)
    }

}

impl Default for FitMethod {

    fn default() -> Self {
        FitMethod::MLE
    }

}

impl FromStr for FitMethod {

    type Err = InvalidInput;

    fn from_str(s : &str) -> Result<Self, InvalidInput> {
        match s {
            "MLE" => Ok(FitMethod::MLE),
            "MAP" => Ok(FitMethod::MAP),
            "Mean" => Ok(FitMethod::Mean),
            "Bayes" => Ok(FitMethod::Bayes),
            other => Err(InvalidInput::UnknownMethod(other.to_string()))
        }
    }

}

impl Display for FitMethod {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMethod::MLE => write!(f, "MLE"),
            FitMethod::MAP => write!(f, "MAP"),
            FitMethod::Mean => write!(f, "Mean"),
            FitMethod::Bayes => write!(f, "Bayes")
        }
    }

}

/// Per-call fit settings. Increasing alpha, nu or k adds weight to the prior belief
/// of the Bayesian strategies. All of them are ignored by maximum likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {

    /// Overrides the configured fit method when set.
    pub method : Option<FitMethod>,

    /// Dirichlet prior Dir(alpha) over class probabilities.
    pub alpha : f64,

    /// Covariance pseudo-observations (p + nu).
    pub nu : f64,

    /// Mean pseudo-observations.
    pub k : f64

}

impl Default for FitOptions {

    fn default() -> Self {
        Self { method : None, alpha : 1.0, nu : 2.0, k : 1e-3 }
    }

}

impl FitOptions {

    pub fn with_method(method : FitMethod) -> Self {
        Self { method : Some(method), ..Default::default() }
    }

}

/// Outcome of a fit call that passed input validation. The status code
/// is zero for both variants: selecting a method without an implementation is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {

    /// Estimates were computed with the informed method.
    Fitted(FitMethod),

    /// Class bookkeeping was updated, but the method has no implementation and no
    /// estimates were computed.
    Skipped(FitMethod)

}

impl FitStatus {

    pub fn code(&self) -> i32 {
        0
    }

    pub fn method(&self) -> FitMethod {
        match self {
            FitStatus::Fitted(m) | FitStatus::Skipped(m) => *m
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, FitStatus::Fitted(_))
    }

}

#[test]
fn fit_method_choices() {
    for name in ["MLE", "MAP", "Mean", "Bayes"].iter() {
        let method : FitMethod = name.parse().unwrap();
        assert_eq!(&method.to_string(), name);
    }
    assert_eq!("mle".parse::<FitMethod>(), Err(InvalidInput::UnknownMethod("mle".to_string())));
    assert!(FitMethod::MLE.is_realized());
    assert!(!FitMethod::Bayes.is_realized());
}

#[test]
fn fit_options_defaults() {
    let opts = FitOptions::default();
    assert_eq!(opts.method, None);
    assert_eq!((opts.alpha, opts.nu, opts.k), (1.0, 2.0, 1e-3));
    assert_eq!(FitOptions::with_method(FitMethod::MAP).method, Some(FitMethod::MAP));
}
