use nalgebra::*;
use super::*;
use crate::sample::{Array, ClassPartition, TrainingSet};
use serde::{Serialize, Deserialize};
use serde_json::{Value, map::Map};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt::{self, Debug, Display};

/// Construction-time configuration of the discriminant analysis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscriminantConfig {

    pub fit_method : FitMethod,

    /// Force class covariances to be diagonal (off-diagonal entries set to zero).
    pub diag_cov : bool

}

/// Parameters estimated for a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassParams {

    /// Number of training rows with this label.
    pub count : usize,

    /// count / n_samples
    pub prior : f64,

    /// Mean feature vector (n_features).
    pub mean : DVector<f64>,

    /// Biased (divide-by-count) covariance matrix (n_features x n_features).
    pub cov : DMatrix<f64>

}

/// Per-class parameters produced by a realized fit method.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel<L> {

    method : FitMethod,

    diag_cov : bool,

    params : BTreeMap<L, ClassParams>

}

impl<L> FittedModel<L>
where
    L : Ord
{

    pub fn method(&self) -> FitMethod {
        self.method
    }

    pub fn diag_cov(&self) -> bool {
        self.diag_cov
    }

    pub fn get(&self, label : &L) -> Option<&ClassParams> {
        self.params.get(label)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, L, ClassParams> {
        self.params.iter()
    }

    pub fn n_categories(&self) -> usize {
        self.params.len()
    }

    pub fn n_features(&self) -> usize {
        self.params.values().next().map(|p| p.mean.nrows() ).unwrap_or(0)
    }

}

impl<L> Display for FittedModel<L>
where
    L : Ord
{

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GDA({}; {} classes; {} features)", self.method, self.n_categories(), self.n_features())
    }

}

/// Gaussian discriminant analysis: a generative classifier holding one prior, mean vector and
/// covariance matrix per class label.
///
/// Fitting partitions the training rows by label and computes the closed-form maximum likelihood
/// estimates of each class. Only FitMethod::MLE computes estimates. For the other strategies, fit
/// updates the class bookkeeping (classes and their counts), leaves the estimates unset
/// and still returns successfully.
///
/// Fitting takes &mut self; sharing an instance across threads requires external synchronization.
#[derive(Debug, Clone)]
pub struct DiscriminantAnalysis<L> {

    config : DiscriminantConfig,

    n_samples : Option<usize>,

    n_features : Option<usize>,

    class_counts : Option<BTreeMap<L, usize>>,

    model : Option<FittedModel<L>>

}

impl<L> Default for DiscriminantAnalysis<L> {

    fn default() -> Self {
        Self::new(DiscriminantConfig::default())
    }

}

impl<L> DiscriminantAnalysis<L> {

    pub fn new(config : DiscriminantConfig) -> Self {
        Self { config, n_samples : None, n_features : None, class_counts : None, model : None }
    }

    pub fn config(&self) -> &DiscriminantConfig {
        &self.config
    }

}

impl<L> DiscriminantAnalysis<L>
where
    L : Ord + Clone + Debug
{

    /// Fits the model with the configured method and default hyperparameters.
    pub fn fit<X, Y>(&mut self, x : X, y : Y) -> Result<FitStatus, InvalidInput>
    where
        X : Into<Array<f64>>,
        Y : Into<Array<L>>
    {
        self.fit_with(x, y, &FitOptions::default())
    }

    /// Validates x (n_samples x n_features) and y (n_samples), and estimates the class
    /// parameters with opts.method (or the configured method, if the override is not set). No state is
    /// changed if validation fails. Any previous estimates are discarded once validation succeeds.
    pub fn fit_with<X, Y>(&mut self, x : X, y : Y, opts : &FitOptions) -> Result<FitStatus, InvalidInput>
    where
        X : Into<Array<f64>>,
        Y : Into<Array<L>>
    {
        let data = TrainingSet::new(x.into(), y.into())?;
        let partition = data.partition();
        self.n_samples = Some(data.n_samples());
        self.n_features = Some(data.n_features());
        self.class_counts = Some(data.class_counts());
        self.model = None;

        let method = opts.method.unwrap_or(self.config.fit_method);
        match method {
            FitMethod::MLE => {
                let model = self.fit_likelihood(&partition, data.n_samples());
                tracing::debug!(
                    n_samples = data.n_samples(),
                    n_features = data.n_features(),
                    n_categories = model.n_categories(),
                    diag_cov = self.config.diag_cov,
                    "Fitted discriminant model via maximum likelihood"
                );
                self.model = Some(model);
                Ok(FitStatus::Fitted(method))
            },
            FitMethod::MAP | FitMethod::Mean | FitMethod::Bayes => {
                tracing::warn!(
                    %method,
                    alpha = opts.alpha,
                    nu = opts.nu,
                    k = opts.k,
                    "Fit method has no implementation; class estimates were left unset"
                );
                Ok(FitStatus::Skipped(method))
            }
        }
    }

    fn fit_likelihood(&self, partition : &ClassPartition<L>, n_samples : usize) -> FittedModel<L> {
        let params = partition.iter().map(|(label, rows)| {
            let count = rows.nrows();
            let mean = mean_mle(rows);
            let mut cov = cov_mle(rows, &mean);
            if self.config.diag_cov {
                cov = DMatrix::from_diagonal(&cov.diagonal());
            }
            let prior = count as f64 / n_samples as f64;
            (label.clone(), ClassParams { count, prior, mean, cov })
        }).collect();
        FittedModel { method : FitMethod::MLE, diag_cov : self.config.diag_cov, params }
    }

    /// Whether the last fit computed class estimates.
    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Method used to compute the current estimates.
    pub fn fit_method_used(&self) -> Option<FitMethod> {
        self.model.as_ref().map(|m| m.method )
    }

    pub fn model(&self) -> Option<&FittedModel<L>> {
        self.model.as_ref()
    }

    pub fn n_samples(&self) -> Option<usize> {
        self.n_samples
    }

    pub fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    /// Distinct labels observed at the last fit, in ascending order.
    pub fn classes(&self) -> Option<Vec<&L>> {
        self.class_counts.as_ref().map(|c| c.keys().collect() )
    }

    pub fn class_counts(&self) -> Option<&BTreeMap<L, usize>> {
        self.class_counts.as_ref()
    }

    pub fn n_categories(&self) -> Option<usize> {
        self.class_counts.as_ref().map(|c| c.len() )
    }

    pub fn class_prior(&self, label : &L) -> Option<f64> {
        self.model.as_ref()?.get(label).map(|p| p.prior )
    }

    pub fn class_mean(&self, label : &L) -> Option<&DVector<f64>> {
        self.model.as_ref()?.get(label).map(|p| &p.mean )
    }

    pub fn class_covariance(&self, label : &L) -> Option<&DMatrix<f64>> {
        self.model.as_ref()?.get(label).map(|p| &p.cov )
    }

}

/// Arithmetic mean of the rows of y.
pub fn mean_mle(y : &DMatrix<f64>) -> DVector<f64> {
    let n = y.nrows() as f64;
    DVector::from_iterator(y.ncols(), y.column_iter().map(|c| c.sum() / n ))
}

/// Biased covariance of the rows of y (centered cross-products divided by the
/// number of rows, not the number of rows minus one). A matrix with a single
/// distinct row yields the zero matrix.
pub fn cov_mle(y : &DMatrix<f64>, mean : &DVector<f64>) -> DMatrix<f64> {
    let n = y.nrows() as f64;
    let mut centered = y.clone();
    for (mut col, m) in centered.column_iter_mut().zip(mean.iter()) {
        col.add_scalar_mut(-m);
    }
    (centered.transpose() * &centered).unscale(n)
}

fn vector_to_value(v : &DVector<f64>) -> Value {
    Value::Array(v.iter().map(|x| Value::from(*x) ).collect())
}

fn matrix_to_value(m : &DMatrix<f64>) -> Value {
    Value::Array(m.row_iter().map(|r| Value::Array(r.iter().map(|x| Value::from(*x) ).collect()) ).collect())
}

impl<'a, L> From<&'a FittedModel<L>> for Value
where
    L : Ord + Display
{

    fn from(model : &'a FittedModel<L>) -> Value {
        let mut classes = Map::new();
        for (label, params) in model.iter() {
            let mut child = Map::new();
            child.insert(String::from("count"), Value::from(params.count));
            child.insert(String::from("prior"), Value::from(params.prior));
            child.insert(String::from("mean"), vector_to_value(&params.mean));
            child.insert(String::from("cov"), matrix_to_value(&params.cov));
            classes.insert(label.to_string(), Value::Object(child));
        }
        let mut gda = Map::new();
        gda.insert(String::from("method"), Value::from(model.method.to_string()));
        gda.insert(String::from("diag_cov"), Value::from(model.diag_cov));
        gda.insert(String::from("classes"), Value::Object(classes));
        let mut parent = Map::new();
        parent.insert(String::from("gda"), Value::Object(gda));
        Value::Object(parent)
    }

}
