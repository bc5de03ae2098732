use gda::distr::*;
use gda::fit::*;
use gda::sample::table;
use structopt::*;
use serde::Deserialize;
use serde_json::Value;
use nalgebra::*;
use anyhow::{self, Context};
use std::fs::{self, File};
use std::fmt::{Debug, Display};
use tracing_subscriber::EnvFilter;

/// Fit Gaussian discriminant models and evaluate multivariate Student-t densities
#[derive(StructOpt, Debug)]
pub enum Gda {

    /// Estimates per-class priors, means and covariances from a CSV table
    /// with a header line, printing the fitted model as JSON.
    Fit {
        data : String,

        /// Column holding the class labels. All other columns are features.
        #[structopt(short, long)]
        label : String,

        /// One of MLE, MAP, Mean or Bayes (only MLE computes estimates).
        #[structopt(short, long, default_value = "MLE")]
        method : FitMethod,

        /// Zero the off-diagonal entries of the class covariances.
        #[structopt(long)]
        diag_cov : bool,

        #[structopt(short)]
        output : Option<String>
    },

    /// Evaluates the multivariate Student-t log-density at each row of a CSV table.
    Density {
        points : String,

        /// JSON file with "mean", "scale", "nu" and (optionally) "min_regularization" entries.
        #[structopt(short, long)]
        params : String,

        /// Print densities instead of log-densities.
        #[structopt(long)]
        exp : bool
    }

}

#[derive(Debug, Deserialize)]
struct StudentParams {

    mean : Vec<f64>,

    scale : Vec<Vec<f64>>,

    nu : f64,

    #[serde(default = "default_min_reg")]
    min_regularization : f64

}

fn default_min_reg() -> f64 {
    MIN_REGULARIZATION
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_or_save(content : &str, opt_path : &Option<String>) -> Result<(), anyhow::Error> {
    match opt_path {
        Some(path) => fs::write(path, content).with_context(|| format!("Error writing to {}", path)),
        None => { println!("{}", content); Ok(()) }
    }
}

/// Pretty-printed JSON of the fitted model, or None when the method left the estimates unset.
fn model_json<L>(estimator : &DiscriminantAnalysis<L>) -> Result<Option<String>, anyhow::Error>
where
    L : Ord + Clone + Debug + Display
{
    match estimator.model() {
        Some(model) => {
            let val : Value = model.into();
            Ok(Some(serde_json::to_string_pretty(&val)?))
        },
        None => Ok(None)
    }
}

fn fit(data : &str, label : &str, method : FitMethod, diag_cov : bool, output : &Option<String>) -> Result<(), anyhow::Error> {
    let file = File::open(data).with_context(|| format!("Error opening {}", data))?;
    let train = table::read_training_set(file, label)?;
    let config = DiscriminantConfig { fit_method : method, diag_cov };
    let mut estimator = DiscriminantAnalysis::new(config);
    let status = estimator.fit(train.features(), train.labels().to_vec())?;
    match model_json(&estimator)? {
        Some(json) => {
            if let Some(model) = estimator.model() {
                tracing::info!("{} fitted from {} samples", model, train.n_samples());
            }
            print_or_save(&json, output)
        },
        None => {
            tracing::info!("Method {} is not implemented; no model was fitted (status {})", status.method(), status.code());
            Ok(())
        }
    }
}

/// Parses the JSON parameter file of the density subcommand into
/// (location, scale matrix, degrees of freedom, regularization floor).
fn parse_student_params(content : &str) -> Result<(DVector<f64>, DMatrix<f64>, f64, f64), anyhow::Error> {
    let params : StudentParams = serde_json::from_str(content)?;
    let p = params.mean.len();
    if params.scale.len() != p || params.scale.iter().any(|row| row.len() != p ) {
        anyhow::bail!("Scale matrix must be {}x{} to match the mean vector", p, p);
    }
    let flat : Vec<f64> = params.scale.iter().flatten().cloned().collect();
    let sigma = DMatrix::from_row_slice(p, p, &flat[..]);
    let mu = DVector::from_column_slice(&params.mean[..]);
    Ok((mu, sigma, params.nu, params.min_regularization))
}

fn density_lines(log_p : &DVector<f64>, exp : bool) -> Vec<String> {
    log_p.iter().map(|lp| if exp { lp.exp().to_string() } else { lp.to_string() } ).collect()
}

fn density(points : &str, params : &str, exp : bool) -> Result<(), anyhow::Error> {
    let content = fs::read_to_string(params).with_context(|| format!("Error reading {}", params))?;
    let (mu, sigma, nu, min_reg) = parse_student_params(&content)?;
    let file = File::open(points).with_context(|| format!("Error opening {}", points))?;
    let x = table::read_points(file)?;
    let log_p = log_multivariate_t_pdf(x.slice((0, 0), x.shape()), &mu, &sigma, nu, min_reg)?;
    for line in density_lines(&log_p, exp) {
        println!("{}", line);
    }
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    init_logging();
    match Gda::from_args() {
        Gda::Fit { data, label, method, diag_cov, output } => {
            fit(&data, &label, method, diag_cov, &output)
        },
        Gda::Density { points, params, exp } => {
            density(&points, &params, exp)
        }
    }
}

#[test]
fn student_params_default_regularization() {
    let (mu, sigma, nu, min_reg) = parse_student_params(
        r#"{ "mean" : [1.0, 2.0], "scale" : [[2.0, 0.5], [0.5, 1.0]], "nu" : 3.0 }"#
    ).unwrap();
    assert_eq!(mu, DVector::from_column_slice(&[1.0, 2.0]));
    assert_eq!(sigma, DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]));
    assert_eq!(nu, 3.0);
    assert_eq!(min_reg, MIN_REGULARIZATION);

    let (_, _, _, min_reg) = parse_student_params(
        r#"{ "mean" : [0.0], "scale" : [[1.0]], "nu" : 1.0, "min_regularization" : 0.01 }"#
    ).unwrap();
    assert_eq!(min_reg, 0.01);
}

#[test]
fn student_params_ragged_scale() {
    let err = parse_student_params(r#"{ "mean" : [0.0, 0.0], "scale" : [[1.0, 0.0]], "nu" : 2.0 }"#).unwrap_err();
    assert!(err.to_string().contains("2x2"));
    let err = parse_student_params(r#"{ "mean" : [0.0, 0.0], "scale" : [[1.0, 0.0], [0.0]], "nu" : 2.0 }"#).unwrap_err();
    assert!(err.to_string().contains("2x2"));
    assert!(parse_student_params(r#"{ "mean" : [0.0], "scale" : [[1.0]] }"#).is_err());
}

#[test]
fn density_lines_exp() {
    let log_p = DVector::from_column_slice(&[0.0, -1.0]);
    assert_eq!(density_lines(&log_p, false), vec!["0".to_string(), "-1".to_string()]);
    let dens = density_lines(&log_p, true);
    assert_eq!(dens[0], "1");
    assert_eq!(dens[1].parse::<f64>().unwrap(), (-1.0f64).exp());
}

#[test]
fn skipped_fit_has_no_model_json() {
    let x = DMatrix::from_row_slice(4, 2, &[0., 0., 1., 1., 5., 5., 6., 6.]);
    let y = vec!["a", "a", "b", "b"];
    let mut estimator = DiscriminantAnalysis::new(DiscriminantConfig { fit_method : FitMethod::MAP, diag_cov : false });
    let status = estimator.fit(&x, y.clone()).unwrap();
    assert!(!status.is_fitted());
    assert_eq!(model_json(&estimator).unwrap(), None);

    let mut estimator = DiscriminantAnalysis::default();
    estimator.fit(&x, y).unwrap();
    let json = model_json(&estimator).unwrap().unwrap();
    let val : Value = serde_json::from_str(&json).unwrap();
    assert_eq!(val["gda"]["classes"]["b"]["count"], 2);
}
