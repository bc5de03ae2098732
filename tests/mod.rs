use nalgebra::*;
use gda::distr::*;
use gda::fit::*;
use gda::sample::*;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

const EPS : f64 = 10E-8;

fn scale() -> (DVector<f64>, DMatrix<f64>) {
    let mu = DVector::from_column_slice(&[1.0, -0.5, 2.0]);
    let sigma = DMatrix::from_row_slice(3, 3, &[
        2.0, 0.3, 0.1,
        0.3, 1.0, -0.2,
        0.1, -0.2, 0.5
    ]);
    (mu, sigma)
}

fn random_points(n : usize, p : usize, sd : f64, seed : u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let norm = Normal::new(0.0, sd).unwrap();
    DMatrix::from_fn(n, p, |_, _| norm.sample(&mut rng) )
}

#[test]
fn student_t_approaches_normal() {
    let (mu, sigma) = scale();
    // Points near the location, where the gap to the normal is of order (Mahalanobis^2 / nu).
    let mut x = random_points(20, 3, 0.5, 1);
    for mut row in x.row_iter_mut() {
        row += mu.transpose();
    }
    let t = multivariate_t_pdf(x.slice((0, 0), x.shape()), &mu, &sigma, 10_000.).unwrap();
    let n = multinormal_pdf(x.slice((0, 0), x.shape()), &mu, &sigma).unwrap();
    for (tp, np) in t.iter().zip(n.iter()) {
        assert!(((tp - np) / np).abs() < 1E-2, "t = {}, normal = {}", tp, np);
    }

    // The gap shrinks as the degrees of freedom grow.
    let t_small = multivariate_t_pdf(x.slice((0, 0), x.shape()), &mu, &sigma, 10.).unwrap();
    let gap_small = (t_small - &n).abs().sum();
    let gap_large = (t - &n).abs().sum();
    assert!(gap_large < gap_small);
}

#[test]
fn log_density_translation_invariance() {
    let (mu, sigma) = scale();
    let x = random_points(10, 3, 1.5, 2);
    let shift = DVector::from_column_slice(&[100.0, -3.0, 7.5]);
    let mut x_shift = x.clone();
    for mut row in x_shift.row_iter_mut() {
        row += shift.transpose();
    }
    let mu_shift = &mu + &shift;
    let lp = log_multivariate_t_pdf(x.slice((0, 0), x.shape()), &mu, &sigma, 3., MIN_REGULARIZATION).unwrap();
    let lp_shift = log_multivariate_t_pdf(x_shift.slice((0, 0), x_shift.shape()), &mu_shift, &sigma, 3., MIN_REGULARIZATION).unwrap();
    for (a, b) in lp.iter().zip(lp_shift.iter()) {
        assert!((a - b).abs() < 1E-6);
    }
}

#[test]
fn log_density_matches_density() {
    let (mu, sigma) = scale();
    let x = random_points(15, 3, 1.5, 3);
    for nu in [0.5, 1.0, 2.0, 7.5, 30.0].iter() {
        let lp = log_multivariate_t_pdf(x.slice((0, 0), x.shape()), &mu, &sigma, *nu, MIN_REGULARIZATION).unwrap();
        let p = multivariate_t_pdf(x.slice((0, 0), x.shape()), &mu, &sigma, *nu).unwrap();
        for (l, d) in lp.iter().zip(p.iter()) {
            assert!((l.exp() - d).abs() < EPS);
        }
    }
}

#[test]
fn density_peaks_at_location() {
    let (mu, sigma) = scale();
    let mut x = random_points(8, 3, 1.5, 4);
    x.set_row(0, &mu.transpose());
    let lp = log_multivariate_t_pdf(x.slice((0, 0), x.shape()), &mu, &sigma, 4., MIN_REGULARIZATION).unwrap();
    assert_eq!(lp.imax(), 0);
}

#[test]
fn fit_recovers_class_parameters() {
    let mut rng = StdRng::seed_from_u64(42);
    let norm = Normal::new(0.0, 1.0).unwrap();
    let centers = [[-5.0, 0.0], [5.0, 3.0], [0.0, 10.0]];
    let sizes = [2000, 1000, 1000];
    let total : usize = sizes.iter().sum();
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (label, (center, size)) in centers.iter().zip(sizes.iter()).enumerate() {
        for _ in 0..*size {
            let a = norm.sample(&mut rng);
            let b = norm.sample(&mut rng);
            // Second feature correlated with the first (cov = [[1, 0.8], [0.8, 1]]).
            rows.push(center[0] + a);
            rows.push(center[1] + 0.8 * a + 0.6 * b);
            labels.push(label as u32);
        }
    }
    let x = DMatrix::from_row_slice(total, 2, &rows[..]);
    let mut gda = DiscriminantAnalysis::default();
    assert!(gda.fit(&x, labels.clone()).unwrap().is_fitted());

    assert_eq!(gda.n_categories(), Some(3));
    assert_eq!(gda.class_prior(&0), Some(0.5));
    assert_eq!(gda.class_prior(&1), Some(0.25));
    for (label, center) in centers.iter().enumerate() {
        let label = label as u32;
        let mean = gda.class_mean(&label).unwrap();
        assert!((mean[0] - center[0]).abs() < 0.15);
        assert!((mean[1] - center[1]).abs() < 0.15);
        let cov = gda.class_covariance(&label).unwrap();
        assert!((cov[(0, 0)] - 1.0).abs() < 0.15);
        assert!((cov[(0, 1)] - 0.8).abs() < 0.15);
        assert!((cov[(1, 1)] - 1.0).abs() < 0.15);
        assert!((cov[(0, 1)] - cov[(1, 0)]).abs() < EPS);
    }

    // Fitted class parameters plug into the density evaluator; each class center
    // is most likely under its own class.
    let model = gda.model().unwrap();
    let centers_m = DMatrix::from_row_slice(3, 2, &[-5.0, 0.0, 5.0, 3.0, 0.0, 10.0]);
    for (label, params) in model.iter() {
        let lp = log_multivariate_t_pdf(
            centers_m.slice((0, 0), centers_m.shape()),
            &params.mean,
            &params.cov,
            5.,
            MIN_REGULARIZATION
        ).unwrap();
        assert_eq!(lp.imax(), *label as usize);
    }

    let mut diag = DiscriminantAnalysis::new(DiscriminantConfig { fit_method : FitMethod::MLE, diag_cov : true });
    diag.fit(&x, labels).unwrap();
    for label in 0..3u32 {
        let cov = diag.class_covariance(&label).unwrap();
        assert_eq!(cov[(0, 1)], 0.0);
        assert_eq!(cov[(0, 0)], gda.class_covariance(&label).unwrap()[(0, 0)]);
    }
}

#[test]
fn degenerate_class_covariance_is_regularized_by_density() {
    // A single-member class yields a zero covariance matrix. The density evaluator
    // still accepts it through the regularized retry.
    let x = DMatrix::from_row_slice(3, 2, &[0., 0., 1., 1., 4., 4.]);
    let mut gda = DiscriminantAnalysis::default();
    gda.fit(&x, vec!['a', 'a', 'b']).unwrap();
    let cov = gda.class_covariance(&'b').unwrap();
    assert_eq!(cov, &DMatrix::zeros(2, 2));
    let mean = gda.class_mean(&'b').unwrap();
    let lp = log_multivariate_t_pdf(x.slice((0, 0), x.shape()), mean, cov, 2., MIN_REGULARIZATION).unwrap();
    assert!(lp.iter().all(|l| !l.is_nan() ));
    assert_eq!(lp.imax(), 2);
}

#[test]
fn csv_to_json_model() {
    let content = "\
height,weight,species
1.0,2.0,cat
1.5,2.5,cat
3.0,8.0,dog
3.4,9.0,dog
2.9,7.5,dog
";
    let data = read_training_set(content.as_bytes(), "species").unwrap();
    let mut gda = DiscriminantAnalysis::default();
    gda.fit(data.features(), data.labels().to_vec()).unwrap();
    assert_eq!(gda.classes().unwrap(), vec!["cat", "dog"]);
    assert_eq!(gda.class_prior(&"dog".to_string()), Some(0.6));
    let val : serde_json::Value = gda.model().unwrap().into();
    let cat_mean = &val["gda"]["classes"]["cat"]["mean"];
    assert!((cat_mean[0].as_f64().unwrap() - 1.25).abs() < EPS);
    assert!((cat_mean[1].as_f64().unwrap() - 2.25).abs() < EPS);
    assert_eq!(val["gda"]["classes"]["dog"]["count"], 3);
}

#[test]
fn rejected_fit_does_not_mutate() {
    let x = DMatrix::from_row_slice(2, 2, &[0., 1., 2., 3.]);
    let mut gda : DiscriminantAnalysis<i32> = DiscriminantAnalysis::default();
    assert!(matches!(gda.fit(&x, vec![1, 2, 3]), Err(InvalidInput::LengthMismatch { samples : 2, labels : 3 })));
    let col_y = Array::new(vec![2, 1], vec![1, 2]).unwrap();
    assert!(matches!(gda.fit(&x, col_y), Err(InvalidInput::LabelDimension(2))));
    assert!(!gda.is_fitted());
    assert!(gda.classes().is_none());
    assert!(gda.fit_method_used().is_none());
}
