use nalgebra::*;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt::Debug;
use thiserror::Error;

/// Loading of training sets and evaluation points from CSV tables.
pub mod table;

pub use table::*;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidInput {

    #[error("y must have a single dimension (informed {0} dimensions)")]
    LabelDimension(usize),

    #[error("X must have two dimensions (informed {0} dimensions)")]
    FeatureDimension(usize),

    #[error("X, y length mismatch {samples} != {labels}")]
    LengthMismatch { samples : usize, labels : usize },

    #[error("Array of shape {shape:?} cannot hold {len} elements")]
    Shape { shape : Vec<usize>, len : usize },

    #[error("Unknown fit method '{0}' (expected one of MLE, MAP, Mean, Bayes)")]
    UnknownMethod(String)

}

/// Raw row-major array whose number of dimensions is only known at runtime, used to
/// receive user data before its shape is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Array<T> {

    shape : Vec<usize>,

    data : Vec<T>

}

impl<T> Array<T> {

    pub fn new(shape : Vec<usize>, data : Vec<T>) -> Result<Self, InvalidInput> {
        let len : usize = shape.iter().product();
        if len != data.len() {
            return Err(InvalidInput::Shape { shape, len : data.len() });
        }
        Ok(Self { shape, data })
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape[..]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

}

impl<T> From<Vec<T>> for Array<T> {

    fn from(data : Vec<T>) -> Self {
        Self { shape : vec![data.len()], data }
    }

}

impl<T : Scalar> From<DVector<T>> for Array<T> {

    fn from(v : DVector<T>) -> Self {
        Self::from(v.iter().cloned().collect::<Vec<_>>())
    }

}

impl<T : Scalar> From<&DMatrix<T>> for Array<T> {

    fn from(m : &DMatrix<T>) -> Self {
        // nalgebra storage is column-major, so the transpose storage is the row-major buffer.
        let data = m.transpose().as_slice().to_vec();
        Self { shape : vec![m.nrows(), m.ncols()], data }
    }

}

impl<T : Scalar> From<DMatrix<T>> for Array<T> {

    fn from(m : DMatrix<T>) -> Self {
        Self::from(&m)
    }

}

/// Feature matrix (n_samples x n_features) paired with one label per row.
#[derive(Debug, Clone)]
pub struct TrainingSet<L> {

    x : DMatrix<f64>,

    y : Vec<L>

}

impl<L> TrainingSet<L>
where
    L : Ord + Clone + Debug
{

    /// Validates that y is one-dimensional, that x is two-dimensional and
    /// that y carries one label per row of x (in this order).
    pub fn new(x : Array<f64>, y : Array<L>) -> Result<Self, InvalidInput> {
        if y.ndim() != 1 {
            return Err(InvalidInput::LabelDimension(y.ndim()));
        }
        if x.ndim() != 2 {
            return Err(InvalidInput::FeatureDimension(x.ndim()));
        }
        let (n, p) = (x.shape[0], x.shape[1]);
        if y.len() != n {
            return Err(InvalidInput::LengthMismatch { samples : n, labels : y.len() });
        }
        let x = DMatrix::from_row_slice(n, p, &x.data[..]);
        Ok(Self { x, y : y.data })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn features(&self) -> &DMatrix<f64> {
        &self.x
    }

    pub fn labels(&self) -> &[L] {
        &self.y[..]
    }

    /// Distinct labels (in ascending order) and their frequencies.
    pub fn class_counts(&self) -> BTreeMap<L, usize> {
        let mut counts = BTreeMap::new();
        for label in self.y.iter() {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Splits the feature matrix into one sub-matrix per label. Rows preserve
    /// the order they have in the training set.
    pub fn partition(&self) -> ClassPartition<L> {
        let mut rows : BTreeMap<L, Vec<usize>> = BTreeMap::new();
        for (i, label) in self.y.iter().enumerate() {
            rows.entry(label.clone()).or_insert_with(Vec::new).push(i);
        }
        let parts = rows.into_iter()
            .map(|(label, ixs)| (label, self.x.select_rows(ixs.iter())) )
            .collect();
        ClassPartition { parts }
    }

}

/// Label-to-data lookup table.
#[derive(Debug, Clone)]
pub struct ClassPartition<L> {
    parts : BTreeMap<L, DMatrix<f64>>
}

impl<L> ClassPartition<L>
where
    L : Ord
{

    pub fn get(&self, label : &L) -> Option<&DMatrix<f64>> {
        self.parts.get(label)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, L, DMatrix<f64>> {
        self.parts.iter()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

}

#[test]
fn array_shape() {
    assert!(Array::new(vec![2, 3], vec![0.0; 6]).is_ok());
    assert_eq!(
        Array::new(vec![2, 3], vec![0.0; 5]),
        Err(InvalidInput::Shape { shape : vec![2, 3], len : 5 })
    );
    let m = DMatrix::from_row_slice(2, 2, &[1., 2., 3., 4.]);
    let arr : Array<f64> = m.into();
    assert_eq!(arr.shape(), &[2, 2]);
    assert_eq!(arr.data, vec![1., 2., 3., 4.]);
    let v : Array<i32> = vec![1, 2, 3].into();
    assert_eq!(v.ndim(), 1);
}

#[test]
fn training_set_validation() {
    let x = DMatrix::from_row_slice(3, 2, &[0., 0., 1., 1., 2., 2.]);
    let ok = TrainingSet::new(Array::from(&x), Array::from(vec![0, 1, 1])).unwrap();
    assert_eq!((ok.n_samples(), ok.n_features()), (3, 2));

    let col_y = Array::new(vec![3, 1], vec![0, 1, 1]).unwrap();
    assert_eq!(TrainingSet::new(Array::from(&x), col_y).unwrap_err(), InvalidInput::LabelDimension(2));

    let flat_x = Array::from(vec![0., 1., 2.]);
    assert_eq!(TrainingSet::new(flat_x, Array::from(vec![0, 1, 1])).unwrap_err(), InvalidInput::FeatureDimension(1));

    assert_eq!(
        TrainingSet::new(Array::from(&x), Array::from(vec![0, 1])).unwrap_err(),
        InvalidInput::LengthMismatch { samples : 3, labels : 2 }
    );
}

#[test]
fn partition_preserves_row_order() {
    let x = DMatrix::from_row_slice(5, 1, &[10., 20., 30., 40., 50.]);
    let y = vec!["b", "a", "b", "a", "b"];
    let data = TrainingSet::new(Array::from(&x), Array::from(y)).unwrap();
    let counts = data.class_counts();
    assert_eq!(counts.iter().map(|(l, c)| (*l, *c) ).collect::<Vec<_>>(), vec![("a", 2), ("b", 3)]);
    let part = data.partition();
    assert_eq!(part.len(), 2);
    assert_eq!(part.get(&"a").unwrap().as_slice(), &[20., 40.]);
    assert_eq!(part.get(&"b").unwrap().as_slice(), &[10., 30., 50.]);
}
