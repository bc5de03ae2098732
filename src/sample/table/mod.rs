use nalgebra::*;
use std::io::Read;
use thiserror::Error;
use super::{Array, InvalidInput, TrainingSet};

#[derive(Debug, Error)]
pub enum TableError {

    #[error("Error reading CSV content: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column '{0}' not found at CSV header")]
    MissingColumn(String),

    #[error("Could not parse value '{value}' at column '{column}' (Line {line}) as a real number")]
    Parse { line : usize, column : String, value : String },

    #[error("No records available")]
    Empty,

    #[error(transparent)]
    Input(#[from] InvalidInput)

}

fn parse_header<R : Read>(csv_reader : &mut csv::Reader<R>) -> Result<Vec<String>, TableError> {
    Ok(csv_reader.headers()?.iter().map(|h| h.trim().to_string() ).collect())
}

fn parse_real(value : &str, line : usize, column : &str) -> Result<f64, TableError> {
    value.trim().parse::<f64>().map_err(|_| TableError::Parse {
        line,
        column : column.to_string(),
        value : value.to_string()
    })
}

/// Reads a CSV table with a header line into a training set. The values at label_column
/// are taken verbatim as class labels. All remaining columns are parsed as real-valued features,
/// preserving their order at the header.
pub fn read_training_set<R : Read>(reader : R, label_column : &str) -> Result<TrainingSet<String>, TableError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let header = parse_header(&mut csv_reader)?;
    let label_ix = header.iter().position(|h| h == label_column)
        .ok_or_else(|| TableError::MissingColumn(label_column.to_string()) )?;
    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (ix_rec, record) in csv_reader.records().enumerate() {
        let record = record?;
        for (i, entry) in record.iter().enumerate() {
            if i == label_ix {
                labels.push(entry.trim().to_string());
            } else {
                values.push(parse_real(entry, ix_rec + 1, &header[i])?);
            }
        }
    }
    if labels.is_empty() {
        return Err(TableError::Empty);
    }
    let x = Array::new(vec![labels.len(), header.len() - 1], values)?;
    Ok(TrainingSet::new(x, Array::from(labels))?)
}

/// Reads a CSV table with a header line and real-valued columns into a
/// matrix with one point per row.
pub fn read_points<R : Read>(reader : R) -> Result<DMatrix<f64>, TableError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let header = parse_header(&mut csv_reader)?;
    let mut values = Vec::new();
    let mut n = 0;
    for (ix_rec, record) in csv_reader.records().enumerate() {
        let record = record?;
        for (i, entry) in record.iter().enumerate() {
            values.push(parse_real(entry, ix_rec + 1, &header[i])?);
        }
        n += 1;
    }
    if n == 0 {
        return Err(TableError::Empty);
    }
    Ok(DMatrix::from_row_slice(n, header.len(), &values[..]))
}

#[test]
fn training_set_from_csv() {
    let content = "sepal,label,petal\n1.0,setosa,0.2\n2.5,virginica,1.5\n1.2,setosa,0.3\n";
    let data = read_training_set(content.as_bytes(), "label").unwrap();
    assert_eq!((data.n_samples(), data.n_features()), (3, 2));
    assert_eq!(data.labels(), &["setosa", "virginica", "setosa"]);
    assert_eq!(data.features().row(1).iter().cloned().collect::<Vec<_>>(), vec![2.5, 1.5]);
}

#[test]
fn training_set_csv_errors() {
    let content = "a,b\n1.0,x\n";
    assert!(matches!(read_training_set(content.as_bytes(), "c"), Err(TableError::MissingColumn(_))));
    let content = "a,b\nnan?,x\n";
    assert!(matches!(read_training_set(content.as_bytes(), "b"), Err(TableError::Parse { line : 1, .. })));
    let content = "a,b\n";
    assert!(matches!(read_training_set(content.as_bytes(), "b"), Err(TableError::Empty)));
    let content = "a,b\n1.0,x\n2.0\n";
    assert!(matches!(read_training_set(content.as_bytes(), "b"), Err(TableError::Csv(_))));
}

#[test]
fn points_from_csv() {
    let content = "x,y\n0,1\n2,3\n";
    let pts = read_points(content.as_bytes()).unwrap();
    assert_eq!(pts, DMatrix::from_row_slice(2, 2, &[0., 1., 2., 3.]));
}
