use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ShapeError;

/// Dense row-major matrix of `f64`.
///
/// The shape is fixed at construction. Every fallible operation checks shapes
/// up front and returns a `ShapeError` instead of coercing operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<f64>>,
}

/// Unchecked wire form; converted through `TryFrom` so a saved model with a
/// ragged or mislabelled matrix is rejected at load time.
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<f64>>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = ShapeError;

    fn try_from(raw: RawMatrix) -> Result<Matrix, ShapeError> {
        let declared = (raw.rows, raw.cols);
        let m = Matrix::from_rows(raw.data)?;
        if m.shape() != declared {
            return Err(ShapeError::new("deserialize", declared, m.shape()));
        }
        Ok(m)
    }
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Builds a `rows × cols` matrix from a flat row-major sequence.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Matrix, ShapeError> {
        if values.len() != rows * cols {
            return Err(ShapeError::new("from_vec", (rows, cols), (values.len(), 1)));
        }
        let data = if cols == 0 {
            vec![Vec::new(); rows]
        } else {
            values.chunks(cols).map(|row| row.to_vec()).collect()
        };
        Ok(Matrix { rows, cols, data })
    }

    /// Builds a matrix from nested rows. Rows must be non-empty and equally long.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Matrix, ShapeError> {
        let rows = data.len();
        let cols = data.first().map(|row| row.len()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(ShapeError::new("from_rows", (1, 1), (rows, cols)));
        }
        if let Some(bad) = data.iter().find(|row| row.len() != cols) {
            return Err(ShapeError::new("from_rows", (rows, cols), (rows, bad.len())));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Column matrix (`n × 1`) holding `values` in order.
    pub fn from_column(values: &[f64]) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.iter().map(|&v| vec![v]).collect(),
        }
    }

    /// Flattens the matrix in row-major order. For a column matrix this is the
    /// inverse of `from_column`.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.iter().flat_map(|row| row.iter().copied()).collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn row_slices(&self) -> &[Vec<f64>] {
        &self.data
    }

    /// Fills every element with an independent uniform draw from `[low, high]`.
    ///
    /// # Panics
    /// Panics if `low > high` or either bound is not finite.
    pub fn randomize<R: Rng + ?Sized>(&mut self, low: f64, high: f64, rng: &mut R) {
        let dist = Uniform::new_inclusive(low, high);
        for row in self.data.iter_mut() {
            for x in row.iter_mut() {
                *x = dist.sample(rng);
            }
        }
    }

    pub fn multiply(&self, rhs: &Matrix) -> Result<Matrix, ShapeError> {
        if self.cols != rhs.rows {
            return Err(ShapeError::new("multiply", (self.cols, rhs.cols), rhs.shape()));
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        Ok(res)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix, ShapeError> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    /// Element-wise sum. A `1 × 1` operand on either side is broadcast.
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix, ShapeError> {
        self.broadcast_with(rhs, "add", |a, b| a + b)
    }

    /// Element-wise difference. A `1 × 1` operand on either side is broadcast.
    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix, ShapeError> {
        self.broadcast_with(rhs, "sub", |a, b| a - b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    fn zip_with<F>(&self, rhs: &Matrix, op: &'static str, f: F) -> Result<Matrix, ShapeError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != rhs.shape() {
            return Err(ShapeError::new(op, self.shape(), rhs.shape()));
        }
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(row_a, row_b)| row_a.iter().zip(row_b.iter()).map(|(&x, &y)| f(x, y)).collect())
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    fn broadcast_with<F>(&self, rhs: &Matrix, op: &'static str, f: F) -> Result<Matrix, ShapeError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() == rhs.shape() {
            return self.zip_with(rhs, op, f);
        }
        if rhs.is_scalar() {
            let s = rhs.data[0][0];
            return Ok(self.map(|x| f(x, s)));
        }
        if self.is_scalar() {
            let s = self.data[0][0];
            return Ok(rhs.map(|y| f(s, y)));
        }
        Err(ShapeError::new(op, self.shape(), rhs.shape()))
    }
}
