/// Dense row-major `f32` matrix used for features, activations and weights.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(r: usize, c: usize) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![0.0; r * c],
        }
    }

    pub fn from_vec(r: usize, c: usize, v: Vec<f32>) -> Self {
        assert_eq!(v.len(), r * c);
        Matrix {
            rows: r,
            cols: c,
            data: v,
        }
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    /// Borrow row `r` as a slice.
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f32] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.cols, b.rows);
        let mut out = vec![0.0; a.rows * b.cols];
        for i in 0..a.rows {
            let a_row = &a.data[i * a.cols..(i + 1) * a.cols];
            let out_row = &mut out[i * b.cols..(i + 1) * b.cols];
            for (k, &a_val) in a_row.iter().enumerate() {
                if a_val == 0.0 {
                    continue;
                }
                let b_row = &b.data[k * b.cols..(k + 1) * b.cols];
                for (o, &bv) in out_row.iter_mut().zip(b_row) {
                    *o += a_val * bv;
                }
            }
        }
        Matrix::from_vec(a.rows, b.cols, out)
    }

    /// `aᵀ · b` without materialising the transpose.
    pub fn matmul_tn(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.rows, b.rows);
        let mut out = vec![0.0; a.cols * b.cols];
        for k in 0..a.rows {
            let a_row = a.row(k);
            let b_row = b.row(k);
            for (i, &a_val) in a_row.iter().enumerate() {
                if a_val == 0.0 {
                    continue;
                }
                let out_row = &mut out[i * b.cols..(i + 1) * b.cols];
                for (o, &bv) in out_row.iter_mut().zip(b_row) {
                    *o += a_val * bv;
                }
            }
        }
        Matrix::from_vec(a.cols, b.cols, out)
    }

    /// `a · bᵀ` without materialising the transpose.
    pub fn matmul_nt(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.cols, b.cols);
        let mut out = vec![0.0; a.rows * b.rows];
        for i in 0..a.rows {
            let a_row = a.row(i);
            for j in 0..b.rows {
                let b_row = b.row(j);
                out[i * b.rows + j] = a_row.iter().zip(b_row).map(|(x, y)| x * y).sum();
            }
        }
        Matrix::from_vec(a.rows, b.rows, out)
    }

    pub fn transpose(&self) -> Matrix {
        let mut v = vec![0.0; self.rows * self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                v[j * self.rows + i] = self.get(i, j);
            }
        }
        Matrix::from_vec(self.cols, self.rows, v)
    }

    pub fn softmax(&self) -> Matrix {
        let mut v = vec![0.0; self.data.len()];
        for r in 0..self.rows {
            let row_start = r * self.cols;
            let row_slice = self.row(r);
            let max = row_slice.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0;
            for c in 0..self.cols {
                let e = (row_slice[c] - max).exp();
                v[row_start + c] = e;
                sum += e;
            }
            for c in 0..self.cols {
                v[row_start + c] /= sum;
            }
        }
        Matrix::from_vec(self.rows, self.cols, v)
    }
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax(v: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &x) in v.iter().enumerate() {
        if x > best_val {
            best_val = x;
            best = i;
        }
    }
    best
}

/// Argmax of every row of `logits`.
pub fn argmax_rows(logits: &Matrix) -> Vec<usize> {
    (0..logits.rows).map(|r| argmax(logits.row(r))).collect()
}

/// Numerically stable softmax followed by cross-entropy against one class
/// index per row.
///
/// Returns the loss averaged over the batch and the gradient of that mean
/// loss with respect to the logits.
pub fn softmax_cross_entropy(logits: &Matrix, targets: &[usize]) -> (f32, Matrix) {
    debug_assert_eq!(logits.rows, targets.len());
    let mut grad = logits.softmax();
    let mut loss = 0.0f32;
    for (row, &tgt) in targets.iter().enumerate().take(logits.rows) {
        let p = grad.get(row, tgt);
        loss -= (p + 1e-9).ln();
        grad.set(row, tgt, p - 1.0);
    }

    let n = targets.len().min(logits.rows);
    if n > 0 {
        let scale = 1.0 / n as f32;
        loss *= scale;
        grad.data.iter_mut().for_each(|v| *v *= scale);
    }
    (loss, grad)
}
