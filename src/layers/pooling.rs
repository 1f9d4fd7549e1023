use super::layer::{Layer, LayerError};
use super::linear::LinearT;
use crate::math::Matrix;

/// Output length of a pooling window along one axis (floor mode).
pub fn pool_output_size(input: usize, kernel: usize, stride: usize) -> Option<usize> {
    input.checked_sub(kernel).map(|span| span / stride + 1)
}

/// 2D max pooling forward pass over a single `rows x cols` feature map.
///
/// Returns the pooled values and, for each window, the index of the maximum
/// with respect to the flattened input. The indices drive
/// [`max_pool2d_backward`]. Ties keep the first maximum in scan order.
pub fn max_pool2d(input: &Matrix, kernel: usize, stride: usize) -> (Matrix, Vec<usize>) {
    let out_rows = pool_output_size(input.rows, kernel, stride).unwrap_or(0);
    let out_cols = pool_output_size(input.cols, kernel, stride).unwrap_or(0);
    let mut out = vec![0.0; out_rows * out_cols];
    let mut indices = vec![0usize; out_rows * out_cols];
    let mut idx = 0;
    for r in 0..out_rows {
        for c in 0..out_cols {
            let mut best = f32::NEG_INFINITY;
            let mut best_idx = 0usize;
            for kr in 0..kernel {
                for kc in 0..kernel {
                    let ir = r * stride + kr;
                    let ic = c * stride + kc;
                    let val = input.get(ir, ic);
                    if val > best {
                        best = val;
                        best_idx = ir * input.cols + ic;
                    }
                }
            }
            out[idx] = best;
            indices[idx] = best_idx;
            idx += 1;
        }
    }
    (Matrix::from_vec(out_rows, out_cols, out), indices)
}

/// Backward pass for 2D max pooling: each output gradient is routed to the
/// input position that won its window.
pub fn max_pool2d_backward(
    grad: &[f32],
    indices: &[usize],
    input_len: usize,
) -> Vec<f32> {
    let mut grad_input = vec![0.0; input_len];
    for (&g, &idx) in grad.iter().zip(indices) {
        grad_input[idx] += g;
    }
    grad_input
}

/// Max pooling layer over `channels` feature maps of `in_h x in_w` per sample.
pub struct MaxPool2d {
    kernel: usize,
    stride: usize,
    channels: usize,
    in_h: usize,
    in_w: usize,
    out_h: usize,
    out_w: usize,
    // per sample, per channel argmax indices from the last training pass
    indices: Vec<Vec<usize>>,
}

impl MaxPool2d {
    /// Create a new max pooling layer.
    pub fn new(
        channels: usize,
        (in_h, in_w): (usize, usize),
        kernel: usize,
        stride: usize,
    ) -> Result<Self, LayerError> {
        let too_large = |input| LayerError::KernelTooLarge {
            input,
            kernel,
            padding: 0,
        };
        let out_h = pool_output_size(in_h, kernel, stride).ok_or(too_large(in_h))?;
        let out_w = pool_output_size(in_w, kernel, stride).ok_or(too_large(in_w))?;
        Ok(Self {
            kernel,
            stride,
            channels,
            in_h,
            in_w,
            out_h,
            out_w,
            indices: Vec::new(),
        })
    }

    pub fn output_shape(&self) -> (usize, usize) {
        (self.out_h, self.out_w)
    }

    pub fn output_features(&self) -> usize {
        self.channels * self.out_h * self.out_w
    }

    fn pool(&self, x: &Matrix) -> Result<(Matrix, Vec<Vec<usize>>), LayerError> {
        let plane = self.in_h * self.in_w;
        let expected = self.channels * plane;
        if x.cols != expected {
            return Err(LayerError::ShapeMismatch {
                expected,
                got: x.cols,
            });
        }
        let out_plane = self.out_h * self.out_w;
        let mut out = Matrix::zeros(x.rows, self.channels * out_plane);
        let mut all_indices = Vec::with_capacity(x.rows * self.channels);
        for b in 0..x.rows {
            let row = x.row(b);
            for c in 0..self.channels {
                let fm = Matrix::from_vec(
                    self.in_h,
                    self.in_w,
                    row[c * plane..(c + 1) * plane].to_vec(),
                );
                let (pooled, idx) = max_pool2d(&fm, self.kernel, self.stride);
                out.row_mut(b)[c * out_plane..(c + 1) * out_plane].copy_from_slice(&pooled.data);
                all_indices.push(idx);
            }
        }
        Ok((out, all_indices))
    }
}

impl Layer for MaxPool2d {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        self.pool(x).map(|(out, _)| out)
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        let (out, indices) = self.pool(x)?;
        self.indices = indices;
        Ok(out)
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let plane = self.in_h * self.in_w;
        let out_plane = self.out_h * self.out_w;
        let mut grad_in = Matrix::zeros(grad_out.rows, self.channels * plane);
        for b in 0..grad_out.rows {
            for c in 0..self.channels {
                let g = &grad_out.row(b)[c * out_plane..(c + 1) * out_plane];
                let routed = max_pool2d_backward(g, &self.indices[b * self.channels + c], plane);
                grad_in.row_mut(b)[c * plane..(c + 1) * plane].copy_from_slice(&routed);
            }
        }
        grad_in
    }

    fn zero_grad(&mut self) {}

    fn parameters(&mut self) -> Vec<&mut LinearT> {
        Vec::new()
    }
}
