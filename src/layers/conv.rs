use super::layer::{Layer, LayerError};
use super::linear::LinearT;
use crate::math::Matrix;

/// Output length of a convolution along one axis, or `None` when the kernel
/// does not fit the padded input.
pub fn conv_output_size(input: usize, kernel: usize, stride: usize, padding: usize) -> Option<usize> {
    (input + 2 * padding)
        .checked_sub(kernel)
        .map(|span| span / stride + 1)
}

/// 2D convolution layer using im2col and a linear weight matrix.
///
/// Each input row holds one sample laid out channel-major as
/// `(in_channels, height, width)`. The spatial size is fixed when the layer
/// is built, which lets non-square inputs (spectrograms, folded waveforms)
/// go through without guessing. The kernel weights and per-channel bias live
/// in a [`LinearT`] of shape `(in_channels * k * k) x out_channels`, so the
/// optimiser code is shared with the dense layers.
pub struct Conv2d {
    pub w: LinearT,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
    in_h: usize,
    in_w: usize,
    out_h: usize,
    out_w: usize,
    // batch size seen by the last training forward pass
    last_batch: usize,
}

impl Conv2d {
    /// Create a new convolution layer for inputs of `in_h x in_w`.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        (in_h, in_w): (usize, usize),
    ) -> Result<Self, LayerError> {
        let too_large = |input| LayerError::KernelTooLarge {
            input,
            kernel: kernel_size,
            padding,
        };
        let out_h = conv_output_size(in_h, kernel_size, stride, padding).ok_or(too_large(in_h))?;
        let out_w = conv_output_size(in_w, kernel_size, stride, padding).ok_or(too_large(in_w))?;
        let w = LinearT::new(in_channels * kernel_size * kernel_size, out_channels);
        Ok(Self {
            w,
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
            in_h,
            in_w,
            out_h,
            out_w,
            last_batch: 0,
        })
    }

    fn check(&self, x: &Matrix) -> Result<(), LayerError> {
        if x.cols % self.in_channels != 0 {
            return Err(LayerError::ChannelMismatch {
                features: x.cols,
                in_channels: self.in_channels,
            });
        }
        let expected = self.in_channels * self.in_h * self.in_w;
        if x.cols != expected {
            return Err(LayerError::ShapeMismatch {
                expected,
                got: x.cols,
            });
        }
        Ok(())
    }

    /// Visit every (im2col row, im2col column, input index) triple whose
    /// input position lies inside the unpadded image.
    fn for_each_tap(&self, batch: usize, mut f: impl FnMut(usize, usize, usize)) {
        let (in_h, in_w) = (self.in_h, self.in_w);
        let sample_len = self.in_channels * in_h * in_w;
        let mut row = 0;
        for b in 0..batch {
            for oh in 0..self.out_h {
                for ow in 0..self.out_w {
                    let mut col_idx = 0;
                    for ic in 0..self.in_channels {
                        for kh in 0..self.kernel_size {
                            for kw in 0..self.kernel_size {
                                let ihp = (oh * self.stride + kh) as isize - self.padding as isize;
                                let iwp = (ow * self.stride + kw) as isize - self.padding as isize;
                                if ihp >= 0 && ihp < in_h as isize && iwp >= 0 && iwp < in_w as isize {
                                    let idx = b * sample_len
                                        + ic * in_h * in_w
                                        + ihp as usize * in_w
                                        + iwp as usize;
                                    f(row, col_idx, idx);
                                }
                                col_idx += 1;
                            }
                        }
                    }
                    row += 1;
                }
            }
        }
    }

    fn im2col(&self, x: &Matrix) -> Matrix {
        let mut cols = Matrix::zeros(
            x.rows * self.out_h * self.out_w,
            self.in_channels * self.kernel_size * self.kernel_size,
        );
        let width = cols.cols;
        self.for_each_tap(x.rows, |row, col, idx| {
            cols.data[row * width + col] = x.data[idx];
        });
        cols
    }

    fn col2im(&self, cols: &Matrix, batch: usize) -> Matrix {
        let mut img = Matrix::zeros(batch, self.in_channels * self.in_h * self.in_w);
        self.for_each_tap(batch, |row, col, idx| {
            img.data[idx] += cols.get(row, col);
        });
        img
    }

    /// `(batch*oh*ow) x oc` -> `batch x (oc, oh, ow)`.
    fn reshape_output(&self, out_cols: &Matrix, batch: usize) -> Matrix {
        let plane = self.out_h * self.out_w;
        let mut out = Matrix::zeros(batch, self.out_channels * plane);
        for b in 0..batch {
            for p in 0..plane {
                let src = out_cols.row(b * plane + p);
                let dst = out.row_mut(b);
                for (oc, &val) in src.iter().enumerate() {
                    dst[oc * plane + p] = val;
                }
            }
        }
        out
    }

    /// Inverse of `reshape_output` for gradients.
    fn gather_grad(&self, grad_out: &Matrix) -> Matrix {
        let plane = self.out_h * self.out_w;
        let mut grad_cols = Matrix::zeros(grad_out.rows * plane, self.out_channels);
        for b in 0..grad_out.rows {
            let src = grad_out.row(b);
            for p in 0..plane {
                let dst = grad_cols.row_mut(b * plane + p);
                for (oc, d) in dst.iter_mut().enumerate() {
                    *d = src[oc * plane + p];
                }
            }
        }
        grad_cols
    }

    pub fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        self.check(x)?;
        let cols = self.im2col(x);
        let out_cols = self.w.forward(&cols)?;
        Ok(self.reshape_output(&out_cols, x.rows))
    }

    pub fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        self.check(x)?;
        let cols = self.im2col(x);
        let out_cols = self.w.forward_train(&cols)?;
        self.last_batch = x.rows;
        Ok(self.reshape_output(&out_cols, x.rows))
    }

    pub fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let grad_cols = self.gather_grad(grad_out);
        let grad_in_cols = self.w.backward(&grad_cols);
        self.col2im(&grad_in_cols, self.last_batch)
    }

    pub fn zero_grad(&mut self) {
        self.w.zero_grad();
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Spatial size of the output feature maps.
    pub fn output_shape(&self) -> (usize, usize) {
        (self.out_h, self.out_w)
    }

    /// Number of features per sample produced by this layer.
    pub fn output_features(&self) -> usize {
        self.out_channels * self.out_h * self.out_w
    }
}

impl Layer for Conv2d {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        Conv2d::forward(self, x)
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        Conv2d::forward_train(self, x)
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        Conv2d::backward(self, grad_out)
    }

    fn zero_grad(&mut self) {
        Conv2d::zero_grad(self);
    }

    fn parameters(&mut self) -> Vec<&mut LinearT> {
        vec![&mut self.w]
    }
}
