use super::layer::{Layer, LayerError};
use crate::math::Matrix;
use crate::rng::rng_from_env;
use rand::Rng;

// Fully connected layer `y = x·W + b`. During training the last input is
// cached so that `backward` can accumulate weight and bias gradients. The
// struct also owns its Adam moment estimates so optimizer state persists
// across steps without a separate parameter registry.

pub struct LinearT {
    /// Weights, `in_dim x out_dim`.
    pub w: Matrix,
    /// Bias, one entry per output.
    pub b: Vec<f32>,
    grad_w: Matrix,
    grad_b: Vec<f32>,
    m_w: Matrix,
    v_w: Matrix,
    m_b: Vec<f32>,
    v_b: Vec<f32>,
    t: usize,
    last_x: Matrix,
}

impl LinearT {
    /// Create a layer with weights and bias drawn uniformly from
    /// `±1/sqrt(in_dim)`.
    pub fn new(in_dim: usize, out_dim: usize) -> Self {
        let mut rng = rng_from_env();
        Self::with_rng(in_dim, out_dim, &mut rng)
    }

    pub fn with_rng<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_dim.max(1) as f32).sqrt();
        let w = Matrix::from_vec(
            in_dim,
            out_dim,
            (0..in_dim * out_dim)
                .map(|_| rng.gen_range(-bound..bound))
                .collect(),
        );
        let b = (0..out_dim).map(|_| rng.gen_range(-bound..bound)).collect();
        Self {
            w,
            b,
            grad_w: Matrix::zeros(in_dim, out_dim),
            grad_b: vec![0.0; out_dim],
            m_w: Matrix::zeros(in_dim, out_dim),
            v_w: Matrix::zeros(in_dim, out_dim),
            m_b: vec![0.0; out_dim],
            v_b: vec![0.0; out_dim],
            t: 0,
            last_x: Matrix::zeros(0, 0),
        }
    }

    pub fn in_dim(&self) -> usize {
        self.w.rows
    }

    pub fn out_dim(&self) -> usize {
        self.w.cols
    }

    /// Accumulated weight gradient.
    pub fn grad_w(&self) -> &Matrix {
        &self.grad_w
    }

    /// Accumulated bias gradient.
    pub fn grad_b(&self) -> &[f32] {
        &self.grad_b
    }

    fn check(&self, x: &Matrix) -> Result<(), LayerError> {
        if x.cols != self.w.rows {
            return Err(LayerError::ShapeMismatch {
                expected: self.w.rows,
                got: x.cols,
            });
        }
        Ok(())
    }

    fn affine(&self, x: &Matrix) -> Matrix {
        let mut out = Matrix::matmul(x, &self.w);
        for r in 0..out.rows {
            for (o, &b) in out.row_mut(r).iter_mut().zip(self.b.iter()) {
                *o += b;
            }
        }
        out
    }

    pub fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        self.check(x)?;
        Ok(self.affine(x))
    }

    /// Forward pass storing the input for the backward pass.
    pub fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        self.check(x)?;
        self.last_x = x.clone();
        Ok(self.affine(x))
    }

    /// Accumulate `xᵀ·grad_out` into the weight gradient and the column sums
    /// of `grad_out` into the bias gradient; returns `grad_out·Wᵀ`.
    pub fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let grad_w = Matrix::matmul_tn(&self.last_x, grad_out);
        for (g, d) in self.grad_w.data.iter_mut().zip(grad_w.data.iter()) {
            *g += d;
        }
        for r in 0..grad_out.rows {
            for (g, &d) in self.grad_b.iter_mut().zip(grad_out.row(r)) {
                *g += d;
            }
        }
        Matrix::matmul_nt(grad_out, &self.w)
    }

    pub fn zero_grad(&mut self) {
        self.grad_w.data.iter_mut().for_each(|g| *g = 0.0);
        self.grad_b.iter_mut().for_each(|g| *g = 0.0);
    }

    /// Adam update with bias-corrected moments. `weight_decay` is added to
    /// the gradient (L2 style, as `torch.optim.Adam` does).
    pub fn adam_step(&mut self, lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) {
        self.t += 1;
        let bc1 = 1.0 - beta1.powi(self.t as i32);
        let bc2 = 1.0 - beta2.powi(self.t as i32);
        adam_update(
            &mut self.w.data,
            &self.grad_w.data,
            &mut self.m_w.data,
            &mut self.v_w.data,
            (lr, beta1, beta2, eps, weight_decay),
            (bc1, bc2),
        );
        adam_update(
            &mut self.b,
            &self.grad_b,
            &mut self.m_b,
            &mut self.v_b,
            (lr, beta1, beta2, eps, weight_decay),
            (bc1, bc2),
        );
    }
}

fn adam_update(
    params: &mut [f32],
    grads: &[f32],
    m: &mut [f32],
    v: &mut [f32],
    (lr, beta1, beta2, eps, weight_decay): (f32, f32, f32, f32, f32),
    (bc1, bc2): (f32, f32),
) {
    for i in 0..params.len() {
        let g = grads[i] + weight_decay * params[i];
        m[i] = beta1 * m[i] + (1.0 - beta1) * g;
        v[i] = beta2 * v[i] + (1.0 - beta2) * g * g;
        let m_hat = m[i] / bc1;
        let v_hat = v[i] / bc2;
        params[i] -= lr * m_hat / (v_hat.sqrt() + eps);
    }
}

impl Layer for LinearT {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        LinearT::forward(self, x)
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        LinearT::forward_train(self, x)
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        LinearT::backward(self, grad_out)
    }

    fn zero_grad(&mut self) {
        LinearT::zero_grad(self);
    }

    fn parameters(&mut self) -> Vec<&mut LinearT> {
        vec![self]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    #[test]
    fn backward_accumulates_until_zeroed() {
        let mut lin = LinearT::with_rng(3, 2, &mut seeded(1));
        let x = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]);
        let g = Matrix::from_vec(1, 2, vec![1.0, -1.0]);
        lin.forward_train(&x).unwrap();
        lin.backward(&g);
        lin.backward(&g);
        assert_eq!(lin.grad_w().get(2, 0), 6.0);
        assert_eq!(lin.grad_b(), &[2.0, -2.0]);
        lin.zero_grad();
        assert!(lin.grad_w().data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn adam_moves_weights_against_gradient() {
        let mut lin = LinearT::with_rng(1, 1, &mut seeded(2));
        let before = lin.w.data[0];
        let x = Matrix::from_vec(1, 1, vec![1.0]);
        lin.forward_train(&x).unwrap();
        lin.backward(&Matrix::from_vec(1, 1, vec![1.0]));
        lin.adam_step(0.1, 0.9, 0.999, 1e-8, 0.0);
        // first Adam step moves by ~lr in the sign of -grad
        assert!((before - lin.w.data[0] - 0.1).abs() < 1e-4);
    }
}
