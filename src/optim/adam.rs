use crate::layers::LinearT;

/// Adam optimiser. Moment estimates live inside each [`LinearT`], so this
/// struct only carries hyper-parameters.
#[derive(Clone, Debug)]
pub struct Adam {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    pub weight_decay: f32,
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) -> Self {
        Self { lr, beta1, beta2, eps, weight_decay }
    }

    /// `torch.optim.Adam` defaults with the given learning rate.
    pub fn with_lr(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, 0.0)
    }

    pub fn step(&mut self, params: &mut [&mut LinearT]) {
        for p in params.iter_mut() {
            p.adam_step(self.lr, self.beta1, self.beta2, self.eps, self.weight_decay);
        }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::with_lr(1e-3)
    }
}
