pub mod adam;

pub use adam::Adam;

use crate::layers::LinearT;

/// Common interface for optimizers operating on linear layers.
pub trait Optimizer {
    /// Update the provided parameters in-place from their accumulated
    /// gradients.
    fn step(&mut self, params: &mut [&mut LinearT]);
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut LinearT]) {
        Adam::step(self, params);
    }
}
