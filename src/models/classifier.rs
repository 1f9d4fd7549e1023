use std::fmt;

use thiserror::Error;

use super::sequential::Sequential;
use crate::layers::{conv_output_size, pool_output_size, Conv2d, LayerError, LinearT, MaxPool2d, ReLUT};
use crate::math::{self, Matrix};

const CONV1_CHANNELS: usize = 16;
const CONV2_CHANNELS: usize = 32;
const KERNEL: usize = 3;
const STRIDE: usize = 1;
const PADDING: usize = 1;
const POOL: usize = 2;
const HIDDEN: usize = 128;

/// Number of output logits; class 0 is fake, class 1 is real.
pub const NUM_CLASSES: usize = 2;

/// Spatial size of the single-channel model input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputShape {
    pub height: usize,
    pub width: usize,
}

impl InputShape {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Values per sample in the flattened input row.
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.height, self.width)
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("input {shape} is too small; both sides must be at least 4")]
    InputTooSmall { shape: InputShape },
    #[error(transparent)]
    Layer(#[from] LayerError),
}

fn stage(h: usize) -> Option<usize> {
    let conv = conv_output_size(h, KERNEL, STRIDE, PADDING)?;
    pool_output_size(conv, POOL, POOL)
}

/// Length of the flattened feature vector entering the first dense layer,
/// derived from the conv/pool arithmetic. `None` when the input collapses to
/// nothing before reaching the dense head.
pub fn flattened_size(shape: InputShape) -> Option<usize> {
    let h = stage(stage(shape.height)?)?;
    let w = stage(stage(shape.width)?)?;
    if h == 0 || w == 0 {
        return None;
    }
    Some(CONV2_CHANNELS * h * w)
}

/// Two conv blocks and a two-layer dense head mapping a single-channel
/// `height x width` input to two class logits.
///
/// ```text
/// conv3x3(1->16) relu maxpool2 -> conv3x3(16->32) relu maxpool2
///   -> flatten -> fc(flat->128) relu -> fc(128->2)
/// ```
pub struct AudioClassifier {
    net: Sequential,
    input: InputShape,
    flat: usize,
}

impl AudioClassifier {
    /// Build the network for inputs of `input` size. The dense head's input
    /// width is computed from the shape, so any input of at least 4x4 works.
    pub fn new(input: InputShape) -> Result<Self, ModelError> {
        let flat = flattened_size(input).ok_or(ModelError::InputTooSmall { shape: input })?;

        let conv1 = Conv2d::new(1, CONV1_CHANNELS, KERNEL, STRIDE, PADDING, (input.height, input.width))?;
        let pool1 = MaxPool2d::new(CONV1_CHANNELS, conv1.output_shape(), POOL, POOL)?;
        let conv2 = Conv2d::new(CONV1_CHANNELS, CONV2_CHANNELS, KERNEL, STRIDE, PADDING, pool1.output_shape())?;
        let pool2 = MaxPool2d::new(CONV2_CHANNELS, conv2.output_shape(), POOL, POOL)?;
        debug_assert_eq!(pool2.output_features(), flat);

        let mut net = Sequential::new();
        net.add_layer(Box::new(conv1));
        net.add_layer(Box::new(ReLUT::new()));
        net.add_layer(Box::new(pool1));
        net.add_layer(Box::new(conv2));
        net.add_layer(Box::new(ReLUT::new()));
        net.add_layer(Box::new(pool2));
        net.add_layer(Box::new(LinearT::new(flat, HIDDEN)));
        net.add_layer(Box::new(ReLUT::new()));
        net.add_layer(Box::new(LinearT::new(HIDDEN, NUM_CLASSES)));

        log::debug!("classifier for {input} input, {flat} flattened features");
        Ok(Self { net, input, flat })
    }

    pub fn input_shape(&self) -> InputShape {
        self.input
    }

    pub fn flattened_features(&self) -> usize {
        self.flat
    }

    /// Logits for a `batch x (height*width)` input, without caching.
    pub fn forward(&self, x: &Matrix) -> Result<Matrix, ModelError> {
        Ok(self.net.forward(x)?)
    }

    /// Logits for a training batch; caches activations for `backward`.
    pub fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, ModelError> {
        Ok(self.net.forward_train(x)?)
    }

    pub fn backward(&mut self, grad_logits: &Matrix) -> Matrix {
        self.net.backward(grad_logits)
    }

    pub fn zero_grad(&mut self) {
        self.net.zero_grad();
    }

    pub fn parameters(&mut self) -> Vec<&mut LinearT> {
        self.net.parameters()
    }

    /// Predicted class per row.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>, ModelError> {
        Ok(math::argmax_rows(&self.forward(x)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_size_matches_fixed_28x28_network() {
        assert_eq!(flattened_size(InputShape::new(28, 28)), Some(32 * 7 * 7));
    }

    #[test]
    fn flattened_size_handles_odd_sides() {
        // 128 -> 64 -> 32, 87 -> 43 -> 21
        assert_eq!(flattened_size(InputShape::new(128, 87)), Some(32 * 32 * 21));
        assert_eq!(flattened_size(InputShape::new(3, 100)), None);
        assert_eq!(flattened_size(InputShape::new(4, 4)), Some(32));
    }
}
