use super::linear::LinearT;
use crate::math::Matrix;
use std::fmt;

/// Shape problems detected when a layer is built or fed.
#[derive(Debug, PartialEq)]
pub enum LayerError {
    /// The kernel does not fit inside the padded input.
    KernelTooLarge {
        input: usize,
        kernel: usize,
        padding: usize,
    },
    /// The flattened feature count is not a multiple of the channel count.
    ChannelMismatch { features: usize, in_channels: usize },
    /// The flattened feature count differs from what the layer was built for.
    ShapeMismatch { expected: usize, got: usize },
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::KernelTooLarge {
                input,
                kernel,
                padding,
            } => write!(
                f,
                "kernel {} does not fit input of size {} with padding {}",
                kernel, input, padding
            ),
            LayerError::ChannelMismatch {
                features,
                in_channels,
            } => write!(
                f,
                "input feature count {} is not divisible by in_channels {}",
                features, in_channels
            ),
            LayerError::ShapeMismatch { expected, got } => {
                write!(f, "expected {} input features, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for LayerError {}

/// Common interface for network layers.
///
/// Inputs and outputs are `batch x features` matrices; convolutional layers
/// interpret each row as channel-major `(channels, height, width)` data.
pub trait Layer {
    /// Forward pass used during evaluation. Nothing is cached.
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError>;

    /// Forward pass used during training, caching what `backward` needs.
    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError>;

    /// Backward pass returning gradient with respect to the layer input.
    /// Parameter gradients are accumulated until `zero_grad`.
    fn backward(&mut self, grad_out: &Matrix) -> Matrix;

    /// Zero any accumulated gradients.
    fn zero_grad(&mut self);

    /// Mutable references to the trainable parameters.
    fn parameters(&mut self) -> Vec<&mut LinearT>;
}
