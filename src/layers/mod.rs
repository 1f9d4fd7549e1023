pub mod conv;
pub mod layer;
pub mod linear;
pub mod pooling;
pub mod relu;

pub use conv::{conv_output_size, Conv2d};
pub use layer::{Layer, LayerError};
pub use linear::LinearT;
pub use pooling::{max_pool2d, pool_output_size, MaxPool2d};
pub use relu::ReLUT;
