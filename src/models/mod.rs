pub mod classifier;
pub mod sequential;

pub use classifier::{flattened_size, AudioClassifier, InputShape, ModelError, NUM_CLASSES};
pub use sequential::Sequential;
