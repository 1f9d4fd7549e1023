pub mod dataloader;
pub mod dataset;
pub mod layout;
pub mod split;

pub use dataloader::{Batch, DataLoader, LoaderError};
pub use dataset::{build_feature_set, Dataset, Excluded, ExtractFailure, FeatureSet};
pub use layout::InputLayout;
pub use split::{split_dataset, train_test_split, DatasetSplit, SplitConfig, SplitError};
