pub mod audio;
pub mod cli;
pub mod config;
pub mod data;
pub mod features;
pub mod layers;
pub mod logging;
pub mod math;
pub mod metrics;
pub mod models;
pub mod optim;
pub mod pipeline;
pub mod rng;
pub mod train;
pub mod util;
