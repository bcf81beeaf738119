pub mod cli;
pub mod config;
pub mod construct;
pub mod ctx;
pub mod deltas;
pub mod error;
pub mod io;
pub mod labels;
pub mod math;
pub mod metrics;
pub mod pipeline;
pub mod ranking;
pub mod sampler;
pub mod schema;
pub mod volume;
