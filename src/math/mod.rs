pub mod pool;
pub mod stats;
