pub mod migrate;
pub mod stats;
pub mod user;
