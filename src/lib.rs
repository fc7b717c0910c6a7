pub mod api;
pub mod config;
pub mod consensus;
pub mod error;
pub mod layouts;
pub mod matrix;
pub mod optimizer;
pub mod scorer;
// cmd and reports belong to the binary crate (main.rs).

pub use error::{QapError, QapResult};
