pub mod consensus;
pub mod solve;
