pub mod lines;
pub mod memory;
pub mod twitter;
