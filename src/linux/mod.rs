//! Linux backend over the `/proc` filesystem

pub mod maps;
pub mod procfs;

pub use procfs::{ProcfsHandle, ProcfsProcessApi};
