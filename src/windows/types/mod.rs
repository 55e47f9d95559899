//! Windows type wrappers

pub mod handle;

pub use handle::Handle;
