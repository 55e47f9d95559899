//! Windows backend for process and memory access
//!
//! All unsafe FFI calls are contained within this module. Handles are
//! opened with read, write, operation and query rights only.

pub mod api;
pub mod bindings;
pub mod types;
pub mod utils;

pub use api::Win32ProcessApi;
pub use types::Handle;
pub use utils::ErrorCode;
