//! Process attachment and raw cross-process memory access
//!
//! This module provides the [`ProcessApi`] capability trait implemented by
//! each OS backend, the [`ProcessSession`] that owns the single live
//! attachment, and an in-memory backend for tests.

pub mod api;
#[doc(hidden)]
pub mod mock;
pub mod session;

pub use api::ProcessApi;
pub use session::{ProcessSession, RegionWalker};

/// The OS backend for the platform this crate was built for
#[cfg(target_os = "linux")]
pub type NativeProcessApi = crate::linux::ProcfsProcessApi;

/// The OS backend for the platform this crate was built for
#[cfg(windows)]
pub type NativeProcessApi = crate::windows::Win32ProcessApi;

/// Whether this build carries a native OS backend
pub const fn has_native_backend() -> bool {
    cfg!(any(target_os = "linux", windows))
}
