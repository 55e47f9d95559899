//! Command surface: facade, wire protocol and async service

pub mod facade;
pub mod protocol;
pub mod service;

pub use facade::{CommandFacade, FacadeOptions};
pub use protocol::{AttachTarget, Command, CommandOutput, Request, Response};
pub use service::{CommandService, ServeExit};
