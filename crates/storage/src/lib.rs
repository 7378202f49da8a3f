#![forbid(unsafe_code)]

pub mod registry;

pub use registry::{ChatLease, SessionRegistry};
