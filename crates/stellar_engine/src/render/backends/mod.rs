//! Backend implementations for the render module
//!
//! Device backends implement [`RenderBackend`](super::api::RenderBackend)
//! outside this crate; the headless backend ships with it.

/// State-tracking backend without a device
pub mod headless;

pub use headless::{Command, DrawCall, HeadlessBackend, InjectedFailure, UniformValue};
