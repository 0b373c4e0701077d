//! Host window system implementations.
//!
//! This module provides concrete backends for the
//! [`WindowSystem`](crate::traits::WindowSystem) trait.
//!
//! Nothing outside this module should reference a concrete host directly.

pub mod headless;
