//! Prism Core - Core types and utilities for the Prism demo
//!
//! This crate provides the foundational types shared by the other crates:
//! - Mathematical primitives (re-exported from glam)
//! - Transform and color types
//! - Frame time tracking for the component lifecycle

pub mod time;
pub mod types;

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use time::{FrameTime, TimeConfig};
pub use types::{Color, ObjectId, Transform};
