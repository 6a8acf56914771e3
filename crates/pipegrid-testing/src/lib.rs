//! Testing infrastructure for pipegrid tests.
//!
//! This crate provides utilities for writing readable timeline tests:
//! - `TimelineWorld`: Fluent wrapper around a controller that records emitted stores
//! - `assertions`: Custom assertions over projected cells and stores
//! - `fixtures`: Sample drafts, record builders and a fixed clock

pub mod assertions;
pub mod fixtures;
pub mod world;

pub use world::TimelineWorld;
