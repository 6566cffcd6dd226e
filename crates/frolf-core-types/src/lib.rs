//! Core types shared across Frolf facilities
//!
//! This crate provides the canonical field keys and event names used by
//! the logging facility and the error facility, so both agree on the shape
//! of structured events.

pub mod schema;
