#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Runtime value model for snapshoot.
//!
//! A [`Value`] is the actual value a test observed when its snapshot matcher
//! was called without an expected argument. Values are later turned into
//! source literals by the serializer in `snapshoot-lib`.
//!
//! Two ways to build one:
//! - **Directly**: `From` conversions and the [`Value`] constructors
//! - **From any `Serialize` type**: [`to_value`] walks the serde data model

mod capture;
mod reflect;
mod value;

#[cfg(test)]
mod capture_tests;
#[cfg(test)]
mod value_tests;

pub use capture::{CaptureError, to_value};
pub use reflect::{Convention, Record, Reflect};
pub use value::Value;
