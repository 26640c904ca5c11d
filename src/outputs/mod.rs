//! Output writers.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`DailyBrief`](crate::models::DailyBrief) record
//! - [`text`]: Writes the rendered digest sent to the model (optional)
//!
//! Both overwrite whatever the previous run left behind.

pub mod json;
pub mod text;
