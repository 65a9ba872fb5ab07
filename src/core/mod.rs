//! Core data structures: monthly calendar points and the month-keyed dataset.

pub mod dataset;
pub mod month;

pub use dataset::{Dataset, MISSING};
pub use month::Month;
