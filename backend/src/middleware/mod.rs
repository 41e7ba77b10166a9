//! Request middleware.
//!
//! [`Trace`] assigns every request a trace id and echoes it in the
//! `trace-id` response header.

pub mod trace;

pub use trace::Trace;
