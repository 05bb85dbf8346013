//! Input data.
//!
//! Candidate rows arrive as a CSV written by the upstream odds/model
//! pipeline; this crate never fetches odds itself.

pub mod candidates;
