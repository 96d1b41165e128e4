//! # IO Module
//!
//! Adapter layer between the backend's wire rows (`shared` crate) and the
//! domain models. Everything that knows about wire field names, alternate
//! field names or string encodings of dates and statuses lives here.

pub mod mappers;
