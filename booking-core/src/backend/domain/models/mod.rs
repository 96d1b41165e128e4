//! Domain models for the booking core.
//!
//! These are the validated, strongly-typed counterparts of the wire rows in
//! the `shared` crate. Conversion happens in `io::mappers`.

pub mod booking;
pub mod reservation;
pub mod slot;
pub mod subscription;
pub mod weekday;
