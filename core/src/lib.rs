//! Warden Core Types
//!
//! This crate provides the foundational types shared by every layer of the
//! trigger subsystem:
//! - Value types (the `Value` enum with scalar and collection variants)
//! - Records (ordered field maps) and their JSON conversion
//! - Table identifiers, primary keys and trigger event kinds
//! - The `Clock` abstraction used for timestamps

mod clock;
mod event;
mod record;
mod value;

pub use clock::*;
pub use event::*;
pub use record::*;
pub use value::*;
