//! Pure, deterministic grading logic.
//!
//! Nothing in this module touches the filesystem or spawns processes.

pub mod normalize;
pub mod session;
pub mod toolchain;
