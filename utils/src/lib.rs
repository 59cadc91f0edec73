//! Native audio plumbing for running a live session against real devices.

pub mod audio;
pub mod device;

pub use cpal;
pub use ringbuf;
pub use rubato;
