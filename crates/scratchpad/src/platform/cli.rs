//! Native platform: embedded RustPython, file-backed storage and a
//! virtual clock for deterministic autosave ticks.

pub mod clock;
pub mod python;
pub mod storage;
