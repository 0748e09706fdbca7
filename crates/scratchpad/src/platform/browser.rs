//! Browser platform. Storage and timers belong to the page (`localStorage`
//! and `zoon::Timer` in the playground); this module only binds the runtime.

pub mod pyodide;
