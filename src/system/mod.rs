//! System-level modules
//!
//! Process-wide facilities that sit below the runtime: currently the
//! tracing subscriber setup.

pub mod logging;

pub use logging::init_logging;
