//! Router middleware layers.

pub mod logging;
