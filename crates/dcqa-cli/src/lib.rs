//! Library side of the `dcqa` command line.

pub mod logging;
pub mod outputs;
