pub mod logging;

pub use logging::{init_stdout_logger, StdoutLogger};

// Re-export log so downstream crates can use whisker_base::log::*
pub use log;
