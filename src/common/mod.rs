//! Cross-cutting pieces shared by every module: errors and logging.

pub mod error;
pub mod logging;
