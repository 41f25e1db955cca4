//! User-defined operand that reconfigures a footprint analysis inside a host
//! application, has the host compute it, and reads the X/Y extents back out
//! of the host's text report.

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod printer;
pub mod report;
pub mod utils;

pub use engine::{run_operand, Invocation};
pub use error::{OperandError, ParseError};
pub use report::ResultVector;
