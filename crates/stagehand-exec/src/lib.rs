//! Host execution engine: runs stage steps as shell commands on this machine.

mod error;
pub use error::ExecError;

mod shell;
pub use shell::ShellRunner;

mod util;
