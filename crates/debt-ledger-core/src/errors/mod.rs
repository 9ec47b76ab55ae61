mod model;

pub use model::{ErrorCode, ExitCode, MachineError};
