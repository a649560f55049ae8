use kernel::KernelError;

use crate::error::ConvertError;

pub mod database;
pub mod error;
pub mod system;

pub(crate) fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key)
        .convert_error()
        .map_err(|report| report.attach_printable(format!("missing environment variable {key}")))
}
