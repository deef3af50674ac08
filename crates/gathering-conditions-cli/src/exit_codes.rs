//! Process exit codes.
//! Service errors map through `ServiceError::exit_code`; these cover the rest.

pub const SUCCESS: i32 = 0;
pub const INTERNAL_ERROR: i32 = 3; // Unexpected failure outside the service core
