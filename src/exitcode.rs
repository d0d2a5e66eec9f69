//! Exit codes
//!
//! Tree failures exit with the bits of their error set (1..=63), which stays
//! below the BSD sysexits.h range used for everything else.

use crate::domain::TreeErrors;

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (malformed script, failed expectation)
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;

/// Exit code for a failed tree operation.
pub fn tree_failure(errors: TreeErrors) -> i32 {
    match errors.bits() {
        0 => SOFTWARE,
        bits => bits as i32,
    }
}
