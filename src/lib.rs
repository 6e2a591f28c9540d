pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

pub use error::{AuthError, AuthResult};

// Stderr trace for store and provider internals (stale writes, event fan-out).
// Prints in tests and debug builds only.
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// Release builds: arguments are still type-checked, nothing is printed.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}
