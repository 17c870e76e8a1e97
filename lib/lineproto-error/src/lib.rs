//! Error plumbing shared by the application-facing crates.
//!
//! Domain errors (building points, claiming from pools, reading configuration) are modeled as dedicated enums in the
//! crates that produce them. Once those errors cross into setup code, where the only sensible reaction is to report
//! them and stop, they are folded into [`GenericError`] so that context can be layered on top without every caller
//! having to declare its own error type.

use std::fmt::Display;

/// An opaque error carrying a chain of causes.
pub type GenericError = anyhow::Error;

/// Constructs a [`GenericError`].
///
/// Accepts a string literal, a format string with arguments, or an existing value implementing `Display` and `Debug`.
/// When given an existing `std::error::Error`, its source chain is preserved.
#[macro_export]
macro_rules! generic_error {
    ($msg:literal $(,)?) => { $crate::__private_anyhow!($msg) };
    ($err:expr $(,)?) => { $crate::__private_anyhow!($err) };
    ($fmt:expr, $($arg:tt)*) => { $crate::__private_anyhow!($fmt, $($arg)*) };
}

#[doc(hidden)]
pub use anyhow::anyhow as __private_anyhow;

mod sealed {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}

/// Extension methods for attaching context to fallible results.
///
/// This exists instead of re-exporting `anyhow::Context` so it can be imported next to `snafu::ResultExt` without the
/// method names colliding.
pub trait ErrorContext<T, E>: sealed::Sealed {
    /// Wraps the error, if any, with the given context.
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error, if any, with context produced by `f`.
    ///
    /// `f` is only called when the result is an error.
    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    Result<T, E>: anyhow::Context<T, E>,
{
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
    {
        anyhow::Context::context(self, context)
    }

    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        anyhow::Context::with_context(self, f)
    }
}
