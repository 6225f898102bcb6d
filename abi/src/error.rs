//! Error types shared between the runtime and the interpreter
//!
//! Operational errors carry the legacy platform's own numbering so the
//! interpreter can hand them to scripts unchanged. Programming faults (core
//! bugs) live in their own types and never collapse into these codes.

use core::fmt;

/// Implement common methods for legacy error enums.
///
/// Generates `as_c_int()`, `from_c_int()` and `description()` for
/// `#[repr(i32)]` error enums that follow the platform's error convention.
macro_rules! impl_opl_error {
    ($ty:ty, fallback: $fallback:ident, variants: { $($val:literal => $variant:ident : $text:literal),* $(,)? }) => {
        impl $ty {
            /// Convert to the legacy integer code.
            #[inline]
            pub fn as_c_int(self) -> i32 {
                self as i32
            }

            /// Convert from the legacy integer code.
            #[inline]
            pub fn from_c_int(val: i32) -> Self {
                match val {
                    $($val => Self::$variant,)*
                    _ => Self::$fallback,
                }
            }

            /// Message text as the platform reports it.
            pub fn description(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} ({})", self.description(), self.as_c_int())
            }
        }
    };
}

/// Result type for operations that can fail with a legacy error code
pub type OplResult<T = ()> = Result<T, OplError>;

/// Errors surfaced to the interpreter. Values must not change.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OplError {
    GeneralFail = -1,
    InvalidArgs = -2,
    OsError = -3,
    NotSupported = -4,
    OutOfRange = -7,
    InUse = -9,
    NoMemory = -10,
    FontNotLoaded = -21,
    AlreadyExists = -32,
    NotExists = -33,
    WriteFailed = -34,
    ReadFailed = -35,
    EndOfFile = -36,
    DiskFull = -37,
    InvalidName = -38,
    AccessDenied = -39,
    /// Drawable id does not name an open window or bitmap
    DrawNotOpen = -118,
    /// Drawable exists but is not a window
    InvalidWindow = -119,
}

impl_opl_error!(OplError, fallback: GeneralFail, variants: {
    -1 => GeneralFail: "General failure",
    -2 => InvalidArgs: "Invalid arguments",
    -3 => OsError: "O/S error",
    -4 => NotSupported: "Service not supported",
    -7 => OutOfRange: "Out of range",
    -9 => InUse: "In use",
    -10 => NoMemory: "No system memory",
    -21 => FontNotLoaded: "Font not loaded",
    -32 => AlreadyExists: "File already exists",
    -33 => NotExists: "File does not exist",
    -34 => WriteFailed: "Write failed",
    -35 => ReadFailed: "Read failed",
    -36 => EndOfFile: "End of file",
    -37 => DiskFull: "Disk full",
    -38 => InvalidName: "Invalid name",
    -39 => AccessDenied: "Access denied",
    -118 => DrawNotOpen: "Drawable not open",
    -119 => InvalidWindow: "Invalid window",
});

impl std::error::Error for OplError {}

/// Invariant violations inside the scheduler. These indicate a bug in the
/// runtime or its caller, never bad script input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerFault {
    /// Handle already registered and still pending
    DuplicateRequest(i32),
    /// Completion delivered twice for the same request
    AlreadyCompleted(i32),
    /// A GETEVENT or KEYA request is already outstanding
    ExclusiveRequestPending(i32),
    /// Completion for a handle that was never registered
    UnknownRequest(i32),
}

impl SchedulerFault {
    pub fn handle(self) -> i32 {
        match self {
            Self::DuplicateRequest(h)
            | Self::AlreadyCompleted(h)
            | Self::ExclusiveRequestPending(h)
            | Self::UnknownRequest(h) => h,
        }
    }
}

impl fmt::Display for SchedulerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRequest(h) => write!(f, "request {} registered twice", h),
            Self::AlreadyCompleted(h) => write!(f, "request {} completed twice", h),
            Self::ExclusiveRequestPending(h) => {
                write!(f, "request {} conflicts with a pending input wait", h)
            }
            Self::UnknownRequest(h) => write!(f, "request {} is not registered", h),
        }
    }
}

impl std::error::Error for SchedulerFault {}

/// Bitmap data that cannot describe the pixels it claims to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    InvalidBitmap,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBitmap => f.write_str("invalid bitmap dimensions"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for OplError {
    fn from(_: CodecError) -> Self {
        OplError::InvalidArgs
    }
}
