use core::fmt;

use thiserror::Error;

/// Errors produced by buffer construction, access, interop and kernel launches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PixelError {
    /// Bad dimensions, area, stride or configuration at construction time.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A checked accessor was called with a coordinate outside the image.
    #[error("index (y={y}, x={x}) out of range for {width}x{height} image")]
    IndexOutOfRange {
        y: usize,
        x: usize,
        width: usize,
        height: usize,
    },

    /// Byte size or pixel format of an external bitmap does not match the color type.
    #[error("format mismatch: {color} expects {expected_bits} bits per pixel ({expected}), got {actual_bits} ({actual})")]
    FormatMismatch {
        color: &'static str,
        expected: String,
        expected_bits: usize,
        actual: String,
        actual_bits: usize,
    },

    /// A color type fails the layout requirements for descriptor computation.
    #[error("type {type_name} is not a valid color: {reason}")]
    TypeError {
        type_name: &'static str,
        reason: String,
    },

    /// One or more rows of a parallel kernel launch faulted.
    #[error("{} kernel row(s) faulted: {}", .faults.len(), FaultList(.faults))]
    AggregatedKernelFault { faults: Vec<KernelFault> },
}

/// A single faulted row of a kernel launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelFault {
    /// Grid row (`y`) the fault occurred in.
    pub row: usize,
    /// Column (`x`) being processed when the fault was raised.
    pub column: usize,
    /// Panic payload or error message.
    pub message: String,
}

impl fmt::Display for KernelFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} col {}: {}", self.row, self.column, self.message)
    }
}

struct FaultList<'a>(&'a [KernelFault]);

impl fmt::Display for FaultList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fault) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{fault}")?;
        }
        Ok(())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = PixelError> = core::result::Result<T, E>;
