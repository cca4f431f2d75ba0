// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::frame::ErrorCode;
use core::fmt;

/// picolink Error
///
/// Every failure of a local operation or a responder-reported error code
/// ends up as exactly one of these variants.
///
/// Variants other than [`Error::Responder`] are detected locally: by the
/// codec, by a transport, or by the responder while decoding a request.
/// An error code received from the MCU is always reported as
/// [`Error::Responder`], never as the local variant of the same name.
/// Both convert to the same [`ErrorCode`] on the wire.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No (complete) package has been received
    NoIncomingPackage,
    /// Sensor name rejected while handling a request (malformed or unknown)
    InvalidSensorName,
    /// Invalid argument(s)
    InvalidArgument,
    /// Unknown function code
    InvalidFunctionCode(u8),
    /// Unknown error code
    InvalidErrorCode(u8),
    /// Checksum mismatch (expected, actual)
    InvalidChecksum(u8, u8),
    /// No response within the configured time
    RequestTimeout,
    /// The underlying transport failed
    Transport,
    /// The responder answered with an error code other than
    /// [`ErrorCode::None`]
    Responder(ErrorCode),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            NoIncomingPackage => write!(f, "No incoming package"),
            InvalidSensorName => write!(f, "Invalid sensor name"),
            InvalidArgument => write!(f, "Invalid argument"),
            InvalidFunctionCode(code) => write!(f, "Invalid function code: 0x{code:0>2X}"),
            InvalidErrorCode(code) => write!(f, "Invalid error code: 0x{code:0>2X}"),
            InvalidChecksum(expected, actual) => write!(
                f,
                "Invalid checksum: expected = 0x{expected:0>2X}, actual = 0x{actual:0>2X}"
            ),
            RequestTimeout => write!(f, "Request timeout"),
            Transport => write!(f, "Transport error"),
            Responder(code) => write!(f, "Responder reported: {code}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
