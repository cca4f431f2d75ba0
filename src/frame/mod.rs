// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

mod request;

pub use self::request::*;
use crate::error::Error;

/// Capacity of the PDU payload buffer.
pub const PAYLOAD_CAPACITY: usize = 128;

/// Size of the PDU on the wire: function code, error code, arguments, payload.
pub const PDU_LEN: usize = 1 + 1 + 2 + PAYLOAD_CAPACITY;

/// Size of the ADU on the wire: PDU plus the trailing checksum byte.
pub const ADU_LEN: usize = PDU_LEN + 1;

// Field offsets within the ADU.
pub(crate) const FN_CODE_POS: usize = 0;
pub(crate) const ERR_CODE_POS: usize = 1;
pub(crate) const ARGS_POS: usize = 2;
pub(crate) const PAYLOAD_POS: usize = 4;
pub(crate) const CHECKSUM_POS: usize = PDU_LEN;

/// Function specific 16 bit argument field (little-endian on the wire).
pub type Arguments = u16;

/// Raw PDU payload
pub type Payload = [u8; PAYLOAD_CAPACITY];

/// A picolink function code.
///
/// It is represented by an unsigned 8 bit integer.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// Function Code: `0` (`0x00`).
    Heartbeat,

    /// Function Code: `1` (`0x01`).
    GetActualData,

    /// Function Code: `2` (`0x02`).
    GetHistoryData,

    /// Function Code: `3` (`0x03`).
    GetSensorInfo,

    /// Function Code: `4` (`0x04`).
    GetMcuInfo,

    /// Function Code: `5` (`0x05`).
    SetReadingPeriod,
}

impl FunctionCode {
    /// Get the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Heartbeat => 0x00,
            Self::GetActualData => 0x01,
            Self::GetHistoryData => 0x02,
            Self::GetSensorInfo => 0x03,
            Self::GetMcuInfo => 0x04,
            Self::SetReadingPeriod => 0x05,
        }
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        let fn_code = match code {
            0x00 => Self::Heartbeat,
            0x01 => Self::GetActualData,
            0x02 => Self::GetHistoryData,
            0x03 => Self::GetSensorInfo,
            0x04 => Self::GetMcuInfo,
            0x05 => Self::SetReadingPeriod,
            _ => return Err(Error::InvalidFunctionCode(code)),
        };
        Ok(fn_code)
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

/// The outcome carried by every PDU.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    None = 0x00,
    NoIncomingPackage = 0x01,
    InvalidSensorName = 0x02,
    InvalidArgument = 0x03,
    InvalidFunctionCode = 0x04,
    InvalidChecksum = 0x05,
    RequestTimeout = 0x06,
    Transport = 0x07,
}

impl ErrorCode {
    const fn get_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::NoIncomingPackage => "No incoming package",
            Self::InvalidSensorName => "Invalid sensor name",
            Self::InvalidArgument => "Invalid argument",
            Self::InvalidFunctionCode => "Invalid function code",
            Self::InvalidChecksum => "Invalid checksum",
            Self::RequestTimeout => "Request timeout",
            Self::Transport => "Transport error",
        }
    }

    /// `Ok(())` for [`ErrorCode::None`], [`Error::Responder`] otherwise.
    pub const fn into_result(self) -> Result<(), Error> {
        match self {
            Self::None => Ok(()),
            code => Err(Error::Responder(code)),
        }
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        use ErrorCode::*;
        let err_code = match code {
            0x00 => None,
            0x01 => NoIncomingPackage,
            0x02 => InvalidSensorName,
            0x03 => InvalidArgument,
            0x04 => InvalidFunctionCode,
            0x05 => InvalidChecksum,
            0x06 => RequestTimeout,
            0x07 => Transport,
            _ => return Err(Error::InvalidErrorCode(code)),
        };
        Ok(err_code)
    }
}

impl From<Error> for ErrorCode {
    fn from(err: Error) -> Self {
        match err {
            Error::NoIncomingPackage => Self::NoIncomingPackage,
            Error::InvalidSensorName => Self::InvalidSensorName,
            Error::InvalidArgument | Error::InvalidErrorCode(_) => Self::InvalidArgument,
            Error::InvalidFunctionCode(_) => Self::InvalidFunctionCode,
            Error::InvalidChecksum(_, _) => Self::InvalidChecksum,
            Error::RequestTimeout => Self::RequestTimeout,
            Error::Transport => Self::Transport,
            Error::Responder(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_name())
    }
}

/// Protocol Data Unit
///
/// The payload is a fixed size buffer. How many bytes of it are used
/// depends on the function code and the arguments.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pdu {
    pub function: FunctionCode,
    pub error: ErrorCode,
    pub args: Arguments,
    pub payload: Payload,
}

impl Pdu {
    /// Create a PDU with a zero padded copy of `payload`.
    pub fn new(
        function: FunctionCode,
        error: ErrorCode,
        args: Arguments,
        payload: &[u8],
    ) -> Result<Self, Error> {
        if payload.len() > PAYLOAD_CAPACITY {
            return Err(Error::InvalidArgument);
        }
        let mut buf = [0; PAYLOAD_CAPACITY];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            function,
            error,
            args,
            payload: buf,
        })
    }
}

/// Application Data Unit: the PDU exactly as laid out on the wire
/// followed by its checksum.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Adu {
    pub(crate) bytes: [u8; ADU_LEN],
}

impl Adu {
    /// The PDU region covered by the checksum.
    #[must_use]
    pub fn pdu_bytes(&self) -> &[u8] {
        &self.bytes[..PDU_LEN]
    }

    /// The trailing checksum byte.
    #[must_use]
    pub const fn checksum(&self) -> u8 {
        self.bytes[CHECKSUM_POS]
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADU_LEN] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Adu {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Adu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adu")
            .field("fn_code", &self.bytes[FN_CODE_POS])
            .field("err_code", &self.bytes[ERR_CODE_POS])
            .field("args", &[self.bytes[ARGS_POS], self.bytes[ARGS_POS + 1]])
            .field("checksum", &self.checksum())
            .finish_non_exhaustive()
    }
}

#[cfg(all(feature = "defmt", target_os = "none"))]
impl defmt::Format for Adu {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Adu {{ fn_code: {}, err_code: {}, checksum: {} }}",
            self.bytes[FN_CODE_POS],
            self.bytes[ERR_CODE_POS],
            self.checksum()
        )
    }
}
