// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! UART transport

use super::*;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::{
    io::{self, Read, Write},
    time::Duration,
};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Serial port settings (8N1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`
    pub path: String,
    pub baud_rate: u32,
    /// Upper bound of a single read
    pub timeout: Duration,
}

impl SerialConfig {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A transport on top of a serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn open(config: &SerialConfig) -> serialport::Result<Self> {
        let port = serialport::new(config.path.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.timeout)
            .open()?;
        #[cfg(feature = "log")]
        log::debug!("Opened {} at {} baud", config.path, config.baud_rate);
        Ok(Self { port })
    }

    /// Wrap an already opened port.
    #[must_use]
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl core::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.port.name())
            .finish()
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .and_then(|()| self.port.flush())
            .map_err(|_err| {
                #[cfg(feature = "log")]
                log::error!("Failed to write {} byte(s): {_err}", bytes.len());
                Error::Transport
            })
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(0) => Err(Error::NoIncomingPackage),
            Ok(cnt) => Ok(cnt),
            Err(err) if matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                Err(Error::NoIncomingPackage)
            }
            Err(_err) => {
                #[cfg(feature = "log")]
                log::error!("Failed to read: {_err}");
                Err(Error::Transport)
            }
        }
    }

    fn discard_pending(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(|_err| {
            #[cfg(feature = "log")]
            log::error!("Failed to clear input buffer: {_err}");
            Error::Transport
        })
    }
}
