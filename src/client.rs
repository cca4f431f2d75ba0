// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controller side request engine.
//!
//! Every exchange sends exactly one request ADU and awaits exactly one
//! response ADU. There are no retries at this layer.

use crate::{
    codec::{Checksum, decode, encode},
    error::*,
    frame::*,
    transport::Transport,
};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    thread,
    time::{Duration, Instant},
};

/// Default time to wait for a response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause between two receive attempts that delivered nothing.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Request engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound for awaiting a complete response
    pub timeout: Duration,
    pub checksum: Checksum,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            checksum: Checksum::Crc8,
        }
    }
}

impl Config {
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = checksum;
        self
    }
}

/// Fill `buf` with one ADU from `transport`.
///
/// Returns the number of received bytes, which is less than [`ADU_LEN`]
/// only if the deadline passed. Fails with [`Error::RequestTimeout`]
/// if not a single byte arrived in time.
pub(crate) fn receive_adu<T>(
    transport: &mut T,
    timeout: Duration,
    buf: &mut [u8; ADU_LEN],
) -> Result<usize>
where
    T: Transport + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let mut filled = 0;
    while filled < ADU_LEN {
        let cnt = match transport.receive(&mut buf[filled..]) {
            Ok(cnt) => cnt.min(ADU_LEN - filled),
            Err(Error::NoIncomingPackage) => 0,
            Err(_) => return Err(Error::Transport),
        };
        filled += cnt;
        if filled == ADU_LEN {
            break;
        }
        if Instant::now() >= deadline {
            break;
        }
        if cnt == 0 {
            thread::sleep(POLL_INTERVAL);
        }
    }
    if filled == 0 {
        #[cfg(feature = "log")]
        log::warn!("No response within {timeout:?}");
        return Err(Error::RequestTimeout);
    }
    #[cfg(feature = "log")]
    log::trace!("Received {filled} byte(s): {:X?}", &buf[..filled]);
    Ok(filled)
}

/// A client talking to a single MCU over a [`Transport`].
#[derive(Debug)]
pub struct Client<T> {
    transport: T,
    config: Config,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, Config::default())
    }

    pub const fn with_config(transport: T, config: Config) -> Self {
        Self { transport, config }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send a request PDU and return the decoded response PDU.
    ///
    /// Bytes left over from earlier exchanges are discarded before the
    /// request is sent. A response to another function is rejected with
    /// [`Error::InvalidFunctionCode`].
    ///
    /// Errors reported by the responder are not interpreted here: they
    /// are returned as part of the response PDU.
    pub fn exchange(&mut self, request: &Pdu) -> Result<Pdu> {
        let Config { timeout, checksum } = self.config;
        let adu = encode(request, checksum);
        if let Err(_err) = self.transport.discard_pending() {
            #[cfg(feature = "log")]
            log::error!("Failed to discard pending input: {_err}");
            return Err(Error::Transport);
        }
        #[cfg(feature = "log")]
        log::debug!("Sending request: function = {}, args = {}", request.function, request.args);
        if let Err(_err) = self.transport.send(adu.as_ref()) {
            #[cfg(feature = "log")]
            log::error!("Failed to send request: {_err}");
            return Err(Error::Transport);
        }

        let mut buf = [0; ADU_LEN];
        let cnt = receive_adu(&mut self.transport, timeout, &mut buf)?;
        let response = decode(&buf[..cnt], checksum)?;
        if response.function != request.function {
            #[cfg(feature = "log")]
            log::warn!(
                "Dropping response to function {} while awaiting function {}",
                response.function,
                request.function
            );
            return Err(Error::InvalidFunctionCode(response.function.value()));
        }
        #[cfg(feature = "log")]
        log::debug!(
            "Received response: function = {}, error = {}, args = {}",
            response.function,
            response.error,
            response.args
        );
        Ok(response)
    }

    /// Send a typed request and copy the response payload into `out`.
    ///
    /// It returns the number of bytes written to `out`, which is the
    /// payload capacity or less if `out` is shorter.
    pub fn request(&mut self, request: Request<'_>, out: &mut [u8]) -> Result<usize> {
        let pdu = request.to_pdu()?;
        let response = self.exchange(&pdu)?;
        response.error.into_result()?;
        let cnt = out.len().min(PAYLOAD_CAPACITY);
        out[..cnt].copy_from_slice(&response.payload[..cnt]);
        Ok(cnt)
    }

    pub fn heartbeat(&mut self, out: &mut [u8]) -> Result<usize> {
        self.request(Request::Heartbeat, out)
    }

    /// Read the latest value of a sensor.
    pub fn actual_data(&mut self, sensor: &str, out: &mut [u8]) -> Result<usize> {
        self.request(Request::ActualData(sensor), out)
    }

    /// Read the last `count` values of a sensor.
    pub fn history_data(&mut self, sensor: &str, count: Count, out: &mut [u8]) -> Result<usize> {
        self.request(Request::HistoryData(sensor, count), out)
    }

    pub fn sensor_info(&mut self, sensor: &str, out: &mut [u8]) -> Result<usize> {
        self.request(Request::SensorInfo(sensor), out)
    }

    pub fn mcu_info(&mut self, out: &mut [u8]) -> Result<usize> {
        self.request(Request::McuInfo, out)
    }

    pub fn set_reading_period(
        &mut self,
        sensor: &str,
        period: Period,
        out: &mut [u8],
    ) -> Result<usize> {
        self.request(Request::SetReadingPeriod(sensor, period), out)
    }
}

/// A [`Client`] that can be shared between threads.
///
/// Exchanges are serialized: at most one request is in flight at a time.
#[derive(Debug)]
pub struct SharedClient<T> {
    inner: Arc<Mutex<Client<T>>>,
}

impl<T> Clone for SharedClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SharedClient<T> {
    pub fn new(client: Client<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Client<T>>> {
        self.inner.lock().map_err(|_| {
            #[cfg(feature = "log")]
            log::error!("Client lock poisoned");
            Error::Transport
        })
    }

    pub fn exchange(&self, request: &Pdu) -> Result<Pdu> {
        self.lock()?.exchange(request)
    }

    pub fn request(&self, request: Request<'_>, out: &mut [u8]) -> Result<usize> {
        self.lock()?.request(request, out)
    }
}
