// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

/// Name of a sensor attached to the MCU (e.g. `temp0`).
pub type SensorName<'r> = &'r str;

/// Number of historical samples to read.
pub type Count = u16;

/// Sampling period in MCU time units.
pub type Period = u16;

/// A request represents a message from the controller to the MCU.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'r> {
    Heartbeat,
    ActualData(SensorName<'r>),
    HistoryData(SensorName<'r>, Count),
    SensorInfo(SensorName<'r>),
    McuInfo,
    SetReadingPeriod(SensorName<'r>, Period),
}

impl<'r> From<Request<'r>> for FunctionCode {
    fn from(r: Request<'r>) -> Self {
        use Request as R;

        match r {
            R::Heartbeat => Self::Heartbeat,
            R::ActualData(_) => Self::GetActualData,
            R::HistoryData(_, _) => Self::GetHistoryData,
            R::SensorInfo(_) => Self::GetSensorInfo,
            R::McuInfo => Self::GetMcuInfo,
            R::SetReadingPeriod(_, _) => Self::SetReadingPeriod,
        }
    }
}

impl<'r> Request<'r> {
    /// The sensor addressed by this request, if any.
    #[must_use]
    pub const fn sensor(&self) -> Option<SensorName<'r>> {
        match *self {
            Self::Heartbeat | Self::McuInfo => None,
            Self::ActualData(name)
            | Self::HistoryData(name, _)
            | Self::SensorInfo(name)
            | Self::SetReadingPeriod(name, _) => Some(name),
        }
    }

    /// Value of the PDU argument field.
    #[must_use]
    pub const fn args(&self) -> Arguments {
        match *self {
            Self::HistoryData(_, count) => count,
            Self::SetReadingPeriod(_, period) => period,
            _ => 0,
        }
    }

    /// Serialize the request specific data into a PDU payload.
    ///
    /// The sensor name is stored NUL terminated, so it must not contain
    /// NUL itself. It returns the number of payload bytes used.
    pub fn encode_payload(&self, payload: &mut Payload) -> Result<usize, Error> {
        let Some(name) = self.sensor() else {
            return Ok(0);
        };
        let name = name.as_bytes();
        if name.len() + 1 > PAYLOAD_CAPACITY || name.contains(&0) {
            return Err(Error::InvalidArgument);
        }
        payload[..name.len()].copy_from_slice(name);
        payload[name.len()] = 0;
        Ok(name.len() + 1)
    }

    /// Build the request PDU.
    pub fn to_pdu(&self) -> Result<Pdu, Error> {
        let mut payload = [0; PAYLOAD_CAPACITY];
        self.encode_payload(&mut payload)?;
        Ok(Pdu {
            function: (*self).into(),
            error: ErrorCode::None,
            args: self.args(),
            payload,
        })
    }
}

fn decode_sensor_name(payload: &Payload) -> Result<SensorName<'_>, Error> {
    let Some(end) = payload.iter().position(|b| *b == 0) else {
        return Err(Error::InvalidArgument);
    };
    if end == 0 {
        return Err(Error::InvalidSensorName);
    }
    core::str::from_utf8(&payload[..end]).map_err(|_| Error::InvalidSensorName)
}

impl<'r> TryFrom<&'r Pdu> for Request<'r> {
    type Error = Error;

    fn try_from(pdu: &'r Pdu) -> Result<Self, Error> {
        use FunctionCode as f;

        let req = match pdu.function {
            f::Heartbeat => Self::Heartbeat,
            f::GetMcuInfo => Self::McuInfo,
            f::GetActualData => Self::ActualData(decode_sensor_name(&pdu.payload)?),
            f::GetHistoryData => Self::HistoryData(decode_sensor_name(&pdu.payload)?, pdu.args),
            f::GetSensorInfo => Self::SensorInfo(decode_sensor_name(&pdu.payload)?),
            f::SetReadingPeriod => {
                Self::SetReadingPeriod(decode_sensor_name(&pdu.payload)?, pdu.args)
            }
        };
        Ok(req)
    }
}
