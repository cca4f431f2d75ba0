// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Packing and unpacking of ADUs

use crate::{error::*, frame::*};
use byteorder::{ByteOrder, LittleEndian};
use core::net::Ipv4Addr;

pub mod checksum;

pub use self::checksum::{crc8, fold_to_u8, pseudo_header_checksum};

/// The algorithm protecting the PDU.
///
/// Both ends of a link have to agree on the same strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Checksum {
    /// CRC-8 over the PDU (serial links).
    #[default]
    Crc8,
    /// Pseudo-header checksum folded into one byte (raw TCP streams).
    PseudoHeader {
        source: Ipv4Addr,
        destination: Ipv4Addr,
    },
}

impl Checksum {
    /// Calculate the trailing checksum byte for the given PDU bytes.
    #[must_use]
    pub fn calculate(&self, pdu: &[u8]) -> u8 {
        match *self {
            Self::Crc8 => crc8(pdu),
            Self::PseudoHeader {
                source,
                destination,
            } => fold_to_u8(pseudo_header_checksum(pdu, source, destination)),
        }
    }
}

/// Pack the PDU fields into an ADU protected by a CRC-8.
pub fn pack(
    function: FunctionCode,
    error: ErrorCode,
    args: Arguments,
    payload: &[u8],
) -> Result<Adu> {
    let pdu = Pdu::new(function, error, args, payload)?;
    Ok(encode(&pdu, Checksum::Crc8))
}

/// Unpack a CRC-8 protected ADU.
pub fn unpack(buf: &[u8]) -> Result<Pdu> {
    decode(buf, Checksum::Crc8)
}

/// Encode a PDU into its ADU using the given checksum strategy.
#[must_use]
pub fn encode(pdu: &Pdu, checksum: Checksum) -> Adu {
    encode_raw(
        pdu.function.value(),
        pdu.error,
        pdu.args,
        &pdu.payload,
        checksum,
    )
}

/// Encode an ADU with a function code that is not necessarily known.
pub(crate) fn encode_raw(
    fn_code: u8,
    error: ErrorCode,
    args: Arguments,
    payload: &Payload,
    checksum: Checksum,
) -> Adu {
    let mut bytes = [0; ADU_LEN];
    bytes[FN_CODE_POS] = fn_code;
    bytes[ERR_CODE_POS] = error as u8;
    LittleEndian::write_u16(&mut bytes[ARGS_POS..PAYLOAD_POS], args);
    bytes[PAYLOAD_POS..CHECKSUM_POS].copy_from_slice(payload);
    bytes[CHECKSUM_POS] = checksum.calculate(&bytes[..PDU_LEN]);
    Adu { bytes }
}

/// Decode an ADU.
///
/// The checksum is verified before any field is interpreted. Bytes
/// following the ADU are ignored.
pub fn decode(buf: &[u8], checksum: Checksum) -> Result<Pdu> {
    if buf.len() < ADU_LEN {
        #[cfg(feature = "log")]
        log::warn!(
            "Incomplete ADU: received {} of {ADU_LEN} byte(s)",
            buf.len()
        );
        return Err(Error::NoIncomingPackage);
    }
    let (pdu_buf, rest) = buf.split_at(PDU_LEN);
    let expected = rest[0];
    let actual = checksum.calculate(pdu_buf);
    if expected != actual {
        #[cfg(feature = "log")]
        log::warn!("Dropping ADU: checksum 0x{expected:0>2X} != 0x{actual:0>2X}");
        return Err(Error::InvalidChecksum(expected, actual));
    }
    let function = FunctionCode::try_from(pdu_buf[FN_CODE_POS])?;
    let error = ErrorCode::try_from(pdu_buf[ERR_CODE_POS])?;
    let args = LittleEndian::read_u16(&pdu_buf[ARGS_POS..PAYLOAD_POS]);
    let mut payload = [0; PAYLOAD_CAPACITY];
    payload.copy_from_slice(&pdu_buf[PAYLOAD_POS..]);
    Ok(Pdu {
        function,
        error,
        args,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> [u8; PAYLOAD_CAPACITY] {
        core::array::from_fn(|i| i as u8 ^ 0x5A)
    }

    #[test]
    fn pack_heartbeat_request() {
        let adu = pack(FunctionCode::Heartbeat, ErrorCode::None, 0, &[]).unwrap();
        assert_eq!(adu.as_bytes().len(), 133);
        assert!(adu.as_bytes().iter().all(|b| *b == 0));
        assert_eq!(adu.checksum(), 0x00);

        let pdu = unpack(adu.as_ref()).unwrap();
        assert_eq!(pdu.function, FunctionCode::Heartbeat);
        assert_eq!(pdu.error, ErrorCode::None);
        assert_eq!(pdu.args, 0);
        assert_eq!(pdu.payload, [0; PAYLOAD_CAPACITY]);
    }

    #[test]
    fn pack_history_data_request() {
        let adu = pack(FunctionCode::GetHistoryData, ErrorCode::None, 5, b"temp0\0").unwrap();
        let bytes = adu.as_bytes();
        assert_eq!(bytes[0], 0x02); // function code
        assert_eq!(bytes[1], 0x00); // error code
        assert_eq!(bytes[2], 0x05); // args lo
        assert_eq!(bytes[3], 0x00); // args hi
        assert_eq!(&bytes[4..10], b"temp0\0");
        assert_eq!(bytes[132], 0x97); // crc
    }

    #[test]
    fn args_are_little_endian() {
        let adu = pack(FunctionCode::SetReadingPeriod, ErrorCode::None, 0xABCD, &[]).unwrap();
        assert_eq!(&adu.as_bytes()[2..4], &[0xCD, 0xAB]);
    }

    #[test]
    fn round_trip() {
        let payload = sample_payload();
        let codes = [
            FunctionCode::Heartbeat,
            FunctionCode::GetActualData,
            FunctionCode::GetHistoryData,
            FunctionCode::GetSensorInfo,
            FunctionCode::GetMcuInfo,
            FunctionCode::SetReadingPeriod,
        ];
        for (i, function) in codes.into_iter().enumerate() {
            let error = ErrorCode::try_from(i as u8).unwrap();
            let args = 0x0101 * i as u16;
            let len = i * 25;
            let adu = pack(function, error, args, &payload[..len]).unwrap();
            let pdu = unpack(adu.as_ref()).unwrap();
            assert_eq!(pdu.function, function);
            assert_eq!(pdu.error, error);
            assert_eq!(pdu.args, args);
            assert_eq!(&pdu.payload[..len], &payload[..len]);
            assert!(pdu.payload[len..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn pack_oversized_payload() {
        let payload = [0; PAYLOAD_CAPACITY + 1];
        assert_eq!(
            pack(FunctionCode::GetMcuInfo, ErrorCode::None, 0, &payload)
                .err()
                .unwrap(),
            Error::InvalidArgument
        );
    }

    #[test]
    fn unpack_short_buffer() {
        let adu = pack(FunctionCode::GetMcuInfo, ErrorCode::None, 1, b"mcu").unwrap();
        for len in 0..ADU_LEN {
            assert_eq!(
                unpack(&adu.as_bytes()[..len]).err().unwrap(),
                Error::NoIncomingPackage
            );
        }
    }

    #[test]
    fn unpack_ignores_trailing_bytes() {
        let adu = pack(FunctionCode::GetMcuInfo, ErrorCode::None, 1, b"mcu").unwrap();
        let mut buf = [0xEE; ADU_LEN + 4];
        buf[..ADU_LEN].copy_from_slice(adu.as_ref());
        assert_eq!(unpack(&buf).unwrap().args, 1);
    }

    #[test]
    fn detect_every_single_bit_error() {
        let payload = sample_payload();
        let adu = pack(FunctionCode::GetActualData, ErrorCode::None, 0x1234, &payload).unwrap();
        for byte in 0..ADU_LEN {
            for bit in 0..8 {
                let mut buf = *adu.as_bytes();
                buf[byte] ^= 1 << bit;
                assert!(
                    matches!(unpack(&buf), Err(Error::InvalidChecksum(_, _))),
                    "undetected bit flip at byte {byte}, bit {bit}"
                );
            }
        }
    }

    #[test]
    fn checksum_is_verified_before_function_code() {
        let adu = pack(FunctionCode::Heartbeat, ErrorCode::None, 0, &[]).unwrap();
        let mut buf = *adu.as_bytes();
        buf[0] = 0x42;
        assert_eq!(unpack(&buf).err().unwrap(), Error::InvalidChecksum(0x00, crc8(&buf[..PDU_LEN])));
    }

    #[test]
    fn unpack_unknown_codes() {
        let payload = [0; PAYLOAD_CAPACITY];
        let adu = encode_raw(0x42, ErrorCode::None, 0, &payload, Checksum::Crc8);
        assert_eq!(
            unpack(adu.as_ref()).err().unwrap(),
            Error::InvalidFunctionCode(0x42)
        );

        let mut buf = [0; ADU_LEN];
        buf[ERR_CODE_POS] = 0x08;
        buf[CHECKSUM_POS] = crc8(&buf[..PDU_LEN]);
        assert_eq!(unpack(&buf).err().unwrap(), Error::InvalidErrorCode(0x08));
    }

    #[test]
    fn responder_error_code_is_kept() {
        let adu = pack(FunctionCode::GetActualData, ErrorCode::InvalidSensorName, 0, &[]).unwrap();
        let pdu = unpack(adu.as_ref()).unwrap();
        assert_eq!(pdu.error, ErrorCode::InvalidSensorName);
    }

    mod pseudo_header {
        use super::*;

        const STRATEGY: Checksum = Checksum::PseudoHeader {
            source: Ipv4Addr::new(127, 0, 0, 1),
            destination: Ipv4Addr::new(127, 0, 0, 1),
        };

        #[test]
        fn trailer_is_folded_checksum() {
            let pdu = Pdu::new(FunctionCode::Heartbeat, ErrorCode::None, 0, &[]).unwrap();
            let adu = encode(&pdu, STRATEGY);
            // 0x0173 folded
            assert_eq!(adu.checksum(), 0x74);
            assert_eq!(decode(adu.as_ref(), STRATEGY).unwrap(), pdu);
        }

        #[test]
        fn strategies_are_not_interchangeable() {
            let pdu = Pdu::new(FunctionCode::Heartbeat, ErrorCode::None, 0, &[]).unwrap();
            let adu = encode(&pdu, STRATEGY);
            assert_eq!(
                decode(adu.as_ref(), Checksum::Crc8).err().unwrap(),
                Error::InvalidChecksum(0x74, 0x00)
            );
        }

        #[test]
        fn detect_every_single_bit_error() {
            let strategy = Checksum::PseudoHeader {
                source: Ipv4Addr::new(10, 0, 0, 1),
                destination: Ipv4Addr::new(10, 0, 0, 2),
            };
            let payload = sample_payload();
            let pdu =
                Pdu::new(FunctionCode::GetActualData, ErrorCode::None, 0x1234, &payload).unwrap();
            let adu = encode(&pdu, strategy);
            assert_eq!(decode(adu.as_ref(), strategy).unwrap(), pdu);
            for byte in 0..ADU_LEN {
                for bit in 0..8 {
                    let mut buf = *adu.as_bytes();
                    buf[byte] ^= 1 << bit;
                    assert!(
                        matches!(decode(&buf, strategy), Err(Error::InvalidChecksum(_, _))),
                        "undetected bit flip at byte {byte}, bit {bit}"
                    );
                }
            }
        }
    }
}
