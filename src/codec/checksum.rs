// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checksum algorithms

use byteorder::{BigEndian, ByteOrder};
use core::net::Ipv4Addr;

const CRC8_POLYNOM: u8 = 0x07;
const CRC8_INIT: u8 = 0x00;

/// IP protocol number placed into the pseudo-header.
pub const TCP_PROTOCOL: u8 = 6;

/// Calculate the CRC-8 (polynom `0x07`, init `0x00`, no reflection, no final XOR).
#[must_use]
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for x in data {
        crc ^= *x;
        for _ in 0..8 {
            crc = if (crc & 0x80) != 0 {
                (crc << 1) ^ CRC8_POLYNOM
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Calculate the ones' complement checksum of `data` and a TCP style
/// pseudo-header built from the given addresses.
///
/// The pseudo-header consists of the source and destination address,
/// a zero byte, the protocol number and the data length. All words are
/// read in network byte order, a trailing odd byte is padded with zero.
///
/// The length field is 16 bit wide. Longer `data` is still summed in
/// full, but its length saturates at `u16::MAX`.
#[must_use]
pub fn pseudo_header_checksum(data: &[u8], source: Ipv4Addr, destination: Ipv4Addr) -> u16 {
    let mut hdr = [0; 12];
    hdr[0..4].copy_from_slice(&source.octets());
    hdr[4..8].copy_from_slice(&destination.octets());
    hdr[8] = 0;
    hdr[9] = TCP_PROTOCOL;
    let len = u16::try_from(data.len()).unwrap_or(u16::MAX);
    BigEndian::write_u16(&mut hdr[10..12], len);

    let sum = ones_complement_sum(ones_complement_sum(0, &hdr), data);
    !(fold(sum) as u16)
}

fn ones_complement_sum(mut sum: u32, data: &[u8]) -> u32 {
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum = fold(sum + u32::from(BigEndian::read_u16(word)));
    }
    if let [last] = words.remainder() {
        sum = fold(sum + (u32::from(*last) << 8));
    }
    sum
}

/// Fold a 16 bit ones' complement checksum into a single byte.
///
/// Both bytes are added with end-around carry, so a change of any bit of
/// the summed data changes the result.
#[must_use]
pub const fn fold_to_u8(checksum: u16) -> u8 {
    let mut sum = (checksum >> 8) + (checksum & 0xFF);
    while sum >> 8 != 0 {
        sum = (sum & 0xFF) + (sum >> 8);
    }
    sum as u8
}

/// End-around carry
const fn fold(mut sum: u32) -> u32 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum
}
