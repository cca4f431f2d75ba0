// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Byte transports
//!
//! The protocol engine moves bytes only through the two operations of
//! the [`Transport`] trait. Implementations own their blocking and
//! timeout behaviour.

use crate::error::*;

#[cfg(feature = "std")]
mod binding;
#[cfg(feature = "std")]
pub mod memory;
#[cfg(feature = "serial")]
pub mod serial;
#[cfg(feature = "std")]
pub mod tcp;

#[cfg(feature = "std")]
pub use self::binding::*;

/// A bidirectional byte channel to an MCU.
pub trait Transport {
    /// Send all `bytes`.
    ///
    /// Failures are reported as [`Error::Transport`].
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive up to `buf.len()` bytes and return how many were written.
    ///
    /// Returns [`Error::NoIncomingPackage`] if nothing arrived within the
    /// transport's own waiting period and [`Error::Transport`] if the
    /// channel failed.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Drop all bytes that already arrived, without waiting for more.
    ///
    /// Called before a request is sent, so that a late response to an
    /// earlier request is not taken as the answer. Transports that cannot
    /// tell pending bytes apart keep the default, which does nothing.
    fn discard_pending(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive(buf)
    }

    fn discard_pending(&mut self) -> Result<()> {
        (**self).discard_pending()
    }
}

#[cfg(feature = "std")]
impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive(buf)
    }

    fn discard_pending(&mut self) -> Result<()> {
        (**self).discard_pending()
    }
}
