// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

/// Send capability: forwards all bytes or fails.
pub type SendFn = Box<dyn FnMut(&[u8]) -> Result<()> + Send>;

/// Receive capability: fills the buffer and returns the number of bytes.
/// Returning `Ok(0)` means that nothing is available.
pub type ReceiveFn = Box<dyn FnMut(&mut [u8]) -> Result<usize> + Send>;

/// A transport assembled from separately installed send and receive
/// capabilities.
///
/// Install both capabilities before the binding is handed to a
/// [`Client`](crate::client::Client); a missing capability makes the
/// corresponding operation fail with [`Error::Transport`].
#[derive(Default)]
pub struct Binding {
    send: Option<SendFn>,
    receive: Option<ReceiveFn>,
}

impl Binding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the send capability.
    pub fn install_send(&mut self, send: Option<SendFn>) -> Result<()> {
        let Some(send) = send else {
            return Err(Error::InvalidArgument);
        };
        self.send = Some(send);
        Ok(())
    }

    /// Replace the receive capability.
    pub fn install_receive(&mut self, receive: Option<ReceiveFn>) -> Result<()> {
        let Some(receive) = receive else {
            return Err(Error::InvalidArgument);
        };
        self.receive = Some(receive);
        Ok(())
    }

    /// Returns `true` if both capabilities are installed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.send.is_some() && self.receive.is_some()
    }
}

impl Transport for Binding {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(send) = self.send.as_mut() else {
            #[cfg(feature = "log")]
            log::error!("No send capability installed");
            return Err(Error::Transport);
        };
        send(bytes).map_err(|_| Error::Transport)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(receive) = self.receive.as_mut() else {
            #[cfg(feature = "log")]
            log::error!("No receive capability installed");
            return Err(Error::Transport);
        };
        match receive(buf) {
            Ok(0) | Err(Error::NoIncomingPackage) => Err(Error::NoIncomingPackage),
            Ok(cnt) => Ok(cnt),
            Err(_) => Err(Error::Transport),
        }
    }
}

impl core::fmt::Debug for Binding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Binding")
            .field("send", &self.send.is_some())
            .field("receive", &self.receive.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn install_absent_capability() {
        let mut binding = Binding::new();
        assert_eq!(binding.install_send(None), Err(Error::InvalidArgument));
        assert_eq!(binding.install_receive(None), Err(Error::InvalidArgument));
        assert!(!binding.is_complete());
    }

    #[test]
    fn operations_without_capabilities() {
        let mut binding = Binding::new();
        assert_eq!(binding.send(&[1, 2, 3]), Err(Error::Transport));
        assert_eq!(binding.receive(&mut [0; 8]), Err(Error::Transport));
    }

    #[test]
    fn forward_to_installed_capabilities() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sent);
        let mut binding = Binding::new();
        binding
            .install_send(Some(Box::new(move |bytes: &[u8]| -> Result<()> {
                sink.lock().unwrap().extend_from_slice(bytes);
                Ok(())
            })))
            .unwrap();
        binding
            .install_receive(Some(Box::new(|buf: &mut [u8]| -> Result<usize> {
                buf[..2].copy_from_slice(&[0xAB, 0xCD]);
                Ok(2)
            })))
            .unwrap();
        assert!(binding.is_complete());

        binding.send(&[1, 2, 3]).unwrap();
        assert_eq!(*sent.lock().unwrap(), vec![1, 2, 3]);

        let buf = &mut [0; 4];
        assert_eq!(binding.receive(buf).unwrap(), 2);
        assert_eq!(buf, &[0xAB, 0xCD, 0, 0]);
    }

    #[test]
    fn reinstall_replaces_capability() {
        let mut binding = Binding::new();
        binding
            .install_send(Some(Box::new(|_: &[u8]| -> Result<()> { Err(Error::Transport) })))
            .unwrap();
        assert_eq!(binding.send(&[0]), Err(Error::Transport));
        binding
            .install_send(Some(Box::new(|_: &[u8]| -> Result<()> { Ok(()) })))
            .unwrap();
        assert_eq!(binding.send(&[0]), Ok(()));
    }

    #[test]
    fn capability_failures() {
        let mut binding = Binding::new();
        binding
            .install_send(Some(Box::new(|_: &[u8]| -> Result<()> { Err(Error::InvalidArgument) })))
            .unwrap();
        binding
            .install_receive(Some(Box::new(|_: &mut [u8]| -> Result<usize> { Ok(0) })))
            .unwrap();
        assert_eq!(binding.send(&[0]), Err(Error::Transport));
        assert_eq!(
            binding.receive(&mut [0; 4]),
            Err(Error::NoIncomingPackage)
        );

        binding
            .install_receive(Some(Box::new(|_: &mut [u8]| -> Result<usize> { Err(Error::RequestTimeout) })))
            .unwrap();
        assert_eq!(binding.receive(&mut [0; 4]), Err(Error::Transport));
    }
}
