// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw TCP transport

use super::*;
use crate::codec::Checksum;
use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

/// A transport on top of a raw TCP byte stream.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to `addr`. `timeout` bounds every single read.
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream, timeout)
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream, timeout: Duration) -> io::Result<Self> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// The pseudo-header checksum strategy for this connection.
    ///
    /// Returns `None` unless both ends use IPv4 addresses.
    pub fn pseudo_header(&self) -> io::Result<Option<Checksum>> {
        let local = self.stream.local_addr()?;
        let peer = self.stream.peer_addr()?;
        let checksum = match (local, peer) {
            (SocketAddr::V4(local), SocketAddr::V4(peer)) => Some(Checksum::PseudoHeader {
                source: *local.ip(),
                destination: *peer.ip(),
            }),
            _ => None,
        };
        Ok(checksum)
    }

    #[must_use]
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).map_err(|_err| {
            #[cfg(feature = "log")]
            log::error!("Failed to send {} byte(s): {_err}", bytes.len());
            Error::Transport
        })
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.stream.read(buf) {
            Ok(0) => {
                #[cfg(feature = "log")]
                log::error!("Connection closed by peer");
                Err(Error::Transport)
            }
            Ok(cnt) => Ok(cnt),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                Err(Error::NoIncomingPackage)
            }
            Err(_err) => {
                #[cfg(feature = "log")]
                log::error!("Failed to receive: {_err}");
                Err(Error::Transport)
            }
        }
    }

    fn discard_pending(&mut self) -> Result<()> {
        self.stream
            .set_nonblocking(true)
            .map_err(|_| Error::Transport)?;
        let mut buf = [0; 64];
        let mut discarded = 0;
        let res = loop {
            match self.stream.read(&mut buf) {
                Ok(0) => break Err(Error::Transport),
                Ok(cnt) => discarded += cnt,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break Err(Error::Transport),
            }
        };
        if discarded > 0 {
            #[cfg(feature = "log")]
            log::warn!("Discarded {discarded} stale byte(s)");
        }
        self.stream
            .set_nonblocking(false)
            .map_err(|_| Error::Transport)?;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{net::TcpListener, thread};

    #[test]
    fn exchange_bytes_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let peer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0; 3];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&[buf[2], buf[1], buf[0]]).unwrap();
        });

        let mut transport = TcpTransport::connect(addr, Duration::from_secs(2)).unwrap();
        transport.send(&[1, 2, 3]).unwrap();
        let mut buf = [0; 8];
        let mut cnt = 0;
        while cnt < 3 {
            cnt += transport.receive(&mut buf[cnt..]).unwrap();
        }
        assert_eq!(&buf[..3], &[3, 2, 1]);
        peer.join().unwrap();

        assert_eq!(transport.receive(&mut buf), Err(Error::Transport));
    }

    #[test]
    fn read_timeout_means_no_package() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut transport = TcpTransport::connect(addr, Duration::from_millis(10)).unwrap();
        let _peer = listener.accept().unwrap();
        assert_eq!(
            transport.receive(&mut [0; 8]),
            Err(Error::NoIncomingPackage)
        );
    }

    #[test]
    fn discard_pending_input() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut transport = TcpTransport::connect(addr, Duration::from_millis(20)).unwrap();
        let (mut peer, _) = listener.accept().unwrap();

        peer.write_all(&[0xEE; 100]).unwrap();
        thread::sleep(Duration::from_millis(50));
        transport.discard_pending().unwrap();
        assert_eq!(
            transport.receive(&mut [0; 8]),
            Err(Error::NoIncomingPackage)
        );

        peer.write_all(&[1, 2]).unwrap();
        let buf = &mut [0; 8];
        let mut cnt = 0;
        while cnt < 2 {
            match transport.receive(&mut buf[cnt..]) {
                Ok(n) => cnt += n,
                Err(Error::NoIncomingPackage) => {}
                Err(err) => panic!("{err}"),
            }
        }
        assert_eq!(&buf[..2], &[1, 2]);
    }

    #[test]
    fn pseudo_header_from_socket_addresses() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let transport = TcpTransport::connect(addr, Duration::from_secs(1)).unwrap();
        let localhost = std::net::Ipv4Addr::LOCALHOST;
        assert_eq!(
            transport.pseudo_header().unwrap(),
            Some(Checksum::PseudoHeader {
                source: localhost,
                destination: localhost,
            })
        );
    }
}
