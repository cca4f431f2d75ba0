// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCU (responder) side.
use crate::{
    client::{Config, receive_adu},
    codec::{decode, encode, encode_raw},
    error::*,
    frame::*,
    transport::Transport,
};

/// Answers decoded requests.
pub trait Handler {
    /// Handle a request.
    ///
    /// On success the response arguments are returned and the response
    /// payload has been written to `payload` (which is zeroed before).
    /// An error is put on the wire as its [`ErrorCode`].
    fn handle(&mut self, request: Request<'_>, payload: &mut Payload) -> Result<Arguments>;
}

impl<F> Handler for F
where
    F: FnMut(Request<'_>, &mut Payload) -> Result<Arguments>,
{
    fn handle(&mut self, request: Request<'_>, payload: &mut Payload) -> Result<Arguments> {
        self(request, payload)
    }
}

/// Serves requests arriving on a [`Transport`].
#[derive(Debug)]
pub struct Server<T> {
    transport: T,
    config: Config,
}

impl<T: Transport> Server<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, Config::default())
    }

    /// `config.timeout` bounds the wait for a single request.
    pub const fn with_config(transport: T, config: Config) -> Self {
        Self { transport, config }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Receive one request, dispatch it and send the response.
    ///
    /// Requests that fail to decode are answered with the matching error
    /// code. Returns the decoding error in that case, or
    /// [`Error::RequestTimeout`] if no request arrived at all.
    pub fn serve_one<H: Handler>(&mut self, handler: &mut H) -> Result<()> {
        let Config { timeout, checksum } = self.config;
        let mut buf = [0; ADU_LEN];
        let cnt = receive_adu(&mut self.transport, timeout, &mut buf)?;
        let empty = [0; PAYLOAD_CAPACITY];

        let pdu = match decode(&buf[..cnt], checksum) {
            Ok(pdu) => pdu,
            Err(Error::NoIncomingPackage) => return Err(Error::NoIncomingPackage),
            Err(err) => {
                #[cfg(feature = "log")]
                log::warn!("Rejecting request: {err}");
                // The function code may be corrupted, echo it anyway.
                let adu = encode_raw(buf[0], err.into(), 0, &empty, checksum);
                self.transport.send(adu.as_ref())?;
                return Err(err);
            }
        };

        let mut payload = [0; PAYLOAD_CAPACITY];
        let (error, args) = match Request::try_from(&pdu)
            .and_then(|request| handler.handle(request, &mut payload))
        {
            Ok(args) => (ErrorCode::None, args),
            Err(err) => {
                #[cfg(feature = "log")]
                log::debug!("Request failed: {err}");
                payload = empty;
                (err.into(), 0)
            }
        };
        let response = Pdu {
            function: pdu.function,
            error,
            args,
            payload,
        };
        self.transport.send(encode(&response, checksum).as_ref())
    }
}
