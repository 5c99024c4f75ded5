//! Serial link to the co-processor
//!
//! The runtime only needs three things from the link: write a frame, read
//! whatever bytes have already arrived, and throw away buffered bytes after
//! a peer restart. `ByteLink` captures that so tests can drive the runtime
//! with an in-memory link.

pub mod port;

use thiserror::Error;

use lumawall_protocol::LinkWriter;

pub use port::{list_ports, PortConfig, PortInfo, SerialLink};

/// Serial link errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// The port could not be opened
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },
    /// Port control operation failed
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    /// Read or write failed
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bidirectional byte link with non-blocking reads
pub trait ByteLink: LinkWriter {
    /// Read bytes that have already arrived, without waiting
    ///
    /// Returns 0 when nothing is pending.
    fn read_available(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    /// Discard everything buffered by the OS in both directions
    fn discard_input(&mut self) -> Result<(), Self::Error>;
}
