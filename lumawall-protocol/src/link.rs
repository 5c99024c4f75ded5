//! Byte sink abstraction for the outbound half of the link

/// Write side of a serial link
///
/// Implemented by the host's serial port and by the co-processor's UART
/// transmitter. Only one owner writes at a time; callers never interleave
/// partial frames.
pub trait LinkWriter {
    /// Error type for write failures
    type Error: core::fmt::Debug;

    /// Write all bytes, blocking until they are queued for transmission
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered bytes
    fn flush(&mut self) -> Result<(), Self::Error>;
}
