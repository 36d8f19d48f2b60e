/// Possible errors from the DHT driver.
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor never acknowledged the start signal.
    NotResponding,
    /// Timed out waiting for a pin state change during data transfer.
    Timeout,
    /// Checksum did not match the received data.
    ChecksumMismatch,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}
