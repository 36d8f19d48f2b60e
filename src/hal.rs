//! Traits the integrator must implement on top of `embedded-hal`.

use embedded_hal::digital::{InputPin, OutputPin};

/// A GPIO pin that can be switched between input and output mode.
///
/// `embedded-hal` has no trait for reconfiguring a pin's direction or pull
/// resistor, so the HAL-specific pin type needs a small wrapper implementing
/// this (e.g. around `rppal`'s `IoPin` or `esp-hal`'s `Flex`).
pub trait IoPin: InputPin + OutputPin {
    /// Configures the pin as input with the internal pull-up enabled.
    fn set_input_pullup(&mut self) -> Result<(), Self::Error>;

    /// Configures the pin as output.
    fn set_output(&mut self) -> Result<(), Self::Error>;
}

/// A monotonic time source with microsecond resolution.
pub trait MonotonicClock {
    /// Returns the microseconds elapsed since some fixed epoch, typically
    /// boot. The value must never decrease.
    fn now_us(&self) -> u64;
}
