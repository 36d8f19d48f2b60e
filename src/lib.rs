//! DHT Sensor Family Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11, DHT21 and
//! DHT22 temperature and humidity sensors, plus the ITEAD Si7021 in its
//! DHT-compatible mode, built on top of the [`embedded-hal`] traits.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Built-in rate limiting: calls within two seconds of the previous bus
//!   transaction are served from the cached result
//! - Cumulative per-handle statistics: attempts, successes, cache hits and
//!   time spent on successful reads
//! - Optional masking of interrupts around the timing-critical part of the
//!   protocol via the `critical-section` crate
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access
//! - [`DelayNs`] for accurate timing
//!
//! Two concerns of the protocol are not covered by `embedded-hal`, so the
//! integrator implements two small traits from this crate:
//! - [`IoPin`] to switch the data line between input-with-pull-up and
//!   output mode
//! - [`MonotonicClock`] for the microsecond timestamps behind rate
//!   limiting and statistics
//!
//! The driver busy-polls the data line once per microsecond; the
//! [`DelayNs`] implementation must offer true microsecond resolution or
//! the decoded bits will be corrupted.
//!
//! # Optional Features
//! - `critical-section` (default): run the timing-critical window inside
//!   [`critical_section::with`], so preemption cannot stretch the polling
//!   loops and the interrupt state is restored on every exit path
//! - `defmt`: Implements `defmt::Format` for logging support
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs
//! [`critical_section::with`]: https://docs.rs/critical-section

#![cfg_attr(not(test), no_std)]

pub mod dht;
pub mod error;
pub mod hal;

pub use dht::{Dht, SensorType, Stats};
pub use error::DhtError;
pub use hal::{IoPin, MonotonicClock};

/// Readiness hook for host frameworks that gate sensor startup on an
/// explicit module-init step. The driver keeps no global state, so there is
/// nothing to set up.
pub fn module_init() -> bool {
    true
}
