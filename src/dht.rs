use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};

#[cfg(feature = "critical-section")]
use critical_section::with;
#[cfg(not(feature = "critical-section"))]
fn with<R>(f: impl FnOnce(()) -> R) -> R {
    f(())
}

use crate::error::DhtError;
use crate::hal::{IoPin, MonotonicClock};

/// Minimum time between two physical bus transactions, in microseconds.
/// Calls arriving sooner are served from the cached result.
const MIN_READ_INTERVAL_US: u64 = 2_000_000;

/// Maximum time to wait (in microseconds) for each of the sensor's two
/// acknowledgment edges, which nominally arrive after 80 microseconds.
const ACK_TIMEOUT_US: u32 = 90;

/// Maximum time to wait (in microseconds) for a single pulse edge during
/// the 40-bit data transfer.
const PULSE_TIMEOUT_US: u32 = 500;

/// The supported sensor variants.
///
/// All variants speak the same single-wire protocol; they differ in the
/// length of the initiation pulse and in how the raw bytes map to physical
/// units.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorType {
    /// DHT11: integer-valued readings.
    Dht11,
    /// DHT21 (AM2301): readings in tenths.
    Dht21,
    /// DHT22 (AM2302): readings in tenths.
    Dht22,
    /// ITEAD Si7021 in DHT-compatible mode: readings in tenths, but the
    /// sensor expects a much shorter initiation pulse.
    Si7021,
}

impl SensorType {
    /// Converts the raw data bytes into degrees Celsius.
    ///
    /// The DHT11 reports whole degrees in byte 2. The other variants report
    /// tenths of a degree as a 15-bit big-endian value, with bit 7 of byte 2
    /// acting as the sign bit for sub-zero temperatures.
    fn temperature_from(self, data: &[u8; 5]) -> f32 {
        match self {
            SensorType::Dht11 => f32::from(data[2]),
            _ => {
                let tenths = u16::from_be_bytes([data[2] & 0x7F, data[3]]);
                let temperature = f32::from(tenths) / 10.0;
                if data[2] & 0x80 != 0 {
                    -temperature
                } else {
                    temperature
                }
            }
        }
    }

    /// Converts the raw data bytes into percent relative humidity.
    fn humidity_from(self, data: &[u8; 5]) -> f32 {
        match self {
            SensorType::Dht11 => f32::from(data[0]),
            _ => f32::from(u16::from_be_bytes([data[0], data[1]])) / 10.0,
        }
    }
}

/// Cumulative counters for one sensor handle.
///
/// Updated only by the read path and never reset; [`Dht::stats`] returns a
/// snapshot copy.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Total calls into the read routine, including cache hits.
    pub reads: u32,
    /// Fresh reads that passed checksum validation.
    pub successes: u32,
    /// Calls served from the cached result by the rate limiter.
    pub cached: u32,
    /// Cumulative wall-clock microseconds spent on successful fresh reads.
    pub success_time_us: u64,
    /// Timestamp of the most recent fresh attempt, `None` before the first.
    pub last_attempt_us: Option<u64>,
}

/// Driver for one DHT-family sensor bound to one GPIO pin.
///
/// A read blocks and busy-waits for the full protocol duration, tens of
/// milliseconds. The handle holds no lock; callers must serialize reads per
/// handle.
pub struct Dht<PIN, DELAY, CLOCK> {
    pin: PIN,
    delay: DELAY,
    clock: CLOCK,
    sensor: SensorType,
    data: [u8; 5],
    last_result: bool,
    stats: Stats,
}

impl<PIN, DELAY, CLOCK, E> Dht<PIN, DELAY, CLOCK>
where
    PIN: IoPin + InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    CLOCK: MonotonicClock,
{
    /// Creates a driver for the given data line, configuring it as input
    /// with pull-up so the idle level is high.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the sensor's data line.
    /// * `delay` - A delay provider implementing [`DelayNs`]. It must offer
    ///   true microsecond resolution, or the polling loops will misdecode
    ///   the bitstream.
    /// * `clock` - The monotonic time source behind rate limiting and
    ///   statistics.
    /// * `sensor` - The sensor variant on the line.
    ///
    /// # Errors
    ///
    /// Returns `DhtError::PinError` if the initial pin configuration fails;
    /// no handle is produced in that case.
    pub fn new(
        mut pin: PIN,
        delay: DELAY,
        clock: CLOCK,
        sensor: SensorType,
    ) -> Result<Self, DhtError<E>> {
        pin.set_input_pullup()?;
        Ok(Dht {
            pin,
            delay,
            clock,
            sensor,
            data: [0; 5],
            last_result: false,
            stats: Stats::default(),
        })
    }

    /// Releases the handle, returning the pin, delay and clock.
    pub fn release(self) -> (PIN, DELAY, CLOCK) {
        (self.pin, self.delay, self.clock)
    }

    /// Reads the temperature in degrees Celsius.
    ///
    /// Triggers a bus transaction unless one happened within the last two
    /// seconds, in which case the cached bytes are reused. Returns NaN when
    /// no valid reading is available; miss-reads are expected under
    /// electrical noise or marginal wiring, so treat NaN as "no reading this
    /// cycle" and retry later.
    pub fn temperature(&mut self) -> f32 {
        if self.refresh() {
            self.sensor.temperature_from(&self.data)
        } else {
            f32::NAN
        }
    }

    /// Reads the relative humidity in percent.
    ///
    /// Same contract as [`Self::temperature`].
    pub fn humidity(&mut self) -> f32 {
        if self.refresh() {
            self.sensor.humidity_from(&self.data)
        } else {
            f32::NAN
        }
    }

    /// Returns a snapshot of the cumulative counters.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// One call of the read routine: serve the cached result if the last
    /// fresh attempt is under two seconds old, otherwise run a full bus
    /// transaction and update the counters.
    fn refresh(&mut self) -> bool {
        let start = self.clock.now_us();
        self.stats.reads += 1;
        if let Some(last) = self.stats.last_attempt_us {
            if start - last < MIN_READ_INTERVAL_US {
                self.stats.cached += 1;
                return self.last_result;
            }
        }
        self.stats.last_attempt_us = Some(start);
        self.last_result = false;
        self.data = [0; 5];

        if self.transfer().is_ok() {
            self.last_result = true;
            self.stats.successes += 1;
            self.stats.success_time_us += self.clock.now_us() - start;
        }
        self.last_result
    }

    /// Runs the full bus protocol: start signal, acknowledgment, capture of
    /// the 80 pulse durations, decode and checksum validation. On success
    /// `self.data` holds the five raw bytes.
    fn transfer(&mut self) -> Result<(), DhtError<E>> {
        // Let the pulled-up line settle high before signalling.
        self.pin.set_input_pullup()?;
        self.delay.delay_ms(10);

        // Start signal: hold the line low long enough for the sensor to
        // detect it. The Si7021 expects a much shorter pulse.
        self.pin.set_output()?;
        self.pin.set_low()?;
        match self.sensor {
            SensorType::Si7021 => self.delay.delay_us(500),
            _ => self.delay.delay_ms(18),
        }

        // Timing-critical window: from releasing the line until the last
        // bit edge, the polling loops must not be stretched by preemption.
        let captured: Result<[u32; 80], DhtError<E>> = with(|_cs| {
            // Release the line and give the sensor 20-40us to respond.
            self.pin.set_input_pullup()?;
            self.delay.delay_us(40);

            // Acknowledgment: the sensor holds the line low for 80us, then
            // high for 80us before data starts.
            if self.wait_for_level(PinState::High, ACK_TIMEOUT_US)? == 0
                || self.wait_for_level(PinState::Low, ACK_TIMEOUT_US)? == 0
            {
                return Err(DhtError::NotResponding);
            }

            // 40 bits, two durations per bit: ~50us low, then high for
            // ~28us (zero) or ~70us (one). A timed-out edge records 0 and
            // is dealt with once interrupts are restored.
            let mut cycles = [0u32; 80];
            for slot in cycles.chunks_exact_mut(2) {
                slot[0] = self.wait_for_level(PinState::High, PULSE_TIMEOUT_US)?;
                slot[1] = self.wait_for_level(PinState::Low, PULSE_TIMEOUT_US)?;
            }
            Ok(cycles)
        });
        let cycles = captured?;

        self.data = decode(&cycles).ok_or(DhtError::Timeout)?;

        let sum = self.data[..4]
            .iter()
            .fold(0u8, |sum, v| sum.wrapping_add(*v));
        if self.data[4] != sum {
            return Err(DhtError::ChecksumMismatch);
        }
        Ok(())
    }

    /// Busy-polls the pin once per microsecond until it reads `level`.
    ///
    /// Returns the number of microseconds elapsed, or 0 if `timeout_us`
    /// elapsed first. A zero elapsed time is indistinguishable from a
    /// timeout and every caller treats it as a failure; partial captures
    /// have no defined meaning in this protocol.
    fn wait_for_level(&mut self, level: PinState, timeout_us: u32) -> Result<u32, E> {
        let mut elapsed = 0;
        loop {
            let at_level = match level {
                PinState::High => self.pin.is_high()?,
                PinState::Low => self.pin.is_low()?,
            };
            if at_level {
                return Ok(elapsed);
            }
            if elapsed == timeout_us {
                return Ok(0);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
    }
}

/// Decodes 40 low/high duration pairs into the five raw bytes, most
/// significant bit first. A bit is one when its high phase outlasted the
/// preceding low phase. Any zeroed slot means an edge timed out, which
/// fails the whole transfer; there is no partial recovery.
fn decode(cycles: &[u32; 80]) -> Option<[u8; 5]> {
    let mut data = [0u8; 5];
    for (i, slot) in cycles.chunks_exact(2).enumerate() {
        let (low, high) = (slot[0], slot[1]);
        if low == 0 || high == 0 {
            return None;
        }
        data[i / 8] <<= 1;
        if high > low {
            data[i / 8] |= 1;
        }
    }
    Some(data)
}
