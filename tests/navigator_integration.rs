//! Integration tests: full Navigator session against simulated hardware.
//!
//! The mock bus emulates just enough of each chip (identity registers,
//! calibration block, last-written register state) for `init`,
//! `self_test`, and every peripheral operation to run end-to-end.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use navigator::bus::{Pin, RegisterBus};
use navigator::{AdcChannel, BusError, Error, Navigator, PwmChannel, UserLed, pins};

// ── Mock implementations ──────────────────────────────────────

#[derive(Default)]
struct MockState {
    /// Last-written bytes keyed by (device, start register).
    registers: HashMap<(u8, u8), Vec<u8>>,
    /// Devices that never acknowledge.
    absent: Vec<u8>,
    /// Fail the next N transactions with NotAcknowledged.
    fail_next: u32,
}

#[derive(Clone)]
struct MockBus(Arc<Mutex<MockState>>);

impl MockBus {
    fn new() -> Self {
        let bus = Self(Arc::new(Mutex::new(MockState::default())));
        bus.seed_healthy_board();
        bus
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    fn seed(&self, device: u8, register: u8, bytes: &[u8]) {
        self.state()
            .registers
            .insert((device, register), bytes.to_vec());
    }

    fn register(&self, device: u8, register: u8) -> Option<Vec<u8>> {
        self.state().registers.get(&(device, register)).cloned()
    }

    fn mark_absent(&self, device: u8) {
        self.state().absent.push(device);
    }

    fn fail_next(&self, n: u32) {
        self.state().fail_next = n;
    }

    /// Identity registers, calibration, and data registers for a board
    /// with every chip present and healthy.
    fn seed_healthy_board(&self) {
        // ADS1115: conversion register reads 16384 counts = 2.048 V.
        self.seed(pins::ADS1115_ADDR, 0x00, &[0x40, 0x00]);

        // BMP280: chip ID, datasheet example trim, datasheet example
        // raw data (expected 25.08 °C / 100.653 kPa).
        self.seed(pins::BMP280_ADDR, 0xD0, &[0x58]);
        let trim: [(u16, bool); 12] = [
            (27504, false),
            (26435, false),
            (1000, true),
            (36477, false),
            (10685, true),
            (3024, false),
            (2855, false),
            (140, false),
            (7, true),
            (15500, false),
            (14600, true),
            (6000, false),
        ];
        let mut calib = Vec::new();
        for (value, negative) in trim {
            let word = if negative {
                (-(i32::from(value))) as i16 as u16
            } else {
                value
            };
            calib.extend_from_slice(&word.to_le_bytes());
        }
        self.seed(pins::BMP280_ADDR, 0x88, &calib);
        // adc_P = 415148, adc_T = 519888, packed 20-bit big-endian.
        self.seed(pins::BMP280_ADDR, 0xF7, &[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]);

        // AK09915: WIA pair, then ST1 + 100/-200/0 counts + TMPS + ST2.
        self.seed(pins::AK09915_ADDR, 0x00, &[0x48, 0x10]);
        self.seed(
            pins::AK09915_ADDR,
            0x10,
            &[0x01, 0x64, 0x00, 0x38, 0xFF, 0x00, 0x00, 0x00, 0x00],
        );

        // ICM20689: WHO_AM_I, accel x = 4096 counts (1 g), gyro x = 164
        // counts (10 dps).
        self.seed(pins::ICM20689_ADDR, 0x75, &[0x98]);
        self.seed(pins::ICM20689_ADDR, 0x3B, &[0x10, 0x00, 0x00, 0x00, 0x00, 0x00]);
        self.seed(pins::ICM20689_ADDR, 0x43, &[0x00, 0xA4, 0x00, 0x00, 0x00, 0x00]);
    }
}

impl RegisterBus for MockBus {
    fn read_register(
        &mut self,
        device: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), BusError> {
        let mut state = self.state();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(BusError::NotAcknowledged);
        }
        if state.absent.contains(&device) {
            return Err(BusError::NotAcknowledged);
        }
        match state.registers.get(&(device, register)) {
            Some(bytes) if bytes.len() >= buf.len() => {
                buf.copy_from_slice(&bytes[..buf.len()]);
            }
            _ => buf.fill(0),
        }
        Ok(())
    }

    fn write_register(
        &mut self,
        device: u8,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), BusError> {
        let mut state = self.state();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(BusError::NotAcknowledged);
        }
        if state.absent.contains(&device) {
            return Err(BusError::NotAcknowledged);
        }
        state.registers.insert((device, register), bytes.to_vec());
        Ok(())
    }
}

#[derive(Clone)]
struct MockPin(Arc<Mutex<bool>>);

impl MockPin {
    fn idle_high() -> Self {
        Self(Arc::new(Mutex::new(true)))
    }
}

impl Pin for MockPin {
    fn set(&mut self, high: bool) -> Result<(), BusError> {
        *self.0.lock().unwrap() = high;
        Ok(())
    }
    fn read(&mut self) -> Result<bool, BusError> {
        Ok(*self.0.lock().unwrap())
    }
}

#[derive(Clone, Default)]
struct MockSpi {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl embedded_hal::spi::ErrorType for MockSpi {
    type Error = Infallible;
}

impl embedded_hal::spi::SpiBus for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        words.fill(0);
        Ok(())
    }
    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        self.frames.lock().unwrap().push(words.to_vec());
        Ok(())
    }
    fn transfer(&mut self, read: &mut [u8], _write: &[u8]) -> Result<(), Infallible> {
        read.fill(0);
        Ok(())
    }
    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Infallible> {
        Ok(())
    }
    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

struct Rig {
    bus: MockBus,
    oe: MockPin,
    spi: MockSpi,
    nav: Navigator<MockBus, MockPin, MockSpi>,
}

fn rig() -> Rig {
    let bus = MockBus::new();
    let oe = MockPin::idle_high();
    let spi = MockSpi::default();
    let mut nav = Navigator::new(
        bus.clone(),
        oe.clone(),
        MockPin::idle_high(),
        MockPin::idle_high(),
        MockPin::idle_high(),
        spi.clone(),
    );
    nav.init().expect("init against healthy mock board");
    Rig { bus, oe, spi, nav }
}

fn channel_register(index: usize) -> u8 {
    0x06 + 4 * index as u8
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn init_and_self_test_pass_on_healthy_board() {
    let mut rig = rig();
    assert!(rig.nav.self_test());
}

#[test]
fn self_test_fails_when_one_sensor_is_absent() {
    let mut rig = rig();
    rig.bus.mark_absent(pins::ICM20689_ADDR);
    assert!(!rig.nav.self_test());
}

#[test]
fn self_test_fails_on_wrong_chip_identity() {
    let mut rig = rig();
    rig.bus.seed(pins::BMP280_ADDR, 0xD0, &[0x55]);
    assert!(!rig.nav.self_test());
}

#[test]
fn init_fails_when_imu_reports_wrong_identity() {
    let bus = MockBus::new();
    bus.seed(pins::ICM20689_ADDR, 0x75, &[0x00]);
    let mut nav = Navigator::new(
        bus,
        MockPin::idle_high(),
        MockPin::idle_high(),
        MockPin::idle_high(),
        MockPin::idle_high(),
        MockSpi::default(),
    );
    assert_eq!(
        nav.init(),
        Err(Error::WrongDevice {
            address: pins::ICM20689_ADDR,
            id: 0x00
        })
    );
}

// ── Bus retry behavior ────────────────────────────────────────

#[test]
fn transient_nak_below_retry_limit_recovers() {
    let mut rig = rig();
    rig.bus.fail_next(2);
    assert!(rig.nav.read_adc(AdcChannel::Ch0).is_ok());
}

#[test]
fn persistent_nak_surfaces_bus_error() {
    let mut rig = rig();
    rig.bus.mark_absent(pins::ADS1115_ADDR);
    assert_eq!(
        rig.nav.read_adc(AdcChannel::Ch0),
        Err(Error::Bus(BusError::NotAcknowledged))
    );
}

// ── Sensor readings ───────────────────────────────────────────

#[test]
fn adc_counts_scale_to_volts() {
    let mut rig = rig();
    let v = rig.nav.read_adc(AdcChannel::Ch1).unwrap();
    assert!((v - 2.048).abs() < 1e-6, "got {v}");
    let all = rig.nav.read_adc_all().unwrap();
    for v in all.channel {
        assert!((v - 2.048).abs() < 1e-6);
    }
}

#[test]
fn barometer_matches_datasheet_worked_example() {
    let mut rig = rig();
    let t = rig.nav.read_temp().unwrap();
    let p = rig.nav.read_pressure().unwrap();
    assert!((t - 25.08).abs() < 0.01, "got {t} °C");
    assert!((p - 100.65327).abs() < 0.001, "got {p} kPa");
}

#[test]
fn magnetometer_scales_to_microtesla() {
    let mut rig = rig();
    let mag = rig.nav.read_mag().unwrap();
    assert!((mag.x - 15.0).abs() < 1e-4);
    assert!((mag.y + 30.0).abs() < 1e-4);
    assert!(mag.z.abs() < 1e-6);
}

#[test]
fn imu_scales_to_si_units() {
    let mut rig = rig();
    let accel = rig.nav.read_accel().unwrap();
    assert!((accel.x - 9.80665).abs() < 1e-4, "got {}", accel.x);
    let gyro = rig.nav.read_gyro().unwrap();
    let ten_dps_in_rads = 10.0_f32.to_radians();
    assert!((gyro.x - ten_dps_in_rads).abs() < 1e-4, "got {}", gyro.x);
}

// ── LEDs & NeoPixel ───────────────────────────────────────────

#[test]
fn led_set_get_toggle_round_trip() {
    let mut rig = rig();
    rig.nav.set_led(UserLed::Led1, true).unwrap();
    assert!(rig.nav.get_led(UserLed::Led1).unwrap());
    rig.nav.set_led_toggle(UserLed::Led1).unwrap();
    assert!(!rig.nav.get_led(UserLed::Led1).unwrap());
}

#[test]
fn led_set_all_reaches_every_led() {
    let mut rig = rig();
    rig.nav.set_led_all(true).unwrap();
    for led in UserLed::ALL {
        assert!(rig.nav.get_led(led).unwrap());
    }
}

#[test]
fn neopixel_redraws_whole_strip_per_call() {
    let mut rig = rig();
    rig.nav.set_neopixel(&[[255, 0, 0], [0, 255, 0]]).unwrap();
    let frames = rig.spi.frames.lock().unwrap();
    assert_eq!(frames.len(), 1);
    // 2 pixels × 24 encoded bits + reset tail.
    assert!(frames[0].len() > 2 * 24);
}

// ── PWM ───────────────────────────────────────────────────────

#[test]
fn pwm_enable_drives_oe_line_active_low() {
    let mut rig = rig();
    rig.nav.pwm_enable(true).unwrap();
    assert!(!rig.oe.read().unwrap());
    rig.nav.pwm_enable(false).unwrap();
    assert!(rig.oe.read().unwrap());
}

#[test]
fn prescale_write_reaches_prescale_register() {
    let mut rig = rig();
    rig.nav.set_pwm_freq_prescale(100).unwrap();
    assert_eq!(rig.bus.register(pins::PCA9685_ADDR, 0xFE), Some(vec![100]));
    assert_eq!(rig.nav.pwm_prescale(), 100);
}

#[test]
fn frequency_maps_through_fixed_formula() {
    let mut rig = rig();
    rig.nav.set_pwm_freq_hz(60.0).unwrap();
    // round(24576000 / (4096 * 60)) - 1 = 99
    assert_eq!(rig.nav.pwm_prescale(), 99);
    assert_eq!(rig.bus.register(pins::PCA9685_ADDR, 0xFE), Some(vec![99]));
}

#[test]
fn out_of_range_frequency_writes_nothing() {
    let mut rig = rig();
    let before = rig.bus.register(pins::PCA9685_ADDR, 0xFE);
    let result = rig.nav.set_pwm_freq_hz(10_000.0);
    assert!(matches!(result, Err(Error::InvalidFrequency { .. })));
    assert_eq!(rig.bus.register(pins::PCA9685_ADDR, 0xFE), before);

    let result = rig.nav.set_pwm_freq_hz(1.0);
    assert!(matches!(result, Err(Error::InvalidFrequency { .. })));
    assert_eq!(rig.bus.register(pins::PCA9685_ADDR, 0xFE), before);
}

#[test]
fn all_channel_write_fans_out_and_is_idempotent() {
    let mut rig = rig();
    for _ in 0..2 {
        rig.nav
            .set_pwm_channel_value(PwmChannel::All, 0x0234)
            .unwrap();
        for index in 0..16 {
            assert_eq!(
                rig.bus
                    .register(pins::PCA9685_ADDR, channel_register(index)),
                Some(vec![0, 0, 0x34, 0x02]),
                "channel {index}"
            );
        }
    }
}

#[test]
fn single_channel_write_touches_only_that_channel() {
    let mut rig = rig();
    rig.nav
        .set_pwm_channel_value(PwmChannel::Ch3, 1500)
        .unwrap();
    assert_eq!(
        rig.bus.register(pins::PCA9685_ADDR, channel_register(2)),
        Some(vec![0, 0, 0xDC, 0x05])
    );
    // Neighbours keep the zero duty written by init.
    assert_eq!(
        rig.bus.register(pins::PCA9685_ADDR, channel_register(3)),
        Some(vec![0, 0, 0, 0])
    );
}

#[test]
fn channel_list_applies_one_value_to_each() {
    let mut rig = rig();
    rig.nav
        .set_pwm_channels_value(&[PwmChannel::Ch1, PwmChannel::Ch16], 800)
        .unwrap();
    for index in [0, 15] {
        assert_eq!(
            rig.bus
                .register(pins::PCA9685_ADDR, channel_register(index)),
            Some(vec![0, 0, 0x20, 0x03])
        );
    }
}

#[test]
fn parallel_lists_write_pairwise() {
    let mut rig = rig();
    rig.nav
        .set_pwm_channels_values(&[PwmChannel::Ch2, PwmChannel::Ch5], &[10, 20])
        .unwrap();
    assert_eq!(
        rig.bus.register(pins::PCA9685_ADDR, channel_register(1)),
        Some(vec![0, 0, 10, 0])
    );
    assert_eq!(
        rig.bus.register(pins::PCA9685_ADDR, channel_register(4)),
        Some(vec![0, 0, 20, 0])
    );
}

#[test]
fn mismatched_lists_fail_without_writing() {
    let mut rig = rig();
    let before: Vec<_> = (0..16)
        .map(|i| rig.bus.register(pins::PCA9685_ADDR, channel_register(i)))
        .collect();
    let result = rig
        .nav
        .set_pwm_channels_values(&[PwmChannel::Ch1, PwmChannel::Ch2], &[42]);
    assert_eq!(
        result,
        Err(Error::LengthMismatch {
            channels: 2,
            values: 1
        })
    );
    let after: Vec<_> = (0..16)
        .map(|i| rig.bus.register(pins::PCA9685_ADDR, channel_register(i)))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn frequency_change_leaves_channel_values_alone() {
    // Hardware-faithful behavior: duty values are frequency-relative and
    // are NOT rewritten when the prescaler changes.
    let mut rig = rig();
    rig.nav
        .set_pwm_channel_value(PwmChannel::Ch1, 2000)
        .unwrap();
    rig.nav.set_pwm_freq_hz(200.0).unwrap();
    assert_eq!(
        rig.bus.register(pins::PCA9685_ADDR, channel_register(0)),
        Some(vec![0, 0, 0xD0, 0x07])
    );
}

#[test]
fn sessions_are_independent_instances() {
    let mut a = rig();
    let mut b = rig();
    a.nav.set_pwm_freq_prescale(50).unwrap();
    assert_eq!(a.nav.pwm_prescale(), 50);
    assert_ne!(b.nav.pwm_prescale(), 50);
    assert!(b.nav.self_test());
}
