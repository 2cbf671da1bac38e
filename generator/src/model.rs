// Licensed under the Apache-2.0 license

//! Configuration model consumed by the generators and produced by the importer.
//!
//! All collections are ordered [`Vec`]s. Several generation rules pick "the
//! first matching element in declaration order" (the first modulator names
//! the output files, the first active phase is re-driven after a frequency
//! change), so reordering a list changes the generated code.
//!
//! Numeric fields of [`Modulator`] (`frequency`, `deadtime`, `duty_cycle`) are
//! kept as text: they are emitted verbatim as C tokens.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

//=============================================================================
// Modulators
//=============================================================================

/// File-level wrapper around a list of modulators.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulatorConfiguration {
    pub modulators: Vec<Modulator>,
}

/// One PWM-driven power-conversion channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modulator {
    pub id: u32,
    /// Free-text name; every generated identifier is derived from it.
    pub name: String,
    /// Switching frequency as typed; blank means `80e3`.
    pub frequency: String,
    pub deadtime: String,
    /// Nominal duty cycle as typed; blank means `0.5f`.
    pub duty_cycle: String,
    /// Synchronisation group (0, 1 or 2).
    pub group_number: u8,
    pub trigger_start: String,
    pub trigger_stop: String,
    pub trigger_swap: String,
    pub phases: Vec<Phase>,
}

impl Modulator {
    /// Phases that contribute code, in declaration order.
    ///
    /// A phase with an empty PWM identifier is a placeholder and is skipped
    /// everywhere.
    pub fn active_phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter().filter(|p| p.is_active())
    }
}

/// One physical PWM output belonging to a [`Modulator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase {
    pub id: u32,
    pub alias: String,
    /// PWM resource identifier, e.g. `PWM_A_INNER`.
    pub pwm: String,
    /// Advisory only; emitted as a comment.
    pub phase_shift: String,
    pub generate_isr: bool,
    pub isr_trigger_source: IsrTriggerSource,
    pub trigger_adc: bool,
    pub adc_trigger_source: AdcTriggerSource,
    pub alignment: PwmAlignment,
    pub group_number: i32,
    pub is_inverted: bool,
}

impl Default for Phase {
    fn default() -> Self {
        Self {
            id: 0,
            alias: String::new(),
            pwm: String::new(),
            phase_shift: String::new(),
            generate_isr: false,
            isr_trigger_source: IsrTriggerSource::PeriodMatch,
            trigger_adc: false,
            adc_trigger_source: AdcTriggerSource::TR0,
            alignment: PwmAlignment::CenterAligned,
            group_number: 0,
            is_inverted: false,
        }
    }
}

impl Phase {
    pub fn is_active(&self) -> bool {
        !self.pwm.is_empty()
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum IsrTriggerSource {
    #[default]
    PeriodMatch,
    Compare0Match,
    Compare1Match,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum AdcTriggerSource {
    #[default]
    TR0,
    TR1,
    TR2,
    TR3,
    TR4,
    TR5,
    TR6,
    TR7,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum PwmAlignment {
    LeftAligned,
    RightAligned,
    #[default]
    CenterAligned,
}

//=============================================================================
// Microcontroller peripherals
//=============================================================================

/// Aggregate root for pin, timer and serial peripheral generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsocConfiguration {
    pub project_name: String,
    pub version: String,
    pub clock_settings: ClockSettings,
    pub pins: Vec<Pin>,
    pub timers: Vec<Timer>,
    pub uarts: Vec<Uart>,
    pub i2cs: Vec<I2c>,
    pub spis: Vec<Spi>,
}

impl Default for PsocConfiguration {
    fn default() -> Self {
        Self {
            project_name: "PsocProject".to_string(),
            version: "1.0.0".to_string(),
            clock_settings: ClockSettings::default(),
            pins: Vec::new(),
            timers: Vec::new(),
            uarts: Vec::new(),
            i2cs: Vec::new(),
            spis: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    pub main_clock_frequency: u32,
    pub use_external_crystal: bool,
    pub external_crystal_frequency: u32,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            main_clock_frequency: 24_000_000,
            use_external_crystal: false,
            external_crystal_frequency: 24_000_000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pin {
    pub name: String,
    pub port: u32,
    pub number: u32,
    pub mode: PinMode,
    pub drive: PinDrive,
    pub pull_up: bool,
    pub pull_down: bool,
    /// Emitted as a comment under the pin's macros when non-empty.
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timer {
    pub name: String,
    pub period: u32,
    pub mode: TimerMode,
    pub enable_interrupt: bool,
    /// User handler called from the ISR; blank means `{name}_Handler`.
    pub interrupt_handler: String,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            name: String::new(),
            period: 1000,
            mode: TimerMode::Continuous,
            enable_interrupt: false,
            interrupt_handler: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Uart {
    pub name: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: ParityType,
    pub stop_bits: u8,
    pub tx_pin: String,
    pub rx_pin: String,
}

impl Default for Uart {
    fn default() -> Self {
        Self {
            name: String::new(),
            baud_rate: 9600,
            data_bits: 8,
            parity: ParityType::None,
            stop_bits: 1,
            tx_pin: String::new(),
            rx_pin: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I2c {
    pub name: String,
    pub clock_frequency: u32,
    pub scl_pin: String,
    pub sda_pin: String,
    pub is_master: bool,
    pub slave_address: u8,
}

impl Default for I2c {
    fn default() -> Self {
        Self {
            name: String::new(),
            clock_frequency: 100_000,
            scl_pin: String::new(),
            sda_pin: String::new(),
            is_master: true,
            slave_address: 0x50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spi {
    pub name: String,
    pub clock_frequency: u32,
    pub mode: SpiMode,
    pub mosi_pin: String,
    pub miso_pin: String,
    pub sclk_pin: String,
    pub cs_pin: String,
}

impl Default for Spi {
    fn default() -> Self {
        Self {
            name: String::new(),
            clock_frequency: 1_000_000,
            mode: SpiMode::Mode0,
            mosi_pin: String::new(),
            miso_pin: String::new(),
            sclk_pin: String::new(),
            cs_pin: String::new(),
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum PinMode {
    #[default]
    Input,
    Output,
    Bidirectional,
    Analog,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum PinDrive {
    #[default]
    Standard,
    HighDrive,
    OpenDrain,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum TimerMode {
    OneShot,
    #[default]
    Continuous,
    Pwm,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum ParityType {
    #[default]
    None,
    Even,
    Odd,
}

/// SPI clock polarity/phase. The discriminant is the emitted mode index.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0 = 0,
    /// CPOL=0, CPHA=1
    Mode1 = 1,
    /// CPOL=1, CPHA=0
    Mode2 = 2,
    /// CPOL=1, CPHA=1
    Mode3 = 3,
}

impl SpiMode {
    pub fn index(self) -> u8 {
        self as u8
    }
}
