// Licensed under the Apache-2.0 license

//! C code generation for pins, timers and serial peripherals.
//!
//! Every section for a peripheral list is omitted entirely when the list is
//! empty. Sections are emitted in a fixed order: clock, pins, timers, UART,
//! I2C, SPI, prototypes.

use std::fmt::{self, Write};

use log::debug;

use crate::model::{PinMode, PsocConfiguration, Timer};
use crate::util::{c_identifier, hex_byte, macro_name};

/// Base name of the generated peripheral files.
pub const PERIPHERAL_BASE_NAME: &str = "psoc_config";

const INCLUDE_GUARD: &str = "PSOC_CONFIG_H";

pub(crate) struct PeripheralCode<'a> {
    config: &'a PsocConfiguration,
    timestamp: String,
}

impl<'a> PeripheralCode<'a> {
    pub(crate) fn new(config: &'a PsocConfiguration, timestamp: String) -> Self {
        Self { config, timestamp }
    }

    fn write_banner(&self, out: &mut dyn Write, kind: &str) -> fmt::Result {
        writeln!(out, "/*")?;
        writeln!(
            out,
            " * {} - Generated {kind} File",
            self.config.project_name
        )?;
        writeln!(out, " * Version: {}", self.config.version)?;
        writeln!(out, " * Generated: {}", self.timestamp)?;
        writeln!(out, " */")?;
        writeln!(out)
    }

    fn output_pins(&self) -> impl Iterator<Item = &'a str> {
        let config = self.config;
        config
            .pins
            .iter()
            .filter(|p| p.mode == PinMode::Output)
            .map(|p| p.name.as_str())
    }

    fn input_pins(&self) -> impl Iterator<Item = &'a str> {
        let config = self.config;
        config
            .pins
            .iter()
            .filter(|p| p.mode == PinMode::Input)
            .map(|p| p.name.as_str())
    }

    fn interrupt_timers(&self) -> impl Iterator<Item = &'a Timer> {
        let config = self.config;
        config.timers.iter().filter(|t| t.enable_interrupt)
    }

    //=========================================================================
    // Header
    //=========================================================================

    pub(crate) fn write_header(&self, out: &mut dyn Write) -> fmt::Result {
        self.write_banner(out, "Header")?;
        writeln!(out, "#ifndef {INCLUDE_GUARD}")?;
        writeln!(out, "#define {INCLUDE_GUARD}")?;
        writeln!(out)?;
        writeln!(out, "#include <project.h>")?;
        writeln!(out)?;

        self.write_clock_config(out)?;
        self.write_pin_definitions(out)?;
        self.write_timer_definitions(out)?;
        self.write_uart_definitions(out)?;
        self.write_i2c_definitions(out)?;
        self.write_spi_definitions(out)?;
        self.write_prototypes(out)?;

        writeln!(out)?;
        writeln!(out, "#endif // {INCLUDE_GUARD}")
    }

    fn write_clock_config(&self, out: &mut dyn Write) -> fmt::Result {
        let clock = &self.config.clock_settings;
        writeln!(out, "/* Clock Configuration */")?;
        writeln!(
            out,
            "#define MAIN_CLOCK_FREQ_HZ    {}u",
            clock.main_clock_frequency
        )?;
        if clock.use_external_crystal {
            writeln!(
                out,
                "#define EXTERNAL_CRYSTAL_FREQ_HZ    {}u",
                clock.external_crystal_frequency
            )?;
            writeln!(out, "#define USE_EXTERNAL_CRYSTAL    1")?;
        } else {
            writeln!(out, "#define USE_EXTERNAL_CRYSTAL    0")?;
        }
        writeln!(out)
    }

    fn write_pin_definitions(&self, out: &mut dyn Write) -> fmt::Result {
        if self.config.pins.is_empty() {
            return Ok(());
        }
        writeln!(out, "/* Pin Definitions */")?;
        for pin in &self.config.pins {
            let name = macro_name(&pin.name);
            writeln!(out, "#define {name}_PORT    P{}", pin.port)?;
            writeln!(out, "#define {name}_PIN     {}", pin.number)?;
            writeln!(out, "#define {name}_MASK    (1u << {})", pin.number)?;
            if !pin.comment.is_empty() {
                writeln!(out, "// {}", pin.comment)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_timer_definitions(&self, out: &mut dyn Write) -> fmt::Result {
        if self.config.timers.is_empty() {
            return Ok(());
        }
        writeln!(out, "/* Timer Definitions */")?;
        for timer in &self.config.timers {
            let name = macro_name(&timer.name);
            writeln!(out, "#define {name}_PERIOD    {}u", timer.period)?;
            if timer.enable_interrupt {
                writeln!(out, "#define {name}_INTERRUPT_ENABLED    1")?;
            }
        }
        writeln!(out)
    }

    fn write_uart_definitions(&self, out: &mut dyn Write) -> fmt::Result {
        if self.config.uarts.is_empty() {
            return Ok(());
        }
        writeln!(out, "/* UART Definitions */")?;
        for uart in &self.config.uarts {
            let name = macro_name(&uart.name);
            writeln!(out, "#define {name}_BAUD_RATE    {}u", uart.baud_rate)?;
            writeln!(out, "#define {name}_DATA_BITS    {}u", uart.data_bits)?;
            writeln!(out, "#define {name}_STOP_BITS    {}u", uart.stop_bits)?;
        }
        writeln!(out)
    }

    fn write_i2c_definitions(&self, out: &mut dyn Write) -> fmt::Result {
        if self.config.i2cs.is_empty() {
            return Ok(());
        }
        writeln!(out, "/* I2C Definitions */")?;
        for i2c in &self.config.i2cs {
            let name = macro_name(&i2c.name);
            writeln!(out, "#define {name}_CLOCK_FREQ    {}u", i2c.clock_frequency)?;
            if !i2c.is_master {
                writeln!(
                    out,
                    "#define {name}_SLAVE_ADDR    {}",
                    hex_byte(i2c.slave_address)
                )?;
            }
        }
        writeln!(out)
    }

    fn write_spi_definitions(&self, out: &mut dyn Write) -> fmt::Result {
        if self.config.spis.is_empty() {
            return Ok(());
        }
        writeln!(out, "/* SPI Definitions */")?;
        for spi in &self.config.spis {
            let name = macro_name(&spi.name);
            writeln!(out, "#define {name}_CLOCK_FREQ    {}u", spi.clock_frequency)?;
            writeln!(out, "#define {name}_MODE    {}u", spi.mode.index())?;
        }
        writeln!(out)
    }

    fn write_prototypes(&self, out: &mut dyn Write) -> fmt::Result {
        writeln!(out, "/* Function Prototypes */")?;
        writeln!(out, "void PsocConfig_Init(void);")?;
        for timer in self.interrupt_timers() {
            writeln!(out, "CY_ISR_PROTO({}_ISR);", c_identifier(&timer.name))?;
        }
        for pin in self.output_pins() {
            writeln!(out, "void {}_Write(uint8 value);", c_identifier(pin))?;
        }
        for pin in self.input_pins() {
            writeln!(out, "uint8 {}_Read(void);", c_identifier(pin))?;
        }
        writeln!(out)
    }

    //=========================================================================
    // Source
    //=========================================================================

    pub(crate) fn write_source(&self, out: &mut dyn Write) -> fmt::Result {
        self.write_banner(out, "Source")?;
        writeln!(out, "#include \"{PERIPHERAL_BASE_NAME}.h\"")?;
        writeln!(out)?;

        self.write_init_function(out)?;
        self.write_timer_handlers(out)?;
        self.write_pin_functions(out)
    }

    /// `PsocConfig_Init`, starting peripherals in timer, UART, I2C, SPI, pin order.
    fn write_init_function(&self, out: &mut dyn Write) -> fmt::Result {
        writeln!(out, "/*")?;
        writeln!(out, " * Initialize all PSOC components")?;
        writeln!(out, " */")?;
        writeln!(out, "void PsocConfig_Init(void)")?;
        writeln!(out, "{{")?;
        writeln!(out, "    /* Enable global interrupts */")?;
        writeln!(out, "    CyGlobalIntEnable;")?;
        writeln!(out)?;

        for timer in &self.config.timers {
            let name = c_identifier(&timer.name);
            writeln!(out, "    /* Initialize {} */", timer.name)?;
            writeln!(out, "    {name}_Start();")?;
            if timer.enable_interrupt {
                writeln!(out, "    {name}_ISR_StartEx({name}_ISR);")?;
            }
            writeln!(out)?;
        }

        let serial = self
            .config
            .uarts
            .iter()
            .map(|u| u.name.as_str())
            .chain(self.config.i2cs.iter().map(|i| i.name.as_str()))
            .chain(self.config.spis.iter().map(|s| s.name.as_str()));
        for name in serial {
            writeln!(out, "    /* Initialize {name} */")?;
            writeln!(out, "    {}_Start();", c_identifier(name))?;
            writeln!(out)?;
        }

        for pin in &self.config.pins {
            writeln!(out, "    /* Initialize {} */", pin.name)?;
            if pin.mode == PinMode::Output {
                let name = macro_name(&pin.name);
                writeln!(
                    out,
                    "    {name}_PORT_DR &= ~{name}_MASK; // Set initial state to low"
                )?;
            }
            writeln!(out)?;
        }

        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn write_timer_handlers(&self, out: &mut dyn Write) -> fmt::Result {
        for timer in self.interrupt_timers() {
            let name = c_identifier(&timer.name);
            let handler = if timer.interrupt_handler.is_empty() {
                format!("{name}_Handler")
            } else {
                timer.interrupt_handler.clone()
            };

            writeln!(out, "/*")?;
            writeln!(out, " * {} interrupt service routine", timer.name)?;
            writeln!(out, " */")?;
            writeln!(out, "CY_ISR({name}_ISR)")?;
            writeln!(out, "{{")?;
            writeln!(out, "    /* Clear the interrupt */")?;
            writeln!(out, "    {name}_ReadStatusRegister();")?;
            writeln!(out)?;
            writeln!(out, "    /* Call user handler */")?;
            writeln!(out, "    {handler}();")?;
            writeln!(out, "}}")?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_pin_functions(&self, out: &mut dyn Write) -> fmt::Result {
        for pin in self.output_pins() {
            let upper = macro_name(pin);
            writeln!(out, "/*")?;
            writeln!(out, " * Write to {pin}")?;
            writeln!(out, " */")?;
            writeln!(out, "void {}_Write(uint8 value)", c_identifier(pin))?;
            writeln!(out, "{{")?;
            writeln!(out, "    if (value)")?;
            writeln!(out, "        {upper}_PORT_DR |= {upper}_MASK;")?;
            writeln!(out, "    else")?;
            writeln!(out, "        {upper}_PORT_DR &= ~{upper}_MASK;")?;
            writeln!(out, "}}")?;
            writeln!(out)?;
        }

        for pin in self.input_pins() {
            let upper = macro_name(pin);
            writeln!(out, "/*")?;
            writeln!(out, " * Read from {pin}")?;
            writeln!(out, " */")?;
            writeln!(out, "uint8 {}_Read(void)", c_identifier(pin))?;
            writeln!(out, "{{")?;
            writeln!(
                out,
                "    return ({upper}_PORT_PS & {upper}_MASK) ? 1u : 0u;"
            )?;
            writeln!(out, "}}")?;
            writeln!(out)?;
        }
        Ok(())
    }

    pub(crate) fn log_summary(&self) {
        let c = self.config;
        debug!(
            "peripherals for '{}': {} pin(s), {} timer(s), {} UART(s), {} I2C(s), {} SPI(s)",
            c.project_name,
            c.pins.len(),
            c.timers.len(),
            c.uarts.len(),
            c.i2cs.len(),
            c.spis.len()
        );
    }
}
