// Licensed under the Apache-2.0 license

//! C code generation for PWM modulators.
//!
//! Identifiers are resolved once into a [`ModulatorCode`] plan, which then
//! renders the header and the source. Both files are emitted modulator-major:
//! every section loops over the modulators in declaration order, and within a
//! modulator over its active phases in declaration order.

use std::fmt::{self, Write};

use log::debug;

use crate::config::{GeneratorConfig, NameConfig};
use crate::model::{Modulator, Phase};
use crate::util::{base_file_name, include_guard, instance_name};

/// Upper duty cycle bound emitted as `{PREFIX}_MAX_DUTY`.
pub const MAX_DUTY: &str = "0.97f";
/// Lower duty cycle bound emitted as `{PREFIX}_MIN_DUTY`.
pub const MIN_DUTY: &str = "0.03f";
/// Duty cycle literal used when the modulator's duty cycle is blank.
pub const DEFAULT_DUTY_CYCLE: &str = "0.5f";
/// Switching frequency literal used when the modulator's frequency is blank.
pub const DEFAULT_SWITCHING_FREQUENCY: &str = "80e3";
/// Positive and negative deadtime set by every init function.
pub const DEFAULT_DEADTIME: u32 = 20;

const ISR_ATTRIBUTES: &str =
    "__attribute__ ((interrupt (\"IRQ\"))) __attribute__ ((section (\".sram\")))";

/// Resolved identifiers of one active phase.
struct PhasePlan<'a> {
    phase: &'a Phase,
    /// Phase enumerator, `{PREFIX}_{tag}`.
    enumerator: String,
    /// Short name used by ADC macros, controllers and DMA channels.
    name: String,
}

impl PhasePlan<'_> {
    fn pwm(&self) -> &str {
        &self.phase.pwm
    }
}

/// Resolved identifiers of one modulator.
struct ModulatorPlan<'a> {
    /// The modulator name as typed, for comments.
    display: &'a str,
    prefix: String,
    instance: String,
    duty: String,
    frequency: &'a str,
    phases: Vec<PhasePlan<'a>>,
    /// Phases with their interrupt service routine flag set.
    isr_phases: Vec<usize>,
}

impl<'a> ModulatorPlan<'a> {
    fn new(modulator: &'a Modulator, names: &NameConfig) -> Self {
        let prefix = names.symbol_prefix(&modulator.name);
        let phases: Vec<PhasePlan> = modulator
            .active_phases()
            .map(|phase| PhasePlan {
                phase,
                enumerator: format!("{prefix}_{}", names.phase_tag(&phase.pwm)),
                name: names.phase_name(&phase.pwm),
            })
            .collect();
        let isr_phases = phases
            .iter()
            .enumerate()
            .filter(|(_, p)| p.phase.generate_isr)
            .map(|(i, _)| i)
            .collect();

        let duty = if modulator.duty_cycle.trim().is_empty() {
            DEFAULT_DUTY_CYCLE.to_string()
        } else {
            format!("{}f", modulator.duty_cycle)
        };
        let frequency = if modulator.frequency.trim().is_empty() {
            DEFAULT_SWITCHING_FREQUENCY
        } else {
            modulator.frequency.as_str()
        };

        Self {
            display: &modulator.name,
            prefix,
            instance: instance_name(&modulator.name),
            duty,
            frequency,
            phases,
            isr_phases,
        }
    }

    fn isr_phases(&self) -> impl Iterator<Item = &PhasePlan<'a>> {
        self.isr_phases.iter().map(|&i| &self.phases[i])
    }

    /// `{instance}_config.{instance}`, the per-phase state of this modulator.
    fn phase_state(&self) -> String {
        format!("{0}_config.{0}", self.instance)
    }
}

/// A modulator batch with every identifier resolved, ready to render.
pub(crate) struct ModulatorCode<'a> {
    base_name: String,
    timestamp: String,
    modulators: Vec<ModulatorPlan<'a>>,
}

impl<'a> ModulatorCode<'a> {
    pub(crate) fn plan(modulators: &'a [Modulator], config: &GeneratorConfig) -> Self {
        Self {
            base_name: base_file_name(modulators, &config.names.fallback_base_name),
            timestamp: config.time_source.timestamp(),
            modulators: modulators
                .iter()
                .map(|m| ModulatorPlan::new(m, &config.names))
                .collect(),
        }
    }

    pub(crate) fn base_name(&self) -> &str {
        &self.base_name
    }

    fn write_banner(&self, out: &mut dyn Write, kind: &str) -> fmt::Result {
        writeln!(out, "/*")?;
        writeln!(out, " * {} - Generated {kind} File", self.base_name)?;
        writeln!(out, " * Generated: {}", self.timestamp)?;
        writeln!(out, " */")?;
        writeln!(out)
    }

    //=========================================================================
    // Header
    //=========================================================================

    pub(crate) fn write_header(&self, out: &mut dyn Write) -> fmt::Result {
        let guard = include_guard(&self.base_name);
        self.write_banner(out, "Header")?;
        writeln!(out, "#ifndef {guard}")?;
        writeln!(out, "#define {guard}")?;
        writeln!(out)?;
        writeln!(out, "#include <stdint.h>")?;
        writeln!(out, "#include <stdbool.h>")?;
        writeln!(out)?;

        self.write_enums_and_defines(out)?;
        self.write_structures(out)?;
        self.write_prototypes(out)?;

        writeln!(out)?;
        writeln!(out, "#endif /* {guard} */")
    }

    fn write_enums_and_defines(&self, out: &mut dyn Write) -> fmt::Result {
        writeln!(out, "/* Modulator Configuration Enums and Defines */")?;
        writeln!(out)?;

        for m in &self.modulators {
            let p = &m.prefix;
            writeln!(
                out,
                "typedef enum {{{p}_disabled, {p}_openLoop, {p}_currentControl}} {p}_mode_t;"
            )?;
        }
        writeln!(out)?;

        // One enumeration shared by every modulator
        let enumerators: Vec<&str> = self
            .modulators
            .iter()
            .flat_map(|m| m.phases.iter().map(|p| p.enumerator.as_str()))
            .collect();
        if let Some((last, rest)) = enumerators.split_last() {
            writeln!(out, "typedef enum {{")?;
            for enumerator in rest {
                writeln!(out, "    {enumerator},")?;
            }
            writeln!(out, "    {last}")?;
            writeln!(out, "}} modulator_phase_t;")?;
            writeln!(out)?;
        }

        for m in &self.modulators {
            writeln!(out, "/* {} Duty Cycle Limits */", m.display)?;
            writeln!(out, "#define {}_MAX_DUTY {MAX_DUTY}", m.prefix)?;
            writeln!(out, "#define {}_MIN_DUTY {MIN_DUTY}", m.prefix)?;
            writeln!(out)?;
        }

        for m in &self.modulators {
            let state = m.phase_state();
            writeln!(out, "/* {} ADC Definitions */", m.display)?;
            for phase in &m.phases {
                writeln!(
                    out,
                    "#define {}_I_{} ({state}.ADC_res[0])",
                    m.prefix, phase.name
                )?;
                writeln!(
                    out,
                    "#define {}_VFC_{} ({state}.ADC_res[1])",
                    m.prefix, phase.name
                )?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_structures(&self, out: &mut dyn Write) -> fmt::Result {
        for m in &self.modulators {
            writeln!(out, "/* {} Phase Configuration Structure */", m.display)?;
            writeln!(out, "typedef struct {}_phaseConfig_t", m.prefix)?;
            writeln!(out, "{{")?;
            writeln!(out, "    float duty;")?;
            writeln!(out, "    uint16_t period;")?;
            writeln!(out, "    uint32_t Iref;")?;
            writeln!(out, "    int32_t compareValueOffset;")?;
            writeln!(out, "    uint32_t ADC_res[2];")?;
            writeln!(out, "    uint32_t currentFilt;")?;
            writeln!(out, "}} {}_phaseConfig_t;", m.prefix)?;
            writeln!(out)?;
        }

        for m in &self.modulators {
            let i = &m.instance;
            writeln!(out, "/* {} Configuration Structure */", m.display)?;
            writeln!(out, "typedef struct {i}_config_t")?;
            writeln!(out, "{{")?;
            writeln!(out, "    {}_phaseConfig_t {i};", m.prefix)?;
            writeln!(out, "    float Kp;")?;
            writeln!(out, "    uint32_t deadtimePos;")?;
            writeln!(out, "    uint32_t deadtimeNeg;")?;
            writeln!(out, "    {}_mode_t mode;", m.prefix)?;
            writeln!(out, "    bool isRunning;")?;
            writeln!(out, "    uint32_t fsw;")?;
            writeln!(out, "    uint32_t clockFreq;")?;
            writeln!(out, "}} {i}_config_t;")?;
            writeln!(out)?;
            writeln!(out, "extern {i}_config_t {i}_config;")?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_prototypes(&self, out: &mut dyn Write) -> fmt::Result {
        for m in &self.modulators {
            let i = &m.instance;
            writeln!(out, "/* {} Function Prototypes */", m.display)?;
            writeln!(out, "void {i}_init(void);")?;
            writeln!(out, "void {i}_startAll(void);")?;
            writeln!(out, "void {i}_stopAll(void);")?;
            writeln!(out, "void {i}_setFsw(uint32_t fsw);")?;
            writeln!(out, "void {i}_setDuty(modulator_phase_t phase, float duty);")?;
            writeln!(out, "void {i}_setDeadtime(uint8_t deadtime);")?;
            writeln!(out, "void {i}_setDeadtimeNeg(uint32_t deadtime);")?;
            writeln!(out, "void {i}_setDeadtimePos(uint32_t deadtime);")?;
            writeln!(out, "void {i}_setMode({}_mode_t mode);", m.prefix)?;
            writeln!(out, "void {i}_setCurrent(float current);")?;
            writeln!(out)?;

            for phase in m.isr_phases() {
                writeln!(out, "{ISR_ATTRIBUTES}")?;
                writeln!(out, "void {i}_{}_Controller(void);", phase.name)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    //=========================================================================
    // Source
    //=========================================================================

    pub(crate) fn write_source(&self, out: &mut dyn Write) -> fmt::Result {
        self.write_banner(out, "Source")?;
        writeln!(out, "#include \"{}.h\"", self.base_name)?;
        writeln!(out, "#include <math.h>")?;
        writeln!(out)?;

        self.write_instances(out)?;
        for m in &self.modulators {
            Self::write_init_function(out, m)?;
        }
        for m in &self.modulators {
            Self::write_control_functions(out, m)?;
        }
        for m in &self.modulators {
            Self::write_interrupt_handlers(out, m)?;
        }
        Ok(())
    }

    fn write_instances(&self, out: &mut dyn Write) -> fmt::Result {
        writeln!(out, "/* Static helper functions */")?;
        for m in &self.modulators {
            writeln!(out, "static inline void {}_init_DMA_ISR(void);", m.instance)?;
            writeln!(out, "static inline void {}_updatePhaseShift(void);", m.instance)?;
        }
        writeln!(out)?;

        for m in &self.modulators {
            writeln!(out, "/* {} Configuration Instance */", m.display)?;
            writeln!(out, "{0}_config_t {0}_config = {{.Kp = 1.0f}};", m.instance)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Writes one `Cy_TCPWM_InputTriggerSetup` per phase for the given input.
    fn write_trigger_setup(
        out: &mut dyn Write,
        m: &ModulatorPlan,
        comment: &str,
        input: &str,
        trigger: u8,
    ) -> fmt::Result {
        writeln!(out, "    // {comment}")?;
        for phase in &m.phases {
            let pwm = phase.pwm();
            writeln!(
                out,
                "    Cy_TCPWM_InputTriggerSetup({pwm}_HW, {pwm}_NUM, {input}, CY_TCPWM_INPUT_RISINGEDGE, CY_TCPWM_INPUT_TRIG({trigger}));"
            )?;
        }
        writeln!(out)
    }

    fn write_init_function(out: &mut dyn Write, m: &ModulatorPlan) -> fmt::Result {
        let i = &m.instance;
        let state = m.phase_state();

        writeln!(out, "/*")?;
        writeln!(out, " * Initialize {} configuration", m.display)?;
        writeln!(out, " * Sets the interrupt handler called by the ADC interrupt.")?;
        writeln!(out, " */")?;
        writeln!(out, "void {i}_init(void)")?;
        writeln!(out, "{{")?;
        writeln!(out, "    {i}_config.deadtimePos = {DEFAULT_DEADTIME};")?;
        writeln!(out, "    {i}_config.deadtimeNeg = {DEFAULT_DEADTIME};")?;
        writeln!(out, "    {state}.duty = {};", m.duty)?;
        writeln!(out, "    {i}_config.fsw = {};", m.frequency)?;
        writeln!(out)?;
        writeln!(out, "    {i}_config.clockFreq = Cy_SysClk_ClkHfGetFrequency(3);")?;
        writeln!(out, "    {state}.compareValueOffset = 0;")?;
        writeln!(out)?;

        for phase in &m.phases {
            let pwm = phase.pwm();
            writeln!(
                out,
                "    Cy_TCPWM_PWM_Init({pwm}_HW, {pwm}_NUM, &{pwm}_config);"
            )?;
            writeln!(out, "    Cy_TCPWM_PWM_Enable({pwm}_HW, {pwm}_NUM);")?;
        }
        writeln!(out)?;

        Self::write_trigger_setup(
            out,
            m,
            "Set up the kill input",
            "CY_TCPWM_INPUT_TR_STOP_OR_KILL",
            5,
        )?;
        Self::write_trigger_setup(
            out,
            m,
            "Setup swap functionality for variable fsw",
            "CY_TCPWM_INPUT_TR_INDEX_OR_SWAP",
            6,
        )?;
        Self::write_trigger_setup(
            out,
            m,
            "Setup start trigger for synchronized operation",
            "CY_TCPWM_INPUT_TR_START",
            4,
        )?;

        writeln!(out, "    {i}_setFsw({i}_config.fsw);")?;
        writeln!(out, "    {i}_updatePhaseShift();")?;
        writeln!(out, "    {i}_init_DMA_ISR();")?;
        writeln!(out, "    {i}_setMode({}_openLoop);", m.prefix)?;
        writeln!(out, "    {i}_setDeadtimePos({i}_config.deadtimePos);")?;
        writeln!(out, "    {i}_setDeadtimeNeg({i}_config.deadtimeNeg);")?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn write_control_functions(out: &mut dyn Write, m: &ModulatorPlan) -> fmt::Result {
        let i = &m.instance;
        let p = &m.prefix;
        let state = m.phase_state();

        writeln!(out, "/*")?;
        writeln!(out, " * Start {}", m.display)?;
        writeln!(out, " */")?;
        writeln!(out, "void {i}_startAll(void)")?;
        writeln!(out, "{{")?;
        writeln!(
            out,
            "    Cy_TrigMux_SwTrigger(TRIG_OUT_MUX_10_TCPWM0_TR_IN4, CY_TRIGGER_TWO_CYCLES);"
        )?;
        writeln!(
            out,
            "    Cy_TrigMux_SwTrigger(TRIG_OUT_MUX_10_TCPWM0_TR_IN5, CY_TRIGGER_DEACTIVATE);"
        )?;
        writeln!(out, "    {i}_config.isRunning = true;")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "/*")?;
        writeln!(out, " * Stop {}", m.display)?;
        writeln!(out, " */")?;
        writeln!(out, "void {i}_stopAll(void)")?;
        writeln!(out, "{{")?;
        writeln!(
            out,
            "    Cy_TrigMux_SwTrigger(TRIG_OUT_MUX_10_TCPWM0_TR_IN5, CY_TRIGGER_INFINITE);"
        )?;
        writeln!(out, "    {i}_config.isRunning = false;")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        // Period is clock / (2 * fsw) for center-aligned counting.
        writeln!(out, "/*")?;
        writeln!(out, " * Set {} switching frequency", m.display)?;
        writeln!(out, " */")?;
        writeln!(out, "void {i}_setFsw(uint32_t fsw)")?;
        writeln!(out, "{{")?;
        writeln!(
            out,
            "    {state}.period = {i}_config.clockFreq / (2*fsw); // (2*fsw because of center aligned modulation)"
        )?;
        writeln!(out, "    {i}_config.fsw = fsw;")?;
        writeln!(out)?;
        for phase in &m.phases {
            let pwm = phase.pwm();
            writeln!(
                out,
                "    Cy_TCPWM_PWM_SetPeriod1({pwm}_HW, {pwm}_NUM, {state}.period);"
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "    // When we change the frequency we also need to recalculate the duty cycle"
        )?;
        if let Some(first) = m.phases.first() {
            writeln!(
                out,
                "    {i}_setDuty({}, {state}.duty);",
                first.enumerator
            )?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "/*")?;
        writeln!(out, " * Set {} duty cycle for specific phase", m.display)?;
        writeln!(out, " */")?;
        writeln!(out, "void {i}_setDuty(modulator_phase_t phase, float duty)")?;
        writeln!(out, "{{")?;
        writeln!(out, "    uint16_t compare;")?;
        writeln!(out)?;
        writeln!(out, "    if(duty > {p}_MAX_DUTY)")?;
        writeln!(out, "        duty = {p}_MAX_DUTY;")?;
        writeln!(out, "    else if(duty < {p}_MIN_DUTY)")?;
        writeln!(out, "        duty = {p}_MIN_DUTY;")?;
        writeln!(out)?;
        writeln!(out, "    switch(phase)")?;
        writeln!(out, "    {{")?;
        for phase in &m.phases {
            let pwm = phase.pwm();
            writeln!(out, "        case {}:", phase.enumerator)?;
            writeln!(out, "            {state}.duty = duty;")?;
            writeln!(
                out,
                "            compare = {state}.period - {state}.period * duty;"
            )?;
            writeln!(
                out,
                "            Cy_TCPWM_PWM_SetCompare0BufVal({pwm}_HW, {pwm}_NUM, compare + {state}.compareValueOffset);"
            )?;
            writeln!(out, "            break;")?;
        }
        writeln!(out, "    }}")?;
        writeln!(out)?;
        writeln!(
            out,
            "    Cy_TrigMux_SwTrigger(TRIG_OUT_MUX_10_TCPWM0_TR_IN6, CY_TRIGGER_TWO_CYCLES);"
        )?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        for (suffix, call, field) in [
            ("Pos", "Cy_TCPWM_PWM_PWMDeadTime", "deadtimePos"),
            ("Neg", "Cy_TCPWM_PWM_PWMDeadTimeN", "deadtimeNeg"),
        ] {
            writeln!(out, "void {i}_setDeadtime{suffix}(uint32_t deadtime)")?;
            writeln!(out, "{{")?;
            for phase in &m.phases {
                let pwm = phase.pwm();
                writeln!(out, "    {call}({pwm}_HW, {pwm}_NUM, deadtime);")?;
            }
            writeln!(out, "    {i}_config.{field} = deadtime;")?;
            writeln!(out, "}}")?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_interrupt_handlers(out: &mut dyn Write, m: &ModulatorPlan) -> fmt::Result {
        let i = &m.instance;
        let state = m.phase_state();

        writeln!(out, "/*")?;
        writeln!(out, " * {} Current Controller Helper Function", m.display)?;
        writeln!(out, " */")?;
        writeln!(
            out,
            "static inline void {i}_CurrentController(modulator_phase_t phase, int32_t err)"
        )?;
        writeln!(out, "{{")?;
        writeln!(out, "    float duty;")?;
        writeln!(out, "    float VL;")?;
        writeln!(
            out,
            "    float VIN_temp = 1.0f; // TODO: Replace with actual input voltage reading"
        )?;
        writeln!(out)?;
        writeln!(out, "    VL = err * {i}_config.Kp;")?;
        writeln!(out, "    if(VIN_temp > 0)")?;
        writeln!(
            out,
            "        duty = (VIN_temp + VL) / 400.0f; // TODO: Adjust divisor based on VDC"
        )?;
        writeln!(out, "    else")?;
        writeln!(out, "        duty = 1.0f + (VIN_temp + VL) / 400.0f;")?;
        writeln!(out)?;
        writeln!(out, "    {i}_setDuty(phase, duty);")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        for phase in m.isr_phases() {
            let name = &phase.name;
            writeln!(out, "/*")?;
            writeln!(out, " * {} {name} Controller ISR", m.display)?;
            writeln!(
                out,
                " * Function is called by interrupt to control the phase current and flying cap"
            )?;
            writeln!(out, " * voltage via a simple P controller.")?;
            writeln!(out, " * Duty cycle is updated at the rate of the PWM.")?;
            writeln!(out, " */")?;
            writeln!(out, "{ISR_ATTRIBUTES}")?;
            writeln!(out, "void {i}_{name}_Controller(void)")?;
            writeln!(out, "{{")?;
            writeln!(
                out,
                "    // elapsed_time_start(0); // Uncomment if using performance measurement"
            )?;
            writeln!(out)?;
            writeln!(
                out,
                "    {state}.currentFilt = moving_average({}_I_{name});",
                m.prefix
            )?;
            writeln!(out)?;
            writeln!(
                out,
                "    int32_t err = {state}.Iref - {state}.currentFilt;"
            )?;
            writeln!(out, "    {i}_CurrentController({}, err);", phase.enumerator)?;
            if phase.phase.trigger_adc {
                writeln!(
                    out,
                    "    Cy_DMA_Channel_ClearInterrupt(DMA_{name}_HW, DMA_{name}_CHANNEL);"
                )?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "    // elapsed_time_stop(0); // Uncomment if using performance measurement"
            )?;
            writeln!(out, "}}")?;
            writeln!(out)?;
        }

        writeln!(out, "/*")?;
        writeln!(
            out,
            " * {} helper function implementations - customize as needed",
            m.display
        )?;
        writeln!(out, " */")?;
        writeln!(out, "static inline void {i}_init_DMA_ISR(void)")?;
        writeln!(out, "{{")?;
        writeln!(out, "    // TODO: Initialize DMA and ISR configurations")?;
        writeln!(out, "    // Configure DMA channels for ADC data transfer")?;
        writeln!(out, "    // Set up interrupt priorities and handlers")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "static inline void {i}_updatePhaseShift(void)")?;
        writeln!(out, "{{")?;
        writeln!(out, "    // TODO: Implement phase shift calculations")?;
        writeln!(out, "    // Set initial phase shifts for synchronized operation")?;
        for phase in m.phases.iter().filter(|p| !p.phase.phase_shift.is_empty()) {
            writeln!(
                out,
                "    // Set phase shift for {}: {}",
                phase.pwm(),
                phase.phase.phase_shift
            )?;
        }
        writeln!(out, "}}")?;
        writeln!(out)
    }

    pub(crate) fn log_summary(&self) {
        for m in &self.modulators {
            debug!(
                "modulator '{}': prefix {}, {} active phase(s), {} ISR(s)",
                m.display,
                m.prefix,
                m.phases.len(),
                m.isr_phases.len()
            );
        }
    }
}
