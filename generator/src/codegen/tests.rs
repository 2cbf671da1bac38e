// Licensed under the Apache-2.0 license

//! Tests for the code generators.

mod test {
    use super::super::{
        generate_modulator_code_with_config, generate_peripheral_code_with_config,
        generate_peripheral_header, generate_peripheral_source, write_modulator_code,
    };
    use crate::clock::{FixedClock, TimeSource};
    use crate::config::{GeneratorConfig, NameConfig};
    use crate::error::GenerateError;
    use crate::model::{
        ClockSettings, I2c, Modulator, Phase, Pin, PinMode, PsocConfiguration, Spi, SpiMode,
        Timer, Uart,
    };
    use crate::output::{CodeGenerationResult, GeneratedFiles};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::fmt;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn fixed_config() -> GeneratorConfig {
        let instant = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        GeneratorConfig::with_defaults().with_time_source(FixedClock(instant))
    }

    fn phase(pwm: &str) -> Phase {
        Phase {
            pwm: pwm.to_string(),
            ..Default::default()
        }
    }

    /// Two ISR phases (only the first triggers the ADC), a placeholder and a
    /// phase with a shift.
    fn buck() -> Modulator {
        Modulator {
            id: 1,
            name: "Buck 1".to_string(),
            phases: vec![
                Phase {
                    generate_isr: true,
                    trigger_adc: true,
                    ..phase("PWM_A_INNER")
                },
                Phase {
                    generate_isr: true,
                    ..phase("PWM_B_OUTER")
                },
                Phase::default(),
                Phase {
                    phase_shift: "90".to_string(),
                    ..phase("PWM_C")
                },
            ],
            ..Default::default()
        }
    }

    fn boost() -> Modulator {
        Modulator {
            id: 2,
            name: "boost-2".to_string(),
            frequency: "100e3".to_string(),
            duty_cycle: "0.25".to_string(),
            phases: vec![phase("PWM_D")],
            ..Default::default()
        }
    }

    /// Advances one second on every read.
    #[derive(Debug, Default)]
    struct TickingClock(AtomicI64);

    impl TimeSource for TickingClock {
        fn now(&self) -> NaiveDateTime {
            let elapsed = self.0.fetch_add(1, Ordering::SeqCst);
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + Duration::seconds(elapsed)
        }
    }

    /// A sink that rejects every write.
    struct FailingWriter;

    impl fmt::Write for FailingWriter {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    //=========================================================================
    // Modulators
    //=========================================================================

    #[test]
    fn test_modulator_file_names() {
        let files = generate_modulator_code_with_config(&[buck(), boost()], &fixed_config()).unwrap();
        assert_eq!(files.header_file_name, "buck_1.h");
        assert_eq!(files.source_file_name, "buck_1.c");
        assert!(files.header.contains("#ifndef BUCK_1_H\n#define BUCK_1_H\n"));
        assert!(files.header.ends_with("#endif /* BUCK_1_H */\n"));
        assert!(files.header.starts_with(
            "/*\n * buck_1 - Generated Header File\n * Generated: 2024-01-02 03:04:05\n */\n"
        ));
        assert!(files.source.contains("#include \"buck_1.h\"\n#include <math.h>\n"));

        // Reordering renames the output
        let files = generate_modulator_code_with_config(&[boost(), buck()], &fixed_config()).unwrap();
        assert_eq!(files.header_file_name, "boost_2.h");
    }

    #[test]
    fn test_modulator_output_is_deterministic() {
        let config = fixed_config();
        let first = generate_modulator_code_with_config(&[buck(), boost()], &config).unwrap();
        let second = generate_modulator_code_with_config(&[buck(), boost()], &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blank_name_fallbacks() {
        let unnamed = Modulator {
            name: "  ".to_string(),
            phases: vec![phase("PWM_A")],
            ..Default::default()
        };
        let files = generate_modulator_code_with_config(&[unnamed.clone()], &fixed_config()).unwrap();
        assert_eq!(files.header_file_name, "modulator_config.h");
        assert!(files.header.contains("MODULATOR_mode_t;"));
        assert!(files.header.contains("    MODULATOR_A\n} modulator_phase_t;"));

        let names = NameConfig::with_defaults()
            .fallback_base_name("power_stage")
            .fallback_prefix("STAGE");
        let files =
            generate_modulator_code_with_config(&[unnamed], &fixed_config().with_names(names))
                .unwrap();
        assert_eq!(files.header_file_name, "power_stage.h");
        assert!(files.header.contains("#define STAGE_MAX_DUTY 0.97f"));

        let files = generate_modulator_code_with_config(&[], &fixed_config()).unwrap();
        assert_eq!(files.source_file_name, "modulator_config.c");
    }

    #[test]
    fn test_phase_enumeration() {
        let files = generate_modulator_code_with_config(&[buck(), boost()], &fixed_config()).unwrap();
        assert!(files.header.contains(
            "typedef enum {\n    BUCK_1_A_INNER,\n    BUCK_1_B_OUTER,\n    BUCK_1_C,\n    BOOST_2_D\n} modulator_phase_t;\n"
        ));
        assert!(files.header.contains(
            "typedef enum {BUCK_1_disabled, BUCK_1_openLoop, BUCK_1_currentControl} BUCK_1_mode_t;\n"
        ));
    }

    #[test]
    fn test_empty_phase_enumeration_is_omitted() {
        let idle = Modulator {
            name: "Idle".to_string(),
            phases: vec![Phase::default()],
            ..Default::default()
        };
        let files = generate_modulator_code_with_config(&[idle], &fixed_config()).unwrap();
        assert!(!files.header.contains("modulator_phase_t;"));
        // Prototypes still refer to the type
        assert!(files
            .header
            .contains("void idle_setDuty(modulator_phase_t phase, float duty);"));

        // No per-phase statements either
        for absent in [
            "Cy_TCPWM_PWM_SetCompare0BufVal",
            "case ",
            "Cy_TCPWM_PWM_Init(",
            "Cy_TCPWM_InputTriggerSetup(",
            "Cy_TCPWM_PWM_SetPeriod1(",
        ] {
            assert!(!files.source.contains(absent), "{absent}");
        }
        assert!(files
            .source
            .contains("    // When we change the frequency we also need to recalculate the duty cycle\n}\n"));
    }

    #[test]
    fn test_placeholder_phases_are_skipped() {
        let files = generate_modulator_code_with_config(&[buck()], &fixed_config()).unwrap();
        assert!(!files.source.contains("(_HW"));
        assert!(!files.header.contains("BUCK_1__"));
        assert_eq!(
            files.source.matches("Cy_TCPWM_PWM_Init(").count(),
            3,
            "one init per active phase"
        );
        assert!(files
            .source
            .contains("    Cy_TCPWM_PWM_Init(PWM_C_HW, PWM_C_NUM, &PWM_C_config);\n"));
    }

    #[test]
    fn test_adc_macros_use_short_names() {
        let files = generate_modulator_code_with_config(&[buck()], &fixed_config()).unwrap();
        assert!(files
            .header
            .contains("#define BUCK_1_I_A (buck_1_config.buck_1.ADC_res[0])\n"));
        assert!(files
            .header
            .contains("#define BUCK_1_VFC_B (buck_1_config.buck_1.ADC_res[1])\n"));
    }

    #[test]
    fn test_duty_clamp_order() {
        let files = generate_modulator_code_with_config(&[buck()], &fixed_config()).unwrap();
        assert!(files.header.contains("#define BUCK_1_MAX_DUTY 0.97f\n"));
        assert!(files.header.contains("#define BUCK_1_MIN_DUTY 0.03f\n"));

        let max = files.source.find("    if(duty > BUCK_1_MAX_DUTY)\n").unwrap();
        let min = files
            .source
            .find("    else if(duty < BUCK_1_MIN_DUTY)\n")
            .unwrap();
        assert!(max < min);
    }

    #[test]
    fn test_textual_defaults() {
        let files = generate_modulator_code_with_config(&[buck(), boost()], &fixed_config()).unwrap();
        assert!(files.source.contains("    buck_1_config.buck_1.duty = 0.5f;\n"));
        assert!(files.source.contains("    buck_1_config.fsw = 80e3;\n"));
        assert!(files.source.contains("    boost-2_config.boost-2.duty = 0.25f;\n"));
        assert!(files.source.contains("    boost-2_config.fsw = 100e3;\n"));
        assert!(files.source.contains("    buck_1_config.deadtimePos = 20;\n"));
    }

    #[test]
    fn test_set_fsw_redrives_first_active_phase() {
        let leading_placeholder = Modulator {
            name: "Buck 1".to_string(),
            phases: vec![Phase::default(), phase("PWM_B"), phase("PWM_C")],
            ..Default::default()
        };
        let files =
            generate_modulator_code_with_config(&[leading_placeholder], &fixed_config()).unwrap();
        assert!(files.source.contains(
            "    // When we change the frequency we also need to recalculate the duty cycle\n    buck_1_setDuty(BUCK_1_B, buck_1_config.buck_1.duty);\n}\n"
        ));
        assert_eq!(files.source.matches("buck_1_setDuty(BUCK_1_").count(), 1);
    }

    #[test]
    fn test_isr_generation() {
        let files = generate_modulator_code_with_config(&[buck()], &fixed_config()).unwrap();

        assert!(files.header.contains(
            "__attribute__ ((interrupt (\"IRQ\"))) __attribute__ ((section (\".sram\")))\nvoid buck_1_A_Controller(void);\n"
        ));
        assert!(files.header.contains("void buck_1_B_Controller(void);\n"));
        assert!(!files.header.contains("buck_1_C_Controller"));

        assert!(files.source.contains("void buck_1_A_Controller(void)\n{\n"));
        assert!(files.source.contains("    buck_1_CurrentController(BUCK_1_B_OUTER, err);\n"));
        assert!(files.source.contains(
            "    Cy_DMA_Channel_ClearInterrupt(DMA_A_HW, DMA_A_CHANNEL);\n"
        ));
        assert!(!files.source.contains("DMA_B_HW"));
        assert!(files
            .source
            .contains("    buck_1_config.buck_1.currentFilt = moving_average(BUCK_1_I_A);\n"));

        for controller in ["void buck_1_A_Controller(void)", "void buck_1_B_Controller(void)"] {
            assert_eq!(files.header.matches(controller).count(), 1, "{controller}");
            assert_eq!(files.source.matches(controller).count(), 1, "{controller}");
        }
    }

    #[test]
    fn test_isr_flag_on_placeholder_phase() {
        let stray = Modulator {
            name: "Buck 1".to_string(),
            phases: vec![
                Phase {
                    generate_isr: true,
                    trigger_adc: true,
                    ..Default::default()
                },
                phase("PWM_A"),
            ],
            ..Default::default()
        };
        let files = generate_modulator_code_with_config(&[stray], &fixed_config()).unwrap();
        for text in [&files.header, &files.source] {
            assert!(!text.contains("_Controller(void)"));
            assert!(!text.contains("__attribute__ ((interrupt"));
            assert!(!text.contains("Cy_DMA_Channel_ClearInterrupt"));
        }
    }

    #[test]
    fn test_phase_shift_comments() {
        let files = generate_modulator_code_with_config(&[buck()], &fixed_config()).unwrap();
        assert!(files.source.contains("    // Set phase shift for PWM_C: 90\n"));
        assert_eq!(files.source.matches("// Set phase shift for ").count(), 1);
    }

    #[test]
    fn test_modulator_sections_are_grouped() {
        let files = generate_modulator_code_with_config(&[buck(), boost()], &fixed_config()).unwrap();
        let s = &files.source;
        let buck_init = s.find("void buck_1_init(void)").unwrap();
        let boost_init = s.find("void boost-2_init(void)").unwrap();
        let buck_start = s.find("void buck_1_startAll(void)").unwrap();
        let boost_isr_helpers = s.find("static inline void boost-2_init_DMA_ISR(void)\n{").unwrap();
        assert!(buck_init < boost_init);
        assert!(boost_init < buck_start);
        assert!(buck_start < boost_isr_helpers);
        assert!(s.contains("buck_1_config_t buck_1_config = {.Kp = 1.0f};\n"));
    }

    #[test]
    fn test_streaming_writer_matches_files() {
        let config = fixed_config();
        let modulators = [buck(), boost()];
        let files = generate_modulator_code_with_config(&modulators, &config).unwrap();

        let mut header = String::new();
        let mut source = String::new();
        let base_name = write_modulator_code(&modulators, &config, &mut header, &mut source).unwrap();
        assert_eq!(base_name, "buck_1");
        assert_eq!(header, files.header);
        assert_eq!(source, files.source);
    }

    #[test]
    fn test_header_and_source_share_timestamp() {
        let config = GeneratorConfig::with_defaults().with_time_source(TickingClock::default());

        let mut header = String::new();
        let mut source = String::new();
        write_modulator_code(&[buck()], &config, &mut header, &mut source).unwrap();
        assert!(header.contains(" * Generated: 2024-01-02 00:00:00\n"));
        assert!(source.contains(" * Generated: 2024-01-02 00:00:00\n"));

        // The next call reads the clock again
        let files = generate_modulator_code_with_config(&[buck()], &config).unwrap();
        assert!(files.header.contains(" * Generated: 2024-01-02 00:00:01\n"));
        assert!(files.source.contains(" * Generated: 2024-01-02 00:00:01\n"));

        let files = generate_peripheral_code_with_config(&board(), &config).unwrap();
        assert!(files.header.contains(" * Generated: 2024-01-02 00:00:02\n"));
        assert!(files.source.contains(" * Generated: 2024-01-02 00:00:02\n"));
    }

    #[test]
    fn test_failing_sink() {
        let config = fixed_config();
        let mut source = String::new();
        let result = write_modulator_code(&[buck()], &config, &mut FailingWriter, &mut source);
        assert!(matches!(result, Err(GenerateError::Format(_))));
        assert!(source.is_empty());

        let err = result.unwrap_err();
        let result = CodeGenerationResult::from(Err::<GeneratedFiles, _>(err));
        assert!(!result.success);
        assert!(result.header_file.is_empty());
        assert!(!result.error_message.is_empty());
    }

    //=========================================================================
    // Peripherals
    //=========================================================================

    fn board() -> PsocConfiguration {
        PsocConfiguration {
            project_name: "Inverter".to_string(),
            version: "2.1.0".to_string(),
            clock_settings: ClockSettings {
                use_external_crystal: true,
                external_crystal_frequency: 16_000_000,
                ..Default::default()
            },
            pins: vec![
                Pin {
                    name: "Led 1".to_string(),
                    port: 2,
                    number: 3,
                    mode: PinMode::Output,
                    comment: "status led".to_string(),
                    ..Default::default()
                },
                Pin {
                    name: "Button".to_string(),
                    port: 0,
                    number: 4,
                    mode: PinMode::Input,
                    ..Default::default()
                },
                Pin {
                    name: "Vsense".to_string(),
                    mode: PinMode::Analog,
                    ..Default::default()
                },
            ],
            timers: vec![
                Timer {
                    name: "Tick".to_string(),
                    enable_interrupt: true,
                    ..Default::default()
                },
                Timer {
                    name: "Watchdog".to_string(),
                    period: 5000,
                    enable_interrupt: true,
                    interrupt_handler: "OnWatchdog".to_string(),
                    ..Default::default()
                },
                Timer {
                    name: "Free".to_string(),
                    ..Default::default()
                },
            ],
            uarts: vec![Uart {
                name: "Debug Uart".to_string(),
                baud_rate: 115_200,
                ..Default::default()
            }],
            i2cs: vec![
                I2c {
                    name: "Bus".to_string(),
                    ..Default::default()
                },
                I2c {
                    name: "Target".to_string(),
                    is_master: false,
                    slave_address: 0x3c,
                    ..Default::default()
                },
            ],
            spis: vec![Spi {
                name: "Flash".to_string(),
                mode: SpiMode::Mode3,
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_peripheral_file_names() {
        let files = generate_peripheral_code_with_config(&board(), &fixed_config()).unwrap();
        assert_eq!(files.header_file_name, "psoc_config.h");
        assert_eq!(files.source_file_name, "psoc_config.c");
        assert!(files.header.starts_with(
            "/*\n * Inverter - Generated Header File\n * Version: 2.1.0\n * Generated: 2024-01-02 03:04:05\n */\n"
        ));
        assert!(files.header.ends_with("#endif // PSOC_CONFIG_H\n"));
        assert!(files.source.contains("#include \"psoc_config.h\"\n"));
    }

    #[test]
    fn test_empty_peripheral_lists_are_silent() {
        let config = fixed_config();
        let header = generate_peripheral_header(&PsocConfiguration::default(), &config).unwrap();
        for section in [
            "Pin Definitions",
            "Timer Definitions",
            "UART Definitions",
            "I2C Definitions",
            "SPI Definitions",
        ] {
            assert!(!header.contains(section), "{section}");
        }
        assert!(header.contains("#define MAIN_CLOCK_FREQ_HZ    24000000u\n"));
        assert!(header.contains("#define USE_EXTERNAL_CRYSTAL    0\n"));
        assert!(!header.contains("EXTERNAL_CRYSTAL_FREQ_HZ"));
        assert!(header.contains("/* Function Prototypes */\nvoid PsocConfig_Init(void);\n\n"));

        let source = generate_peripheral_source(&PsocConfiguration::default(), &config).unwrap();
        assert!(!source.contains("CY_ISR("));
        assert!(!source.contains("_Write("));
        assert!(!source.contains("_Read("));
    }

    #[test]
    fn test_peripheral_header() {
        let header = generate_peripheral_header(&board(), &fixed_config()).unwrap();
        assert!(header.contains("#define EXTERNAL_CRYSTAL_FREQ_HZ    16000000u\n"));
        assert!(header.contains("#define USE_EXTERNAL_CRYSTAL    1\n"));

        assert!(header.contains(
            "#define LED_1_PORT    P2\n#define LED_1_PIN     3\n#define LED_1_MASK    (1u << 3)\n// status led\n\n"
        ));
        assert!(header.contains("#define BUTTON_MASK    (1u << 4)\n\n"));

        assert!(header.contains("#define TICK_PERIOD    1000u\n#define TICK_INTERRUPT_ENABLED    1\n"));
        assert!(header.contains("#define FREE_PERIOD    1000u\n"));
        assert!(!header.contains("FREE_INTERRUPT_ENABLED"));

        assert!(header.contains("#define DEBUG_UART_BAUD_RATE    115200u\n"));
        assert!(header.contains("#define BUS_CLOCK_FREQ    100000u\n"));
        assert!(!header.contains("BUS_SLAVE_ADDR"));
        assert!(header.contains("#define TARGET_SLAVE_ADDR    0x3C\n"));
        assert!(header.contains("#define FLASH_MODE    3u\n"));

        assert!(header.contains("CY_ISR_PROTO(Tick_ISR);\nCY_ISR_PROTO(Watchdog_ISR);\n"));
        assert!(header.contains("void Led_1_Write(uint8 value);\n"));
        assert!(header.contains("uint8 Button_Read(void);\n"));
        assert!(!header.contains("Vsense_Read"));
    }

    #[test]
    fn test_peripheral_source() {
        let source = generate_peripheral_source(&board(), &fixed_config()).unwrap();

        let order: Vec<usize> = [
            "    /* Initialize Tick */",
            "    /* Initialize Free */",
            "    /* Initialize Debug Uart */",
            "    /* Initialize Bus */",
            "    /* Initialize Flash */",
            "    /* Initialize Led 1 */",
            "    /* Initialize Vsense */",
        ]
        .iter()
        .map(|line| source.find(line).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        assert!(source.contains("    Tick_Start();\n    Tick_ISR_StartEx(Tick_ISR);\n"));
        assert!(source.contains("    Debug_Uart_Start();\n"));
        assert!(source.contains("    LED_1_PORT_DR &= ~LED_1_MASK; // Set initial state to low\n"));
        assert!(!source.contains("BUTTON_PORT_DR &="));

        assert!(source.contains("    Tick_Handler();\n"));
        assert!(source.contains("    OnWatchdog();\n"));
        assert!(!source.contains("CY_ISR(Free_ISR)"));

        assert!(source.contains("        LED_1_PORT_DR |= LED_1_MASK;\n"));
        assert!(source.contains("    return (BUTTON_PORT_PS & BUTTON_MASK) ? 1u : 0u;\n"));
    }

    #[test]
    fn test_peripheral_output_is_deterministic() {
        let config = fixed_config();
        let first = generate_peripheral_code_with_config(&board(), &config).unwrap();
        let second = generate_peripheral_code_with_config(&board(), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.header,
            generate_peripheral_header(&board(), &config).unwrap()
        );
    }
}
