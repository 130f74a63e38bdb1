use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use retro85_cpu::{Cpu, CpuType, InterruptBits, Regs, SaveState};
use typed_builder::TypedBuilder;

pub mod machine;

pub use machine::FlatMachine;
use machine::{CPM_BDOS_ENTRY, CPM_TPA_START, CPM_TPA_TOP};

/// Default budget: one second of a 2 MHz part.
pub const DEFAULT_CYCLES: u64 = 2_000_000;

/// Cycles handed to `Cpu::execute` per slice outside CP/M mode.
const SLICE_CYCLES: i32 = 10_000;

pub const USAGE: &str = "usage: retro85 <rom> [--cpu 8080|8085] [--origin ADDR] [--cycles N] \
[--cpm] [--load-state FILE] [--save-state FILE]";

#[derive(Debug, Clone, TypedBuilder)]
pub struct RunConfig {
    #[builder(setter(into))]
    pub rom_path: PathBuf,
    #[builder(default)]
    pub cpu_type: CpuType,
    /// Load address and entry point (ignored in CP/M mode).
    #[builder(default)]
    pub origin: u16,
    #[builder(default = DEFAULT_CYCLES)]
    pub cycles: u64,
    #[builder(default)]
    pub cpm: bool,
    #[builder(default)]
    pub load_state: Option<PathBuf>,
    #[builder(default)]
    pub save_state: Option<PathBuf>,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub cpu_type: CpuType,
    pub cycles: u64,
    pub halted: bool,
    pub regs: Regs,
    /// Text written through the BDOS console functions.
    pub console: String,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.regs;
        write!(
            f,
            "{:?} PC={:04X} SP={:04X} AF={:04X} BC={:04X} DE={:04X} HL={:04X} \
             IM={:02X} cycles={}{}",
            self.cpu_type,
            r.pc,
            r.sp,
            r.af.word(),
            r.bc.word(),
            r.de.word(),
            r.hl.word(),
            r.mask.bits(),
            self.cycles,
            if self.halted { " halted" } else { "" },
        )
    }
}

/// Parse command-line arguments (without the program name).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<RunConfig> {
    let mut args = args.into_iter();
    let mut rom_path = None;
    let mut cpu_type = CpuType::default();
    let mut origin = 0;
    let mut cycles = DEFAULT_CYCLES;
    let mut cpm = false;
    let mut load_state = None;
    let mut save_state = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cpu" => {
                cpu_type = match option_value(&mut args, &arg)?.as_str() {
                    "8080" => CpuType::I8080,
                    "8085" => CpuType::I8085,
                    other => bail!("unknown cpu '{}' (expected 8080 or 8085)", other),
                }
            }
            "--origin" => {
                let value = parse_number(&option_value(&mut args, &arg)?)?;
                origin = u16::try_from(value)
                    .with_context(|| format!("origin {:#x} is outside the address space", value))?;
            }
            "--cycles" => cycles = parse_number(&option_value(&mut args, &arg)?)?,
            "--cpm" => cpm = true,
            "--load-state" => load_state = Some(PathBuf::from(option_value(&mut args, &arg)?)),
            "--save-state" => save_state = Some(PathBuf::from(option_value(&mut args, &arg)?)),
            flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
            _ if rom_path.is_none() => rom_path = Some(arg),
            _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
        }
    }

    let Some(rom_path) = rom_path else {
        bail!("no program image given\n{}", USAGE);
    };

    Ok(RunConfig::builder()
        .rom_path(rom_path)
        .cpu_type(cpu_type)
        .origin(origin)
        .cycles(cycles)
        .cpm(cpm)
        .load_state(load_state)
        .save_state(save_state)
        .build())
}

fn option_value(args: &mut impl Iterator<Item = String>, option: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("option '{}' needs a value", option))
}

/// Decimal, or hexadecimal with a `0x` prefix.
pub fn parse_number(text: &str) -> Result<u64> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid number '{}'", text))
}

/// Load the image named by `config` and run it.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let image = std::fs::read(&config.rom_path)
        .with_context(|| format!("failed to read {}", config.rom_path.display()))?;
    log::info!("Running image '{}'", config.rom_path.display());
    run_image(config, &image)
}

/// Run `image` according to `config`; the config's `rom_path` is not read.
pub fn run_image(config: &RunConfig, image: &[u8]) -> Result<RunReport> {
    let mut machine = FlatMachine::new(config.cpm);
    let mut cpu = Cpu::new(config.cpu_type);

    if config.cpm {
        machine.load(CPM_TPA_START, image)?;
        cpu.set_pc(CPM_TPA_START);
        cpu.set_sp(CPM_TPA_TOP);
    } else {
        machine.load(config.origin, image)?;
        cpu.set_pc(config.origin);
    }

    if let Some(path) = &config.load_state {
        cpu.state_load(&read_state(path)?);
    }

    let cycles = if config.cpm {
        run_cpm(&mut cpu, &mut machine, config.cycles)
    } else {
        run_flat(&mut cpu, &mut machine, config.cycles)
    };

    if let Some(path) = &config.save_state {
        write_state(path, &cpu.state_save())?;
    }

    let report = RunReport {
        cpu_type: cpu.cpu_type(),
        cycles,
        halted: cpu.halted(),
        regs: *cpu.regs(),
        console: String::from_utf8_lossy(machine.console()).into_owned(),
    };
    log::debug!("{}", report);
    Ok(report)
}

/// A halted CPU with interrupts disabled can never resume.
fn stuck(cpu: &Cpu) -> bool {
    cpu.halted() && !cpu.regs().mask.contains(InterruptBits::IEN)
}

fn run_flat(cpu: &mut Cpu, machine: &mut FlatMachine, budget: u64) -> u64 {
    let mut used = 0u64;
    while used < budget && !stuck(cpu) {
        let slice = (budget - used).min(SLICE_CYCLES as u64) as i32;
        let spent = cpu.execute(machine, slice);
        used += u64::try_from(spent).unwrap_or(0);
    }
    used
}

fn run_cpm(cpu: &mut Cpu, machine: &mut FlatMachine, budget: u64) -> u64 {
    let mut used = 0u64;
    while used < budget && !machine.finished() && !stuck(cpu) {
        if cpu.pc() == CPM_BDOS_ENTRY {
            machine.bdos_call(cpu.regs());
        }
        used += u64::from(cpu.step(machine));
    }
    used
}

fn read_state(path: &Path) -> Result<SaveState> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read save state {}", path.display()))?;
    SaveState::from_json(&json)
        .with_context(|| format!("malformed save state {}", path.display()))
}

fn write_state(path: &Path, state: &SaveState) -> Result<()> {
    let json = state.to_json().context("failed to encode save state")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write save state {}", path.display()))?;
    log::info!("saved state to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("retro85-{}-{}", std::process::id(), name))
    }

    #[test]
    fn parses_all_options() {
        let config = parse_args(args(&[
            "prog.bin",
            "--cpu",
            "8080",
            "--origin",
            "0x200",
            "--cycles",
            "5000",
            "--cpm",
            "--save-state",
            "out.json",
        ]))
        .unwrap();

        assert_eq!(config.rom_path, PathBuf::from("prog.bin"));
        assert_eq!(config.cpu_type, CpuType::I8080);
        assert_eq!(config.origin, 0x200);
        assert_eq!(config.cycles, 5000);
        assert!(config.cpm);
        assert_eq!(config.load_state, None);
        assert_eq!(config.save_state, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn defaults_and_errors() {
        let config = parse_args(args(&["a.bin"])).unwrap();
        assert_eq!(config.cpu_type, CpuType::I8085);
        assert_eq!(config.cycles, DEFAULT_CYCLES);
        assert!(!config.cpm);

        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["a.bin", "--cpu", "z80"])).is_err());
        assert!(parse_args(args(&["a.bin", "--origin", "0x10000"])).is_err());
        assert!(parse_args(args(&["a.bin", "--cycles"])).is_err());
        assert!(parse_args(args(&["a.bin", "--fast"])).is_err());
        assert!(parse_args(args(&["a.bin", "b.bin"])).is_err());
    }

    #[test]
    fn numbers_accept_hex_prefix() {
        assert_eq!(parse_number("42").unwrap(), 42);
        assert_eq!(parse_number("0x2A").unwrap(), 42);
        assert!(parse_number("0xZZ").is_err());
    }

    #[test]
    fn flat_run_stops_at_halt() {
        let config = RunConfig::builder().rom_path("mem").origin(0x0200).build();
        // MVI A,42h; HLT
        let report = run_image(&config, &[0x3e, 0x42, 0x76]).unwrap();

        assert!(report.halted);
        assert_eq!(report.regs.a(), 0x42);
        assert_eq!(report.regs.pc, 0x0202);
        assert!(report.cycles < DEFAULT_CYCLES);
        assert!(report.to_string().contains("PC=0202"));
    }

    #[test]
    fn cpm_program_prints_through_bdos() {
        let config = RunConfig::builder()
            .rom_path("ok.com")
            .cpu_type(CpuType::I8080)
            .cpm(true)
            .build();
        // MVI C,9; LXI D,msg; CALL 5; JMP 0; msg: "OK$"
        let image = [
            0x0e, 0x09, 0x11, 0x0b, 0x01, 0xcd, 0x05, 0x00, 0xc3, 0x00, 0x00, b'O', b'K', b'$',
        ];
        let report = run_image(&config, &image).unwrap();

        assert_eq!(report.console, "OK");
        assert_eq!(report.regs.pc, 0x0002);
    }

    #[test]
    fn cpm_character_output() {
        let config = RunConfig::builder().rom_path("c.com").cpm(true).build();
        // MVI C,2; MVI E,'!'; CALL 5; MVI C,0; CALL 5
        let image = [0x0e, 0x02, 0x1e, b'!', 0xcd, 0x05, 0x00, 0x0e, 0x00, 0xcd, 0x05, 0x00];
        let report = run_image(&config, &image).unwrap();
        assert_eq!(report.console, "!");
    }

    #[test]
    fn oversized_image_is_rejected() {
        let config = RunConfig::builder().rom_path("big").origin(0xff00).build();
        assert!(run_image(&config, &[0u8; 0x200]).is_err());
    }

    #[test]
    fn state_survives_save_and_load() {
        let saved = temp_path("state.json");
        let config = RunConfig::builder()
            .rom_path("mem")
            .save_state(Some(saved.clone()))
            .build();
        // LXI B,BEEFh; HLT
        run_image(&config, &[0x01, 0xef, 0xbe, 0x76]).unwrap();

        let config = RunConfig::builder()
            .rom_path("mem")
            .cycles(4)
            .load_state(Some(saved.clone()))
            .build();
        // The loaded state resumes on the HLT; the image itself is never run.
        let report = run_image(&config, &[0x01, 0x11, 0x11, 0x76]).unwrap();
        std::fs::remove_file(&saved).unwrap();

        assert_eq!(report.regs.bc.word(), 0xbeef);
        assert_eq!(report.regs.pc, 0x0003);
        assert!(report.halted);
    }

    fn run_com(name: &str, cpu_type: CpuType) -> RunReport {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("../../assets/roms/8080_tests");
        path.push(name);
        let config = RunConfig::builder()
            .rom_path(path)
            .cpu_type(cpu_type)
            .cpm(true)
            .cycles(u64::MAX)
            .build();
        run(&config).unwrap()
    }

    // The CP/M exercisers are not bundled and take a while; run them with
    // `cargo test -p retro85 -- --ignored` after dropping the .COM files into
    // assets/roms/8080_tests.

    #[test]
    #[ignore]
    fn run_tst8080() {
        let report = run_com("TST8080.COM", CpuType::I8080);
        assert!(report.console.contains("CPU IS OPERATIONAL"), "{}", report.console);
    }

    #[test]
    #[ignore]
    fn run_8080pre() {
        let report = run_com("8080PRE.COM", CpuType::I8080);
        assert!(!report.console.contains("ERROR"), "{}", report.console);
    }

    #[test]
    fn missing_rom_reports_path() {
        let config = RunConfig::builder().rom_path(temp_path("missing.bin")).build();
        let err = run(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.bin"));
    }
}
