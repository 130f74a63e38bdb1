//! Context API: bulk register-file copies, per-register access for
//! debuggers and named-field save states.

use std::collections::BTreeMap;
use std::mem;

use serde::{Deserialize, Serialize};

use super::interrupts::{INTR_LINE, RST55_LINE, RST65_LINE, RST75_LINE};
use super::regs::{InterruptBits, LineState, Regs};
use super::{Bus8085, Cpu};

/// Symbolic register ids for [`Cpu::get_reg`] / [`Cpu::set_reg`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// Not tracked by this core; always reads 0.
    PreviousPc,
    Pc,
    Sp,
    Af,
    Bc,
    De,
    Hl,
    Halt,
    /// Interrupt mask byte (what RIM reports).
    Im,
    /// Pending request bits.
    Ireq,
    /// In-service bit.
    Isrv,
    /// INTR vector.
    Vector,
    TrapState,
    IntrState,
    Rst55State,
    Rst65State,
    Rst75State,
    /// The 16-bit word at `SP + 2 * depth`.
    StackContents(u16),
}

impl Cpu {
    /// Copy the register file into `dst`. Returns the size of the context
    /// in bytes whether or not a destination was given.
    pub fn get_context(&self, dst: Option<&mut Regs>) -> usize {
        if let Some(dst) = dst {
            *dst = self.regs;
        }
        mem::size_of::<Regs>()
    }

    /// Replace the register file with `src`; `None` leaves it untouched.
    pub fn set_context(&mut self, src: Option<&Regs>) {
        if let Some(src) = src {
            self.regs = *src;
        }
    }

    pub fn get_reg<B: Bus8085>(&self, bus: &mut B, reg: Register) -> u32 {
        let r = &self.regs;
        match reg {
            Register::PreviousPc => 0,
            Register::Pc => u32::from(r.pc),
            Register::Sp => u32::from(r.sp),
            Register::Af => u32::from(r.af.word()),
            Register::Bc => u32::from(r.bc.word()),
            Register::De => u32::from(r.de.word()),
            Register::Hl => u32::from(r.hl.word()),
            Register::Halt => u32::from(r.halted),
            Register::Im => u32::from(r.mask.bits()),
            Register::Ireq => u32::from(r.request.bits()),
            Register::Isrv => u32::from(r.serviced.bits()),
            Register::Vector => r.intr_vector,
            Register::TrapState => line_value(r.nmi_state),
            Register::IntrState => line_value(r.irq_state[INTR_LINE]),
            Register::Rst55State => line_value(r.irq_state[RST55_LINE]),
            Register::Rst65State => line_value(r.irq_state[RST65_LINE]),
            Register::Rst75State => line_value(r.irq_state[RST75_LINE]),
            Register::StackContents(depth) => match self.stack_slot(depth) {
                Some(addr) => {
                    let lo = bus.mem_read(addr);
                    let hi = bus.mem_read(addr + 1);
                    u32::from(u16::from_le_bytes([lo, hi]))
                }
                None => 0,
            },
        }
    }

    /// Write a register. Line-state ids take a raw line state (0 clear,
    /// 1 assert, 2 hold, 3 pulse) and drive that input exactly as
    /// [`Cpu::set_nmi_line`] / [`Cpu::set_irq_line`] would, so the value
    /// reads back unchanged.
    pub fn set_reg<B: Bus8085>(&mut self, bus: &mut B, reg: Register, value: u32) {
        let word = value as u16;
        let byte = value as u8;
        match reg {
            Register::PreviousPc => {}
            Register::Pc => self.regs.pc = word,
            Register::Sp => self.regs.sp = word,
            Register::Af => self.regs.af.set_word(word),
            Register::Bc => self.regs.bc.set_word(word),
            Register::De => self.regs.de.set_word(word),
            Register::Hl => self.regs.hl.set_word(word),
            Register::Halt => self.regs.halted = value != 0,
            Register::Im => self.regs.mask = InterruptBits::from_bits_retain(byte),
            Register::Ireq => self.regs.request = InterruptBits::from_bits_retain(byte),
            Register::Isrv => self.regs.serviced = InterruptBits::from_bits_retain(byte),
            Register::Vector => self.regs.intr_vector = value,
            Register::TrapState => self.set_nmi_line(line_state(value)),
            Register::IntrState => self.set_irq_line(INTR_LINE, line_state(value)),
            Register::Rst55State => self.set_irq_line(RST55_LINE, line_state(value)),
            Register::Rst65State => self.set_irq_line(RST65_LINE, line_state(value)),
            Register::Rst75State => self.set_irq_line(RST75_LINE, line_state(value)),
            Register::StackContents(depth) => {
                if let Some(addr) = self.stack_slot(depth) {
                    let [lo, hi] = word.to_le_bytes();
                    bus.mem_write(addr, lo);
                    bus.mem_write(addr + 1, hi);
                }
            }
        }
    }

    /// Address of stack slot `depth`, or `None` once the word would run past
    /// the top of memory.
    fn stack_slot(&self, depth: u16) -> Option<u16> {
        let addr = u32::from(self.regs.sp) + 2 * u32::from(depth);
        if addr < 0xffff {
            Some(addr as u16)
        } else {
            None
        }
    }

    /// Capture every persistent field under its stable name.
    pub fn state_save(&self) -> SaveState {
        let r = &self.regs;
        let mut state = SaveState::new();
        state.put_scalar("AF", r.af.word().into());
        state.put_scalar("BC", r.bc.word().into());
        state.put_scalar("DE", r.de.word().into());
        state.put_scalar("HL", r.hl.word().into());
        state.put_scalar("SP", r.sp.into());
        state.put_scalar("PC", r.pc.into());
        state.put_scalar("HALT", r.halted.into());
        state.put_scalar("IM", r.mask.bits().into());
        state.put_scalar("IREQ", r.request.bits().into());
        state.put_scalar("ISRV", r.serviced.bits().into());
        state.put_scalar("INTR", r.intr_vector.into());
        state.put_scalar("IRQ2", r.scheduled_irq.into());
        state.put_scalar("IRQ1", r.executing_irq.into());
        state.put_scalar("NMI_STATE", r.nmi_state.raw().into());
        state.put_array(
            "IRQ_STATE",
            r.irq_state.iter().map(|s| i64::from(s.raw())).collect(),
        );
        state
    }

    /// Restore fields from `state`. Fields that are missing keep their
    /// current value; fields with the wrong shape or range are skipped.
    pub fn state_load(&mut self, state: &SaveState) {
        let r = &mut self.regs;
        if let Some(v) = state.scalar::<u16>("AF") {
            r.af.set_word(v);
        }
        if let Some(v) = state.scalar::<u16>("BC") {
            r.bc.set_word(v);
        }
        if let Some(v) = state.scalar::<u16>("DE") {
            r.de.set_word(v);
        }
        if let Some(v) = state.scalar::<u16>("HL") {
            r.hl.set_word(v);
        }
        if let Some(v) = state.scalar::<u16>("SP") {
            r.sp = v;
        }
        if let Some(v) = state.scalar::<u16>("PC") {
            r.pc = v;
        }
        if let Some(v) = state.scalar::<u8>("HALT") {
            r.halted = v != 0;
        }
        if let Some(v) = state.scalar::<u8>("IM") {
            r.mask = InterruptBits::from_bits_retain(v);
        }
        if let Some(v) = state.scalar::<u8>("IREQ") {
            r.request = InterruptBits::from_bits_retain(v);
        }
        if let Some(v) = state.scalar::<u8>("ISRV") {
            r.serviced = InterruptBits::from_bits_retain(v);
        }
        if let Some(v) = state.scalar::<u32>("INTR") {
            r.intr_vector = v;
        }
        if let Some(v) = state.scalar::<u32>("IRQ2") {
            r.scheduled_irq = v;
        }
        if let Some(v) = state.scalar::<u32>("IRQ1") {
            r.executing_irq = v;
        }
        if let Some(v) = state.scalar::<i8>("NMI_STATE") {
            r.nmi_state = LineState::from_raw(v);
        }
        if let Some(values) = state.array::<i8>("IRQ_STATE", r.irq_state.len()) {
            for (slot, raw) in r.irq_state.iter_mut().zip(values) {
                *slot = LineState::from_raw(raw);
            }
        }
    }
}

fn line_value(state: LineState) -> u32 {
    state.raw() as u32
}

fn line_state(value: u32) -> LineState {
    LineState::from_raw(value as i8)
}

/// One saved field: a single integer or a fixed-length list of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Scalar(i64),
    Array(Vec<i64>),
}

/// Save state keyed by field name.
///
/// Serialises as a flat JSON object, e.g. `{"AF": 4660, "IRQ_STATE": [0, 1, 0, 0]}`.
/// Key order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveState {
    fields: BTreeMap<String, StateValue>,
}

impl SaveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_scalar(&mut self, name: &str, value: i64) {
        self.fields.insert(name.to_owned(), StateValue::Scalar(value));
    }

    pub fn put_array(&mut self, name: &str, values: Vec<i64>) {
        self.fields.insert(name.to_owned(), StateValue::Array(values));
    }

    pub fn get(&self, name: &str) -> Option<&StateValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<StateValue> {
        self.fields.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Scalar field converted to `T`. Logs and returns `None` when the field
    /// is an array or out of range for `T`.
    pub fn scalar<T: TryFrom<i64>>(&self, name: &str) -> Option<T> {
        match self.fields.get(name)? {
            StateValue::Scalar(v) => {
                let converted = T::try_from(*v).ok();
                if converted.is_none() {
                    log::warn!("save state field {} out of range: {}", name, v);
                }
                converted
            }
            StateValue::Array(_) => {
                log::warn!("save state field {} should be a scalar", name);
                None
            }
        }
    }

    /// Array field of exactly `len` entries, each converted to `T`.
    pub fn array<T: TryFrom<i64>>(&self, name: &str, len: usize) -> Option<Vec<T>> {
        let values = match self.fields.get(name)? {
            StateValue::Array(values) if values.len() == len => values,
            other => {
                log::warn!(
                    "save state field {} should hold {} entries, got {:?}",
                    name,
                    len,
                    other
                );
                return None;
            }
        };
        let converted: Option<Vec<T>> = values.iter().map(|v| T::try_from(*v).ok()).collect();
        if converted.is_none() {
            log::warn!("save state field {} has out of range entries", name);
        }
        converted
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::regs::Pair;

    const FIELD_NAMES: [&str; 15] = [
        "AF", "BC", "DE", "HL", "SP", "PC", "HALT", "IM", "IREQ", "ISRV", "INTR", "IRQ2",
        "IRQ1", "NMI_STATE", "IRQ_STATE",
    ];

    fn busy_cpu() -> Cpu {
        let mut cpu = Cpu::new_8085();
        let regs = Regs {
            pc: 0x1234,
            sp: 0xfff0,
            af: Pair::new(0x42d5),
            bc: Pair::new(0x0102),
            de: Pair::new(0x0304),
            hl: Pair::new(0x0506),
            halted: true,
            mask: InterruptBits::IEN | InterruptBits::RST55,
            request: InterruptBits::RST65,
            serviced: InterruptBits::RST65,
            intr_vector: 0xcd_0100,
            scheduled_irq: 0x34,
            executing_irq: 0,
            nmi_state: LineState::Assert,
            irq_state: [LineState::Clear, LineState::Assert, LineState::Clear, LineState::Hold],
            ..cpu.regs
        };
        cpu.set_context(Some(&regs));
        cpu
    }

    #[test]
    fn context_size_and_none_arguments() {
        let mut cpu = busy_cpu();
        let before = cpu.regs;
        assert_eq!(cpu.get_context(None), mem::size_of::<Regs>());
        cpu.set_context(None);
        assert_eq!(cpu.regs, before);
    }

    #[test]
    fn context_round_trip_into_fresh_cpu() {
        let source = busy_cpu();
        let mut snapshot = Regs::default();
        source.get_context(Some(&mut snapshot));

        let mut target = Cpu::new_8085();
        target.set_context(Some(&snapshot));
        assert_eq!(target.regs, source.regs);
    }

    #[test]
    fn state_save_uses_stable_names() {
        let state = busy_cpu().state_save();
        let mut names: Vec<&str> = state.names().collect();
        names.sort_unstable();
        let mut expected = FIELD_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);

        assert_eq!(state.get("AF"), Some(&StateValue::Scalar(0x42d5)));
        assert_eq!(state.get("HALT"), Some(&StateValue::Scalar(1)));
        assert_eq!(
            state.get("IRQ_STATE"),
            Some(&StateValue::Array(vec![0, 1, 0, 2]))
        );
    }

    #[test]
    fn json_round_trip_restores_every_field() {
        let source = busy_cpu();
        let json = source.state_save().to_json().unwrap();
        assert!(json.contains("\"NMI_STATE\""));

        let mut target = Cpu::new_8085();
        target.state_load(&SaveState::from_json(&json).unwrap());
        assert_eq!(target.regs, source.regs);
    }

    #[test]
    fn missing_fields_leave_registers_alone() {
        let mut cpu = busy_cpu();
        let mut state = SaveState::new();
        state.put_scalar("PC", 0x0100);

        cpu.state_load(&state);
        assert_eq!(cpu.regs.pc, 0x0100);
        assert_eq!(cpu.regs.sp, 0xfff0);
        assert_eq!(cpu.regs.af.word(), 0x42d5);
    }

    #[test]
    fn malformed_fields_are_skipped() {
        let mut cpu = busy_cpu();
        let state = SaveState::from_json(
            r#"{"PC": [1, 2], "SP": 70000, "BC": 7, "IRQ_STATE": [1, 1]}"#,
        )
        .unwrap();

        cpu.state_load(&state);
        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cpu.regs.sp, 0xfff0);
        assert_eq!(cpu.regs.bc.word(), 7);
        assert_eq!(cpu.regs.irq_state[3], LineState::Hold);
    }

    #[test]
    fn non_integer_json_is_an_error() {
        assert!(SaveState::from_json(r#"{"PC": "zero"}"#).is_err());
        assert!(SaveState::from_json("[1, 2]").is_err());
    }
}
