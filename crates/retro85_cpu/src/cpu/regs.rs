use bitflags::bitflags;

use super::CpuType;

/// Flag bits in the F register (low byte of AF).
///
/// The layout follows the Z80-style convention used by the lookup tables:
/// - bit 7: S (sign)
/// - bit 6: Z (zero)
/// - bit 4: H (half carry / auxiliary carry)
/// - bit 2: V (parity for logic ops, overflow for arithmetic)
/// - bit 1: N (set by subtractions)
/// - bit 0: C (carry)
pub const SF: u8 = 0x80;
pub const ZF: u8 = 0x40;
pub const HF: u8 = 0x10;
pub const VF: u8 = 0x04;
pub const NF: u8 = 0x02;
pub const CF: u8 = 0x01;

/// A 16-bit register that is also addressable as two 8-bit halves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pair(u16);

impl Pair {
    #[inline]
    pub const fn new(word: u16) -> Self {
        Self(word)
    }

    #[inline]
    pub const fn word(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn set_word(&mut self, value: u16) {
        self.0 = value;
    }

    #[inline]
    pub const fn hi(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    #[inline]
    pub const fn lo(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    #[inline]
    pub fn set_hi(&mut self, value: u8) {
        self.0 = u16::from_be_bytes([value, self.lo()]);
    }

    #[inline]
    pub fn set_lo(&mut self, value: u8) {
        self.0 = u16::from_be_bytes([self.hi(), value]);
    }
}

bitflags! {
    /// Bits shared by the interrupt mask, request and in-service bytes.
    ///
    /// In the mask, the three RST bits mean "masked" (set by SIM). `IEN` is
    /// the general interrupt enable toggled by EI/DI.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct InterruptBits: u8 {
        const SID = 0x80;
        const SOD = 0x40;
        const IEN = 0x20;
        const TRAP = 0x10;
        const INTR = 0x08;
        const RST75 = 0x04;
        const RST65 = 0x02;
        const RST55 = 0x01;
    }
}

impl Default for InterruptBits {
    fn default() -> Self {
        Self::empty()
    }
}

/// Electrical state of an external interrupt input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineState {
    #[default]
    Clear,
    Assert,
    Hold,
    Pulse,
}

impl LineState {
    #[inline]
    pub fn is_asserted(self) -> bool {
        self != LineState::Clear
    }

    pub fn raw(self) -> i8 {
        match self {
            LineState::Clear => 0,
            LineState::Assert => 1,
            LineState::Hold => 2,
            LineState::Pulse => 3,
        }
    }

    /// Unknown non-zero values are treated as an asserted line.
    pub fn from_raw(raw: i8) -> Self {
        match raw {
            0 => LineState::Clear,
            2 => LineState::Hold,
            3 => LineState::Pulse,
            _ => LineState::Assert,
        }
    }
}

/// Complete register file and interrupt bookkeeping of one CPU.
///
/// This is the unit copied by `Cpu::get_context` / `Cpu::set_context`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Regs {
    pub cpu_type: CpuType,
    pub pc: u16,
    pub sp: u16,
    pub af: Pair,
    pub bc: Pair,
    pub de: Pair,
    pub hl: Pair,
    /// Scratch register used inside a single instruction.
    pub xx: Pair,
    pub halted: bool,
    pub mask: InterruptBits,
    pub request: InterruptBits,
    /// At most one bit set: the interrupt currently being serviced.
    pub serviced: InterruptBits,
    pub intr_vector: u32,
    pub scheduled_irq: u32,
    pub executing_irq: u32,
    pub nmi_state: LineState,
    pub irq_state: [LineState; 4],
}

impl Regs {
    #[inline]
    pub fn a(&self) -> u8 {
        self.af.hi()
    }

    #[inline]
    pub fn set_a(&mut self, value: u8) {
        self.af.set_hi(value);
    }

    #[inline]
    pub fn f(&self) -> u8 {
        self.af.lo()
    }

    #[inline]
    pub fn set_f(&mut self, value: u8) {
        self.af.set_lo(value);
    }

    #[inline]
    pub fn flag(&self, flag: u8) -> bool {
        self.f() & flag != 0
    }

    #[inline]
    pub fn is_8085(&self) -> bool {
        self.cpu_type == CpuType::I8085
    }
}
