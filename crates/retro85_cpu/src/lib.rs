pub mod cpu;

pub use cpu::context::{Register, SaveState, StateValue};
pub use cpu::interrupts::{
    ADDR_RST55, ADDR_RST65, ADDR_RST75, ADDR_TRAP, INTR_DEFAULT_VECTOR, INTR_LINE, RST55_LINE,
    RST65_LINE, RST75_LINE,
};
pub use cpu::regs::{InterruptBits, LineState, Pair, Regs};
pub use cpu::{Bus8085, Cpu, CpuType, IrqCallback, SodCallback};

/// Size of the 8080/8085 address space in bytes.
pub const ADDRESS_SPACE: usize = 0x10000;
