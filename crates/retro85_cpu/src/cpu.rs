mod alu;
pub mod context;
mod exec;
pub mod interrupts;
pub mod regs;
pub mod tables;

use std::fmt;

use regs::{InterruptBits, Regs};

/// Bus interface for an Intel 8080/8085 core.
///
/// The CPU uses this trait to access memory and IO ports without knowing
/// anything about the concrete machine around it.
pub trait Bus8085 {
    fn mem_read(&mut self, addr: u16) -> u8;
    fn mem_write(&mut self, addr: u16, value: u8);

    fn io_read(&mut self, port: u16) -> u8;
    fn io_write(&mut self, port: u16, value: u8);

    /// Instruction fetch. Buses with separate opcode decoding (e.g. encrypted
    /// ROMs) can override this; the default is a plain memory read.
    fn opcode_read(&mut self, addr: u16) -> u8 {
        self.mem_read(addr)
    }

    /// Immediate operand fetch.
    fn opcode_arg_read(&mut self, addr: u16) -> u8 {
        self.mem_read(addr)
    }

    /// Called after every non-sequential change of PC (jumps, calls, returns,
    /// interrupt entry). Useful for bank switching or fetch caches.
    fn pc_changed(&mut self, _pc: u16) {}
}

/// Which member of the family is emulated.
///
/// The 8085 adds RIM/SIM, the TRAP input and the RST5.5/6.5/7.5 lines, and
/// runs most instructions with different T-state counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CpuType {
    I8080,
    #[default]
    I8085,
}

/// Interrupt acknowledge hook.
///
/// Called with the line being serviced (0 = INTR, 1..=3 = RST5.5/6.5/7.5) and
/// returns the vector to dispatch: `0xCDnnnn` (CALL nnnn), `0xC3nnnn`
/// (JMP nnnn), one of the fixed RST addresses, or an opcode in the low byte.
///
/// The hook runs inside `Cpu::execute` and must not drive the same CPU.
pub type IrqCallback = Box<dyn FnMut(usize) -> u32>;

/// Called with the new level whenever SIM changes the SOD output pin.
pub type SodCallback = Box<dyn FnMut(bool)>;

/// Intel 8080/8085 interpreter.
///
/// A `Cpu` owns its register file and interrupt state. Memory and IO are
/// supplied per call through a [`Bus8085`], so several independent CPUs can
/// coexist in one process.
pub struct Cpu {
    regs: Regs,
    /// Remaining cycle budget of the current `execute` call.
    icount: i32,
    irq_callback: Option<IrqCallback>,
    sod_callback: Option<SodCallback>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(CpuType::I8085)
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("regs", &self.regs)
            .field("icount", &self.icount)
            .field("irq_callback", &self.irq_callback.is_some())
            .field("sod_callback", &self.sod_callback.is_some())
            .finish()
    }
}

impl Cpu {
    /// Create a new CPU instance in reset state.
    pub fn new(cpu_type: CpuType) -> Self {
        let mut cpu = Self {
            regs: Regs::default(),
            icount: 0,
            irq_callback: None,
            sod_callback: None,
        };
        cpu.regs.cpu_type = cpu_type;
        cpu
    }

    pub fn new_8080() -> Self {
        Self::new(CpuType::I8080)
    }

    pub fn new_8085() -> Self {
        Self::new(CpuType::I8085)
    }

    pub fn cpu_type(&self) -> CpuType {
        self.regs.cpu_type
    }

    /// Reset all registers and interrupt state to zero.
    ///
    /// The CPU type and installed callbacks are kept.
    pub fn reset(&mut self) {
        let cpu_type = self.regs.cpu_type;
        self.regs = Regs::default();
        self.regs.cpu_type = cpu_type;
        self.icount = 0;
        log::debug!("{:?} reset", cpu_type);
    }

    /// Release host hooks. The register file is left as is.
    pub fn exit(&mut self) {
        self.irq_callback = None;
        self.sod_callback = None;
    }

    pub fn set_irq_callback(&mut self, callback: IrqCallback) {
        self.irq_callback = Some(callback);
    }

    pub fn set_sod_callback(&mut self, callback: SodCallback) {
        self.sod_callback = Some(callback);
    }

    pub fn regs(&self) -> &Regs {
        &self.regs
    }

    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.regs.pc = pc;
    }

    pub fn sp(&self) -> u16 {
        self.regs.sp
    }

    pub fn set_sp(&mut self, sp: u16) {
        self.regs.sp = sp;
    }

    pub fn halted(&self) -> bool {
        self.regs.halted
    }

    /// Cycles left in the budget of the current (or last) `execute` call.
    pub fn remaining_cycles(&self) -> i32 {
        self.icount
    }

    /// Run instructions until `cycles` T-states have been consumed.
    ///
    /// At least one instruction is always executed. Returns the number of
    /// cycles actually used, which may overshoot the budget by the cost of
    /// the last instruction. HALT ends the call early by zeroing the budget.
    /// A negative budget is treated as zero; the result saturates at
    /// `i32::MAX`.
    pub fn execute<B: Bus8085>(&mut self, bus: &mut B, cycles: i32) -> i32 {
        let cycles = cycles.max(0);
        self.icount = cycles;
        loop {
            self.run_instruction(bus);
            if self.icount <= 0 {
                break;
            }
        }
        cycles.saturating_sub(self.icount)
    }

    /// Execute a single instruction (servicing a pending interrupt first)
    /// and return the number of cycles consumed.
    pub fn step<B: Bus8085>(&mut self, bus: &mut B) -> u32 {
        self.icount = 0;
        self.run_instruction(bus);
        self.icount.unsigned_abs()
    }

    fn run_instruction<B: Bus8085>(&mut self, bus: &mut B) {
        // TRAP is non-maskable, so a pending TRAP also promotes the schedule.
        if self.regs.mask.contains(InterruptBits::IEN)
            || self.regs.request.contains(InterruptBits::TRAP)
        {
            self.regs.executing_irq = self.regs.scheduled_irq;
            self.regs.scheduled_irq = 0;
            if self.regs.executing_irq != 0 {
                self.take_interrupt(bus);
            }
        }

        let opcode = self.fetch_opcode(bus);
        self.execute_one(bus, opcode);
    }

    fn fetch_opcode<B: Bus8085>(&mut self, bus: &mut B) -> u8 {
        let op = bus.opcode_read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        op
    }

    fn fetch_arg<B: Bus8085>(&mut self, bus: &mut B) -> u8 {
        let b = bus.opcode_arg_read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        b
    }

    fn fetch_arg16<B: Bus8085>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_arg(bus);
        let hi = self.fetch_arg(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn jump<B: Bus8085>(&mut self, bus: &mut B, addr: u16) {
        self.regs.pc = addr;
        bus.pc_changed(addr);
    }
}
