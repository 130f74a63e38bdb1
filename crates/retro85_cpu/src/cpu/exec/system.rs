use crate::cpu::regs::InterruptBits;
use crate::cpu::{Bus8085, Cpu};

impl Cpu {
    /// HLT: park PC on the HALT byte so it re-executes until an interrupt,
    /// and end the current `execute` slice.
    pub(super) fn exec_hlt(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_sub(1);
        self.regs.halted = true;
        if self.icount > 0 {
            self.icount = 0;
        }
    }

    pub(super) fn exec_di(&mut self) {
        self.regs.mask.remove(InterruptBits::IEN);
    }

    pub(super) fn exec_ei(&mut self) {
        self.rearm_interrupts();
    }

    pub(super) fn exec_out<B: Bus8085>(&mut self, bus: &mut B) {
        let port = self.fetch_arg(bus);
        bus.io_write(u16::from(port), self.regs.a());
    }

    pub(super) fn exec_in<B: Bus8085>(&mut self, bus: &mut B) {
        let port = self.fetch_arg(bus);
        let value = bus.io_read(u16::from(port));
        self.regs.set_a(value);
    }

    /// RIM: copy the interrupt mask byte into A.
    pub(super) fn exec_rim(&mut self, opcode: u8) {
        if !self.regs.is_8085() {
            self.illegal(opcode);
            return;
        }
        self.regs.set_a(self.regs.mask.bits());
    }

    /// SIM: update RST masks and SOD from A.
    pub(super) fn exec_sim(&mut self, opcode: u8) {
        if !self.regs.is_8085() {
            self.illegal(opcode);
            return;
        }

        let a = self.regs.a();
        let sod = a & 0x80 != 0;
        if sod != self.regs.mask.contains(InterruptBits::SOD) {
            if let Some(callback) = self.sod_callback.as_mut() {
                callback(sod);
            }
        }

        let kept = InterruptBits::SID | InterruptBits::IEN | InterruptBits::TRAP;
        let loaded = InterruptBits::from_bits_retain(a) - (kept | InterruptBits::SOD);
        self.regs.mask = (self.regs.mask & kept) | loaded;
        self.regs.mask.set(InterruptBits::SOD, sod);

        // Bit 4 (R7.5) resets a latched RST7.5 request.
        if a & 0x10 != 0 {
            self.regs.request.remove(InterruptBits::RST75);
        }
    }

    pub(super) fn illegal(&mut self, opcode: u8) {
        log::warn!(
            "{:?}: illegal opcode {:#04x} at {:#06x}",
            self.regs.cpu_type,
            opcode,
            self.regs.pc.wrapping_sub(1)
        );
    }
}
