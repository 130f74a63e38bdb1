use crate::cpu::regs::{CF, HF, NF};
use crate::cpu::{Bus8085, Cpu};

impl Cpu {
    pub(super) fn exec_alu_reg<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!((0x80..=0xbf).contains(&opcode));
        let value = self.read_reg8(bus, opcode);
        self.alu_op(opcode >> 3, value);
    }

    pub(super) fn exec_alu_imm<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        let value = self.fetch_arg(bus);
        self.alu_op(opcode >> 3, value);
    }

    pub(super) fn exec_inr<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        let reg = opcode >> 3;
        let value = self.read_reg8(bus, reg);
        let result = self.alu_inr(value);
        self.write_reg8(bus, reg, result);
    }

    pub(super) fn exec_dcr<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        let reg = opcode >> 3;
        let value = self.read_reg8(bus, reg);
        let result = self.alu_dcr(value);
        self.write_reg8(bus, reg, result);
    }

    pub(super) fn exec_dad(&mut self, opcode: u8) {
        debug_assert!(matches!(opcode, 0x09 | 0x19 | 0x29 | 0x39));
        let value = self.read_rp(opcode);
        self.alu_dad(value);
    }

    pub(super) fn exec_cma(&mut self) {
        let a = !self.regs.a();
        self.regs.set_a(a);
    }

    pub(super) fn exec_stc(&mut self) {
        let f = (self.regs.f() & !(HF | NF)) | CF;
        self.regs.set_f(f);
    }

    pub(super) fn exec_cmc(&mut self) {
        let f = (self.regs.f() & !(HF | NF)) ^ CF;
        self.regs.set_f(f);
    }
}
