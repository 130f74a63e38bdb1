use crate::cpu::regs::{CF, SF, VF, ZF};
use crate::cpu::{Bus8085, Cpu};

/// Extra cycles charged by a conditional RET when it returns.
const RET_TAKEN_CYCLES: i32 = 6;

impl Cpu {
    /// Evaluate the condition encoded in opcode bits 3-5:
    /// NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, opcode: u8) -> bool {
        let f = self.regs.f();
        match (opcode >> 3) & 0x07 {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & VF == 0,
            5 => f & VF != 0,
            6 => f & SF == 0,
            7 => f & SF != 0,
            _ => unreachable!(),
        }
    }

    pub(super) fn exec_jmp<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.fetch_arg16(bus);
        self.jump(bus, addr);
    }

    /// Conditional jump: the full cost is charged whether taken or not.
    pub(super) fn exec_jmp_cc<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        if self.condition(opcode) {
            self.exec_jmp(bus);
        } else {
            self.regs.pc = self.regs.pc.wrapping_add(2);
        }
    }

    pub(super) fn exec_call<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.fetch_arg16(bus);
        let ret = self.regs.pc;
        self.push_word(bus, ret);
        self.jump(bus, addr);
    }

    pub(super) fn exec_call_cc<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        if self.condition(opcode) {
            self.icount = self.icount.saturating_sub(self.call_taken_cycles());
            self.exec_call(bus);
        } else {
            self.regs.pc = self.regs.pc.wrapping_add(2);
        }
    }

    pub(super) fn exec_ret<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.pop_word(bus);
        self.jump(bus, addr);
    }

    pub(super) fn exec_ret_cc<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        if self.condition(opcode) {
            self.icount = self.icount.saturating_sub(RET_TAKEN_CYCLES);
            self.exec_ret(bus);
        }
    }

    pub(super) fn exec_rst<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!(matches!(
            opcode,
            0xc7 | 0xcf | 0xd7 | 0xdf | 0xe7 | 0xef | 0xf7 | 0xff
        ));

        let ret = self.regs.pc;
        self.push_word(bus, ret);
        self.jump(bus, u16::from(opcode & 0x38));
    }

    pub(super) fn exec_pchl<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.regs.hl.word();
        self.jump(bus, addr);
    }
}
