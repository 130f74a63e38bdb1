use crate::cpu::{Bus8085, Cpu};

impl Cpu {
    /// Push a word: high byte first, each at a pre-decremented SP.
    pub(in crate::cpu) fn push_word<B: Bus8085>(&mut self, bus: &mut B, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.mem_write(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.mem_write(self.regs.sp, lo);
    }

    /// Pop a word: low byte first, each at a post-incremented SP.
    pub(in crate::cpu) fn pop_word<B: Bus8085>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.mem_read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.mem_read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    pub(super) fn exec_push<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!(matches!(opcode, 0xc5 | 0xd5 | 0xe5 | 0xf5));

        let value = match (opcode >> 4) & 0x03 {
            0 => self.regs.bc.word(),
            1 => self.regs.de.word(),
            2 => self.regs.hl.word(),
            3 => self.regs.af.word(),
            _ => unreachable!(),
        };
        self.push_word(bus, value);
    }

    pub(super) fn exec_pop<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!(matches!(opcode, 0xc1 | 0xd1 | 0xe1 | 0xf1));

        let value = self.pop_word(bus);
        match (opcode >> 4) & 0x03 {
            0 => self.regs.bc.set_word(value),
            1 => self.regs.de.set_word(value),
            2 => self.regs.hl.set_word(value),
            3 => self.regs.af.set_word(value),
            _ => unreachable!(),
        }
    }

    /// Exchange HL with the word on top of the stack; SP is unchanged.
    pub(super) fn exec_xthl<B: Bus8085>(&mut self, bus: &mut B) {
        let top = self.pop_word(bus);
        self.regs.xx.set_word(top);
        let hl = self.regs.hl.word();
        self.push_word(bus, hl);
        self.regs.hl = self.regs.xx;
    }
}
