use crate::cpu::{Bus8085, Cpu};

impl Cpu {
    pub(super) fn exec_mov<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!((0x40..=0x7f).contains(&opcode) && opcode != 0x76);

        let value = self.read_reg8(bus, opcode);
        self.write_reg8(bus, opcode >> 3, value);
    }

    pub(super) fn exec_mvi<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!(
            matches!(opcode, 0x06 | 0x0e | 0x16 | 0x1e | 0x26 | 0x2e | 0x36 | 0x3e),
            "unexpected MVI opcode {opcode:#04x}"
        );

        let value = self.fetch_arg(bus);
        self.write_reg8(bus, opcode >> 3, value);
    }

    pub(super) fn exec_lxi<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        let value = self.fetch_arg16(bus);
        self.write_rp(opcode, value);
    }

    pub(super) fn exec_stax<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!(matches!(opcode, 0x02 | 0x12));
        let addr = self.read_rp(opcode);
        bus.mem_write(addr, self.regs.a());
    }

    pub(super) fn exec_ldax<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!(matches!(opcode, 0x0a | 0x1a));
        let addr = self.read_rp(opcode);
        let value = bus.mem_read(addr);
        self.regs.set_a(value);
    }

    pub(super) fn exec_sta<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.fetch_arg16(bus);
        bus.mem_write(addr, self.regs.a());
    }

    pub(super) fn exec_lda<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.fetch_arg16(bus);
        let value = bus.mem_read(addr);
        self.regs.set_a(value);
    }

    pub(super) fn exec_shld<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.fetch_arg16(bus);
        bus.mem_write(addr, self.regs.hl.lo());
        bus.mem_write(addr.wrapping_add(1), self.regs.hl.hi());
    }

    pub(super) fn exec_lhld<B: Bus8085>(&mut self, bus: &mut B) {
        let addr = self.fetch_arg16(bus);
        let lo = bus.mem_read(addr);
        let hi = bus.mem_read(addr.wrapping_add(1));
        self.regs.hl.set_word(u16::from_le_bytes([lo, hi]));
    }

    pub(super) fn exec_inx(&mut self, opcode: u8) {
        let value = self.read_rp(opcode).wrapping_add(1);
        self.write_rp(opcode, value);
    }

    pub(super) fn exec_dcx(&mut self, opcode: u8) {
        let value = self.read_rp(opcode).wrapping_sub(1);
        self.write_rp(opcode, value);
    }

    pub(super) fn exec_xchg(&mut self) {
        core::mem::swap(&mut self.regs.de, &mut self.regs.hl);
    }

    pub(super) fn exec_sphl(&mut self) {
        self.regs.sp = self.regs.hl.word();
    }
}
