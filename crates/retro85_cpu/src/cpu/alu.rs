use super::regs::{CF, HF, NF, SF, VF};
use super::tables::{DAA, ZS, ZSP};
use super::Cpu;

impl Cpu {
    pub(super) fn alu_add(&mut self, value: u8) {
        self.add_with_carry(value, 0);
    }

    pub(super) fn alu_adc(&mut self, value: u8) {
        let carry = self.regs.f() & CF;
        self.add_with_carry(value, carry);
    }

    pub(super) fn alu_sub(&mut self, value: u8) {
        let result = self.subtract(value, 0);
        self.regs.set_a(result);
    }

    pub(super) fn alu_sbb(&mut self, value: u8) {
        let borrow = self.regs.f() & CF;
        let result = self.subtract(value, borrow);
        self.regs.set_a(result);
    }

    pub(super) fn alu_cmp(&mut self, value: u8) {
        self.subtract(value, 0);
    }

    pub(super) fn alu_ana(&mut self, value: u8) {
        let result = self.regs.a() & value;
        self.regs.set_a(result);
        self.regs.set_f(ZSP[result as usize] | HF);
    }

    pub(super) fn alu_xra(&mut self, value: u8) {
        let result = self.regs.a() ^ value;
        self.regs.set_a(result);
        self.regs.set_f(ZSP[result as usize]);
    }

    pub(super) fn alu_ora(&mut self, value: u8) {
        let result = self.regs.a() | value;
        self.regs.set_a(result);
        self.regs.set_f(ZSP[result as usize]);
    }

    /// Dispatch one of the eight accumulator operations by its opcode bits 3-5
    /// (ADD, ADC, SUB, SBB, ANA, XRA, ORA, CMP).
    pub(super) fn alu_op(&mut self, op: u8, value: u8) {
        match op & 0x07 {
            0 => self.alu_add(value),
            1 => self.alu_adc(value),
            2 => self.alu_sub(value),
            3 => self.alu_sbb(value),
            4 => self.alu_ana(value),
            5 => self.alu_xra(value),
            6 => self.alu_ora(value),
            7 => self.alu_cmp(value),
            _ => unreachable!(),
        }
    }

    fn add_with_carry(&mut self, value: u8, carry: u8) {
        let a = self.regs.a();
        let q = u16::from(a) + u16::from(value) + u16::from(carry);
        let result = q as u8;
        let f = ZS[result as usize]
            | ((q >> 8) as u8 & CF)
            | ((a ^ result ^ value) & HF)
            | (((value ^ a ^ SF) & (value ^ result) & SF) >> 5);
        self.regs.set_f(f);
        self.regs.set_a(result);
    }

    /// Compute `A - value - borrow`, set flags and return the result without
    /// storing it (CMP discards it).
    fn subtract(&mut self, value: u8, borrow: u8) -> u8 {
        let a = self.regs.a();
        let q = u16::from(a)
            .wrapping_sub(u16::from(value))
            .wrapping_sub(u16::from(borrow));
        let result = q as u8;
        let f = ZS[result as usize]
            | ((q >> 8) as u8 & CF)
            | NF
            | ((a ^ result ^ value) & HF)
            | (((value ^ a) & (a ^ result) & SF) >> 5);
        self.regs.set_f(f);
        result
    }

    pub(super) fn alu_inr(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        // Carry flag is not affected by INR.
        let mut f = (self.regs.f() & CF) | ZS[result as usize];
        if result == 0x80 {
            f |= VF;
        }
        if result & 0x0f == 0 {
            f |= HF;
        }
        self.regs.set_f(f);
        result
    }

    pub(super) fn alu_dcr(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        // Carry flag is not affected by DCR.
        let mut f = (self.regs.f() & CF) | NF | ZS[result as usize];
        if value == 0x80 {
            f |= VF;
        }
        if value & 0x0f == 0 {
            f |= HF;
        }
        self.regs.set_f(f);
        result
    }

    pub(super) fn alu_dad(&mut self, value: u16) {
        let hl = u32::from(self.regs.hl.word());
        let q = hl + u32::from(value);
        let f = (self.regs.f() & !(HF | CF))
            | (((hl ^ q ^ u32::from(value)) >> 8) as u8 & HF)
            | ((q >> 16) as u8 & CF);
        self.regs.set_f(f);
        self.regs.hl.set_word(q as u16);
    }

    pub(super) fn alu_rlc(&mut self) {
        let a = self.regs.a().rotate_left(1);
        self.regs.set_a(a);
        self.set_rotate_carry(a & 0x01);
    }

    pub(super) fn alu_rrc(&mut self) {
        let a = self.regs.a();
        self.regs.set_a(a.rotate_right(1));
        self.set_rotate_carry(a & 0x01);
    }

    pub(super) fn alu_ral(&mut self) {
        let a = self.regs.a();
        let carry_in = self.regs.f() & CF;
        self.regs.set_a((a << 1) | carry_in);
        self.set_rotate_carry(a >> 7);
    }

    pub(super) fn alu_rar(&mut self) {
        let a = self.regs.a();
        let carry_in = (self.regs.f() & CF) << 7;
        self.regs.set_a((a >> 1) | carry_in);
        self.set_rotate_carry(a & 0x01);
    }

    fn set_rotate_carry(&mut self, carry: u8) {
        let f = (self.regs.f() & !(HF | NF | CF)) | (carry & CF);
        self.regs.set_f(f);
    }

    pub(super) fn alu_daa(&mut self) {
        let f = self.regs.f();
        let mut index = usize::from(self.regs.a());
        if f & CF != 0 {
            index |= 0x100;
        }
        if f & HF != 0 {
            index |= 0x200;
        }
        if f & NF != 0 {
            index |= 0x400;
        }
        self.regs.af.set_word(DAA[index]);
    }
}
