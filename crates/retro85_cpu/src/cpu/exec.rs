mod arith;
mod control;
mod ld;
mod stack;
mod system;

use super::tables::{CYCLES_8080, CYCLES_8085};
use super::{Bus8085, Cpu, CpuType};

impl Cpu {
    /// Decode and execute a single opcode, charging its base cost against the
    /// cycle budget. Every byte value has a defined behaviour.
    pub(super) fn execute_one<B: Bus8085>(&mut self, bus: &mut B, opcode: u8) {
        self.icount = self.icount.saturating_sub(i32::from(self.base_cycles(opcode)));

        match opcode {
            // NOP
            0x00 => {}

            // 8085 RIM / SIM (illegal on the 8080).
            0x20 => self.exec_rim(opcode),
            0x30 => self.exec_sim(opcode),

            // Undocumented opcodes.
            0x08 | 0x10 | 0x18 | 0x28 | 0x38 | 0xcb | 0xd9 | 0xdd | 0xed | 0xfd => {
                self.illegal(opcode)
            }

            // LXI rp,word
            0x01 | 0x11 | 0x21 | 0x31 => self.exec_lxi(bus, opcode),

            // STAX / LDAX
            0x02 | 0x12 => self.exec_stax(bus, opcode),
            0x0a | 0x1a => self.exec_ldax(bus, opcode),

            // SHLD / LHLD / STA / LDA
            0x22 => self.exec_shld(bus),
            0x2a => self.exec_lhld(bus),
            0x32 => self.exec_sta(bus),
            0x3a => self.exec_lda(bus),

            // INX / DCX
            0x03 | 0x13 | 0x23 | 0x33 => self.exec_inx(opcode),
            0x0b | 0x1b | 0x2b | 0x3b => self.exec_dcx(opcode),

            // INR / DCR (including M)
            0x04 | 0x0c | 0x14 | 0x1c | 0x24 | 0x2c | 0x34 | 0x3c => self.exec_inr(bus, opcode),
            0x05 | 0x0d | 0x15 | 0x1d | 0x25 | 0x2d | 0x35 | 0x3d => self.exec_dcr(bus, opcode),

            // MVI r,byte (including M)
            0x06 | 0x0e | 0x16 | 0x1e | 0x26 | 0x2e | 0x36 | 0x3e => self.exec_mvi(bus, opcode),

            // DAD rp
            0x09 | 0x19 | 0x29 | 0x39 => self.exec_dad(opcode),

            // Rotates, DAA, CMA, STC, CMC
            0x07 => self.alu_rlc(),
            0x0f => self.alu_rrc(),
            0x17 => self.alu_ral(),
            0x1f => self.alu_rar(),
            0x27 => self.alu_daa(),
            0x2f => self.exec_cma(),
            0x37 => self.exec_stc(),
            0x3f => self.exec_cmc(),

            // HLT sits in the middle of the MOV block.
            0x76 => self.exec_hlt(),

            // MOV r1,r2
            0x40..=0x7f => self.exec_mov(bus, opcode),

            // ADD/ADC/SUB/SBB/ANA/XRA/ORA/CMP r
            0x80..=0xbf => self.exec_alu_reg(bus, opcode),

            // Immediate accumulator operations (ADI..CPI)
            0xc6 | 0xce | 0xd6 | 0xde | 0xe6 | 0xee | 0xf6 | 0xfe => {
                self.exec_alu_imm(bus, opcode)
            }

            // Rcc / RET
            0xc0 | 0xc8 | 0xd0 | 0xd8 | 0xe0 | 0xe8 | 0xf0 | 0xf8 => {
                self.exec_ret_cc(bus, opcode)
            }
            0xc9 => self.exec_ret(bus),

            // Jcc / JMP
            0xc2 | 0xca | 0xd2 | 0xda | 0xe2 | 0xea | 0xf2 | 0xfa => {
                self.exec_jmp_cc(bus, opcode)
            }
            0xc3 => self.exec_jmp(bus),

            // Ccc / CALL
            0xc4 | 0xcc | 0xd4 | 0xdc | 0xe4 | 0xec | 0xf4 | 0xfc => {
                self.exec_call_cc(bus, opcode)
            }
            0xcd => self.exec_call(bus),

            // POP / PUSH
            0xc1 | 0xd1 | 0xe1 | 0xf1 => self.exec_pop(bus, opcode),
            0xc5 | 0xd5 | 0xe5 | 0xf5 => self.exec_push(bus, opcode),

            // RST n
            0xc7 | 0xcf | 0xd7 | 0xdf | 0xe7 | 0xef | 0xf7 | 0xff => self.exec_rst(bus, opcode),

            // OUT / IN
            0xd3 => self.exec_out(bus),
            0xdb => self.exec_in(bus),

            // XTHL / PCHL / XCHG / SPHL
            0xe3 => self.exec_xthl(bus),
            0xe9 => self.exec_pchl(bus),
            0xeb => self.exec_xchg(),
            0xf9 => self.exec_sphl(),

            // DI / EI
            0xf3 => self.exec_di(),
            0xfb => self.exec_ei(),
        }
    }

    fn base_cycles(&self, opcode: u8) -> u8 {
        match self.regs.cpu_type {
            CpuType::I8080 => CYCLES_8080[opcode as usize],
            CpuType::I8085 => CYCLES_8085[opcode as usize],
        }
    }

    /// Extra cycles charged by a conditional CALL when the call is taken.
    fn call_taken_cycles(&self) -> i32 {
        match self.regs.cpu_type {
            CpuType::I8080 => 6,
            CpuType::I8085 => 9,
        }
    }

    /// Read register `index` in the usual 8080 encoding
    /// (B, C, D, E, H, L, M, A), where M is the byte at HL.
    fn read_reg8<B: Bus8085>(&mut self, bus: &mut B, index: u8) -> u8 {
        match index & 0x07 {
            0 => self.regs.bc.hi(),
            1 => self.regs.bc.lo(),
            2 => self.regs.de.hi(),
            3 => self.regs.de.lo(),
            4 => self.regs.hl.hi(),
            5 => self.regs.hl.lo(),
            6 => bus.mem_read(self.regs.hl.word()),
            7 => self.regs.a(),
            _ => unreachable!(),
        }
    }

    fn write_reg8<B: Bus8085>(&mut self, bus: &mut B, index: u8, value: u8) {
        match index & 0x07 {
            0 => self.regs.bc.set_hi(value),
            1 => self.regs.bc.set_lo(value),
            2 => self.regs.de.set_hi(value),
            3 => self.regs.de.set_lo(value),
            4 => self.regs.hl.set_hi(value),
            5 => self.regs.hl.set_lo(value),
            6 => bus.mem_write(self.regs.hl.word(), value),
            7 => self.regs.set_a(value),
            _ => unreachable!(),
        }
    }

    /// Register pair selected by opcode bits 4-5 (BC, DE, HL, SP).
    fn read_rp(&self, opcode: u8) -> u16 {
        match (opcode >> 4) & 0x03 {
            0 => self.regs.bc.word(),
            1 => self.regs.de.word(),
            2 => self.regs.hl.word(),
            3 => self.regs.sp,
            _ => unreachable!(),
        }
    }

    fn write_rp(&mut self, opcode: u8, value: u16) {
        match (opcode >> 4) & 0x03 {
            0 => self.regs.bc.set_word(value),
            1 => self.regs.de.set_word(value),
            2 => self.regs.hl.set_word(value),
            3 => self.regs.sp = value,
            _ => unreachable!(),
        }
    }
}
