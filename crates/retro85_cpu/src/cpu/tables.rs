//! Flag lookup tables and per-opcode cycle costs.

use super::regs::{CF, HF, NF, SF, VF, ZF};

/// Zero and sign flags for every byte value.
pub static ZS: [u8; 256] = build_zs();

/// Zero, sign and parity flags for every byte value.
pub static ZSP: [u8; 256] = build_zsp();

/// DAA results (A in the high byte, F in the low byte).
///
/// Indexed by `A | C << 8 | H << 9 | N << 10`.
pub static DAA: [u16; 2048] = build_daa();

const fn zs_flags(value: u8) -> u8 {
    let mut f = 0;
    if value == 0 {
        f |= ZF;
    }
    if value & 0x80 != 0 {
        f |= SF;
    }
    f
}

const fn zsp_flags(value: u8) -> u8 {
    let mut f = zs_flags(value);
    if value.count_ones() % 2 == 0 {
        f |= VF;
    }
    f
}

const fn build_zs() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = zs_flags(i as u8);
        i += 1;
    }
    table
}

const fn build_zsp() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = zsp_flags(i as u8);
        i += 1;
    }
    table
}

const fn daa_entry(index: usize) -> u16 {
    let a = (index & 0xff) as u8;
    let carry = index & 0x100 != 0;
    let half = index & 0x200 != 0;
    let subtract = index & 0x400 != 0;

    let mut adjust = 0u8;
    let mut carry_out = carry;
    if half || (a & 0x0f) > 9 {
        adjust |= 0x06;
    }
    if carry || a > 0x99 {
        adjust |= 0x60;
        carry_out = true;
    }

    let (result, half_out) = if subtract {
        (a.wrapping_sub(adjust), half && (a & 0x0f) < 6)
    } else {
        (a.wrapping_add(adjust), (a & 0x0f) > 9)
    };

    let mut f = zsp_flags(result);
    if carry_out {
        f |= CF;
    }
    if half_out {
        f |= HF;
    }
    if subtract {
        f |= NF;
    }
    u16::from_be_bytes([result, f])
}

const fn build_daa() -> [u16; 2048] {
    let mut table = [0u16; 2048];
    let mut i = 0;
    while i < 2048 {
        table[i] = daa_entry(i);
        i += 1;
    }
    table
}

/// Base T-states per opcode on the 8080.
///
/// Conditional CALL/RET add 6 more when taken.
#[rustfmt::skip]
pub static CYCLES_8080: [u8; 256] = [
    //0  1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    4,  10,  7,  5,  5,  5,  7,  4,  4, 10,  7,  5,  5,  5,  7,  4, // 0x00
    4,  10,  7,  5,  5,  5,  7,  4,  4, 10,  7,  5,  5,  5,  7,  4, // 0x10
    4,  10, 16,  5,  5,  5,  7,  4,  4, 10, 16,  5,  5,  5,  7,  4, // 0x20
    4,  10, 13,  5, 10, 10, 10,  4,  4, 10, 13,  5,  5,  5,  7,  4, // 0x30
    5,   5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 0x40
    5,   5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 0x50
    5,   5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 0x60
    7,   7,  7,  7,  7,  7,  7,  7,  5,  5,  5,  5,  5,  5,  7,  5, // 0x70
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0x80
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0x90
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0xA0
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0xB0
    5,  10, 10, 10, 11, 11,  7, 11,  5, 10, 10,  4, 11, 17,  7, 11, // 0xC0
    5,  10, 10, 10, 11, 11,  7, 11,  5,  4, 10, 10, 11,  4,  7, 11, // 0xD0
    5,  10, 10, 18, 11, 11,  7, 11,  5,  5, 10,  4, 11,  4,  7, 11, // 0xE0
    5,  10, 10,  4, 11, 11,  7, 11,  5,  5, 10,  4, 11,  4,  7, 11, // 0xF0
];

/// Base T-states per opcode on the 8085.
///
/// Conditional RET adds 6 when taken, conditional CALL adds 9.
#[rustfmt::skip]
pub static CYCLES_8085: [u8; 256] = [
    //0  1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    4,  10,  7,  6,  4,  4,  7,  4,  4, 10,  7,  6,  4,  4,  7,  4, // 0x00
    4,  10,  7,  6,  4,  4,  7,  4,  4, 10,  7,  6,  4,  4,  7,  4, // 0x10
    4,  10, 16,  6,  4,  4,  7,  4,  4, 10, 16,  6,  4,  4,  7,  4, // 0x20
    4,  10, 13,  6, 10, 10, 10,  4,  4, 10, 13,  6,  4,  4,  7,  4, // 0x30
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0x40
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0x50
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0x60
    7,   7,  7,  7,  7,  7,  5,  7,  4,  4,  4,  4,  4,  4,  7,  4, // 0x70
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0x80
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0x90
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0xA0
    4,   4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 0xB0
    6,  10, 10, 10,  9, 12,  7, 12,  6, 10, 10,  4,  9, 18,  7, 12, // 0xC0
    6,  10, 10, 10,  9, 12,  7, 12,  6,  4, 10, 10,  9,  4,  7, 12, // 0xD0
    6,  10, 10, 16,  9, 12,  7, 12,  6,  6, 10,  4,  9,  4,  7, 12, // 0xE0
    6,  10, 10,  4,  9, 12,  7, 12,  6,  6, 10,  4,  9,  4,  7, 12, // 0xF0
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zs_tables_match_definition() {
        for i in 0..=255u8 {
            let zs = ZS[i as usize];
            assert_eq!(zs & ZF != 0, i == 0, "Z for {i:#04x}");
            assert_eq!(zs & SF != 0, i & 0x80 != 0, "S for {i:#04x}");
            assert_eq!(zs & !(ZF | SF), 0);

            let parity = if i.count_ones() % 2 == 0 { VF } else { 0 };
            assert_eq!(ZSP[i as usize], zs | parity, "ZSP for {i:#04x}");
        }
    }

    #[test]
    fn daa_adjusts_bcd_addition() {
        // 0x09 + 0x08 = 0x11 with a half carry; DAA yields 0x17.
        let [a, f] = DAA[0x11 | 0x200].to_be_bytes();
        assert_eq!(a, 0x17);
        assert_eq!(f & CF, 0);

        // 0x99 + 0x01 = 0x9A; DAA wraps to 0x00 with carry.
        let [a, f] = DAA[0x9a].to_be_bytes();
        assert_eq!(a, 0x00);
        assert_eq!(f & (ZF | CF), ZF | CF);
    }

    #[test]
    fn daa_adjusts_bcd_subtraction() {
        // 0x10 - 0x01 = 0x0F with half borrow; DAA yields 0x09.
        let [a, f] = DAA[0x0f | 0x200 | 0x400].to_be_bytes();
        assert_eq!(a, 0x09);
        assert_ne!(f & NF, 0);
    }

    #[test]
    fn cycle_tables_spot_check() {
        assert_eq!(CYCLES_8080[0x40], 5); // MOV B,B
        assert_eq!(CYCLES_8085[0x40], 4);
        assert_eq!(CYCLES_8080[0x76], 7); // HLT
        assert_eq!(CYCLES_8085[0x76], 5);
        assert_eq!(CYCLES_8080[0xcd], 17); // CALL
        assert_eq!(CYCLES_8085[0xcd], 18);
        assert_eq!(CYCLES_8080[0xe3], 18); // XTHL
        assert_eq!(CYCLES_8085[0xe3], 16);
        for op in [0xc2, 0xca, 0xd2, 0xda, 0xe2, 0xea, 0xf2, 0xfa] {
            assert_eq!(CYCLES_8080[op], 10);
            assert_eq!(CYCLES_8085[op], 10);
        }
    }
}
