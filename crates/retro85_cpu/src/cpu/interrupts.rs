//! Interrupt controller: line inputs, priority resolution and vector dispatch.
//!
//! A request moves through four stages: the request bit is set, the source
//! is claimed in `serviced` and its vector parked in `scheduled_irq`, the
//! next instruction boundary promotes it to `executing_irq`, and
//! `take_interrupt` dispatches it. `serviced` stays set until the handler
//! executes EI, which blocks every other maskable source in the meantime.

use super::regs::{InterruptBits, LineState};
use super::{Bus8085, Cpu};

pub const ADDR_TRAP: u32 = 0x0024;
pub const ADDR_RST55: u32 = 0x002c;
pub const ADDR_RST65: u32 = 0x0034;
pub const ADDR_RST75: u32 = 0x003c;

/// Vector used for INTR when the host did not supply one: opcode 0xFF (RST 7).
pub const INTR_DEFAULT_VECTOR: u32 = 0xff;

pub const INTR_LINE: usize = 0;
pub const RST55_LINE: usize = 1;
pub const RST65_LINE: usize = 2;
pub const RST75_LINE: usize = 3;

/// Maskable sources in priority order, highest first.
static PRIORITY: [(InterruptBits, usize); 4] = [
    (InterruptBits::RST75, RST75_LINE),
    (InterruptBits::RST65, RST65_LINE),
    (InterruptBits::RST55, RST55_LINE),
    (InterruptBits::INTR, INTR_LINE),
];

impl Cpu {
    /// TRAP input (8085). Non-maskable and highest priority; it pre-empts any
    /// source that is merely scheduled.
    pub fn set_trap(&mut self, asserted: bool) {
        log::trace!("TRAP {}", asserted);
        if asserted {
            self.regs.request.insert(InterruptBits::TRAP);
            if self.regs.serviced.contains(InterruptBits::TRAP) {
                return;
            }
            self.regs.serviced = InterruptBits::TRAP;
            self.regs.scheduled_irq = ADDR_TRAP;
        } else {
            self.regs.request.remove(InterruptBits::TRAP);
        }
    }

    /// RST7.5 input (8085). The request is latched: only SIM or the end of
    /// its service routine clears it, so a low level is ignored.
    pub fn set_rst75(&mut self, asserted: bool) {
        log::trace!("RST7.5 {}", asserted);
        if asserted {
            self.request_maskable(InterruptBits::RST75, ADDR_RST75);
        }
    }

    pub fn set_rst65(&mut self, asserted: bool) {
        log::trace!("RST6.5 {}", asserted);
        if asserted {
            self.request_maskable(InterruptBits::RST65, ADDR_RST65);
        } else {
            self.withdraw(InterruptBits::RST65);
        }
    }

    pub fn set_rst55(&mut self, asserted: bool) {
        log::trace!("RST5.5 {}", asserted);
        if asserted {
            self.request_maskable(InterruptBits::RST55, ADDR_RST55);
        } else {
            self.withdraw(InterruptBits::RST55);
        }
    }

    /// INTR input. A non-zero `vector` requests the interrupt and becomes the
    /// value dispatched when it is taken (unless the acknowledge callback
    /// overrides it); zero withdraws the request.
    pub fn set_intr(&mut self, vector: u32) {
        log::trace!("INTR {:#x}", vector);
        if vector != 0 {
            self.regs.intr_vector = vector;
            self.request_maskable(InterruptBits::INTR, vector);
        } else {
            self.withdraw(InterruptBits::INTR);
        }
    }

    /// Serial input pin (8085), visible to RIM in bit 7.
    pub fn set_sid(&mut self, high: bool) {
        self.regs.mask.set(InterruptBits::SID, high);
    }

    /// NMI input. On the 8085 an asserted NMI line raises TRAP; the 8080 has
    /// no such input and only records the state.
    pub fn set_nmi_line(&mut self, state: LineState) {
        self.regs.nmi_state = state;
        if self.regs.is_8085() && state.is_asserted() {
            self.set_trap(true);
        }
    }

    /// Drive one of the maskable input lines (`INTR_LINE`, `RST55_LINE`,
    /// `RST65_LINE`, `RST75_LINE`).
    ///
    /// The line state is always recorded so that EI can pick it up later.
    /// An assert is forwarded only while interrupts are enabled, a clear only
    /// while they are disabled; a request latched during EI therefore
    /// survives the line dropping before it is serviced.
    pub fn set_irq_line(&mut self, line: usize, state: LineState) {
        if line >= self.regs.irq_state.len() {
            log::warn!("ignoring unknown irq line {}", line);
            return;
        }
        self.regs.irq_state[line] = state;

        if !self.regs.is_8085() && line != INTR_LINE {
            return;
        }

        let enabled = self.regs.mask.contains(InterruptBits::IEN);
        match (state.is_asserted(), enabled) {
            (true, true) => match line {
                INTR_LINE => {
                    let vector = self.intr_line_vector();
                    self.set_intr(vector);
                }
                RST55_LINE => self.set_rst55(true),
                RST65_LINE => self.set_rst65(true),
                _ => self.set_rst75(true),
            },
            (false, false) => match line {
                INTR_LINE => self.set_intr(0),
                RST55_LINE => self.set_rst55(false),
                RST65_LINE => self.set_rst65(false),
                _ => self.set_rst75(false),
            },
            _ => {}
        }
    }

    fn intr_line_vector(&self) -> u32 {
        if self.regs.intr_vector != 0 {
            self.regs.intr_vector
        } else {
            INTR_DEFAULT_VECTOR
        }
    }

    fn request_maskable(&mut self, bit: InterruptBits, vector: u32) {
        self.regs.request.insert(bit);
        if self.regs.mask.contains(bit) {
            // Masked: stays pending until SIM unmasks it and EI rescans.
            return;
        }
        if self.regs.serviced.is_empty() {
            self.regs.serviced = bit;
            self.regs.scheduled_irq = vector;
        }
    }

    /// Drop a maskable request. A source that is scheduled but not yet taken
    /// gives up its slot so nothing is dispatched for it.
    fn withdraw(&mut self, bit: InterruptBits) {
        self.regs.request.remove(bit);
        if self.regs.serviced == bit && self.regs.scheduled_irq != 0 {
            self.regs.serviced = InterruptBits::empty();
            self.regs.scheduled_irq = 0;
        }
    }

    /// EI: set the enable bit, retire the source that was being serviced and
    /// schedule the highest-priority request that is pending and unmasked.
    pub(super) fn rearm_interrupts(&mut self) {
        self.regs.mask.insert(InterruptBits::IEN);
        self.regs.request.remove(self.regs.serviced);
        self.regs.serviced = InterruptBits::empty();
        self.regs.scheduled_irq = 0;

        if self.regs.irq_state[INTR_LINE].is_asserted() {
            self.regs.request.insert(InterruptBits::INTR);
            self.regs.intr_vector = self.intr_line_vector();
        }

        let sources: &[(InterruptBits, usize)] = if self.regs.is_8085() {
            for &(bit, line) in &PRIORITY[..3] {
                if self.regs.irq_state[line].is_asserted() {
                    self.regs.request.insert(bit);
                }
            }
            &PRIORITY
        } else {
            &PRIORITY[3..]
        };

        let pending = self.regs.request - self.regs.mask;
        if let Some(&(bit, _)) = sources.iter().find(|(bit, _)| pending.contains(*bit)) {
            self.regs.serviced = bit;
            self.regs.scheduled_irq = self.vector_for(bit);
            log::debug!(
                "EI schedules {:?} vector={:#x}",
                bit,
                self.regs.scheduled_irq
            );
        }
    }

    fn vector_for(&self, bit: InterruptBits) -> u32 {
        if bit == InterruptBits::RST75 {
            ADDR_RST75
        } else if bit == InterruptBits::RST65 {
            ADDR_RST65
        } else if bit == InterruptBits::RST55 {
            ADDR_RST55
        } else {
            self.regs.intr_vector
        }
    }

    /// Acknowledge and dispatch `executing_irq`.
    pub(super) fn take_interrupt<B: Bus8085>(&mut self, bus: &mut B) {
        if self.regs.halted {
            // Resume after the HALT byte.
            self.regs.pc = self.regs.pc.wrapping_add(1);
            self.regs.halted = false;
        }
        self.regs.mask.remove(InterruptBits::IEN);

        if let Some(line) = self.acknowledge_line() {
            if let Some(callback) = self.irq_callback.as_mut() {
                self.regs.executing_irq = callback(line);
            }
        }

        let vector = self.regs.executing_irq;
        log::debug!(
            "{:?} interrupt: serviced={:?} vector={:#x} pc={:#06x} sp={:#06x}",
            self.regs.cpu_type,
            self.regs.serviced,
            vector,
            self.regs.pc,
            self.regs.sp,
        );

        match vector & 0xff_0000 {
            // CALL nnnn
            0xcd_0000 => {
                self.icount = self.icount.saturating_sub(7 + 10);
                let ret = self.regs.pc;
                self.push_word(bus, ret);
                self.jump(bus, vector as u16);
            }
            // JMP nnnn
            0xc3_0000 => {
                self.icount = self.icount.saturating_sub(10);
                self.jump(bus, vector as u16);
            }
            _ => match vector {
                ADDR_TRAP | ADDR_RST75 | ADDR_RST65 | ADDR_RST55 => {
                    let ret = self.regs.pc;
                    self.push_word(bus, ret);
                    self.jump(bus, vector as u16);
                }
                // Anything else is a single opcode supplied by the host.
                _ => self.execute_one(bus, vector as u8),
            },
        }
    }

    /// Line number passed to the acknowledge callback for the source being
    /// serviced. TRAP is never acknowledged; RST lines only on the 8085.
    fn acknowledge_line(&self) -> Option<usize> {
        let serviced = self.regs.serviced;
        if serviced == InterruptBits::INTR {
            return Some(INTR_LINE);
        }
        if !self.regs.is_8085() {
            return None;
        }
        PRIORITY[..3]
            .iter()
            .find(|(bit, _)| serviced == *bit)
            .map(|&(_, line)| line)
    }
}
