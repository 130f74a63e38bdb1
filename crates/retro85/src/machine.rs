use anyhow::{bail, Result};
use retro85_cpu::{Bus8085, Regs, ADDRESS_SPACE};

/// Where CP/M programs are loaded and start executing.
pub const CPM_TPA_START: u16 = 0x0100;
/// BDOS entry point. The host services the call when PC reaches it.
pub const CPM_BDOS_ENTRY: u16 = 0x0005;
/// Top of the transient area, stored at 0x0006 for programs that size
/// their stack from it.
pub const CPM_TPA_TOP: u16 = 0xf000;

/// Port that ends the run in CP/M mode (the warm boot stub writes to it).
const CPM_EXIT_PORT: u16 = 0x00;

/// A 64 KiB flat RAM machine with latched IO ports.
///
/// In CP/M mode it also provides just enough of the BDOS for console
/// test programs: function 2 (print character) and 9 (print `$`-terminated
/// string).
pub struct FlatMachine {
    memory: Box<[u8]>,
    ports: [u8; 0x100],
    cpm: bool,
    finished: bool,
    console: Vec<u8>,
}

impl Default for FlatMachine {
    fn default() -> Self {
        Self::new(false)
    }
}

impl FlatMachine {
    pub fn new(cpm: bool) -> Self {
        let mut machine = Self {
            memory: vec![0; ADDRESS_SPACE].into_boxed_slice(),
            ports: [0; 0x100],
            cpm,
            finished: false,
            console: Vec::new(),
        };
        if cpm {
            machine.install_cpm_stubs();
        }
        machine
    }

    /// Copy `image` into memory at `origin`.
    pub fn load(&mut self, origin: u16, image: &[u8]) -> Result<()> {
        let start = usize::from(origin);
        let end = start + image.len();
        if end > self.memory.len() {
            bail!(
                "image of {} bytes does not fit at {:#06x} ({} bytes free)",
                image.len(),
                origin,
                self.memory.len() - start
            );
        }
        self.memory[start..end].copy_from_slice(image);
        log::info!("loaded {} bytes at {:#06x}", image.len(), origin);
        Ok(())
    }

    fn install_cpm_stubs(&mut self) {
        // Warm boot: OUT 0; HLT
        self.memory[0x0000..0x0003].copy_from_slice(&[0xd3, CPM_EXIT_PORT as u8, 0x76]);
        // BDOS: RET, followed by the top-of-TPA word.
        let [lo, hi] = CPM_TPA_TOP.to_le_bytes();
        self.memory[0x0005..0x0008].copy_from_slice(&[0xc9, lo, hi]);
    }

    /// Service the BDOS call described by the registers (function in C).
    pub fn bdos_call(&mut self, regs: &Regs) {
        match regs.bc.lo() {
            0 => {
                log::debug!("BDOS warm boot");
                self.finished = true;
            }
            2 => self.console.push(regs.de.lo()),
            9 => {
                let mut addr = regs.de.word();
                for _ in 0..ADDRESS_SPACE {
                    let byte = self.memory[usize::from(addr)];
                    if byte == b'$' {
                        break;
                    }
                    self.console.push(byte);
                    addr = addr.wrapping_add(1);
                }
            }
            other => log::warn!("unsupported BDOS function {}", other),
        }
    }

    pub fn cpm(&self) -> bool {
        self.cpm
    }

    /// Set once a CP/M program has returned to the warm boot vector.
    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn console(&self) -> &[u8] {
        &self.console
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn port(&self, port: u8) -> u8 {
        self.ports[usize::from(port)]
    }

    pub fn set_port(&mut self, port: u8, value: u8) {
        self.ports[usize::from(port)] = value;
    }
}

impl Bus8085 for FlatMachine {
    fn mem_read(&mut self, addr: u16) -> u8 {
        self.memory[usize::from(addr)]
    }

    fn mem_write(&mut self, addr: u16, value: u8) {
        self.memory[usize::from(addr)] = value;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.ports[usize::from(port & 0xff)]
    }

    fn io_write(&mut self, port: u16, value: u8) {
        log::trace!("OUT {:#04x} <- {:#04x}", port, value);
        if self.cpm && port == CPM_EXIT_PORT {
            self.finished = true;
        }
        self.ports[usize::from(port & 0xff)] = value;
    }
}
