//! # Mode-agnostic x86 snippets
//!
//! Every instruction emitted here decodes identically in 32-bit protected
//! mode and 64-bit long mode, so a test program runs unchanged whether the
//! loader calling it is an i686 or an `x86_64` process:
//!
//! - `mov eax, imm32` (`B8 id`)
//! - `mov eax, [disp32]`, `add eax, [disp32]`, `mov [disp32], eax` via a
//!   ModRM/SIB pair with no base and no index (`04 25`), which is absolute
//!   in both modes (unlike `A1`/`A3`, whose operand widens to 64 bits)
//! - `jmp rel32` (`E9 cd`)
//! - `ret` (`C3`)

use alloc::vec::Vec;

/// Instruction stream assembled for a fixed load address.
#[derive(Debug, Clone)]
pub struct Code {
    origin: u32,
    bytes: Vec<u8>,
}

impl Code {
    #[must_use]
    pub const fn at(origin: u32) -> Self {
        Self {
            origin,
            bytes: Vec::new(),
        }
    }

    /// Address of the next instruction.
    #[must_use]
    pub fn here(&self) -> u32 {
        self.origin + u32::try_from(self.bytes.len()).expect("code exceeds 4 GiB")
    }

    #[must_use]
    pub fn mov_eax_imm(mut self, value: u32) -> Self {
        self.bytes.push(0xB8);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    #[must_use]
    pub fn load_eax(self, addr: u32) -> Self {
        self.modrm_abs(0x8B, addr)
    }

    #[must_use]
    pub fn add_eax(self, addr: u32) -> Self {
        self.modrm_abs(0x03, addr)
    }

    #[must_use]
    pub fn store_eax(self, addr: u32) -> Self {
        self.modrm_abs(0x89, addr)
    }

    #[must_use]
    pub fn jmp(mut self, target: u32) -> Self {
        let next = self.here() + 5;
        self.bytes.push(0xE9);
        self.bytes.extend_from_slice(&target.wrapping_sub(next).to_le_bytes());
        self
    }

    #[must_use]
    pub fn ret(mut self) -> Self {
        self.bytes.push(0xC3);
        self
    }

    /// Pad with `int3` up to `addr`.
    ///
    /// # Panics
    /// If the stream already extends past `addr`.
    #[must_use]
    pub fn pad_to(mut self, addr: u32) -> Self {
        assert!(addr >= self.here(), "cannot pad backwards");
        let len = (addr - self.origin) as usize;
        self.bytes.resize(len, 0xCC);
        self
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn modrm_abs(mut self, opcode: u8, addr: u32) -> Self {
        self.bytes.extend_from_slice(&[opcode, 0x04, 0x25]);
        self.bytes.extend_from_slice(&addr.to_le_bytes());
        self
    }
}
