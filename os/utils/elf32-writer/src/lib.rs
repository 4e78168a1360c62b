//! # Minimal ELF32 image writer
//!
//! Emits statically linked `ET_EXEC` images for `EM_386`: a file header, a
//! program-header table and one payload per segment. No sections, no symbols.
//!
//! Payloads are placed at page-aligned file offsets congruent to their
//! virtual address, so every file-backed page is directly `mmap`-able.
//!
//! The [`x86`] module assembles the handful of instructions test programs
//! need.

#![no_std]

extern crate alloc;

pub mod x86;

use alloc::vec::Vec;

pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_NOTE: u32 = 4;

pub const PF_X: u32 = 0x1;
pub const PF_W: u32 = 0x2;
pub const PF_R: u32 = 0x4;

const EHDR_SIZE: usize = 52;
const PHDR_SIZE: usize = 32;
const PAGE: usize = 4096;

/// One program header plus the bytes backing it.
///
/// `filesz` is `data.len()`; `memsz` may be larger (zero-filled tail).
#[derive(Debug, Clone)]
pub struct Segment {
    pub kind: u32,
    pub vaddr: u32,
    pub memsz: u32,
    pub flags: u32,
    pub data: Vec<u8>,
}

impl Segment {
    /// A `PT_LOAD` segment.
    #[must_use]
    pub fn load(vaddr: u32, data: impl Into<Vec<u8>>, memsz: u32) -> Self {
        Self {
            kind: PT_LOAD,
            vaddr,
            memsz,
            flags: PF_R | PF_W | PF_X,
            data: data.into(),
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: u32) -> Self {
        self.kind = kind;
        self
    }
}

/// Builder for an executable image.
#[derive(Debug, Clone)]
pub struct Elf32Builder {
    entry: u32,
    machine: u16,
    object_type: u16,
    segments: Vec<Segment>,
}

impl Elf32Builder {
    #[must_use]
    pub const fn new(entry: u32) -> Self {
        Self {
            entry,
            machine: 3,
            object_type: 2,
            segments: Vec::new(),
        }
    }

    /// Override `e_machine` (default `EM_386`).
    #[must_use]
    pub const fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    /// Override `e_type` (default `ET_EXEC`).
    #[must_use]
    pub const fn object_type(mut self, object_type: u16) -> Self {
        self.object_type = object_type;
        self
    }

    #[must_use]
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Shorthand for a readable, writable, executable `PT_LOAD` segment.
    #[must_use]
    pub fn load(self, vaddr: u32, data: impl Into<Vec<u8>>, memsz: u32) -> Self {
        self.segment(Segment::load(vaddr, data, memsz))
    }

    /// Serialize the image.
    ///
    /// # Panics
    /// If the image would exceed 4 GiB or hold more than `u16::MAX` segments.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let phnum = u16::try_from(self.segments.len()).expect("too many segments");
        let table_end = EHDR_SIZE + PHDR_SIZE * self.segments.len();

        // Lay out payloads: each starts on a fresh page, shifted by the
        // segment's in-page virtual offset.
        let mut offsets = Vec::with_capacity(self.segments.len());
        let mut cursor = table_end;
        for seg in &self.segments {
            if seg.data.is_empty() {
                offsets.push(0);
                continue;
            }
            let page_off = seg.vaddr as usize % PAGE;
            let base = align_up(cursor, PAGE);
            let off = base + page_off;
            offsets.push(off);
            cursor = off + seg.data.len();
        }

        let mut out = Vec::with_capacity(cursor);
        out.resize(cursor.max(table_end), 0);

        // Elf32_Ehdr
        out[0..4].copy_from_slice(b"\x7FELF");
        out[4] = 1; // ELFCLASS32
        out[5] = 1; // ELFDATA2LSB
        out[6] = 1; // EV_CURRENT
        put16(&mut out, 16, self.object_type);
        put16(&mut out, 18, self.machine);
        put32(&mut out, 20, 1);
        put32(&mut out, 24, self.entry);
        put32(&mut out, 28, u32_of(EHDR_SIZE)); // e_phoff
        put16(&mut out, 40, 52); // e_ehsize
        put16(&mut out, 42, 32); // e_phentsize
        put16(&mut out, 44, phnum);
        put16(&mut out, 46, 40); // e_shentsize

        // Elf32_Phdr table + payloads
        for (i, (seg, &off)) in self.segments.iter().zip(&offsets).enumerate() {
            let p = EHDR_SIZE + i * PHDR_SIZE;
            put32(&mut out, p, seg.kind);
            put32(&mut out, p + 4, u32_of(off));
            put32(&mut out, p + 8, seg.vaddr);
            put32(&mut out, p + 12, seg.vaddr);
            put32(&mut out, p + 16, u32_of(seg.data.len()));
            put32(&mut out, p + 20, seg.memsz);
            put32(&mut out, p + 24, seg.flags);
            put32(&mut out, p + 28, u32_of(PAGE));
            out[off..off + seg.data.len()].copy_from_slice(&seg.data);
        }

        out
    }
}

const fn align_up(x: usize, a: usize) -> usize {
    (x + (a - 1)) & !(a - 1)
}

fn u32_of(v: usize) -> u32 {
    u32::try_from(v).expect("image exceeds 4 GiB")
}

fn put16(out: &mut [u8], at: usize, v: u16) {
    out[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put32(out: &mut [u8], at: usize, v: u32) {
    out[at..at + 4].copy_from_slice(&v.to_le_bytes());
}
