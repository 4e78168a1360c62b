//! Canned test programs for `lazy-loader`.
//!
//! Each [`Scenario`] is a complete `ET_EXEC` image plus the report the loader
//! is expected to print for it (or `None` if the run must fail).

use elf32_writer::x86::Code;
use elf32_writer::{Elf32Builder, PF_R, PF_W, Segment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected {
    pub return_value: i32,
    pub faults: u32,
    pub allocations: u32,
    pub fragmentation_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub image: Vec<u8>,
    pub expected: Option<Expected>,
}

#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    vec![
        return_42(),
        two_pages(),
        partial_bss(),
        code_and_data(),
        unowned_fault(),
    ]
}

#[must_use]
pub fn find(name: &str) -> Option<Scenario> {
    scenarios().into_iter().find(|s| s.name == name)
}

fn return_42() -> Scenario {
    let code = Code::at(0x1_0000).mov_eax_imm(42).ret().pad_to(0x1_0010).into_bytes();
    Scenario {
        name: "return-42",
        description: "one 16-byte segment at 0x10000 returning 42",
        image: Elf32Builder::new(0x1_0000).load(0x1_0000, code, 0x10).build(),
        expected: Some(Expected {
            return_value: 42,
            faults: 1,
            allocations: 1,
            fragmentation_bytes: 4080,
        }),
    }
}

fn two_pages() -> Scenario {
    let code = Code::at(0x2_0000)
        .jmp(0x2_1000)
        .pad_to(0x2_1000)
        .mov_eax_imm(7)
        .ret()
        .pad_to(0x2_2000)
        .into_bytes();
    Scenario {
        name: "two-pages",
        description: "an 8192-byte segment whose entry jumps into its second page",
        image: Elf32Builder::new(0x2_0000).load(0x2_0000, code, 0x2000).build(),
        expected: Some(Expected {
            return_value: 7,
            faults: 2,
            allocations: 2,
            fragmentation_bytes: 0,
        }),
    }
}

fn partial_bss() -> Scenario {
    let mut data = Code::at(0x3_0000)
        .load_eax(0x3_1100)
        .add_eax(0x3_0060)
        .ret()
        .pad_to(0x3_0060)
        .into_bytes();
    data.extend_from_slice(&5u32.to_le_bytes());
    data.resize(100, 0);
    Scenario {
        name: "partial-bss",
        description: "100 file bytes in a 5000-byte segment; reads the zero-filled second page",
        image: Elf32Builder::new(0x3_0000).load(0x3_0000, data, 5000).build(),
        expected: Some(Expected {
            return_value: 5,
            faults: 2,
            allocations: 2,
            fragmentation_bytes: 3192,
        }),
    }
}

fn code_and_data() -> Scenario {
    let code = Code::at(0x1_0000)
        .load_eax(0x4_0000)
        .store_eax(0x4_1000)
        .add_eax(0x4_1000)
        .ret()
        .into_bytes();
    Scenario {
        name: "code-and-data",
        description: "a code segment doubling a value through a separate data segment",
        image: Elf32Builder::new(0x1_0000)
            .load(0x1_0000, code, 0x20)
            .segment(Segment::load(0x4_0000, 21u32.to_le_bytes(), 0x2000).with_flags(PF_R | PF_W))
            .build(),
        expected: Some(Expected {
            return_value: 42,
            faults: 3,
            allocations: 3,
            fragmentation_bytes: 4064,
        }),
    }
}

fn unowned_fault() -> Scenario {
    let code = Code::at(0x1_0000).load_eax(0x9_0000).ret().into_bytes();
    Scenario {
        name: "unowned-fault",
        description: "reads 0x90000, which no segment covers; the loader must exit with status 1",
        image: Elf32Builder::new(0x1_0000).load(0x1_0000, code, 0x100).build(),
        expected: None,
    }
}
