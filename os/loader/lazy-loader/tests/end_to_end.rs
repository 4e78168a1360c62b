//! Runs the `lazy-loader` binary on generated executables.
//!
//! The fixture code only uses instructions that decode the same in 32- and
//! 64-bit mode, so these tests also run against an `x86_64` build.

#![cfg(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64")))]

use elf32_writer::x86::Code;
use elf32_writer::{Elf32Builder, PF_R, PF_W, Segment};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn fixture(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

fn run(path: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lazy-loader"))
        .arg(path)
        .env_remove("LAZY_LOADER_LOG")
        .output()
        .unwrap()
}

fn report(return_value: i32, faults: u32, allocations: u32, kib: &str) -> String {
    format!(
        "--- SimpleSmartLoader Report ---\n\
         User _start return value = {return_value}\n\
         Total number of page faults = {faults}\n\
         Total number of page allocations = {allocations}\n\
         Total internal fragmentation = {kib} KB\n\
         ------------------------------\n"
    )
}

fn assert_report(output: &Output, expected: &str) {
    assert!(
        output.status.success(),
        "exit {:?}, stderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), expected);
}

#[test]
fn single_tiny_segment_returns_42() {
    let code = Code::at(0x1_0000).mov_eax_imm(42).ret().pad_to(0x1_0010).into_bytes();
    let image = Elf32Builder::new(0x1_0000).load(0x1_0000, code, 0x10).build();
    let file = fixture(&image);

    assert_report(&run(file.path()), &report(42, 1, 1, "3.984375"));
}

#[test]
fn two_full_pages_are_both_faulted() {
    let code = Code::at(0x2_0000)
        .jmp(0x2_1000)
        .pad_to(0x2_1000)
        .mov_eax_imm(7)
        .ret()
        .pad_to(0x2_2000)
        .into_bytes();
    let image = Elf32Builder::new(0x2_0000).load(0x2_0000, code, 8192).build();
    let file = fixture(&image);

    assert_report(&run(file.path()), &report(7, 2, 2, "0.000000"));
}

#[test]
fn partial_page_tail_and_bss_read_as_zero() {
    // [0x00] code, [0x60] the value 5, file content ends at 100 bytes.
    let mut data = Code::at(0x3_0000)
        .load_eax(0x3_0070)
        .add_eax(0x3_1100)
        .add_eax(0x3_0060)
        .ret()
        .pad_to(0x3_0060)
        .into_bytes();
    data.extend_from_slice(&5u32.to_le_bytes());
    data.resize(100, 0);

    let mut image = Elf32Builder::new(0x3_0000).load(0x3_0000, data, 5000).build();

    // Put garbage right after the file-backed bytes; it must not show through.
    let p_offset = u32::from_le_bytes(image[56..60].try_into().unwrap()) as usize;
    let garbage_end = p_offset + 0x200;
    if image.len() < garbage_end {
        image.resize(garbage_end, 0);
    }
    image[p_offset + 100..garbage_end].fill(0xFF);
    let file = fixture(&image);

    // 4096 - (5000 mod 4096) = 3192 bytes, charged once for the BSS page.
    assert_report(&run(file.path()), &report(5, 2, 2, "3.117188"));
}

#[test]
fn code_and_data_segments_fault_independently() {
    let code = Code::at(0x1_0000)
        .load_eax(0x4_0000)
        .store_eax(0x4_1000)
        .add_eax(0x4_1000)
        .ret()
        .into_bytes();
    let image = Elf32Builder::new(0x1_0000)
        .load(0x1_0000, code, 0x20)
        .segment(Segment::load(0x4_0000, 21u32.to_le_bytes(), 8192).with_flags(PF_R | PF_W))
        .build();
    let file = fixture(&image);

    // Code page charges 4096 - 32; the data segment is whole pages.
    assert_report(&run(file.path()), &report(42, 3, 3, "3.968750"));
}

#[test]
fn untouched_segments_cost_nothing() {
    let code = Code::at(0x1_0000).mov_eax_imm(1).ret().into_bytes();
    let image = Elf32Builder::new(0x1_0000)
        .load(0x1_0000, code, 0x1000)
        .load(0x5_0000, vec![0xAA; 64], 0x3000 + 123)
        .build();
    let file = fixture(&image);

    assert_report(&run(file.path()), &report(1, 1, 1, "0.000000"));
}

#[test]
fn unowned_fault_is_fatal() {
    let code = Code::at(0x1_0000).load_eax(0x9_0000).ret().into_bytes();
    let image = Elf32Builder::new(0x1_0000).load(0x1_0000, code, 0x100).build();
    let file = fixture(&image);

    let output = run(file.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Fatal error"), "stderr: {stderr}");
    assert!(stderr.contains("0x00090000"), "stderr: {stderr}");
}

#[test]
fn missing_argument_prints_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_lazy-loader")).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn missing_file_fails_before_launch() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&dir.path().join("does-not-exist"));

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: Failed to open"));
}

#[test]
fn non_elf_file_fails_before_launch() {
    let file = fixture(b"#!/bin/sh\necho this is not an ELF image, but it is long enough\n");
    let output = run(file.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad magic"));
}

#[test]
fn truncated_segment_table_fails_before_launch() {
    let image = Elf32Builder::new(0x1_0000).load(0x1_0000, vec![0xC3], 1).build();
    let file = fixture(&image[..60]);
    let output = run(file.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("truncated"));
}
