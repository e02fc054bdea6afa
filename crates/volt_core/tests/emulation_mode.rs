/*
    VoltPC
    https://github.com/voltpc/voltpc

    Copyright 2022-2025 VoltPC contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    tests::emulation_mode

    The V20 mode bridge: BRKEM into 8080 execution, register file
    translation across the boundary, CALLN native service calls, and
    RETEM back to native mode.

*/

mod common;

use common::*;
use volt_core::{
    cpu_808x::{Register16, Register8, CPU_FLAG_MODE},
    CpuType,
};

/// 8080 code lives at 0200:0000 via BRKEM vector 0x40.
const EMU_SEG: u16 = 0x0200;
const EMU_BASE: u32 = 0x2000;
const BRKEM_VECTOR: u8 = 0x40;

fn emu_cpu(native_tail: &[u8], emu_code: &[u8]) -> (volt_core::Cpu, std::rc::Rc<std::cell::RefCell<RamBus>>) {
    // MOV SP, 0x4000 / MOV AL, 0x12 / BRKEM 0x40 / <tail> / HLT
    let mut code = vec![0xBC, 0x00, 0x40, 0xB0, 0x12, 0x0F, 0xFF, BRKEM_VECTOR];
    code.extend_from_slice(native_tail);
    code.push(0xF4);

    let (cpu, bus) = make_cpu(CpuType::NecV20, &code);
    bus.borrow_mut().set_ivt(BRKEM_VECTOR, EMU_SEG, 0x0000);
    bus.borrow_mut().load(EMU_BASE, emu_code);
    (cpu, bus)
}

#[test]
fn brkem_enters_and_retem_leaves_emulation() {
    // 8080 side: INR A, then RETEM.
    let (mut cpu, _bus) = emu_cpu(&[], &[0x3C, 0xED, 0xFD]);

    run_until_halted(&mut cpu);

    // AL crossed into the 8080 as A, was incremented, and crossed back.
    assert_eq!(cpu.get_register8(Register8::AL), 0x13);
    // Native mode restored, back in the native code segment.
    assert!(!cpu.in_emulation_mode());
    assert_ne!(cpu.get_flags() & CPU_FLAG_MODE, 0);
    assert_eq!(cpu.get_register16(Register16::CS), CODE_SEG);
}

#[test]
fn brkem_clears_mode_flag_while_emulating() {
    // 8080 side: MVI B, 0x77, then park on the 8080's own HLT. The
    // emulated register file stays private until a sync, so the only
    // native-visible evidence is the mode flag.
    let (mut cpu, bus) = emu_cpu(&[], &[0x06, 0x77, 0x76]);

    cpu.run(2000);

    assert!(cpu.in_emulation_mode());
    assert_eq!(cpu.get_flags() & CPU_FLAG_MODE, 0);
    // The 8080 program bytes were fetched from the emulation segment.
    assert!(bus.borrow().first_read_at(EMU_BASE).is_some());
    // The native CH is untouched until RETEM syncs the file back.
    assert_ne!(cpu.get_register8(Register8::CH), 0x77);
}

#[test]
fn register_mapping_follows_the_datasheet() {
    // 8080: load every pair with immediates, then RETEM.
    // LXI B,0xC1C2 / LXI D,0xD1D2 / LXI H,0xE1E2 / MVI A,0x55 /
    // LXI SP,0x7788 / RETEM
    let emu = [
        0x01, 0xC2, 0xC1, // LXI B
        0x11, 0xD2, 0xD1, // LXI D
        0x21, 0xE2, 0xE1, // LXI H
        0x3E, 0x55, // MVI A
        0x31, 0x88, 0x77, // LXI SP
        0xED, 0xFD, // RETEM
    ];
    let (mut cpu, _bus) = emu_cpu(&[], &emu);

    run_until_halted(&mut cpu);

    // B->CH, C->CL, D->DH, E->DL, H->BH, L->BL, A->AL, SP->BP.
    assert_eq!(cpu.get_register16(Register16::CX), 0xC1C2);
    assert_eq!(cpu.get_register16(Register16::DX), 0xD1D2);
    assert_eq!(cpu.get_register16(Register16::BX), 0xE1E2);
    assert_eq!(cpu.get_register8(Register8::AL), 0x55);
    assert_eq!(cpu.get_register16(Register16::BP), 0x7788);
}

#[test]
fn emulated_memory_traffic_goes_through_ds() {
    // 8080: STA 0x0123 stores A through the native DS (zero here), so
    // the byte lands at linear 0x0123.
    let (mut cpu, bus) = emu_cpu(&[], &[0x3E, 0x99, 0x32, 0x23, 0x01, 0xED, 0xFD]);

    run_until_halted(&mut cpu);

    assert_eq!(bus.borrow().mem[0x0123], 0x99);
    assert!(bus.borrow().first_write_at(0x0123).is_some());
}

#[test]
fn calln_invokes_native_service_and_returns_to_emulation() {
    // 8080 side: MVI A,0x31 / CALLN 0x21 / INR A / RETEM.
    // Native ISR: INC CX / IRET. The IRET pops a mode-clear flag image
    // and must drop straight back into 8080 execution.
    let emu = [
        0x3E, 0x31, // MVI A, 0x31
        0xED, 0xED, 0x21, // CALLN 0x21
        0x3C, // INR A
        0xED, 0xFD, // RETEM
    ];
    let (mut cpu, bus) = emu_cpu(&[], &emu);
    bus.borrow_mut().set_ivt(0x21, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0x41, 0xCF]); // INC CX / IRET

    run_until_halted(&mut cpu);

    // The ISR ran natively (CX incremented = 8080 B/C pair touched),
    // then the 8080 resumed and incremented A before leaving.
    assert_eq!(cpu.get_register8(Register8::AL), 0x32);
    assert_eq!(cpu.get_register16(Register16::CX), 1);
    assert!(!cpu.in_emulation_mode());
    assert_eq!(cpu.get_register16(Register16::CS), CODE_SEG);
}

#[test]
fn brkem_frame_looks_like_an_interrupt_frame() {
    let (mut cpu, bus) = emu_cpu(&[], &[0xED, 0xFD]); // immediate RETEM

    run_until_halted(&mut cpu);

    let bus = bus.borrow();
    // Flags, CS, IP pushed at SP 0x4000 going down, vector slot read
    // after the pushes, then 8080 code fetched from the new CS.
    let flags_push = bus.first_write_of_word(0x3FFE).unwrap();
    let cs_push = bus.first_write_of_word(0x3FFC).unwrap();
    let ip_push = bus.first_write_of_word(0x3FFA).unwrap();
    let vector_read = bus.first_read_of_word(BRKEM_VECTOR as u32 * 4).unwrap();
    let emu_fetch = bus.first_read_at(EMU_BASE).unwrap();

    assert!(flags_push < cs_push);
    assert!(cs_push < ip_push);
    assert!(ip_push < vector_read);
    assert!(vector_read < emu_fetch);

    // The pushed image carries the mode flag still set.
    assert_ne!(bus.read_u16_mem(0x3FFE) & CPU_FLAG_MODE, 0);
}
