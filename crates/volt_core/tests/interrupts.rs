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

    tests::interrupts

    Interrupt choreography: ordered frame pushes and vector reads for
    hardware and software interrupts, the IRET inversion, NMI waking a
    halted core, and the PIC acknowledge protocol.

*/

mod common;

use common::*;
use volt_core::{cpu_808x::Register16, CpuType};

/// SP starts at 0x4000 in all programs here, so the frame lands at:
/// flags 0x3FFE, CS 0x3FFC, IP 0x3FFA.
const FLAGS_SLOT: u32 = 0x3FFE;
const CS_SLOT: u32 = 0x3FFC;
const IP_SLOT: u32 = 0x3FFA;

#[test]
fn hardware_interrupt_choreography() {
    // MOV SP, 0x4000 / STI / NOPs / HLT. The IRQ is pending before the
    // run starts and must be taken through the full acknowledge dance.
    let code = [0xBC, 0x00, 0x40, 0xFB, 0x90, 0x90, 0xF4];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().irq_vector = 0x21;
    bus.borrow_mut().set_ivt(0x21, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xF4]); // ISR: HLT

    cpu.set_intr(true);
    run_until_halted(&mut cpu);
    assert_eq!(cpu.get_register16(Register16::CS), 0x0050);

    let bus = bus.borrow();
    assert_eq!(bus.inta_count, 2, "PIC must see exactly two INTA cycles");

    // Acknowledge, then flags push, CS push, IP push, vector read, and
    // only then a code fetch from the ISR.
    let inta = bus.first_inta().unwrap();
    let flags_push = bus.first_write_of_word(FLAGS_SLOT).unwrap();
    let cs_push = bus.first_write_of_word(CS_SLOT).unwrap();
    let ip_push = bus.first_write_of_word(IP_SLOT).unwrap();
    let vector_read = bus.first_read_of_word(0x21 * 4).unwrap();
    let isr_fetch = bus.first_read_at(0x0500).unwrap();

    assert!(inta < flags_push);
    assert!(flags_push < cs_push);
    assert!(cs_push < ip_push);
    assert!(ip_push < vector_read);
    assert!(vector_read < isr_fetch);
}

#[test]
fn software_interrupt_and_iret_inversion() {
    // MOV SP / MOV BX,0 / INT 0x21 / MOV BX, 0x5A5A / HLT
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xBB, 0x00, 0x00, // MOV BX, 0
        0xCD, 0x21, // INT 0x21
        0xBB, 0x5A, 0x5A, // MOV BX, 0x5A5A
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().set_ivt(0x21, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xCF]); // ISR: IRET

    run_until_halted(&mut cpu);

    // Execution resumed after the INT and ran to the HLT.
    assert_eq!(cpu.get_register16(Register16::BX), 0x5A5A);
    assert_eq!(cpu.get_register16(Register16::SP), 0x4000);
    assert_eq!(cpu.get_register16(Register16::CS), CODE_SEG);

    // Reserved flag bit 1 is forced set by the flags pop.
    assert_ne!(cpu.get_flags() & 0x0002, 0);

    let bus = bus.borrow();
    // Pushes go down, pops come back in the inverse order: IP first.
    let flags_push = bus.first_write_of_word(FLAGS_SLOT).unwrap();
    let ip_push = bus.first_write_of_word(IP_SLOT).unwrap();
    let ip_pop = bus.first_read_of_word(IP_SLOT).unwrap();
    let cs_pop = bus.first_read_of_word(CS_SLOT).unwrap();
    let flags_pop = bus.first_read_of_word(FLAGS_SLOT).unwrap();

    assert!(flags_push < ip_push);
    assert!(ip_push < ip_pop);
    assert!(ip_pop < cs_pop);
    assert!(cs_pop < flags_pop);

    // Return offset points past the INT operand.
    assert_eq!(bus.read_u16_mem(IP_SLOT), 0x0008);
}

#[test]
fn interrupt_masks_trap_and_interrupt_flags() {
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xFB, // STI
        0xCD, 0x21, // INT 0x21
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().set_ivt(0x21, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xF4]); // ISR: HLT

    run_until_halted(&mut cpu);

    // Inside the ISR both IF and TF are clear; the pushed image kept IF.
    assert_eq!(cpu.get_flags() & 0x0200, 0, "IF must be masked in the ISR");
    assert_eq!(cpu.get_flags() & 0x0100, 0, "TF must be masked in the ISR");
    let pushed = bus.borrow().read_u16_mem(FLAGS_SLOT);
    assert_ne!(pushed & 0x0200, 0, "pushed image must keep IF");
}

#[test]
fn nmi_wakes_halted_core() {
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xF4, // HLT
        0xBB, 0xEF, 0xBE, // MOV BX, 0xBEEF (after ISR returns)
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().set_ivt(2, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xBA, 0x0D, 0xF0, 0xCF]); // MOV DX, 0xF00D / IRET

    run_until_halted(&mut cpu);
    assert_eq!(cpu.get_register16(Register16::BX), 0);

    // NMI is edge triggered and ignores IF. The core is parked in the
    // halt loop, so push a budget through it to let the wakeup happen.
    cpu.set_nmi(true);
    cpu.run(5000);

    assert!(cpu.is_halted());
    assert_eq!(cpu.get_register16(Register16::DX), 0xF00D);
    // Execution resumed past the HLT.
    assert_eq!(cpu.get_register16(Register16::BX), 0xBEEF);

    // The pushed return offset points after the HLT opcode.
    assert_eq!(bus.borrow().read_u16_mem(IP_SLOT), 0x0004);
}

#[test]
fn custom_nmi_vector_overrides_ivt_slot() {
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xF4, // HLT
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().set_ivt(2, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0600, &[0xF4]); // custom handler: HLT

    cpu.set_custom_nmi_vector(Some(0x0060_0000)); // 0060:0000
    run_until_halted(&mut cpu);

    cpu.set_nmi(true);
    cpu.run(5000);

    assert!(cpu.is_halted());
    assert_eq!(cpu.get_register16(Register16::CS), 0x0060);

    // The regular slot is still read on the bus even though its
    // contents are ignored.
    let bus = bus.borrow();
    assert!(bus.first_read_of_word(2 * 4).is_some());
    assert!(bus.first_read_at(0x0600).is_some());
}

#[test]
fn pop_sreg_suppresses_interrupts_for_one_instruction() {
    // The IRQ goes pending while POP ES executes. Its delivery must be
    // held off until after the following instruction (INC BX), so the
    // pushed return offset points past the INC.
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xFB, // STI
        0x90, // NOP
        0x06, // PUSH ES
        0x07, // POP ES
        0x43, // INC BX
        0x90, // NOP
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().irq_vector = 0x21;
    bus.borrow_mut().set_ivt(0x21, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xF4]); // ISR: HLT

    for _ in 0..5 {
        step_one(&mut cpu); // far jump, mov sp, sti, nop, push es
    }
    cpu.set_intr(true);

    // POP ES completes with the IRQ pending but suppressed.
    step_one(&mut cpu);
    assert_eq!(cpu.get_register16(Register16::CS), CODE_SEG);

    // INC BX runs, and the IRQ is delivered at its boundary.
    step_one(&mut cpu);
    assert_eq!(cpu.get_register16(Register16::BX), 1);
    assert_eq!(cpu.get_register16(Register16::CS), 0x0050);

    // Return offset points past the INC BX at 0x0007.
    let ret_ip = bus.borrow().read_u16_mem(0x4000 - 6);
    assert_eq!(ret_ip, 0x0008);
}

#[test]
fn into_only_fires_on_overflow() {
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xB0, 0x7F, // MOV AL, 0x7F
        0x04, 0x01, // ADD AL, 1 -> OF set
        0xCE, // INTO
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().set_ivt(4, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xF4]);

    run_until_halted(&mut cpu);
    assert_eq!(cpu.get_register16(Register16::CS), 0x0050);

    // Without overflow INTO falls through.
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xB0, 0x01, // MOV AL, 1
        0x04, 0x01, // ADD AL, 1
        0xCE, // INTO
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().set_ivt(4, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xF4]);

    run_until_halted(&mut cpu);
    assert_eq!(cpu.get_register16(Register16::CS), CODE_SEG);
}
