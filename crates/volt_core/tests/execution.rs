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

    tests::execution

    Instruction-level scenarios: reset state, committed-PC advancement,
    stack round trips, multiply/divide results, divide overflow and the
    REP-prefixed string ops.

*/

mod common;

use common::*;
use volt_core::{
    cpu_808x::{BiuState, Register16, Register8, TCycle},
    Cpu, CpuType, ResetType,
};

#[test]
fn cold_reset_state() {
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &[0xF4]);

    assert_eq!(cpu.get_register16(Register16::CS), 0xFFFF);
    assert_eq!(cpu.ip(), 0x0000);
    assert_eq!(cpu.queue_len(), 0);
    assert_eq!(cpu.biu_state(), BiuState::Idle);
    assert_eq!(cpu.t_cycle(), TCycle::T1);

    // The first code fetch comes out of the reset vector.
    let first_cost = step_one(&mut cpu);
    assert_eq!(bus.borrow().first_read_at(0xFFFF0), Some(0));

    // Reset-to-fetch delay plus one full bus cycle before the first
    // byte can even be consumed.
    assert!(first_cost >= 10, "first instruction cost only {} ticks", first_cost);
}

#[test]
fn warm_reset_preserves_general_registers() {
    let (mut cpu, _bus) = make_cpu(CpuType::Intel8088, &[0xF4]);
    cpu.set_register16(Register16::BX, 0x1234);
    cpu.reset(ResetType::Warm);

    assert_eq!(cpu.get_register16(Register16::BX), 0x1234);
    assert_eq!(cpu.get_register16(Register16::CS), 0xFFFF);
    assert_eq!(cpu.ip(), 0);
    assert_eq!(cpu.queue_len(), 0);
}

#[test]
fn committed_pc_advances_one_per_consumed_byte() {
    // NOPs are one byte each: each step must advance IP by exactly 1.
    let (mut cpu, _bus) = make_cpu(CpuType::Intel8088, &[0x90, 0x90, 0x90, 0x90, 0xF4]);

    step_one(&mut cpu); // far jump to the code segment
    assert_eq!(cpu.ip(), 0x0000);

    for expected_ip in 1..=4u16 {
        step_one(&mut cpu);
        assert_eq!(cpu.ip(), expected_ip);
    }
}

#[test]
fn push_pop_round_trip() {
    // MOV SP, 0x4000 / MOV BX, 0xBEEF / 4x (PUSH BX / POP BX) / HLT
    let mut code = vec![0xBC, 0x00, 0x40, 0xBB, 0xEF, 0xBE];
    for _ in 0..4 {
        code.extend_from_slice(&[0x53, 0x5B]);
    }
    code.push(0xF4);
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);

    for _ in 0..3 {
        step_one(&mut cpu); // far jump, mov sp, mov bx
    }

    let mut pair_costs = Vec::new();
    for _ in 0..4 {
        let push_cost = step_one(&mut cpu);
        let pop_cost = step_one(&mut cpu);
        pair_costs.push(push_cost + pop_cost);
        assert_eq!(cpu.get_register16(Register16::BX), 0xBEEF);
        assert_eq!(cpu.get_register16(Register16::SP), 0x4000);
    }

    // Steady-state pairs consume identical tick counts.
    assert_eq!(pair_costs[2], pair_costs[3], "pair costs: {:?}", pair_costs);

    // The stack writes landed where SP pointed.
    assert!(bus.borrow().first_write_of_word(0x3FFE).is_some());
}

#[test]
fn push_sp_stores_decremented_value() {
    // MOV SP, 0x4000 / PUSH SP / HLT
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &[0xBC, 0x00, 0x40, 0x54, 0xF4]);
    run_until_halted(&mut cpu);

    assert_eq!(cpu.get_register16(Register16::SP), 0x3FFE);
    assert_eq!(bus.borrow().read_u16_mem(0x3FFE), 0x3FFE);
}

#[test]
fn mul_div_results() {
    // MOV AL,7 / MOV BL,6 / MUL BL        -> AX = 42
    // MOV AX,100 / MOV BL,7 / DIV BL      -> AL = 14, AH = 2
    // MOV AL,0xFD / MOV BL,5 / IMUL BL    -> AX = -15
    let code = [
        0xB0, 0x07, 0xB3, 0x06, 0xF6, 0xE3, // MUL
        0x89, 0xC6, // MOV SI, AX
        0xB8, 0x64, 0x00, 0xB3, 0x07, 0xF6, 0xF3, // DIV
        0x89, 0xC7, // MOV DI, AX
        0xB0, 0xFD, 0xB3, 0x05, 0xF6, 0xEB, // IMUL
        0xF4,
    ];
    let (mut cpu, _bus) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut cpu);

    assert_eq!(cpu.get_register16(Register16::SI), 42);
    assert_eq!(cpu.get_register16(Register16::DI), 0x020E);
    assert_eq!(cpu.get_register16(Register16::AX), 0xFFF1);
}

#[test]
fn divide_overflow_raises_interrupt_zero() {
    // Quotient 0x200 does not fit AL: vector 0 must be taken and AX
    // left unwritten.
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xB8, 0x00, 0x02, // MOV AX, 0x0200
        0xB3, 0x01, // MOV BL, 1
        0xF6, 0xF3, // DIV BL
        0xBA, 0xAD, 0xDE, // MOV DX, 0xDEAD (must not run before the ISR)
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().set_ivt(0, 0x0050, 0x0000);
    bus.borrow_mut().load(0x0500, &[0xF4]); // ISR: HLT

    run_until_halted(&mut cpu);

    assert_eq!(cpu.get_register16(Register16::CS), 0x0050);
    assert_eq!(cpu.get_register16(Register16::AX), 0x0200);
    assert_ne!(cpu.get_register16(Register16::DX), 0xDEAD);

    // The pushed return offset points at the instruction after DIV.
    let ret_ip = bus.borrow().read_u16_mem(0x3FFA);
    assert_eq!(ret_ip, 0x000A);
}

#[test]
fn rep_movsb_copies_cx_bytes() {
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xFC, // CLD
        0xB9, 0x03, 0x00, // MOV CX, 3
        0xBE, 0x00, 0x20, // MOV SI, 0x2000
        0xBF, 0x00, 0x30, // MOV DI, 0x3000
        0xF3, 0xA4, // REP MOVSB
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().load(0x2000, &[0x11, 0x22, 0x33]);

    run_until_halted(&mut cpu);

    assert_eq!(cpu.get_register16(Register16::CX), 0);
    assert_eq!(cpu.get_register16(Register16::SI), 0x2003);
    assert_eq!(cpu.get_register16(Register16::DI), 0x3003);
    let bus = bus.borrow();
    assert_eq!(&bus.mem[0x3000..0x3003], &[0x11, 0x22, 0x33]);

    // Element traffic strictly alternates read/write, source first.
    for i in 0..3u32 {
        let rd = bus.first_read_at(0x2000 + i).expect("missing element read");
        let wr = bus.first_write_at(0x3000 + i).expect("missing element write");
        assert!(rd < wr, "element {} written before it was read", i);
        if i > 0 {
            let prev_wr = bus.first_write_at(0x3000 + i - 1).unwrap();
            assert!(prev_wr < rd, "element {} read before element {} was written", i, i - 1);
        }
    }
}

#[test]
fn rep_scasb_terminates_on_match() {
    // REPNE SCASB hunting for 0xAA in a 5-byte field finds it at
    // offset 2 and stops with CX reflecting the remaining count.
    let code = [
        0xFC, // CLD
        0xB0, 0xAA, // MOV AL, 0xAA
        0xB9, 0x05, 0x00, // MOV CX, 5
        0xBF, 0x00, 0x20, // MOV DI, 0x2000
        0xF2, 0xAE, // REPNE SCASB
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().load(0x2000, &[0x00, 0x11, 0xAA, 0x33, 0x44]);

    run_until_halted(&mut cpu);

    assert_eq!(cpu.get_register16(Register16::DI), 0x2003);
    assert_eq!(cpu.get_register16(Register16::CX), 2);
}

#[test]
fn xlat_and_lea() {
    // LEA BX, [SI+0x10] / MOV AL, 2 / XLAT
    let code = [
        0xBE, 0x00, 0x20, // MOV SI, 0x2000
        0x8D, 0x5C, 0x10, // LEA BX, [SI+0x10]
        0xB0, 0x02, // MOV AL, 2
        0xD7, // XLAT
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    bus.borrow_mut().load(0x2010, &[0xD0, 0xD1, 0xD2, 0xD3]);

    run_until_halted(&mut cpu);

    assert_eq!(cpu.get_register16(Register16::BX), 0x2010);
    assert_eq!(cpu.get_register8(Register8::AL), 0xD2);
}

#[test]
fn undefined_queue_invariant_under_load() {
    // A mix of bus-heavy and register-only work; the queue fill level
    // must remain within capacity the whole run (the queue itself
    // panics if not), and the BIU must land back in a legal state.
    let code = [
        0xBC, 0x00, 0x40, // MOV SP, 0x4000
        0xB8, 0x34, 0x12, // MOV AX, 0x1234
        0xA3, 0x00, 0x25, // MOV [0x2500], AX
        0x50, // PUSH AX
        0x58, // POP AX
        0x8B, 0x1E, 0x00, 0x25, // MOV BX, [0x2500]
        0xF7, 0xE3, // MUL BX
        0xF4,
    ];
    let (mut cpu, _bus) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut cpu);

    assert!(cpu.queue_len() <= 4);
    assert_eq!(cpu.get_register16(Register16::BX), 0x1234);
}

#[test]
fn wide_bus_queue_is_six_bytes() {
    let code = [0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0xF4];
    let (mut cpu, _bus) = make_cpu(CpuType::Intel8086, &code);
    run_until_halted(&mut cpu);
    assert!(cpu.queue_len() <= 6);

    let (mut cpu8, _bus8) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut cpu8);
    assert!(cpu8.queue_len() <= 4);
}

fn reference_cpu() -> Cpu {
    struct NullBus;
    impl volt_core::BusInterface for NullBus {
        fn read_u8(&mut self, _addr: u32) -> u8 {
            0x90
        }
        fn write_u8(&mut self, _addr: u32, _data: u8) {}
        fn io_read_u8(&mut self, _port: u16) -> u8 {
            0xFF
        }
        fn io_write_u8(&mut self, _port: u16, _data: u8) {}
        fn irq_ack(&mut self) -> u8 {
            0
        }
    }
    Cpu::new(CpuType::Intel8088, Box::new(NullBus))
}

#[test]
fn snapshot_round_trip() {
    let mut cpu = reference_cpu();
    cpu.set_register16(Register16::AX, 0x55AA);
    cpu.set_register16(Register16::SP, 0x8000);
    cpu.set_nmi(true);

    let snap = cpu.snapshot();
    let mut other = reference_cpu();
    other.restore(&snap);

    assert_eq!(other.get_register16(Register16::AX), 0x55AA);
    assert_eq!(other.get_register16(Register16::SP), 0x8000);
    assert_eq!(other.queue_len(), cpu.queue_len());
    assert_eq!(other.t_cycle(), cpu.t_cycle());
    assert_eq!(other.biu_state(), cpu.biu_state());
}
