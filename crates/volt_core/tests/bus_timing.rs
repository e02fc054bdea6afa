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

    tests::bus_timing

    Bus-level timing properties: the T-state round robin, wait-state
    stretching, DRAM refresh stealing cycles, and prefetch steady state.

*/

mod common;

use common::*;
use volt_core::{
    cpu_808x::{CpuOption, TCycle},
    CpuType,
};

#[test]
fn t_states_cycle_in_strict_round_robin() {
    let mut t = TCycle::T1;
    let expected = [TCycle::T2, TCycle::T3, TCycle::T4, TCycle::T1, TCycle::T2];
    for e in expected {
        t = t.next();
        assert_eq!(t, e);
    }
}

#[test]
fn wait_states_stretch_bus_cycles() {
    // The same store runs once against zero-wait memory and once
    // against slow memory; the slow run must cost more ticks while the
    // performed bus traffic stays identical.
    let code = [
        0xB8, 0x34, 0x12, // MOV AX, 0x1234
        0xA3, 0x00, 0x25, // MOV [0x2500], AX
        0xF4,
    ];

    let (mut fast, fast_bus) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut fast);
    let fast_cycles = fast.cycle_count();

    let (mut slow, slow_bus) = make_cpu(CpuType::Intel8088, &code);
    slow_bus.borrow_mut().mem_wait = 2;
    run_until_halted(&mut slow);
    let slow_cycles = slow.cycle_count();

    assert!(
        slow_cycles > fast_cycles,
        "wait states did not stretch the run: {} vs {}",
        slow_cycles,
        fast_cycles
    );
    assert_eq!(slow_bus.borrow().mem[0x2500], 0x34);
    assert_eq!(fast_bus.borrow().mem[0x2500], 0x34);
}

#[test]
fn disabling_wait_states_flattens_timing() {
    let code = [
        0xB8, 0x34, 0x12, // MOV AX, 0x1234
        0xA3, 0x00, 0x25, // MOV [0x2500], AX
        0xF4,
    ];

    let (mut baseline, _bus) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut baseline);

    let (mut gated, gated_bus) = make_cpu(CpuType::Intel8088, &code);
    gated_bus.borrow_mut().mem_wait = 3;
    gated.set_option(CpuOption::EnableWaitStates(false));
    run_until_halted(&mut gated);

    // With wait states disabled, slow memory costs nothing extra.
    assert_eq!(baseline.cycle_count(), gated.cycle_count());
}

#[test]
fn dram_refresh_steals_cycles() {
    let code = [
        0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, // NOP sled
        0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90,
        0xF4,
    ];

    let (mut quiet, _bus) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut quiet);

    let (mut refreshed, _bus2) = make_cpu(CpuType::Intel8088, &code);
    refreshed.set_option(CpuOption::DramRefresh(18));
    run_until_halted(&mut refreshed);

    assert!(
        refreshed.cycle_count() > quiet.cycle_count(),
        "refresh DMA did not steal any cycles: {} vs {}",
        refreshed.cycle_count(),
        quiet.cycle_count()
    );
}

#[test]
fn prefetch_reaches_steady_state() {
    // Identical register-only instructions settle to identical costs
    // once the queue has topped off.
    let code = [
        0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0x90, 0xF4,
    ];
    let (mut cpu, _bus) = make_cpu(CpuType::Intel8088, &code);

    step_one(&mut cpu); // far jump

    let costs: Vec<u64> = (0..12).map(|_| step_one(&mut cpu)).collect();

    // The tail of the run settles into a tight band: the queue is
    // topped off and each NOP consumes what the prefetcher replaces.
    let tail = &costs[6..];
    let min = *tail.iter().min().unwrap();
    let max = *tail.iter().max().unwrap();
    assert!(max - min <= 3, "prefetch never settled, costs: {:?}", costs);
}

#[test]
fn queue_flush_on_jump_refetches_target() {
    // A short backward-free jump: the target bytes are fetched from
    // the bus again after the flush even though they sit right after
    // the jump in memory.
    let code = [
        0xEB, 0x02, // JMP +2
        0x90, 0x90, // skipped
        0xBB, 0x01, 0x00, // MOV BX, 1
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut cpu);

    assert_eq!(cpu.get_register16(volt_core::cpu_808x::Register16::BX), 1);

    // The jump target was fetched at least once; with the queue
    // flushed it must have been read after the jump opcode was.
    let bus = bus.borrow();
    let jmp_fetch = bus.first_read_at(CODE_BASE).unwrap();
    let target_fetch = bus.first_read_at(CODE_BASE + 4).unwrap();
    assert!(jmp_fetch < target_fetch);
}

#[test]
fn io_cycles_reach_the_port_bus() {
    let code = [
        0xB0, 0x5A, // MOV AL, 0x5A
        0xE6, 0x42, // OUT 0x42, AL
        0xE4, 0x42, // IN AL, 0x42
        0xF4,
    ];
    let (mut cpu, bus) = make_cpu(CpuType::Intel8088, &code);
    run_until_halted(&mut cpu);

    let bus = bus.borrow();
    assert!(bus.journal.contains(&BusOp::IoWrite(0x42, 0x5A)));
    assert!(bus.journal.contains(&BusOp::IoRead(0x42)));
    assert_eq!(cpu.get_register8(volt_core::cpu_808x::Register8::AL), 0x5A);
}
