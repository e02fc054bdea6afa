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

    tests::common

    A scripted 1MB RAM bus that journals every bus operation in order,
    shared between the CPU and the test through an Rc so the test can
    inspect memory and the journal after the run.

*/
#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use volt_core::{BusInterface, Cpu, CpuType};

#[derive(Clone, Debug, PartialEq)]
pub enum BusOp {
    MemRead(u32, u8),
    MemWrite(u32, u8),
    IoRead(u16),
    IoWrite(u16, u8),
    Inta,
}

pub struct RamBus {
    pub mem: Vec<u8>,
    pub journal: Vec<BusOp>,
    pub irq_vector: u8,
    pub inta_count: usize,
    pub io_latch: u8,
    pub mem_wait: u32,
    pub io_wait: u32,
}

impl RamBus {
    pub fn new() -> Self {
        RamBus {
            mem: vec![0; 0x100000],
            journal: Vec::new(),
            irq_vector: 0,
            inta_count: 0,
            io_latch: 0xFF,
            mem_wait: 0,
            io_wait: 0,
        }
    }

    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        let addr = addr as usize;
        self.mem[addr..addr + bytes.len()].copy_from_slice(bytes);
    }

    /// Install CS:IP into an interrupt vector table slot.
    pub fn set_ivt(&mut self, vector: u8, cs: u16, ip: u16) {
        let slot = vector as u32 * 4;
        self.load(slot, &[
            (ip & 0xFF) as u8,
            (ip >> 8) as u8,
            (cs & 0xFF) as u8,
            (cs >> 8) as u8,
        ]);
    }

    /// Index of the first write touching the given address, if any.
    pub fn first_write_at(&self, addr: u32) -> Option<usize> {
        self.journal.iter().position(|op| matches!(op, BusOp::MemWrite(a, _) if *a == addr))
    }

    /// Index of the first read touching the given address, if any.
    pub fn first_read_at(&self, addr: u32) -> Option<usize> {
        self.journal.iter().position(|op| matches!(op, BusOp::MemRead(a, _) if *a == addr))
    }

    /// Earliest journal index for either byte of a word at addr.
    pub fn first_write_of_word(&self, addr: u32) -> Option<usize> {
        match (self.first_write_at(addr), self.first_write_at(addr + 1)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn first_read_of_word(&self, addr: u32) -> Option<usize> {
        match (self.first_read_at(addr), self.first_read_at(addr + 1)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn first_inta(&self) -> Option<usize> {
        self.journal.iter().position(|op| matches!(op, BusOp::Inta))
    }

    pub fn read_u16_mem(&self, addr: u32) -> u16 {
        self.mem[addr as usize] as u16 | (self.mem[addr as usize + 1] as u16) << 8
    }
}

/// Rc wrapper so the test retains a handle on the bus it gave the CPU.
pub struct SharedBus(pub Rc<RefCell<RamBus>>);

impl BusInterface for SharedBus {
    fn read_u8(&mut self, addr: u32) -> u8 {
        let mut bus = self.0.borrow_mut();
        let data = bus.mem[(addr & 0xFFFFF) as usize];
        bus.journal.push(BusOp::MemRead(addr, data));
        data
    }

    fn write_u8(&mut self, addr: u32, data: u8) {
        let mut bus = self.0.borrow_mut();
        bus.mem[(addr & 0xFFFFF) as usize] = data;
        bus.journal.push(BusOp::MemWrite(addr, data));
    }

    fn io_read_u8(&mut self, port: u16) -> u8 {
        let mut bus = self.0.borrow_mut();
        bus.journal.push(BusOp::IoRead(port));
        bus.io_latch
    }

    fn io_write_u8(&mut self, port: u16, data: u8) {
        let mut bus = self.0.borrow_mut();
        bus.io_latch = data;
        bus.journal.push(BusOp::IoWrite(port, data));
    }

    fn irq_ack(&mut self) -> u8 {
        let mut bus = self.0.borrow_mut();
        bus.inta_count += 1;
        bus.journal.push(BusOp::Inta);
        bus.irq_vector
    }

    fn read_wait(&self, _addr: u32) -> u32 {
        self.0.borrow().mem_wait
    }

    fn write_wait(&self, _addr: u32) -> u32 {
        self.0.borrow().mem_wait
    }

    fn io_wait(&self, _port: u16) -> u32 {
        self.0.borrow().io_wait
    }
}

pub const CODE_SEG: u16 = 0x0100;
pub const CODE_BASE: u32 = 0x1000;

/// Build a CPU with the given program at 0100:0000 and a far jump to it
/// in the reset ROM.
pub fn make_cpu(cpu_type: CpuType, code: &[u8]) -> (Cpu, Rc<RefCell<RamBus>>) {
    let bus = Rc::new(RefCell::new(RamBus::new()));
    {
        let mut b = bus.borrow_mut();
        // JMP FAR 0100:0000 at the reset vector.
        b.load(0xFFFF0, &[0xEA, 0x00, 0x00, 0x00, 0x01]);
        b.load(CODE_BASE, code);
    }
    let cpu = Cpu::new(cpu_type, Box::new(SharedBus(bus.clone())));
    (cpu, bus)
}

/// Run until the core reports halted. Panics if it never does.
pub fn run_until_halted(cpu: &mut Cpu) {
    let mut guard = 0;
    while !cpu.is_halted() {
        cpu.run(100);
        guard += 1;
        assert!(guard < 100_000, "program never reached HLT");
    }
}

/// Execute exactly one instruction, returning the ticks it consumed.
pub fn step_one(cpu: &mut Cpu) -> u64 {
    let start_count = cpu.instruction_count();
    let start_cycles = cpu.cycle_count();
    let mut guard = 0;
    while cpu.instruction_count() == start_count {
        cpu.run(1);
        guard += 1;
        assert!(guard < 100_000, "instruction never completed");
    }
    cpu.cycle_count() - start_cycles
}
