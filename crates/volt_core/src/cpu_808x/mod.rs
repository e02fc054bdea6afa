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

    cpu_808x::mod.rs

    Implements the 8088/8086 CPU, including the NEC V20 extensions and
    its embedded 8080 emulation mode.

*/

#![allow(clippy::unusual_byte_groupings)]

use std::{error::Error, fmt, fmt::Display};

use serde_derive::{Deserialize, Serialize};

mod alu;
mod bcd;
mod bitwise;
mod biu;
mod cycle;
mod display;
mod dma;
mod emulation;
mod execute;
mod interrupt;
mod modrm;
mod muldiv;
mod queue;
mod stack;
mod step;
mod string;

use crate::{bus::BusInterface, cpu_common::CpuType, cpu_i8080::Intel8080};
pub use crate::cpu_common::CpuOption;

use crate::cpu_808x::queue::PrefetchQueue;

pub const CPU_FLAG_CARRY: u16 = 0b0000_0000_0000_0001;
pub const CPU_FLAG_RESERVED1: u16 = 0b0000_0000_0000_0010;
pub const CPU_FLAG_PARITY: u16 = 0b0000_0000_0000_0100;
pub const CPU_FLAG_AUX_CARRY: u16 = 0b0000_0000_0001_0000;
pub const CPU_FLAG_ZERO: u16 = 0b0000_0000_0100_0000;
pub const CPU_FLAG_SIGN: u16 = 0b0000_0000_1000_0000;
pub const CPU_FLAG_TRAP: u16 = 0b0000_0001_0000_0000;
pub const CPU_FLAG_INT_ENABLE: u16 = 0b0000_0010_0000_0000;
pub const CPU_FLAG_DIRECTION: u16 = 0b0000_0100_0000_0000;
pub const CPU_FLAG_OVERFLOW: u16 = 0b0000_1000_0000_0000;

/// V20 mode flag. Set: native execution. Clear: 8080 emulation mode.
/// On the Intel parts this bit reads as a reserved 1.
pub const CPU_FLAG_MODE: u16 = 0b1000_0000_0000_0000;

/// Mask applied to the flag image pushed by PUSHF and interrupt entry.
const FLAGS_PUSH_MASK: u16 = 0x0FD7;
/// Upper bits forced on in the pushed image of the Intel parts.
const FLAGS_PUSH_FIXED: u16 = 0xF000;
/// Reserved bits forced on in the live flags word.
const FLAGS_RESERVED_ON: u16 = 0xF002;

/// Ticks between reset release and the first code fetch.
const RESET_FETCH_DELAY: u32 = 6;
/// Ticks the prefetcher idles before refilling after a flush lands on an
/// idle bus.
const FLUSH_RESUME_DELAY: u32 = 3;
/// Penalty charged for an undefined opcode, after consuming the byte.
const UNDEFINED_OPCODE_PENALTY: u32 = 8;

// The parity flag is calculated from the lower 8 bits of an ALU result
// regardless of operand width, so it can be precalculated.
pub const PARITY_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut index = 0;
    loop {
        table[index] = index.count_ones() % 2 == 0;
        index += 1;
        if index == 256 {
            break;
        }
    }
    table
};

#[repr(C)]
#[derive(Copy, Clone, Default)]
pub struct GeneralRegisterBytes {
    pub l: u8,
    pub h: u8,
}

#[repr(C)]
pub union GeneralRegister {
    b: GeneralRegisterBytes,
    w: u16,
}

impl Default for GeneralRegister {
    fn default() -> Self {
        GeneralRegister { w: 0 }
    }
}

impl GeneralRegister {
    // Safety: It is safe to access fields of a union comprised of unsigned
    // integer types.
    #[inline(always)]
    pub fn x(&self) -> u16 {
        unsafe { self.w }
    }
    #[inline(always)]
    pub fn set_x(&mut self, value: u16) {
        self.w = value;
    }
    #[inline(always)]
    pub fn h(&self) -> u8 {
        unsafe { self.b.h }
    }
    #[inline(always)]
    pub fn set_h(&mut self, value: u8) {
        self.b.h = value;
    }
    #[inline(always)]
    pub fn l(&self) -> u8 {
        unsafe { self.b.l }
    }
    #[inline(always)]
    pub fn set_l(&mut self, value: u8) {
        self.b.l = value;
    }
    #[inline(always)]
    pub fn incr_h(&mut self) {
        self.b.h = unsafe { self.b.h.wrapping_add(1) };
    }
    #[inline(always)]
    pub fn decr_h(&mut self) {
        self.b.h = unsafe { self.b.h.wrapping_sub(1) };
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Register8 {
    AL,
    CL,
    DL,
    BL,
    AH,
    CH,
    DH,
    BH,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Register16 {
    AX,
    CX,
    DX,
    BX,
    SP,
    BP,
    SI,
    DI,
    ES,
    CS,
    SS,
    DS,
    PC,
}

pub const REGISTER16_LUT: [Register16; 8] = [
    Register16::AX,
    Register16::CX,
    Register16::DX,
    Register16::BX,
    Register16::SP,
    Register16::BP,
    Register16::SI,
    Register16::DI,
];

pub const SEGMENT_REGISTER_LUT: [Segment; 4] = [Segment::ES, Segment::CS, Segment::SS, Segment::DS];

/// Representation of a flag in the CPU flags register.
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    Carry,
    Parity,
    AuxCarry,
    Zero,
    Sign,
    Trap,
    Interrupt,
    Direction,
    Overflow,
    Mode,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    ES,
    CS,
    SS,
    DS,
}

/// One quarter-phase of a bus cycle. The counter is always valid; whether
/// a transfer is actually in flight is the BIU state's business.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum TCycle {
    #[default]
    T1,
    T2,
    T3,
    T4,
}

impl TCycle {
    #[inline]
    pub fn next(&self) -> TCycle {
        match self {
            TCycle::T1 => TCycle::T2,
            TCycle::T2 => TCycle::T3,
            TCycle::T3 => TCycle::T4,
            TCycle::T4 => TCycle::T1,
        }
    }
}

/// BIU disposition. Wait-state insertion is not a distinct state; it holds
/// the phase counter at T3 via Cpu::biu_wait while in Prefetch or Eu.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum BiuState {
    #[default]
    Idle,
    Suspended,
    /// Post-access breather taken when the queue comes within one byte of
    /// full during a code fetch.
    Delay,
    /// Counting down the refill latency after a flush landed on an idle bus.
    Resume,
    Prefetch,
    /// Servicing an EU-issued bus request.
    Eu,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BusRequestKind {
    Mem,
    Io,
    Pic,
}

/// Descriptor of an EU-issued bus request. Code fetches are not
/// represented here; the BIU issues those on its own behalf.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct BusRequest {
    pub kind: BusRequestKind,
    pub out:  bool,
    /// Single 16-bit transfer (8086, even address).
    pub wide: bool,
    /// Second cycle of a split word transfer, addressing offset+1.
    pub high: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DmaState {
    #[default]
    Idle,
    Timer,
    Dreq,
    Hrq,
    Holda,
    Operating(u8),
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum RepMode {
    #[default]
    None,
    Repne,
    Repe,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum AluOp {
    #[default]
    Add,
    Or,
    Adc,
    Sbb,
    And,
    Sub,
    Xor,
    Cmp,
}

impl AluOp {
    #[inline]
    pub fn from_bits(bits: u8) -> AluOp {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Or,
            2 => AluOp::Adc,
            3 => AluOp::Sbb,
            4 => AluOp::And,
            5 => AluOp::Sub,
            6 => AluOp::Xor,
            _ => AluOp::Cmp,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResetType {
    Cold,
    Warm,
}

/// Fatal core conditions. These are logic-error guards; encountering one
/// means timing is already desynchronized, so the session is aborted with
/// the failing context rather than limping on.
#[derive(Debug)]
pub enum CpuError {
    FarOperandRegister(u8, u16, u16),
    BiuDesync(&'static str, u16, u16),
}

impl Error for CpuError {}
impl Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuError::FarOperandRegister(op, cs, ip) => write!(
                f,
                "Far transfer through a register operand: opcode {:02X} at {:04X}:{:04X}",
                op, cs, ip
            ),
            CpuError::BiuDesync(what, cs, ip) => {
                write!(f, "BIU state desync ({}) at {:04X}:{:04X}", what, cs, ip)
            }
        }
    }
}

/// External floating-point execution unit for the ESC opcode range.
/// The core decodes ModRM and computes the effective address, then hands
/// off; it resumes as soon as the call returns.
pub trait Coprocessor {
    fn esc(&mut self, opcode: u8, modrm: u8, ea: Option<(u16, u16)>);
}

/// Flat save-state image: register file, queue contents, bus-phase
/// counters and interrupt latches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub ax: u16,
    pub bx: u16,
    pub cx: u16,
    pub dx: u16,
    pub sp: u16,
    pub bp: u16,
    pub si: u16,
    pub di: u16,
    pub es: u16,
    pub cs: u16,
    pub ss: u16,
    pub ds: u16,
    pub pc: u16,
    pub flags: u16,

    pub queue: Vec<u8>,
    pub pfq_ip: u16,

    pub biu_state: BiuState,
    pub biu_next_state: BiuState,
    pub biu_state_length: u32,
    pub bus_cycle: TCycle,
    pub biu_wait: bool,
    pub wait_states: u32,
    pub dma_wait_states: u32,
    pub dma_state: DmaState,
    pub fetch_suspended: bool,

    pub intr: bool,
    pub nmi: bool,
    pub nmi_latch: bool,
    pub nmi_enable: bool,
    pub noint: bool,
    pub halted: bool,
}

pub struct Cpu {
    cpu_type: CpuType,

    // Register file. AX..DX are byte-addressable.
    a: GeneralRegister,
    b: GeneralRegister,
    c: GeneralRegister,
    d: GeneralRegister,
    sp: u16,
    bp: u16,
    si: u16,
    di: u16,
    cs: u16,
    ds: u16,
    ss: u16,
    es: u16,
    pc: u16,
    flags: u16,

    // Decode context, rebuilt for every instruction.
    opcode: u8,
    rmdat: u8,
    cpu_mod: u8,
    cpu_reg: u8,
    cpu_rm: u8,
    ea_addr: u16,
    ea_seg: u16,
    ovr_seg: Option<Segment>,
    alu_op: AluOp,
    alu_dest: u32,
    alu_src: u32,
    alu_data: u32,

    // Instruction boundary bookkeeping.
    completed: bool,
    repeating: bool,
    in_rep: RepMode,
    in_lock: bool,
    clear_lock: bool,
    noint: bool,
    halted: bool,
    instruction_ip: u16,
    instruction_count: u64,

    // Interrupt lines and latches.
    intr: bool,
    nmi: bool,
    nmi_latch: bool,
    nmi_enable: bool,
    custom_nmi_vector: Option<u32>,

    // BIU state.
    queue: PrefetchQueue,
    pfq_ip: u16,
    fetch_latch: u16,
    biu_state: BiuState,
    biu_next_state: BiuState,
    biu_state_length: u32,
    biu_state_total: u32,
    bus_cycle: TCycle,
    bus_cycle_at_claim: TCycle,
    biu_wait: bool,
    bus_access_done: bool,
    bus_request: Option<BusRequest>,
    mem_seg: u16,
    mem_addr: u16,
    mem_data: u16,
    pic_data: u8,
    wait_states: u32,
    dma_wait_states: u32,
    fetch_suspended: bool,
    pending_fetch_delay: u32,
    last_addr: u16,
    ready: bool,

    // DMA refresh arbiter.
    dma_state: DmaState,
    dram_refresh_period: u32,
    dram_refresh_counter: u32,
    enable_wait_states: bool,

    // Tick accounting. cycles_left is the caller's budget; cycle_num is
    // the shared cycle counter every component advances against.
    cycle_num: u64,
    cycles_left: i64,

    // Embedded 8080 core for V20 emulation mode.
    i8080: Intel8080,

    fpu: Option<Box<dyn Coprocessor>>,
    bus: Box<dyn BusInterface>,
}

impl Cpu {
    pub fn new(cpu_type: CpuType, bus: Box<dyn BusInterface>) -> Self {
        let mut cpu = Cpu {
            cpu_type,
            a: Default::default(),
            b: Default::default(),
            c: Default::default(),
            d: Default::default(),
            sp: 0,
            bp: 0,
            si: 0,
            di: 0,
            cs: 0,
            ds: 0,
            ss: 0,
            es: 0,
            pc: 0,
            flags: FLAGS_RESERVED_ON,
            opcode: 0,
            rmdat: 0,
            cpu_mod: 0,
            cpu_reg: 0,
            cpu_rm: 0,
            ea_addr: 0,
            ea_seg: 0,
            ovr_seg: None,
            alu_op: AluOp::Add,
            alu_dest: 0,
            alu_src: 0,
            alu_data: 0,
            completed: true,
            repeating: false,
            in_rep: RepMode::None,
            in_lock: false,
            clear_lock: false,
            noint: false,
            halted: false,
            instruction_ip: 0,
            instruction_count: 0,
            intr: false,
            nmi: false,
            nmi_latch: false,
            nmi_enable: true,
            custom_nmi_vector: None,
            queue: PrefetchQueue::new(cpu_type.queue_size()),
            pfq_ip: 0,
            fetch_latch: 0,
            biu_state: BiuState::Idle,
            biu_next_state: BiuState::Idle,
            biu_state_length: 0,
            biu_state_total: 0,
            bus_cycle: TCycle::T1,
            bus_cycle_at_claim: TCycle::T1,
            biu_wait: false,
            bus_access_done: false,
            bus_request: None,
            mem_seg: 0,
            mem_addr: 0,
            mem_data: 0,
            pic_data: 0,
            wait_states: 0,
            dma_wait_states: 0,
            fetch_suspended: false,
            pending_fetch_delay: 0,
            last_addr: 0,
            ready: true,
            dma_state: DmaState::Idle,
            dram_refresh_period: 0,
            dram_refresh_counter: 0,
            enable_wait_states: true,
            cycle_num: 0,
            cycles_left: 0,
            i8080: Intel8080::default(),
            fpu: None,
            bus,
        };
        cpu.reset(ResetType::Cold);
        cpu
    }

    /// Reset the CPU. A cold reset zeroes the full register file; both
    /// kinds load CS:IP with the reset vector FFFF:0000, empty the queue
    /// and park the BIU in Idle with the reset-to-fetch delay armed.
    pub fn reset(&mut self, reset_type: ResetType) {
        if let ResetType::Cold = reset_type {
            self.a.set_x(0);
            self.b.set_x(0);
            self.c.set_x(0);
            self.d.set_x(0);
            self.sp = 0;
            self.bp = 0;
            self.si = 0;
            self.di = 0;
            self.ds = 0;
            self.ss = 0;
            self.es = 0;
            self.flags = FLAGS_RESERVED_ON;
            self.custom_nmi_vector = None;
            self.instruction_count = 0;
        }

        self.load_cs(0xFFFF);
        self.pc = 0;

        self.opcode = 0;
        self.ovr_seg = None;
        self.alu_op = AluOp::Add;
        self.completed = true;
        self.repeating = false;
        self.in_rep = RepMode::None;
        self.in_lock = false;
        self.clear_lock = false;
        self.noint = false;
        self.halted = false;

        self.nmi_latch = false;
        self.nmi_enable = true;

        self.queue.flush();
        self.pfq_ip = 0;
        self.fetch_latch = 0;
        self.biu_state = BiuState::Idle;
        self.biu_next_state = BiuState::Idle;
        self.biu_state_length = 0;
        self.biu_state_total = 0;
        self.bus_cycle = TCycle::T1;
        self.biu_wait = false;
        self.bus_access_done = false;
        self.bus_request = None;
        self.wait_states = 0;
        self.dma_wait_states = 0;
        self.fetch_suspended = false;
        self.pending_fetch_delay = RESET_FETCH_DELAY;
        self.ready = true;

        self.dma_state = DmaState::Idle;
        self.dram_refresh_counter = self.dram_refresh_period;

        // Native mode out of reset.
        self.flags |= CPU_FLAG_MODE;
    }

    pub fn set_option(&mut self, option: CpuOption) {
        match option {
            CpuOption::EnableWaitStates(state) => {
                self.enable_wait_states = state;
            }
            CpuOption::DramRefresh(period) => {
                self.dram_refresh_period = period;
                self.dram_refresh_counter = period;
            }
        }
    }

    pub fn attach_fpu(&mut self, fpu: Box<dyn Coprocessor>) {
        self.fpu = Some(fpu);
    }

    // -- Flag access ------------------------------------------------------

    #[inline]
    fn flag_mask(flag: Flag) -> u16 {
        match flag {
            Flag::Carry => CPU_FLAG_CARRY,
            Flag::Parity => CPU_FLAG_PARITY,
            Flag::AuxCarry => CPU_FLAG_AUX_CARRY,
            Flag::Zero => CPU_FLAG_ZERO,
            Flag::Sign => CPU_FLAG_SIGN,
            Flag::Trap => CPU_FLAG_TRAP,
            Flag::Interrupt => CPU_FLAG_INT_ENABLE,
            Flag::Direction => CPU_FLAG_DIRECTION,
            Flag::Overflow => CPU_FLAG_OVERFLOW,
            Flag::Mode => CPU_FLAG_MODE,
        }
    }

    #[inline]
    pub fn get_flag(&self, flag: Flag) -> bool {
        self.flags & Cpu::flag_mask(flag) != 0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Flag) {
        self.flags |= Cpu::flag_mask(flag);
    }

    #[inline]
    pub fn clear_flag(&mut self, flag: Flag) {
        self.flags &= !Cpu::flag_mask(flag);
    }

    #[inline]
    pub fn set_flag_state(&mut self, flag: Flag, state: bool) {
        if state {
            self.set_flag(flag)
        }
        else {
            self.clear_flag(flag)
        }
    }

    pub fn get_flags(&self) -> u16 {
        self.flags
    }

    /// Replace the live flags word, normalizing reserved bits. The V20
    /// keeps its mode flag in bit 15; the Intel parts read it as 1.
    pub fn set_flags(&mut self, value: u16) {
        if self.cpu_type.is_nec() {
            self.flags = (value & (FLAGS_PUSH_MASK | CPU_FLAG_MODE)) | (FLAGS_RESERVED_ON & !CPU_FLAG_MODE);
        }
        else {
            self.flags = (value & FLAGS_PUSH_MASK) | FLAGS_RESERVED_ON;
        }
    }

    /// The flag image seen by PUSHF and interrupt entry.
    pub(crate) fn flags_word(&self) -> u16 {
        if self.cpu_type.is_nec() {
            (self.flags & (FLAGS_PUSH_MASK | CPU_FLAG_MODE)) | (FLAGS_PUSH_FIXED & !CPU_FLAG_MODE)
        }
        else {
            (self.flags & FLAGS_PUSH_MASK) | FLAGS_PUSH_FIXED
        }
    }

    // -- Register access --------------------------------------------------

    pub fn get_register16(&self, reg: Register16) -> u16 {
        match reg {
            Register16::AX => self.a.x(),
            Register16::CX => self.c.x(),
            Register16::DX => self.d.x(),
            Register16::BX => self.b.x(),
            Register16::SP => self.sp,
            Register16::BP => self.bp,
            Register16::SI => self.si,
            Register16::DI => self.di,
            Register16::ES => self.es,
            Register16::CS => self.cs,
            Register16::SS => self.ss,
            Register16::DS => self.ds,
            Register16::PC => self.pc,
        }
    }

    pub fn set_register16(&mut self, reg: Register16, value: u16) {
        match reg {
            Register16::AX => self.a.set_x(value),
            Register16::CX => self.c.set_x(value),
            Register16::DX => self.d.set_x(value),
            Register16::BX => self.b.set_x(value),
            Register16::SP => self.sp = value,
            Register16::BP => self.bp = value,
            Register16::SI => self.si = value,
            Register16::DI => self.di = value,
            Register16::ES => self.es = value,
            Register16::CS => self.load_cs(value),
            Register16::SS => self.ss = value,
            Register16::DS => self.ds = value,
            Register16::PC => self.pc = value,
        }
    }

    pub fn get_register8(&self, reg: Register8) -> u8 {
        match reg {
            Register8::AL => self.a.l(),
            Register8::CL => self.c.l(),
            Register8::DL => self.d.l(),
            Register8::BL => self.b.l(),
            Register8::AH => self.a.h(),
            Register8::CH => self.c.h(),
            Register8::DH => self.d.h(),
            Register8::BH => self.b.h(),
        }
    }

    pub fn set_register8(&mut self, reg: Register8, value: u8) {
        match reg {
            Register8::AL => self.a.set_l(value),
            Register8::CL => self.c.set_l(value),
            Register8::DL => self.d.set_l(value),
            Register8::BL => self.b.set_l(value),
            Register8::AH => self.a.set_h(value),
            Register8::CH => self.c.set_h(value),
            Register8::DH => self.d.set_h(value),
            Register8::BH => self.b.set_h(value),
        }
    }

    // Numbered register access for ModRM and encoded-register opcodes.
    #[inline]
    pub(crate) fn get_r16(&self, idx: u8) -> u16 {
        self.get_register16(REGISTER16_LUT[(idx & 0x07) as usize])
    }

    #[inline]
    pub(crate) fn set_r16(&mut self, idx: u8, value: u16) {
        self.set_register16(REGISTER16_LUT[(idx & 0x07) as usize], value);
    }

    pub(crate) fn get_r8(&self, idx: u8) -> u8 {
        let reg = match idx & 0x03 {
            0 => &self.a,
            1 => &self.c,
            2 => &self.d,
            _ => &self.b,
        };
        if idx & 0x04 != 0 {
            reg.h()
        }
        else {
            reg.l()
        }
    }

    pub(crate) fn set_r8(&mut self, idx: u8, value: u8) {
        let reg = match idx & 0x03 {
            0 => &mut self.a,
            1 => &mut self.c,
            2 => &mut self.d,
            _ => &mut self.b,
        };
        if idx & 0x04 != 0 {
            reg.set_h(value);
        }
        else {
            reg.set_l(value);
        }
    }

    /// Width-sensitive register read keyed by bit 0 of the current opcode.
    #[inline]
    pub(crate) fn get_reg(&self, idx: u8) -> u16 {
        if self.wide() {
            self.get_r16(idx)
        }
        else {
            self.get_r8(idx) as u16
        }
    }

    #[inline]
    pub(crate) fn set_reg(&mut self, idx: u8, value: u16) {
        if self.wide() {
            self.set_r16(idx, value);
        }
        else {
            self.set_r8(idx, (value & 0xFF) as u8);
        }
    }

    #[inline]
    pub(crate) fn get_accum(&self) -> u16 {
        if self.wide() {
            self.a.x()
        }
        else {
            self.a.l() as u16
        }
    }

    #[inline]
    pub(crate) fn set_accum(&mut self, value: u16) {
        if self.wide() {
            self.a.set_x(value);
        }
        else {
            self.a.set_l((value & 0xFF) as u8);
        }
    }

    #[inline]
    pub(crate) fn wide(&self) -> bool {
        self.opcode & 0x01 != 0
    }

    #[inline]
    pub(crate) fn op_bits(&self) -> u32 {
        8 << (self.opcode & 1) as u32
    }

    // -- Segmentation -----------------------------------------------------

    #[inline]
    pub fn calc_linear_address(segment: u16, offset: u16) -> u32 {
        (((segment as u32) << 4) + offset as u32) & 0xFFFFF
    }

    pub(crate) fn seg_value(&self, seg: Segment) -> u16 {
        match seg {
            Segment::ES => self.es,
            Segment::CS => self.cs,
            Segment::SS => self.ss,
            Segment::DS => self.ds,
        }
    }

    pub(crate) fn set_seg_value(&mut self, seg: Segment, value: u16) {
        match seg {
            Segment::ES => self.es = value,
            Segment::CS => self.load_cs(value),
            Segment::SS => self.ss = value,
            Segment::DS => self.ds = value,
        }
    }

    /// The data segment in effect: any active override, else DS.
    #[inline]
    pub(crate) fn data_segment(&self) -> u16 {
        match self.ovr_seg {
            Some(seg) => self.seg_value(seg),
            None => self.ds,
        }
    }

    #[inline]
    pub(crate) fn load_cs(&mut self, segment: u16) {
        self.cs = segment;
    }

    pub(crate) fn sign_extend(data: u8) -> u16 {
        data as u16 + if data < 0x80 { 0 } else { 0xFF00 }
    }

    // -- Public inspection ------------------------------------------------

    pub fn ip(&self) -> u16 {
        self.pc
    }

    pub fn set_ip_register(&mut self, ip: u16) {
        self.pc = ip;
        self.biu_queue_flush();
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_num
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_string(&self) -> String {
        self.queue.to_string()
    }

    pub fn biu_state(&self) -> BiuState {
        self.biu_state
    }

    pub fn t_cycle(&self) -> TCycle {
        self.bus_cycle
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Address latch of the most recent write into the BIOS area, kept for
    /// front-end diagnostics.
    pub fn last_write_addr(&self) -> u16 {
        self.last_addr
    }

    pub fn in_emulation_mode(&self) -> bool {
        self.cpu_type.is_nec() && !self.get_flag(Flag::Mode)
    }

    // -- External lines ---------------------------------------------------

    /// Drive the NMI line. The latch is edge-triggered.
    pub fn set_nmi(&mut self, state: bool) {
        if state && !self.nmi {
            self.nmi_latch = true;
        }
        self.nmi = state;
    }

    /// Drive the INTR line (level-sensitive; the PIC holds it until
    /// acknowledged).
    pub fn set_intr(&mut self, state: bool) {
        self.intr = state;
    }

    /// Route NMI through a fixed vector address instead of IVT slot 2.
    pub fn set_custom_nmi_vector(&mut self, vector: Option<u32>) {
        self.custom_nmi_vector = vector;
    }

    pub fn bus(&self) -> &dyn BusInterface {
        &*self.bus
    }

    pub fn bus_mut(&mut self) -> &mut dyn BusInterface {
        &mut *self.bus
    }

    // -- Save states ------------------------------------------------------

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            ax: self.a.x(),
            bx: self.b.x(),
            cx: self.c.x(),
            dx: self.d.x(),
            sp: self.sp,
            bp: self.bp,
            si: self.si,
            di: self.di,
            es: self.es,
            cs: self.cs,
            ss: self.ss,
            ds: self.ds,
            pc: self.pc,
            flags: self.flags,
            queue: self.queue.to_vec(),
            pfq_ip: self.pfq_ip,
            biu_state: self.biu_state,
            biu_next_state: self.biu_next_state,
            biu_state_length: self.biu_state_length,
            bus_cycle: self.bus_cycle,
            biu_wait: self.biu_wait,
            wait_states: self.wait_states,
            dma_wait_states: self.dma_wait_states,
            dma_state: self.dma_state,
            fetch_suspended: self.fetch_suspended,
            intr: self.intr,
            nmi: self.nmi,
            nmi_latch: self.nmi_latch,
            nmi_enable: self.nmi_enable,
            noint: self.noint,
            halted: self.halted,
        }
    }

    pub fn restore(&mut self, snap: &CpuSnapshot) {
        self.a.set_x(snap.ax);
        self.b.set_x(snap.bx);
        self.c.set_x(snap.cx);
        self.d.set_x(snap.dx);
        self.sp = snap.sp;
        self.bp = snap.bp;
        self.si = snap.si;
        self.di = snap.di;
        self.es = snap.es;
        self.cs = snap.cs;
        self.ss = snap.ss;
        self.ds = snap.ds;
        self.pc = snap.pc;
        self.flags = snap.flags;
        self.queue.load(&snap.queue);
        self.pfq_ip = snap.pfq_ip;
        self.biu_state = snap.biu_state;
        self.biu_next_state = snap.biu_next_state;
        self.biu_state_length = snap.biu_state_length;
        self.bus_cycle = snap.bus_cycle;
        self.biu_wait = snap.biu_wait;
        self.wait_states = snap.wait_states;
        self.dma_wait_states = snap.dma_wait_states;
        self.dma_state = snap.dma_state;
        self.fetch_suspended = snap.fetch_suspended;
        self.intr = snap.intr;
        self.nmi = snap.nmi;
        self.nmi_latch = snap.nmi_latch;
        self.nmi_enable = snap.nmi_enable;
        self.noint = snap.noint;
        self.halted = snap.halted;
    }
}
