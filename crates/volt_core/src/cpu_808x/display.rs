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

    cpu_808x::display.rs

    Formatting for the per-tick trace line and the bus state enums.

*/

use std::fmt;

use crate::cpu_808x::*;

impl fmt::Display for TCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TCycle::T1 => write!(f, "T1"),
            TCycle::T2 => write!(f, "T2"),
            TCycle::T3 => write!(f, "T3"),
            TCycle::T4 => write!(f, "T4"),
        }
    }
}

impl fmt::Display for BiuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiuState::Idle => write!(f, "IDLE"),
            BiuState::Suspended => write!(f, "SUSP"),
            BiuState::Delay => write!(f, "DLY "),
            BiuState::Resume => write!(f, "RES "),
            BiuState::Prefetch => write!(f, "PF  "),
            BiuState::Eu => write!(f, "EU  "),
        }
    }
}

impl Cpu {
    /// One line of cycle trace: tick number, CS:IP, BIU state, T-state
    /// (Tw while wait states hold the phase at T3), queue contents and
    /// outstanding wait-state counters.
    pub fn cycle_state_string(&self) -> String {
        let t_str = if self.biu_wait {
            "Tw".to_string()
        }
        else {
            self.bus_cycle.to_string()
        };

        let op_chr = match self.bus_request {
            Some(req) => match (req.kind, req.out) {
                (BusRequestKind::Mem, false) => 'R',
                (BusRequestKind::Mem, true) => 'W',
                (BusRequestKind::Io, false) => 'r',
                (BusRequestKind::Io, true) => 'w',
                (BusRequestKind::Pic, _) => 'A',
            },
            None => ' ',
        };

        format!(
            "{:08} {:04X}:{:04X} {} {} {} q:{:12} ws:{} dws:{}",
            self.cycle_num,
            self.cs,
            self.pc,
            self.biu_state,
            t_str,
            op_chr,
            self.queue.to_string(),
            self.wait_states,
            self.dma_wait_states,
        )
    }

    /// Register dump used in fatal diagnostics.
    pub fn state_string(&self) -> String {
        format!(
            "AX={:04X} BX={:04X} CX={:04X} DX={:04X} SP={:04X} BP={:04X} SI={:04X} DI={:04X}\n\
             ES={:04X} CS={:04X} SS={:04X} DS={:04X} IP={:04X} FL={:04X} {} {}",
            self.a.x(),
            self.b.x(),
            self.c.x(),
            self.d.x(),
            self.sp,
            self.bp,
            self.si,
            self.di,
            self.es,
            self.cs,
            self.ss,
            self.ds,
            self.pc,
            self.flags,
            self.biu_state,
            self.bus_cycle,
        )
    }
}
