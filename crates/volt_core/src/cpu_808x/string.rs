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

    cpu_808x::string.rs

    The string group and the REP repetition machinery. A repeated
    instruction does not refetch its opcode: the repeating latch makes
    the outer loop re-enter the same handler until CX runs out or an
    interrupt is observed, in which case the PC is backed up over the
    prefix and opcode so the repeat resumes after the service routine.

*/

use crate::cpu_808x::*;

impl Cpu {
    /// Advance ea_addr by the element size, honoring the direction flag.
    fn string_increment(&mut self, bits: u32) -> u16 {
        let d = (bits >> 3) as u16;
        if self.get_flag(Flag::Direction) {
            self.ea_addr = self.ea_addr.wrapping_sub(d);
        }
        else {
            self.ea_addr = self.ea_addr.wrapping_add(d);
        }
        self.ea_addr
    }

    /// Load one element from [SI] into alu_data. The source segment
    /// honors overrides; the destination side never does.
    fn lods(&mut self, bits: u32) {
        self.ea_addr = self.si;
        let seg = self.data_segment();
        if bits == 16 {
            self.alu_data = self.biu_read_u16(seg, self.ea_addr) as u32;
        }
        else {
            self.alu_data = self.biu_read_u8(seg, self.ea_addr) as u32;
        }
        self.si = self.string_increment(bits);
    }

    /// Store alu_data at ES:[DI].
    fn stos(&mut self, bits: u32) {
        self.ea_addr = self.di;
        if bits == 16 {
            let data = (self.alu_data & 0xFFFF) as u16;
            self.biu_write_u16(self.es, self.ea_addr, data);
        }
        else {
            let data = (self.alu_data & 0xFF) as u8;
            self.biu_write_u8(self.es, self.ea_addr, data);
        }
        self.di = self.string_increment(bits);
    }

    /// One turn of the REP crank: short-circuit on CX==0, bail out to
    /// service a pending interrupt (backing the PC up by the prefix and
    /// opcode), otherwise burn one count. Returns true when the repeat
    /// is over.
    fn rep_action(&mut self) -> bool {
        if self.in_rep == RepMode::None {
            return false;
        }
        self.cycles(2);
        let mut t = self.c.x();
        if self.irq_pending() && self.repeating {
            self.pfq_clear();
            self.set_ip(self.pc.wrapping_sub(2));
            t = 0;
        }
        if t == 0 {
            self.cycles(1);
            self.completed = true;
            self.repeating = false;
            return true;
        }
        self.c.set_x(self.c.x().wrapping_sub(1));
        self.completed = false;
        self.cycles(2);
        if !self.repeating {
            self.cycles(2);
        }
        false
    }

    /// A4/A5 MOVS, AC/AD LODS. The two share a handler because MOVS is
    /// LODS with the store bolted on.
    pub(crate) fn op_movs_lods(&mut self) {
        let bits = self.op_bits();
        let is_lods = (self.opcode & 0x08) != 0;

        if !self.repeating {
            self.cycles(1);
            if !is_lods && self.in_rep != RepMode::None {
                self.cycles(1);
            }
        }
        if self.rep_action() {
            self.cycles(1);
            if is_lods {
                self.cycles(1);
            }
            return;
        }
        if self.in_rep != RepMode::None && is_lods {
            self.cycles(1);
        }
        self.access(20);
        self.lods(bits);
        if !is_lods {
            self.access(27);
            self.stos(bits);
        }
        else {
            let data = (self.alu_data & 0xFFFF) as u16;
            self.set_accum(data);
            if self.in_rep != RepMode::None {
                self.cycles(2);
            }
        }
        if self.in_rep == RepMode::None {
            self.cycles(3);
            if is_lods {
                self.cycles(1);
            }
            return;
        }
        self.repeating = true;
    }

    /// A6/A7 CMPS, AE/AF SCAS. REPE/REPNE terminate on the zero flag.
    pub(crate) fn op_cmps_scas(&mut self) {
        let bits = self.op_bits();
        let is_scas = (self.opcode & 0x08) != 0;

        if !self.repeating {
            self.cycles(1);
        }
        if self.rep_action() {
            self.cycles(2);
            return;
        }
        if self.in_rep != RepMode::None {
            self.cycles(1);
        }
        self.cycles(1);
        self.alu_dest = self.get_accum() as u32;
        if !is_scas {
            self.access(21);
            self.lods(bits);
            self.cycles(1);
            self.alu_dest = self.alu_data;
        }
        self.access(2);
        self.ea_addr = self.di;
        if bits == 16 {
            self.alu_data = self.biu_read_u16(self.es, self.ea_addr) as u32;
        }
        else {
            self.alu_data = self.biu_read_u8(self.es, self.ea_addr) as u32;
        }
        self.di = self.string_increment(bits);
        self.alu_src = self.alu_data;
        self.alu_sub(bits);
        self.cycles(2);
        if self.in_rep == RepMode::None {
            self.cycles(3);
            return;
        }
        if self.get_flag(Flag::Zero) == (self.in_rep == RepMode::Repne) {
            self.completed = true;
            self.cycles(4);
            return;
        }
        self.repeating = true;
    }

    /// AA/AB STOS.
    pub(crate) fn op_stos(&mut self) {
        if !self.repeating {
            self.cycles(1);
            if self.in_rep != RepMode::None {
                self.cycles(1);
            }
        }
        if self.rep_action() {
            self.cycles(1);
            return;
        }
        let bits = self.op_bits();
        self.alu_data = self.a.x() as u32;
        self.access(28);
        self.stos(bits);
        if self.in_rep == RepMode::None {
            self.cycles(3);
            return;
        }
        self.repeating = true;
    }
}
