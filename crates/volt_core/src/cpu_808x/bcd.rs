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

    cpu_808x::bcd.rs

    The decimal-adjust group. The adjust constants flow through the
    regular ALU so the overflow flag comes out the way the silicon
    computes it.

*/

use crate::cpu_808x::*;

impl Cpu {
    fn set_ca(&mut self) {
        self.set_cf(true);
        self.set_af(true);
    }

    fn clear_ca(&mut self) {
        self.set_cf(false);
        self.set_af(false);
    }

    /// Shared AAA/AAS tail.
    fn aa(&mut self) {
        self.set_pzs(8);
        let al = (self.alu_data & 0x0F) as u8;
        self.a.set_l(al);
        self.cycles(6);
    }

    pub(crate) fn op_daa(&mut self) {
        self.alu_dest = self.a.l() as u32;
        self.set_of(false);
        let old_af = self.get_flag(Flag::AuxCarry);

        if self.get_flag(Flag::AuxCarry) || (self.a.l() & 0x0F) > 9 {
            self.alu_src = 6;
            self.alu_data = self.alu_dest.wrapping_add(self.alu_src);
            self.set_of_add(8);
            self.alu_dest = self.alu_data;
            self.set_af(true);
        }
        if self.get_flag(Flag::Carry) || self.a.l() > if old_af { 0x9F } else { 0x99 } {
            self.alu_src = 0x60;
            self.alu_data = self.alu_dest.wrapping_add(self.alu_src);
            self.set_of_add(8);
            self.alu_dest = self.alu_data;
            self.set_cf(true);
        }
        self.a.set_l((self.alu_dest & 0xFF) as u8);
        self.alu_data = self.alu_dest;
        self.set_pzs(8);
        self.cycles(3);
    }

    pub(crate) fn op_das(&mut self) {
        self.alu_dest = self.a.l() as u32;
        self.set_of(false);
        let old_af = self.get_flag(Flag::AuxCarry);

        if self.get_flag(Flag::AuxCarry) || (self.a.l() & 0x0F) > 9 {
            self.alu_src = 6;
            self.alu_data = self.alu_dest.wrapping_sub(self.alu_src);
            self.set_of_sub(8);
            self.alu_dest = self.alu_data;
            self.set_af(true);
        }
        if self.get_flag(Flag::Carry) || self.a.l() > if old_af { 0x9F } else { 0x99 } {
            self.alu_src = 0x60;
            self.alu_data = self.alu_dest.wrapping_sub(self.alu_src);
            self.set_of_sub(8);
            self.alu_dest = self.alu_data;
            self.set_cf(true);
        }
        self.a.set_l((self.alu_dest & 0xFF) as u8);
        self.alu_data = self.alu_dest;
        self.set_pzs(8);
        self.cycles(3);
    }

    pub(crate) fn op_aaa(&mut self) {
        self.cycles(1);
        if self.get_flag(Flag::AuxCarry) || (self.a.l() & 0x0F) > 9 {
            self.alu_src = 6;
            self.a.incr_h();
            self.set_ca();
        }
        else {
            self.alu_src = 0;
            self.clear_ca();
            self.cycles(1);
        }
        self.alu_dest = self.a.l() as u32;
        self.alu_data = self.alu_dest.wrapping_add(self.alu_src);
        self.set_of_add(8);
        self.aa();
    }

    pub(crate) fn op_aas(&mut self) {
        self.cycles(1);
        if self.get_flag(Flag::AuxCarry) || (self.a.l() & 0x0F) > 9 {
            self.alu_src = 6;
            self.a.decr_h();
            self.set_ca();
        }
        else {
            self.alu_src = 0;
            self.clear_ca();
            self.cycles(1);
        }
        self.alu_dest = self.a.l() as u32;
        self.alu_data = self.alu_dest.wrapping_sub(self.alu_src);
        self.set_of_sub(8);
        self.aa();
    }
}
