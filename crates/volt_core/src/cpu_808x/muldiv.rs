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

    cpu_808x::muldiv.rs

    Multiply and divide run the bit-serial shift-and-add circuit one bit
    per pass, charging the ticks as they happen, so the data-dependent
    timing of the real part falls out naturally. AAM and AAD share the
    same circuit. A quotient that does not fit the destination raises
    interrupt 0 without writing the result registers.

*/

use crate::cpu_808x::*;

impl Cpu {
    /// The multiply circuit. Signedness is keyed off the ModRM reg field
    /// (IMUL negates to unsigned, multiplies, then negates back). AAD
    /// enters with opcode D5 and skips the operand conditioning.
    pub(crate) fn mul(&mut self, a: u16, b: u16) {
        let mut a = a as u32;
        let mut b = b as u32;
        let mut bit_count: u32 = 8;
        let mut high_bit: u32 = 0x80;
        let mut negate = false;

        if self.opcode != 0xD5 {
            if self.wide() {
                bit_count = 16;
                high_bit = 0x8000;
            }
            else {
                self.cycles(8);
            }

            let size_mask = (1u32 << bit_count) - 1;

            if (self.rmdat & 0x38) == 0x28 {
                // IMUL conditions both operands to positive.
                if !Cpu::top_bit(a, bit_count) {
                    if Cpu::top_bit(b, bit_count) {
                        self.cycles(1);
                        if (b & size_mask) != high_bit {
                            self.cycles(1);
                        }
                        b = (!b).wrapping_add(1) & size_mask;
                        negate = true;
                    }
                }
                else {
                    self.cycles(1);
                    a = (!a).wrapping_add(1) & size_mask;
                    negate = true;
                    if Cpu::top_bit(b, bit_count) {
                        b = (!b).wrapping_add(1) & size_mask;
                        negate = false;
                    }
                    else {
                        self.cycles(4);
                    }
                }
                self.cycles(10);
            }
            self.cycles(3);
        }

        let size_mask = (1u32 << bit_count) - 1;

        let mut c: u32 = 0;
        a &= size_mask;
        let mut carry = (a & 1) != 0;
        a >>= 1;
        for _ in 0..bit_count {
            self.cycles(7);
            if carry {
                self.alu_src = c;
                self.alu_dest = b;
                self.alu_add(bit_count);
                c = self.alu_data & size_mask;
                self.cycles(1);
                carry = self.get_flag(Flag::Carry);
            }
            let r = (c >> 1) + if carry { high_bit } else { 0 };
            carry = (c & 1) != 0;
            c = r;
            let r = (a >> 1) + if carry { high_bit } else { 0 };
            carry = (a & 1) != 0;
            a = r;
        }
        if negate {
            c = !c & size_mask;
            a = (!a).wrapping_add(1) & size_mask;
            if a == 0 {
                c = c.wrapping_add(1) & size_mask;
            }
            self.cycles(9);
        }
        self.alu_data = a;
        self.alu_dest = c;

        self.set_sf(bit_count);
        self.set_pf();
        self.set_af(false);
    }

    /// The divide circuit: restoring long division, one quotient bit per
    /// pass. Returns false when the quotient overflows the destination,
    /// in which case interrupt 0 has already been dispatched and the
    /// result registers are untouched. AAM enters with opcode D4.
    pub(crate) fn x86_div(&mut self, l: u16, h: u16) -> bool {
        let mut bit_count: u32 = 8;
        let mut negative = false;
        let mut dividend_negative = false;

        let (mut l, mut h) = (l as u32, h as u32);
        if self.wide() {
            l = self.a.x() as u32;
            h = self.d.x() as u32;
            bit_count = 16;
        }

        let size_mask = (1u32 << bit_count) - 1;

        if self.opcode != 0xD4 {
            if (self.rmdat & 0x38) == 0x38 {
                // IDIV conditions dividend and divisor to positive.
                if Cpu::top_bit(h, bit_count) {
                    h = !h;
                    l = (!l).wrapping_add(1) & size_mask;
                    if l == 0 {
                        h = h.wrapping_add(1);
                    }
                    h &= size_mask;
                    negative = true;
                    dividend_negative = true;
                    self.cycles(4);
                }
                if Cpu::top_bit(self.alu_src, bit_count) {
                    self.alu_src = (!self.alu_src).wrapping_add(1) & size_mask;
                    negative = !negative;
                }
                else {
                    self.cycles(1);
                }
                self.cycles(9);
            }
            self.cycles(3);
        }
        self.cycles(8);
        self.alu_src &= size_mask;
        if h >= self.alu_src {
            if self.opcode != 0xD4 {
                self.cycles(1);
            }
            self.intr_routine(0);
            return false;
        }
        if self.opcode != 0xD4 {
            self.cycles(1);
        }
        self.cycles(2);

        let mut carry = true;
        for b in 0..bit_count {
            let r = ((l << 1) & size_mask) + carry as u32;
            carry = Cpu::top_bit(l, bit_count);
            l = r;
            let r = ((h << 1) & size_mask) + carry as u32;
            carry = Cpu::top_bit(h, bit_count);
            h = r;
            self.cycles(8);
            if carry {
                carry = false;
                h = (h.wrapping_sub(self.alu_src)) & size_mask;
                if b == bit_count - 1 {
                    self.cycles(2);
                }
            }
            else {
                carry = self.alu_src > h;
                if !carry {
                    h = (h.wrapping_sub(self.alu_src)) & size_mask;
                    self.cycles(1);
                    if b == bit_count - 1 {
                        self.cycles(2);
                    }
                }
            }
        }
        l = !(((l << 1) & size_mask) + carry as u32) & size_mask;
        if self.opcode != 0xD4 && (self.rmdat & 0x38) == 0x38 {
            self.cycles(4);
            if Cpu::top_bit(l, bit_count) {
                if self.cpu_mod == 3 {
                    self.cycles(1);
                }
                self.intr_routine(0);
                return false;
            }
            self.cycles(7);
            if negative {
                l = (!l).wrapping_add(1) & size_mask;
            }
            if dividend_negative {
                h = (!h).wrapping_add(1) & size_mask;
            }
        }
        if self.opcode == 0xD4 {
            self.a.set_l((h & 0xFF) as u8);
            self.a.set_h((l & 0xFF) as u8);
        }
        else {
            self.a.set_h((h & 0xFF) as u8);
            self.a.set_l((l & 0xFF) as u8);
            if self.wide() {
                self.d.set_x((h & 0xFFFF) as u16);
                self.a.set_x((l & 0xFFFF) as u16);
            }
        }
        true
    }

    /// D4: AAM. The immediate operand is the divisor (almost always 10).
    pub(crate) fn op_aam(&mut self) {
        self.cycles(1);
        self.alu_src = self.q_read_u8() as u32;
        let al = self.a.l() as u16;
        if self.x86_div(al, 0) {
            self.set_pzs(16);
        }
    }

    /// D5: AAD. Multiplies AH by the immediate and folds it into AL.
    pub(crate) fn op_aad(&mut self) {
        self.cycles(1);
        let imm = self.q_read_u8() as u16;
        let ah = self.a.h() as u16;
        self.mul(imm, ah);
        self.alu_dest = self.a.l() as u32;
        self.alu_src = self.alu_data;
        self.alu_add(8);
        self.a.set_l((self.alu_data & 0xFF) as u8);
        self.a.set_h(0);
    }

    /// F6/F7 group: TEST/NOT/NEG/MUL/IMUL/DIV/IDIV rm.
    pub(crate) fn op_group_f6f7(&mut self) {
        let bits = self.op_bits();

        self.do_mod_rm();
        self.access(55);
        self.alu_data = self.get_ea() as u32;

        match self.rmdat & 0x38 {
            0x00 | 0x08 => {
                // TEST rm, imm
                self.cycles(2);
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
                self.alu_src = self.q_read() as u32;
                self.cycles(1);
                self.alu_test(bits, self.alu_data, self.alu_src);
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
            }
            0x10 | 0x18 => {
                // NOT / NEG rm
                self.cycles(2);
                if (self.rmdat & 0x38) == 0x10 {
                    self.alu_data = !self.alu_data;
                }
                else {
                    self.alu_op = AluOp::Sub;
                    self.alu_src = self.alu_data;
                    self.alu_dest = 0;
                    self.alu_sub(bits);
                }
                self.access(18);
                let data = self.alu_data;
                self.set_ea(data as u16);
            }
            0x20 | 0x28 => {
                // MUL / IMUL rm
                self.cycles(1);
                let accum = self.get_accum();
                let operand = (self.alu_data & 0xFFFF) as u16;
                self.mul(accum, operand);
                let carry;
                if self.wide() {
                    self.a.set_x((self.alu_data & 0xFFFF) as u16);
                    self.d.set_x((self.alu_dest & 0xFFFF) as u16);
                    let expect_high = if (self.a.x() & 0x8000) == 0 || (self.rmdat & 0x38) == 0x20 {
                        0
                    }
                    else {
                        0xFFFF
                    };
                    carry = self.d.x() != expect_high;
                    self.alu_data = self.d.x() as u32;
                }
                else {
                    self.a.set_l((self.alu_data & 0xFF) as u8);
                    self.a.set_h((self.alu_dest & 0xFF) as u8);
                    let expect_high = if (self.a.l() & 0x80) == 0 || (self.rmdat & 0x38) == 0x20 {
                        0
                    }
                    else {
                        0xFF
                    };
                    carry = self.a.h() != expect_high;
                    self.alu_data = self.a.h() as u32;
                }
                self.set_co_mul(carry);
                self.set_sf(bits);
                self.set_pf();
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
            }
            _ => {
                // DIV / IDIV rm
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
                self.alu_src = self.alu_data;
                let (al, ah) = (self.a.l() as u16, self.a.h() as u16);
                if self.x86_div(al, ah) {
                    self.cycles(1);
                }
            }
        }
    }
}
