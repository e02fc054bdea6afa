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

    cpu_808x::bitwise.rs

    The D0-D3 shift/rotate group, including the undocumented SETMO
    encoding. Multi-bit shifts by CL run the single-bit circuit once per
    count, four ticks a turn.

*/

use crate::cpu_808x::*;

impl Cpu {
    /// D0-D3: rot/shift rm by 1 or by CL.
    pub(crate) fn op_rotate_shift(&mut self) {
        let bits = self.op_bits();
        let high_bit: u32 = if self.wide() { 0x8000 } else { 0x80 };

        self.do_mod_rm();
        if self.cpu_mod == 3 {
            self.cycles(1);
        }
        self.access(53);
        self.alu_data = self.get_ea() as u32;

        if (self.opcode & 2) == 0 {
            self.alu_src = 1;
            self.cycles(if self.cpu_mod != 3 { 4 } else { 0 });
        }
        else {
            self.alu_src = self.c.l() as u32;
            self.cycles(if self.cpu_mod != 3 { 9 } else { 6 });
        }

        while self.alu_src != 0 {
            self.alu_dest = self.alu_data;
            let oldc = self.get_flag(Flag::Carry);

            match self.rmdat & 0x38 {
                0x00 => {
                    // ROL
                    self.set_cf(Cpu::top_bit(self.alu_data, bits));
                    self.alu_data <<= 1;
                    self.alu_data |= self.get_flag(Flag::Carry) as u32;
                    self.set_of_rotate(bits);
                    self.set_af(false);
                }
                0x08 => {
                    // ROR
                    self.set_cf(self.alu_data & 1 != 0);
                    self.alu_data >>= 1;
                    if self.get_flag(Flag::Carry) {
                        self.alu_data |= high_bit;
                    }
                    self.set_of_rotate(bits);
                    self.set_af(false);
                }
                0x10 => {
                    // RCL
                    self.set_cf(Cpu::top_bit(self.alu_data, bits));
                    self.alu_data = (self.alu_data << 1) | (oldc as u32);
                    self.set_of_rotate(bits);
                    self.set_af(false);
                }
                0x18 => {
                    // RCR
                    self.set_cf(self.alu_data & 1 != 0);
                    self.alu_data >>= 1;
                    if oldc {
                        self.alu_data |= high_bit;
                    }
                    self.set_cf(self.alu_dest & 1 != 0);
                    self.set_of_rotate(bits);
                    self.set_af(false);
                }
                0x20 => {
                    // SHL
                    self.set_cf(Cpu::top_bit(self.alu_data, bits));
                    self.alu_data <<= 1;
                    self.set_of_rotate(bits);
                    self.set_af(self.alu_data & 0x10 != 0);
                    self.set_pzs(bits);
                }
                0x28 => {
                    // SHR
                    self.set_cf(self.alu_data & 1 != 0);
                    self.alu_data >>= 1;
                    self.set_of_rotate(bits);
                    self.set_af(false);
                    self.set_pzs(bits);
                }
                0x30 => {
                    // SETMO, undocumented: result is all-ones.
                    self.alu_bitwise(bits, 0xFFFF);
                    self.set_cf(false);
                    self.set_of_rotate(bits);
                    self.set_af(false);
                    self.set_pzs(bits);
                }
                _ => {
                    // SAR
                    self.set_cf(self.alu_data & 1 != 0);
                    self.alu_data >>= 1;
                    self.alu_data |= self.alu_dest & high_bit;
                    self.set_of_rotate(bits);
                    self.set_af(false);
                    self.set_pzs(bits);
                }
            }

            if (self.opcode & 2) != 0 {
                self.cycles(4);
            }
            self.alu_src -= 1;
        }

        self.access(17);
        let data = self.alu_data;
        self.set_ea(data as u16);
    }
}
