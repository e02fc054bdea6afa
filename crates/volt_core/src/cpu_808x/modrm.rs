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

    cpu_808x::modrm.rs

    ModRM fetch and decode, with the effective-address computation charged
    at the documented per-combination cost.

*/

use crate::cpu_808x::*;

impl Cpu {
    fn ea_base(&self, rm: u8) -> u16 {
        match rm & 0x07 {
            0 => self.b.x().wrapping_add(self.si),
            1 => self.b.x().wrapping_add(self.di),
            2 => self.bp.wrapping_add(self.si),
            3 => self.bp.wrapping_add(self.di),
            4 => self.si,
            5 => self.di,
            6 => self.bp,
            _ => self.b.x(),
        }
    }

    /// Default segment for the rm combination: BP-relative addressing
    /// goes through SS.
    fn ea_default_seg(&self, rm: u8) -> u16 {
        match self.ovr_seg {
            Some(seg) => self.seg_value(seg),
            None => match rm & 0x07 {
                2 | 3 | 6 => self.ss,
                _ => self.ds,
            },
        }
    }

    /// Fetch and decode the ModRM byte, computing the effective address
    /// for memory operands. EA computation time depends on the base
    /// register combination and displacement width.
    pub(crate) fn do_mod_rm(&mut self) {
        self.rmdat = self.q_read_u8();
        self.cpu_reg = (self.rmdat >> 3) & 0x07;
        self.cpu_mod = (self.rmdat >> 6) & 0x03;
        self.cpu_rm = self.rmdat & 0x07;

        if self.cpu_mod == 3 {
            return;
        }

        self.cycles(1);
        if (self.rmdat & 0xC7) == 0x06 {
            // Direct address.
            self.cycles(1);
            self.ea_addr = self.q_read_u16();
            self.ea_seg = self.data_segment();
            self.cycles(1);
            return;
        }

        match self.cpu_rm {
            0 | 3 => self.cycles(2),
            1 | 2 => self.cycles(3),
            _ => {}
        }

        self.ea_addr = self.ea_base(self.cpu_rm);
        self.ea_seg = self.ea_default_seg(self.cpu_rm);

        match self.rmdat & 0xC0 {
            0x40 => {
                self.cycles(3);
                let disp = Cpu::sign_extend(self.q_read_u8());
                self.ea_addr = self.ea_addr.wrapping_add(disp);
            }
            0x80 => {
                self.cycles(3);
                let disp = self.q_read_u16();
                self.ea_addr = self.ea_addr.wrapping_add(disp);
            }
            _ => {}
        }

        self.cycles(2);
    }

    // -- Effective-address operand access ---------------------------------

    pub(crate) fn get_ea8(&mut self) -> u8 {
        if self.cpu_mod == 3 {
            return self.get_r8(self.cpu_rm);
        }
        self.biu_read_u8(self.ea_seg, self.ea_addr)
    }

    pub(crate) fn get_ea16(&mut self) -> u16 {
        if self.cpu_mod == 3 {
            return self.get_r16(self.cpu_rm);
        }
        self.biu_read_u16(self.ea_seg, self.ea_addr)
    }

    /// Width-sensitive EA read keyed by bit 0 of the opcode.
    pub(crate) fn get_ea(&mut self) -> u16 {
        if self.wide() {
            self.get_ea16()
        }
        else {
            self.get_ea8() as u16
        }
    }

    pub(crate) fn set_ea8(&mut self, val: u8) {
        if self.cpu_mod == 3 {
            self.set_r8(self.cpu_rm, val);
        }
        else {
            self.biu_write_u8(self.ea_seg, self.ea_addr, val);
        }
    }

    pub(crate) fn set_ea16(&mut self, val: u16) {
        if self.cpu_mod == 3 {
            self.set_r16(self.cpu_rm, val);
        }
        else {
            self.biu_write_u16(self.ea_seg, self.ea_addr, val);
        }
    }

    pub(crate) fn set_ea(&mut self, val: u16) {
        if self.wide() {
            self.set_ea16(val);
        }
        else {
            self.set_ea8((val & 0xFF) as u8);
        }
    }

    /// Load alu_data from the decoded operand. memory_only operands
    /// (LES/LDS, far transfers) leave alu_data untouched for register
    /// encodings; their second word is fetched with read_ea2.
    pub(crate) fn read_ea(&mut self, memory_only: bool, wide: bool) {
        if self.cpu_mod != 3 {
            if wide {
                self.alu_data = self.biu_read_u16(self.ea_seg, self.ea_addr) as u32;
            }
            else {
                self.alu_data = self.biu_read_u8(self.ea_seg, self.ea_addr) as u32;
            }
            return;
        }
        if !memory_only {
            if wide {
                self.alu_data = self.get_r16(self.cpu_rm) as u32;
            }
            else {
                self.alu_data = self.get_r8(self.cpu_rm) as u32;
            }
        }
    }

    /// Fetch the second word of a doubleword memory operand. A far
    /// transfer decoded against a register operand has no second word;
    /// that is a core invariant violation, not a modeled condition.
    pub(crate) fn read_ea2(&mut self, wide: bool) {
        if self.cpu_mod == 3 {
            panic!(
                "{}",
                CpuError::FarOperandRegister(self.opcode, self.cs, self.instruction_ip)
            );
        }
        self.ea_addr = self.ea_addr.wrapping_add(2);
        if wide {
            self.alu_data = self.biu_read_u16(self.ea_seg, self.ea_addr) as u32;
        }
        else {
            self.alu_data = self.biu_read_u8(self.ea_seg, self.ea_addr) as u32;
        }
    }
}
