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

    cpu_808x::stack.rs

    Stack primitives and the shared control-transfer routines. Near call,
    far call, far return and interrupt entry all reuse this push/pop/flush
    choreography rather than each opcode rolling its own.

*/

use crate::cpu_808x::*;

impl Cpu {
    /// Charge the internal delay cycles that precede a bus access for the
    /// given microcode slot. Slots with embedded queue flushes model the
    /// control-transfer microcode lines.
    pub(crate) fn access(&mut self, slot: u8) {
        match slot {
            1 | 6 | 7 | 8 | 9 | 17 | 20 | 21 | 24 | 28 | 47 | 48 | 49 | 50 | 51 | 55 | 56 | 62 | 66 | 68 => {
                self.cycles(1)
            }
            3 | 11 | 15 | 22 | 23 | 25 | 26 | 35 | 44 | 45 | 46 | 52 | 53 | 54 => self.cycles(2),
            16 | 18 | 19 | 27 | 32 | 37 | 42 => self.cycles(3),
            10 | 12 | 13 | 14 | 29 | 30 | 33 | 34 | 39 | 41 | 60 => self.cycles(4),
            4 | 70 => self.cycles(5),
            31 | 38 | 40 => self.cycles(6),
            5 => {
                if self.opcode == 0xCC {
                    self.cycles(7)
                }
                else {
                    self.cycles(4)
                }
            }
            36 => {
                self.cycles(1);
                self.pfq_clear();
                self.cycles(1);
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
                self.cycles(3);
            }
            43 => {
                self.cycles(2);
                self.pfq_clear();
                self.cycles(1);
            }
            57 => {
                if self.cpu_mod != 3 {
                    self.cycles(2);
                }
                self.cycles(4);
            }
            58 => {
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
                self.cycles(4);
            }
            59 => {
                self.cycles(2);
                self.pfq_clear();
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
                self.cycles(3);
            }
            65 => {
                self.cycles(1);
                self.pfq_clear();
                self.cycles(2);
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
            }
            _ => {}
        }
    }

    /// Push a word. Stack writes always go through SS, overrides do not
    /// apply.
    pub(crate) fn push_u16(&mut self, val: u16) {
        self.sp = self.sp.wrapping_sub(2);
        self.ea_addr = self.sp;
        self.biu_write_u16(self.ss, self.ea_addr, val);
    }

    pub(crate) fn pop_u16(&mut self) -> u16 {
        self.ea_addr = self.sp;
        self.sp = self.sp.wrapping_add(2);
        self.biu_read_u16(self.ss, self.ea_addr)
    }

    // -- Control transfers -------------------------------------------------

    /// Relative jump: drop the queue, pay the transfer latency, load the
    /// target. Returns the old PC for the near-call path.
    pub(crate) fn jump(&mut self, delta: u16) -> u16 {
        self.pfq_clear();
        self.cycles(5);
        let old_ip = self.pc;
        self.set_ip(self.pc.wrapping_add(delta));
        old_ip
    }

    pub(crate) fn jump_short(&mut self, disp: u8) {
        self.jump(Cpu::sign_extend(disp));
    }

    pub(crate) fn jump_near(&mut self) -> u16 {
        let delta = self.q_read_u16();
        self.jump(delta)
    }

    /// RET in all four flavors: near/far, with and without a stack
    /// adjustment operand.
    pub(crate) fn ret_routine(&mut self) {
        let far = self.opcode & 0x08 != 0;
        let imm = self.opcode & 0x01 == 0;

        if (self.opcode & 0x09) != 0x01 {
            self.cycles(1);
        }
        let mut adjust = 0;
        if imm {
            adjust = self.q_read_u16();
            self.cycles(1);
        }
        if (self.opcode & 0x09) == 0x09 {
            self.cycles(1);
        }
        self.pfq_clear();
        self.access(26);
        let new_ip = self.pop_u16();
        self.cycles(2);
        let new_cs = if far {
            self.access(42);
            let cs = self.pop_u16();
            if !imm {
                self.cycles(1);
            }
            cs
        }
        else {
            self.cs
        };
        if imm {
            self.sp = self.sp.wrapping_add(adjust);
            self.cycles(1);
        }
        self.load_cs(new_cs);
        self.access(72);
        self.set_ip(new_ip);
    }
}
