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

    cpu_808x::step.rs

    The outer execution loop. The caller hands over a cycle budget;
    instructions run to completion, overshoot is carried as a deficit
    into the next call, and all partial state (open prefixes, a repeating
    string op, a halted core) survives between invocations.

*/

use crate::cpu_808x::{execute::OPCODE_TABLE, *};

impl Cpu {
    /// Run the core for at least `cycles` ticks. Execution stops at the
    /// first instruction boundary on or after the budget; the overshoot
    /// is deducted from the next call.
    pub fn run(&mut self, cycles: u32) {
        self.cycles_left += cycles as i64;

        while self.cycles_left > 0 {
            self.step();
        }
    }

    /// Execute one instruction (or one repetition of a repeating one).
    fn step(&mut self) {
        // In 8080 emulation mode the embedded core takes over; the
        // native decoder never sees the byte stream.
        if self.in_emulation_mode() {
            self.i8080_step();
            self.instruction_count += 1;
            self.check_interrupts();
            if self.noint {
                self.noint = false;
            }
            return;
        }

        if !self.repeating {
            self.instruction_ip = self.pc;
            self.opcode = self.q_read_u8();
            // LOCK is dropped one full instruction after its prefix.
            if self.clear_lock {
                self.in_lock = false;
                self.clear_lock = false;
            }
            self.cycles(1);
        }

        self.completed = true;
        OPCODE_TABLE[self.opcode as usize](self);

        if self.completed {
            self.repeating = false;
            self.ovr_seg = None;
            self.in_rep = RepMode::None;
            if self.in_lock {
                self.clear_lock = true;
            }
            self.instruction_count += 1;

            self.check_interrupts();
            if self.noint {
                self.noint = false;
            }
            self.alu_op = AluOp::Add;
        }
    }
}
