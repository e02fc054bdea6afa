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

    cpu_808x::emulation.rs

    The 8080 emulation mode driver. While the mode flag is clear, the
    step loop hands each instruction to this module instead of the
    native decoder: opcodes are fetched through CS, data through DS, IO
    through the normal accumulator path, and the documented 8080 cycle
    counts are charged as whole ticks, so prefetch and DMA refresh keep
    arbitrating underneath. Register state crosses the bridge only
    through the two sync routines.

*/

use crate::{cpu_808x::*, cpu_i8080::OPCODE_CYCLES};

impl Cpu {
    // -- Mode bridge register translation ---------------------------------

    /// Copy the native register file into the emulated one: A=AL, B=CH,
    /// C=CL, D=DH, E=DL, H=BH, L=BL, SP=BP, plus PC and the low flag
    /// byte. Run on BRKEM and when IRET pops a mode-clear flag image.
    pub(crate) fn sync_to_8080(&mut self) {
        self.i8080.a = self.a.l();
        self.i8080.h = self.b.h();
        self.i8080.l = self.b.l();
        self.i8080.b = self.c.h();
        self.i8080.c = self.c.l();
        self.i8080.d = self.d.h();
        self.i8080.e = self.d.l();
        self.i8080.sp = self.bp;
        self.i8080.pc = self.pc;

        self.i8080.iff = self.get_flag(Flag::Interrupt);
        self.i8080.sf = self.flags & CPU_FLAG_SIGN != 0;
        self.i8080.zf = self.flags & CPU_FLAG_ZERO != 0;
        self.i8080.hf = self.flags & CPU_FLAG_AUX_CARRY != 0;
        self.i8080.pf = self.flags & CPU_FLAG_PARITY != 0;
        self.i8080.cf = self.flags & CPU_FLAG_CARRY != 0;

        self.i8080.interrupt_delay = self.noint as u8;
    }

    /// The inverse translation, run on RETEM, CALLN and any interrupt
    /// taken mid-emulation.
    pub(crate) fn sync_from_8080(&mut self) {
        self.a.set_l(self.i8080.a);
        self.b.set_h(self.i8080.h);
        self.b.set_l(self.i8080.l);
        self.c.set_h(self.i8080.b);
        self.c.set_l(self.i8080.c);
        self.d.set_h(self.i8080.d);
        self.d.set_l(self.i8080.e);
        self.bp = self.i8080.sp;
        self.pc = self.i8080.pc;

        self.flags &= 0xFF00;
        self.flags |= (self.i8080.sf as u16) << 7;
        self.flags |= (self.i8080.zf as u16) << 6;
        self.flags |= (self.i8080.hf as u16) << 4;
        self.flags |= (self.i8080.pf as u16) << 2;
        self.flags |= CPU_FLAG_RESERVED1;
        self.flags |= self.i8080.cf as u16;
        let iff = self.i8080.iff;
        self.set_if(iff);
    }

    // -- Bus plumbing -----------------------------------------------------

    /// 8080 instruction fetches address through CS, like the native
    /// queue pointer would.
    fn i8080_fetch_u8(&mut self) -> u8 {
        let pc = self.i8080.pc;
        self.i8080.pc = pc.wrapping_add(1);
        self.biu_read_u8(self.cs, pc)
    }

    fn i8080_fetch_u16(&mut self) -> u16 {
        let lo = self.i8080_fetch_u8() as u16;
        let hi = self.i8080_fetch_u8() as u16;
        hi << 8 | lo
    }

    /// Data accesses go through DS, one byte cycle at a time; the 8080
    /// side of the part has no word bus.
    fn i8080_rb(&mut self, addr: u16) -> u8 {
        self.biu_read_u8(self.ds, addr)
    }

    fn i8080_wb(&mut self, addr: u16, val: u8) {
        self.biu_write_u8(self.ds, addr, val);
    }

    fn i8080_rw(&mut self, addr: u16) -> u16 {
        let lo = self.i8080_rb(addr) as u16;
        let hi = self.i8080_rb(addr.wrapping_add(1)) as u16;
        hi << 8 | lo
    }

    fn i8080_ww(&mut self, addr: u16, val: u16) {
        self.i8080_wb(addr, (val & 0xFF) as u8);
        self.i8080_wb(addr.wrapping_add(1), (val >> 8) as u8);
    }

    fn i8080_push(&mut self, val: u16) {
        self.i8080.sp = self.i8080.sp.wrapping_sub(2);
        let sp = self.i8080.sp;
        self.i8080_ww(sp, val);
    }

    fn i8080_pop(&mut self) -> u16 {
        let sp = self.i8080.sp;
        self.i8080.sp = sp.wrapping_add(2);
        self.i8080_rw(sp)
    }

    // -- Control flow helpers ---------------------------------------------

    fn i8080_call(&mut self, addr: u16) {
        let pc = self.i8080.pc;
        self.i8080_push(pc);
        self.i8080.pc = addr;
    }

    fn i8080_cond_jmp(&mut self, cond: bool) {
        let addr = self.i8080_fetch_u16();
        if cond {
            self.i8080.pc = addr;
        }
    }

    fn i8080_cond_call(&mut self, cond: bool) {
        let addr = self.i8080_fetch_u16();
        if cond {
            self.i8080_call(addr);
            self.i8080.cyc += 6;
        }
    }

    fn i8080_cond_ret(&mut self, cond: bool) {
        if cond {
            self.i8080.pc = self.i8080_pop();
            self.i8080.cyc += 6;
        }
    }

    /// Register operand by encoding: B C D E H L M A, where M is the
    /// byte at [HL].
    fn i8080_get_reg(&mut self, code: u8) -> u8 {
        match code & 0x07 {
            0 => self.i8080.b,
            1 => self.i8080.c,
            2 => self.i8080.d,
            3 => self.i8080.e,
            4 => self.i8080.h,
            5 => self.i8080.l,
            6 => {
                let hl = self.i8080.hl();
                self.i8080_rb(hl)
            }
            _ => self.i8080.a,
        }
    }

    fn i8080_set_reg(&mut self, code: u8, val: u8) {
        match code & 0x07 {
            0 => self.i8080.b = val,
            1 => self.i8080.c = val,
            2 => self.i8080.d = val,
            3 => self.i8080.e = val,
            4 => self.i8080.h = val,
            5 => self.i8080.l = val,
            6 => {
                let hl = self.i8080.hl();
                self.i8080_wb(hl, val);
            }
            _ => self.i8080.a = val,
        }
    }

    // -- Stepping ---------------------------------------------------------

    /// One emulated instruction. Cycle charging happens after execution
    /// so conditional penalties accrued along the way are included.
    pub(crate) fn i8080_step(&mut self) {
        if self.i8080.halted {
            self.cycles(1);
            return;
        }

        let opcode = self.i8080_fetch_u8();
        self.i8080_execute(opcode);

        let cyc = self.i8080.cyc;
        self.i8080.cyc = 0;
        self.cycles(cyc);

        // RETEM and CALLN leave emulation mode mid-step; the native
        // flag image must not be clobbered with the 8080's in that case.
        if self.in_emulation_mode() {
            let iff = self.i8080.iff;
            self.set_if(iff);
            self.noint = self.i8080.interrupt_delay > 0;
        }
    }

    fn i8080_execute(&mut self, opcode: u8) {
        self.i8080.cyc += OPCODE_CYCLES[opcode as usize] as u32;

        if self.i8080.interrupt_delay > 0 {
            self.i8080.interrupt_delay -= 1;
        }

        match opcode {
            0x76 => self.i8080.halted = true, // HLT

            // MOV dst, src
            0x40..=0x7F => {
                let val = self.i8080_get_reg(opcode);
                self.i8080_set_reg(opcode >> 3, val);
            }

            // ADD/ADC/SUB/SBB/ANA/XRA/ORA/CMP r
            0x80..=0xBF => {
                let val = self.i8080_get_reg(opcode);
                self.i8080.alu(opcode >> 3, val);
            }

            // -- Quadrant 0: moves, pairs, adjusts ------------------------
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => {} // NOPs

            0x01 => {
                let val = self.i8080_fetch_u16();
                self.i8080.set_bc(val); // LXI B
            }
            0x11 => {
                let val = self.i8080_fetch_u16();
                self.i8080.set_de(val); // LXI D
            }
            0x21 => {
                let val = self.i8080_fetch_u16();
                self.i8080.set_hl(val); // LXI H
            }
            0x31 => self.i8080.sp = self.i8080_fetch_u16(), // LXI SP

            0x02 => {
                let bc = self.i8080.bc();
                let a = self.i8080.a;
                self.i8080_wb(bc, a); // STAX B
            }
            0x12 => {
                let de = self.i8080.de();
                let a = self.i8080.a;
                self.i8080_wb(de, a); // STAX D
            }
            0x22 => {
                let addr = self.i8080_fetch_u16();
                let hl = self.i8080.hl();
                self.i8080_ww(addr, hl); // SHLD
            }
            0x32 => {
                let addr = self.i8080_fetch_u16();
                let a = self.i8080.a;
                self.i8080_wb(addr, a); // STA
            }

            0x0A => {
                let bc = self.i8080.bc();
                self.i8080.a = self.i8080_rb(bc); // LDAX B
            }
            0x1A => {
                let de = self.i8080.de();
                self.i8080.a = self.i8080_rb(de); // LDAX D
            }
            0x2A => {
                let addr = self.i8080_fetch_u16();
                let val = self.i8080_rw(addr);
                self.i8080.set_hl(val); // LHLD
            }
            0x3A => {
                let addr = self.i8080_fetch_u16();
                self.i8080.a = self.i8080_rb(addr); // LDA
            }

            0x03 => {
                let val = self.i8080.bc().wrapping_add(1);
                self.i8080.set_bc(val); // INX B
            }
            0x13 => {
                let val = self.i8080.de().wrapping_add(1);
                self.i8080.set_de(val); // INX D
            }
            0x23 => {
                let val = self.i8080.hl().wrapping_add(1);
                self.i8080.set_hl(val); // INX H
            }
            0x33 => self.i8080.sp = self.i8080.sp.wrapping_add(1), // INX SP

            0x0B => {
                let val = self.i8080.bc().wrapping_sub(1);
                self.i8080.set_bc(val); // DCX B
            }
            0x1B => {
                let val = self.i8080.de().wrapping_sub(1);
                self.i8080.set_de(val); // DCX D
            }
            0x2B => {
                let val = self.i8080.hl().wrapping_sub(1);
                self.i8080.set_hl(val); // DCX H
            }
            0x3B => self.i8080.sp = self.i8080.sp.wrapping_sub(1), // DCX SP

            // INR / DCR / MVI through the register encoding (M included)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let val = self.i8080_get_reg(opcode >> 3);
                let result = self.i8080.inr(val);
                self.i8080_set_reg(opcode >> 3, result);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let val = self.i8080_get_reg(opcode >> 3);
                let result = self.i8080.dcr(val);
                self.i8080_set_reg(opcode >> 3, result);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let val = self.i8080_fetch_u8();
                self.i8080_set_reg(opcode >> 3, val);
            }

            0x09 => {
                let bc = self.i8080.bc();
                self.i8080.dad(bc); // DAD B
            }
            0x19 => {
                let de = self.i8080.de();
                self.i8080.dad(de); // DAD D
            }
            0x29 => {
                let hl = self.i8080.hl();
                self.i8080.dad(hl); // DAD H
            }
            0x39 => {
                let sp = self.i8080.sp;
                self.i8080.dad(sp); // DAD SP
            }

            0x07 => self.i8080.rlc(),
            0x0F => self.i8080.rrc(),
            0x17 => self.i8080.ral(),
            0x1F => self.i8080.rar(),
            0x27 => self.i8080.daa(),
            0x2F => self.i8080.a = !self.i8080.a, // CMA
            0x37 => self.i8080.cf = true,         // STC
            0x3F => self.i8080.cf = !self.i8080.cf, // CMC

            // -- Quadrant 3: stack, transfers, IO -------------------------
            0xC9 | 0xD9 => self.i8080.pc = self.i8080_pop(), // RET (D9 alias)
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                let cond = self.i8080.condition(opcode >> 3);
                self.i8080_cond_ret(cond);
            }

            0xC3 | 0xCB => {
                self.i8080.pc = self.i8080_fetch_u16(); // JMP (CB alias)
            }
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let cond = self.i8080.condition(opcode >> 3);
                self.i8080_cond_jmp(cond);
            }

            0xCD => {
                let addr = self.i8080_fetch_u16();
                self.i8080_call(addr); // CALL
            }
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let cond = self.i8080.condition(opcode >> 3);
                self.i8080_cond_call(cond);
            }

            // RST n
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.i8080_call((opcode & 0x38) as u16);
            }

            0xC5 => {
                let val = self.i8080.bc();
                self.i8080_push(val); // PUSH B
            }
            0xD5 => {
                let val = self.i8080.de();
                self.i8080_push(val); // PUSH D
            }
            0xE5 => {
                let val = self.i8080.hl();
                self.i8080_push(val); // PUSH H
            }
            0xF5 => {
                let val = (self.i8080.a as u16) << 8 | self.i8080.psw() as u16;
                self.i8080_push(val); // PUSH PSW
            }
            0xC1 => {
                let val = self.i8080_pop();
                self.i8080.set_bc(val); // POP B
            }
            0xD1 => {
                let val = self.i8080_pop();
                self.i8080.set_de(val); // POP D
            }
            0xE1 => {
                let val = self.i8080_pop();
                self.i8080.set_hl(val); // POP H
            }
            0xF1 => {
                let val = self.i8080_pop();
                self.i8080.a = (val >> 8) as u8;
                self.i8080.set_psw((val & 0xFF) as u8); // POP PSW
            }

            // ADI/ACI/SUI/SBI/ANI/XRI/ORI/CPI
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let val = self.i8080_fetch_u8();
                self.i8080.alu(opcode >> 3, val);
            }

            0xE3 => {
                // XTHL
                let sp = self.i8080.sp;
                let val = self.i8080_rw(sp);
                let hl = self.i8080.hl();
                self.i8080_ww(sp, hl);
                self.i8080.set_hl(val);
            }
            0xE9 => self.i8080.pc = self.i8080.hl(), // PCHL
            0xEB => {
                // XCHG
                let de = self.i8080.de();
                let hl = self.i8080.hl();
                self.i8080.set_de(hl);
                self.i8080.set_hl(de);
            }
            0xF9 => self.i8080.sp = self.i8080.hl(), // SPHL

            0xF3 => self.i8080.iff = false, // DI
            0xFB => {
                self.i8080.iff = true;
                self.i8080.interrupt_delay = 1; // EI
            }

            0xDB => {
                // IN port: through the normal accumulator IO path.
                let port = self.i8080_fetch_u8() as u16;
                self.cpu_io(8, false, port);
                self.i8080.a = self.a.l();
            }
            0xD3 => {
                // OUT port
                let port = self.i8080_fetch_u8() as u16;
                let a = self.i8080.a;
                self.a.set_l(a);
                self.cycles(1);
                self.cpu_io(8, true, port);
            }

            0xED => {
                // The V20 repurposes this undocumented CALL alias as the
                // escape back to native execution.
                let data = self.i8080_fetch_u8();
                match data {
                    0xED => {
                        // CALLN imm8
                        let vector = self.i8080_fetch_u8();
                        self.op_calln(vector);
                    }
                    0xFD => self.op_retem(),
                    _ => {
                        let hi = self.i8080_fetch_u8() as u16;
                        self.i8080_call(hi << 8 | data as u16);
                    }
                }
            }
            0xDD | 0xFD => {
                // undocumented CALL
                let addr = self.i8080_fetch_u16();
                self.i8080_call(addr);
            }

            _ => {}
        }
    }

    // -- Bridge exits -----------------------------------------------------

    /// CALLN (ED ED nn): invoke a native interrupt service routine from
    /// 8080 code. The interrupt frame captures the emulated register
    /// file and sets the mode flag; the matching IRET pops a mode-clear
    /// image and drops back into emulation.
    fn op_calln(&mut self, vector: u8) {
        log::debug!("CALLN {:02X} from emulation mode", vector);
        self.biu_fetch_suspend();
        self.cycles(2);
        self.intr_routine(vector);
    }

    /// RETEM (ED FD): leave emulation mode for good through the far
    /// return choreography, popping the flag image BRKEM pushed (mode
    /// flag set).
    fn op_retem(&mut self) {
        log::debug!("RETEM: leaving 8080 emulation mode");
        self.sync_from_8080();
        self.cycles(1);

        self.pfq_clear();
        self.access(26);
        let new_ip = self.pop_u16();
        self.cycles(2);
        self.access(42);
        let new_cs = self.pop_u16();
        self.cycles(1);
        self.load_cs(new_cs);
        self.access(72);
        self.set_ip(new_ip);

        self.access(45);
        let flags = self.pop_u16();
        self.set_flags(flags);
        self.cycles(1);

        self.noint = true;
        self.nmi_enable = true;
        self.i8080.iff = self.get_flag(Flag::Interrupt);
    }
}
