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

    cpu_808x::interrupt.rs

    Interrupt sequencing: trap, NMI, PIC-acknowledged IRQ and software
    interrupts all funnel through one frame routine (suspend fetch, push
    flags/CS/IP, read the vector, transfer, flush). Also home to the V20
    mode bridge: BRKEM enters 8080 emulation through the same frame with
    the mode flag cleared, and IRET drops back into emulation when it
    pops a flag image with the mode flag clear.

*/

use crate::cpu_808x::*;

impl Cpu {
    /// True when something is waiting at the next instruction boundary.
    /// Priority is resolved in check_interrupts; this is just the gate.
    pub(crate) fn irq_pending(&self) -> bool {
        (self.nmi_latch && self.nmi_enable)
            || (self.get_flag(Flag::Trap) && !self.noint)
            || (self.get_flag(Flag::Interrupt) && self.intr && !self.noint)
    }

    /// Boundary interrupt check. Order per tick: single-step trap, NMI,
    /// then maskable IRQ through the two-cycle PIC acknowledge.
    pub(crate) fn check_interrupts(&mut self) {
        if !self.irq_pending() {
            return;
        }

        if self.get_flag(Flag::Trap) && !self.noint {
            log::debug!("single-step trap at {:04X}:{:04X}", self.cs, self.pc);
            self.intr_routine(1);
            return;
        }

        if self.nmi_latch && self.nmi_enable {
            // NMI re-arms only when IRET executes.
            self.nmi_enable = false;
            self.nmi_latch = false;
            log::debug!("NMI taken at {:04X}:{:04X}", self.cs, self.pc);
            match self.custom_nmi_vector {
                Some(vector) => self.custom_nmi(vector),
                None => self.intr_routine(2),
            }
            return;
        }

        if self.get_flag(Flag::Interrupt) && self.intr && !self.noint {
            self.repeating = false;
            self.completed = true;
            self.ovr_seg = None;

            // Two INTA bus cycles: the first freezes the PIC's request
            // state, the second returns the vector number.
            self.cycles(3);
            self.biu_inta();
            self.cycles(1);
            let vector = self.biu_inta();
            self.cycles(1);
            self.in_lock = false;
            self.clear_lock = false;
            self.cycles(4);
            log::debug!("IRQ vector {:02X} acknowledged", vector);
            self.intr_routine(vector);
        }
    }

    /// The shared interrupt frame. In order: fetch-suspend and queue
    /// drop, flags push, flag mutation (mask I/T, or clear the mode flag
    /// for BRKEM), CS push, IP push, vector table read, transfer and
    /// queue flush to the target. A custom target overrides the fetched
    /// vector; the table slot is still read on the bus.
    fn intr_frame(&mut self, vector: u8, brkem: bool, custom: Option<u32>) {
        // An interrupt taken while the V20 runs 8080 code re-enters
        // native mode; capture the emulated register file first.
        if self.in_emulation_mode() {
            self.sync_from_8080();
            self.i8080.halted = false;
        }
        self.halted = false;

        self.pfq_clear();
        self.ovr_seg = None;
        self.cycles(2);

        let flags = self.flags_word();
        self.access(39);
        self.push_u16(flags);
        if brkem {
            self.clear_flag(Flag::Mode);
        }
        else {
            self.clear_flag(Flag::Trap);
            self.clear_flag(Flag::Interrupt);
            if self.cpu_type.is_nec() {
                // Vector routines always execute native.
                self.set_flag(Flag::Mode);
            }
        }

        self.access(40);
        let old_cs = self.cs;
        self.push_u16(old_cs);
        self.access(41);
        let old_ip = self.pc;
        self.push_u16(old_ip);

        let addr = (vector as u16) << 2;
        self.access(5);
        let mut new_ip = self.biu_read_u16(0, addr);
        self.cycles(1);
        let mut new_cs = self.biu_read_u16(0, addr.wrapping_add(2));

        if let Some(target) = custom {
            new_ip = (target & 0xFFFF) as u16;
            new_cs = (target >> 16) as u16;
        }

        self.load_cs(new_cs);
        self.access(68);
        self.set_ip(new_ip);
    }

    /// Dispatch an interrupt through the vector table.
    pub(crate) fn intr_routine(&mut self, vector: u8) {
        self.intr_frame(vector, false, None);
    }

    /// NMI routed through a fixed address instead of IVT slot 2.
    fn custom_nmi(&mut self, vector: u32) {
        self.intr_frame(2, false, Some(vector));
    }

    // -- Software interrupt opcodes ---------------------------------------

    /// CC: INT3.
    pub(crate) fn op_int3(&mut self) {
        self.intr_routine(3);
    }

    /// CD: INT imm8.
    pub(crate) fn op_int(&mut self) {
        self.cycles(1);
        let vector = self.q_read_u8();
        self.intr_routine(vector);
    }

    /// CE: INTO.
    pub(crate) fn op_into(&mut self) {
        self.cycles(3);
        if self.get_flag(Flag::Overflow) {
            self.cycles(2);
            self.intr_routine(4);
        }
    }

    /// CF: IRET. Exactly inverts the frame pushes and restores flags
    /// with the reserved bit forced set. Re-enables NMI and suppresses
    /// interrupt delivery for one instruction.
    pub(crate) fn op_iret(&mut self) {
        self.access(43);
        let new_ip = self.pop_u16();
        self.cycles(3);
        self.access(44);
        let new_cs = self.pop_u16();
        self.load_cs(new_cs);
        self.access(62);
        self.set_ip(new_ip);
        self.access(45);
        let flags = self.pop_u16();
        self.set_flags(flags);
        self.cycles(5);
        self.noint = true;
        self.nmi_enable = true;

        // Popping a flag image with the mode flag clear is the return
        // path from CALLN and from interrupts taken mid-emulation.
        if self.in_emulation_mode() {
            log::debug!("IRET into 8080 emulation mode");
            self.sync_to_8080();
        }
    }

    // -- V20 extended opcodes ---------------------------------------------

    /// 0F: POP CS on the Intel parts; extension prefix on the V20, of
    /// which only BRKEM reaches outside the native instruction set. The
    /// remaining encodings are modeled as benign undefined opcodes.
    pub(crate) fn op_0f(&mut self) {
        if !self.cpu_type.is_nec() {
            // POP CS. The queue contents are dropped but the fetch
            // pointer is not rewound, faithful to the broken original.
            self.access(22);
            let seg = self.pop_u16();
            self.load_cs(seg);
            self.queue.flush();
            self.cycles(1);
            self.noint = true;
            return;
        }

        let ext = self.q_read_u8();
        match ext {
            0xFF => {
                // BRKEM imm8: vector into 8080 emulation mode.
                self.cycles(1);
                let vector = self.q_read_u8();
                self.interrupt_brkem(vector);
            }
            _ => {
                log::warn!("undefined extended opcode 0F {:02X} at {:04X}:{:04X}", ext, self.cs, self.instruction_ip);
                self.cycles(UNDEFINED_OPCODE_PENALTY);
            }
        }
    }

    /// BRKEM: the standard interrupt frame with the mode flag cleared
    /// instead of I/T masked, then hand the register file to the 8080.
    fn interrupt_brkem(&mut self, vector: u8) {
        log::debug!("BRKEM {:02X}: entering 8080 emulation mode", vector);
        self.intr_frame(vector, true, None);
        self.sync_to_8080();
    }
}
