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

    cpu_i8080::mod.rs

    Register file, flags and the pure arithmetic of the embedded 8080
    core the V20 switches to in emulation mode. Everything that touches
    the bus (instruction fetch, M-operand access, stack traffic, port IO)
    lives on the CPU side in cpu_808x::emulation, which drives this state
    one instruction at a time and charges the documented cycle counts.

*/

/// Base cycle count per opcode. Conditional CALL/RET add 6 more when
/// the condition is met.
#[rustfmt::skip]
pub const OPCODE_CYCLES: [u8; 256] = [
//  0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    4, 10,  7,  5,  5,  5,  7,  4,  4, 10,  7,  5,  5,  5,  7,  4, // 0
    4, 10,  7,  5,  5,  5,  7,  4,  4, 10,  7,  5,  5,  5,  7,  4, // 1
    4, 10, 16,  5,  5,  5,  7,  4,  4, 10, 16,  5,  5,  5,  7,  4, // 2
    4, 10, 13,  5, 10, 10, 10,  4,  4, 10, 13,  5,  5,  5,  7,  4, // 3
    5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 4
    5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 5
    5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 6
    7,  7,  7,  7,  7,  7,  7,  7,  5,  5,  5,  5,  5,  5,  7,  5, // 7
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 8
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 9
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // A
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // B
    5, 10, 10, 10, 11, 11,  7, 11,  5, 10, 10, 10, 11, 17,  7, 11, // C
    5, 10, 10, 10, 11, 11,  7, 11,  5, 10, 10, 10, 11, 17,  7, 11, // D
    5, 10, 10, 18, 11, 11,  7, 11,  5,  5, 10,  4, 11, 17,  7, 11, // E
    5, 10, 10,  4, 11, 11,  7, 11,  5,  5, 10,  4, 11, 17,  7, 11, // F
];

/// The emulated processor's architectural state. The register file maps
/// onto the native one (A=AL, BC=CX, DE=DX, HL=BX, SP=BP) through the
/// sync routines run at every mode transition.
#[derive(Clone, Debug, Default)]
pub struct Intel8080 {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,

    pub sf: bool,
    pub zf: bool,
    pub hf: bool,
    pub pf: bool,
    pub cf: bool,
    pub iff: bool,

    pub halted: bool,
    /// EI enables interrupts only after the following instruction.
    pub interrupt_delay: u8,
    /// Cycles accrued by the instruction in flight, drained into the
    /// shared tick counter by the driver.
    pub cyc: u32,
}

#[inline]
fn parity(val: u8) -> bool {
    val.count_ones() % 2 == 0
}

/// Carry out of the given bit position for a + b + cy.
#[inline]
fn carry(bit_no: u32, a: u8, b: u8, cy: bool) -> bool {
    let result = a as u16 + b as u16 + cy as u16;
    let carry = result ^ a as u16 ^ b as u16;
    carry & (1 << bit_no) != 0
}

impl Intel8080 {
    // -- Register pairs ---------------------------------------------------

    #[inline]
    pub fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[inline]
    pub fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    #[inline]
    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = (val & 0xFF) as u8;
    }

    #[inline]
    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = (val & 0xFF) as u8;
    }

    #[inline]
    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = (val & 0xFF) as u8;
    }

    // -- Flags ------------------------------------------------------------

    pub fn set_zsp(&mut self, val: u8) {
        self.zf = val == 0;
        self.sf = val & 0x80 != 0;
        self.pf = parity(val);
    }

    /// The A/flags image pushed by PUSH PSW. Bits 3 and 5 read zero,
    /// bit 1 reads one.
    pub fn psw(&self) -> u8 {
        (self.sf as u8) << 7
            | (self.zf as u8) << 6
            | (self.hf as u8) << 4
            | (self.pf as u8) << 2
            | 1 << 1
            | self.cf as u8
    }

    pub fn set_psw(&mut self, psw: u8) {
        self.sf = psw & 0x80 != 0;
        self.zf = psw & 0x40 != 0;
        self.hf = psw & 0x10 != 0;
        self.pf = psw & 0x04 != 0;
        self.cf = psw & 0x01 != 0;
    }

    /// Condition codes in encoding order: NZ, Z, NC, C, PO, PE, P, M.
    pub fn condition(&self, idx: u8) -> bool {
        match idx & 0x07 {
            0 => !self.zf,
            1 => self.zf,
            2 => !self.cf,
            3 => self.cf,
            4 => !self.pf,
            5 => self.pf,
            6 => !self.sf,
            _ => self.sf,
        }
    }

    // -- Arithmetic and logic ---------------------------------------------

    pub fn add(&mut self, val: u8, cy: bool) {
        let result = self.a.wrapping_add(val).wrapping_add(cy as u8);
        self.cf = carry(8, self.a, val, cy);
        self.hf = carry(4, self.a, val, cy);
        self.set_zsp(result);
        self.a = result;
    }

    /// Subtraction as addition of the complement; the borrow comes out
    /// inverted.
    pub fn sub(&mut self, val: u8, cy: bool) {
        self.add(!val, !cy);
        self.cf = !self.cf;
    }

    /// DAD: 16-bit add into HL, carry only.
    pub fn dad(&mut self, val: u16) {
        self.cf = (self.hl() as u32 + val as u32) > 0xFFFF;
        let sum = self.hl().wrapping_add(val);
        self.set_hl(sum);
    }

    pub fn inr(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        self.hf = result & 0x0F == 0;
        self.set_zsp(result);
        result
    }

    pub fn dcr(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        self.hf = result & 0x0F != 0x0F;
        self.set_zsp(result);
        result
    }

    pub fn ana(&mut self, val: u8) {
        let result = self.a & val;
        self.cf = false;
        self.hf = (self.a | val) & 0x08 != 0;
        self.set_zsp(result);
        self.a = result;
    }

    pub fn xra(&mut self, val: u8) {
        self.a ^= val;
        self.cf = false;
        self.hf = false;
        self.set_zsp(self.a);
    }

    pub fn ora(&mut self, val: u8) {
        self.a |= val;
        self.cf = false;
        self.hf = false;
        self.set_zsp(self.a);
    }

    pub fn cmp(&mut self, val: u8) {
        let result = (self.a as i16).wrapping_sub(val as i16);
        self.cf = (result >> 8) & 1 != 0;
        self.hf = !(self.a as i16 ^ result ^ val as i16) & 0x10 != 0;
        self.set_zsp((result & 0xFF) as u8);
    }

    /// Dispatch one of the eight accumulator operations in encoding
    /// order: ADD, ADC, SUB, SBB, ANA, XRA, ORA, CMP.
    pub fn alu(&mut self, op: u8, val: u8) {
        match op & 0x07 {
            0 => self.add(val, false),
            1 => {
                let cy = self.cf;
                self.add(val, cy);
            }
            2 => self.sub(val, false),
            3 => {
                let cy = self.cf;
                self.sub(val, cy);
            }
            4 => self.ana(val),
            5 => self.xra(val),
            6 => self.ora(val),
            _ => self.cmp(val),
        }
    }

    // -- Rotates ----------------------------------------------------------

    pub fn rlc(&mut self) {
        self.cf = self.a & 0x80 != 0;
        self.a = self.a << 1 | self.cf as u8;
    }

    pub fn rrc(&mut self) {
        self.cf = self.a & 0x01 != 0;
        self.a = self.a >> 1 | (self.cf as u8) << 7;
    }

    pub fn ral(&mut self) {
        let cy = self.cf;
        self.cf = self.a & 0x80 != 0;
        self.a = self.a << 1 | cy as u8;
    }

    pub fn rar(&mut self) {
        let cy = self.cf;
        self.cf = self.a & 0x01 != 0;
        self.a = self.a >> 1 | (cy as u8) << 7;
    }

    /// DAA: adjust A to packed BCD after an addition.
    pub fn daa(&mut self) {
        let mut cy = self.cf;
        let mut correction: u8 = 0;

        let lsb = self.a & 0x0F;
        let msb = self.a >> 4;

        if self.hf || lsb > 9 {
            correction += 0x06;
        }
        if self.cf || msb > 9 || (msb >= 9 && lsb > 9) {
            correction += 0x60;
            cy = true;
        }

        self.add(correction, false);
        self.cf = cy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_borrow_inverts_carry() {
        let mut c = Intel8080::default();
        c.a = 0x10;
        c.sub(0x20, false);
        assert_eq!(c.a, 0xF0);
        assert!(c.cf);
        assert!(c.sf);

        c.a = 0x20;
        c.sub(0x10, false);
        assert_eq!(c.a, 0x10);
        assert!(!c.cf);
    }

    #[test]
    fn daa_packs_bcd() {
        let mut c = Intel8080::default();
        c.a = 0x2B;
        c.daa();
        assert_eq!(c.a, 0x31);
    }

    #[test]
    fn psw_round_trip_forces_fixed_bits() {
        let mut c = Intel8080::default();
        c.set_psw(0xFF);
        assert!(c.sf && c.zf && c.hf && c.pf && c.cf);
        assert_eq!(c.psw(), 0xD7);
    }

    #[test]
    fn condition_encoding_order() {
        let mut c = Intel8080::default();
        c.zf = true;
        c.cf = false;
        assert!(!c.condition(0)); // NZ
        assert!(c.condition(1)); // Z
        assert!(c.condition(2)); // NC
        assert!(!c.condition(3)); // C
    }
}
