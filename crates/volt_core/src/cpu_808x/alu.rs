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

    cpu_808x::alu.rs

    The staged ALU. Operands are loaded into alu_dest/alu_src, the
    operation runs via alu_op(), and the result lands in alu_data with
    the flags computed the way the silicon computes them. ADC and SBB
    pre-adjust the source by the carry and then share the ADD/SUB path.

*/

use crate::cpu_808x::*;

impl Cpu {
    #[inline]
    pub(crate) fn top_bit(w: u32, bits: u32) -> bool {
        w & (1 << (bits - 1)) != 0
    }

    #[inline]
    pub(crate) fn set_cf(&mut self, state: bool) {
        self.set_flag_state(Flag::Carry, state);
    }

    #[inline]
    pub(crate) fn set_of(&mut self, state: bool) {
        self.set_flag_state(Flag::Overflow, state);
    }

    #[inline]
    pub(crate) fn set_af(&mut self, state: bool) {
        self.set_flag_state(Flag::AuxCarry, state);
    }

    #[inline]
    pub(crate) fn set_if(&mut self, state: bool) {
        self.set_flag_state(Flag::Interrupt, state);
    }

    #[inline]
    pub(crate) fn set_df(&mut self, state: bool) {
        self.set_flag_state(Flag::Direction, state);
    }

    pub(crate) fn set_pf(&mut self) {
        self.set_flag_state(Flag::Parity, PARITY_TABLE[(self.alu_data & 0xFF) as usize]);
    }

    pub(crate) fn set_sf(&mut self, bits: u32) {
        self.set_flag_state(Flag::Sign, Cpu::top_bit(self.alu_data, bits));
    }

    pub(crate) fn set_zf_ex(&mut self, state: bool) {
        self.set_flag_state(Flag::Zero, state);
    }

    fn set_zf(&mut self, bits: u32) {
        let size_mask = (1u32 << bits) - 1;
        self.set_zf_ex(self.alu_data & size_mask == 0);
    }

    pub(crate) fn set_pzs(&mut self, bits: u32) {
        self.set_pf();
        self.set_zf(bits);
        self.set_sf(bits);
    }

    /// Overflow from addition: carry into the sign bit differs from carry
    /// out of it, detected by operand-sign analysis.
    pub(crate) fn set_of_add(&mut self, bits: u32) {
        let of = (self.alu_data ^ self.alu_src) & (self.alu_data ^ self.alu_dest);
        self.set_of(Cpu::top_bit(of, bits));
    }

    pub(crate) fn set_of_sub(&mut self, bits: u32) {
        let of = (self.alu_dest ^ self.alu_src) & (self.alu_data ^ self.alu_dest);
        self.set_of(Cpu::top_bit(of, bits));
    }

    /// Auxiliary carry: carry out of the low nibble.
    pub(crate) fn do_af(&mut self) {
        self.set_af((self.alu_data ^ self.alu_src ^ self.alu_dest) & 0x10 != 0);
    }

    pub(crate) fn set_apzs(&mut self, bits: u32) {
        self.set_pzs(bits);
        self.do_af();
    }

    pub(crate) fn alu_add(&mut self, bits: u32) {
        let size_mask = (1u32 << bits) - 1;

        self.alu_data = self.alu_dest.wrapping_add(self.alu_src);
        self.set_apzs(bits);
        self.set_of_add(bits);

        // Anything + FF with carry in is anything + 0x100: the value is
        // unchanged but the carry stays on.
        if self.alu_op == AluOp::Adc && (self.alu_src & size_mask) == 0 && self.get_flag(Flag::Carry) {
            self.set_flag(Flag::Carry);
        }
        else {
            self.set_cf((self.alu_src & size_mask) > (self.alu_data & size_mask));
        }
    }

    pub(crate) fn alu_sub(&mut self, bits: u32) {
        let size_mask = (1u32 << bits) - 1;

        self.alu_data = self.alu_dest.wrapping_sub(self.alu_src);
        self.set_apzs(bits);
        self.set_of_sub(bits);

        if self.alu_op == AluOp::Sbb && (self.alu_src & size_mask) == 0 && self.get_flag(Flag::Carry) {
            self.set_flag(Flag::Carry);
        }
        else {
            self.set_cf((self.alu_src & size_mask) > (self.alu_dest & size_mask));
        }
    }

    /// Logical result: carry, overflow and aux all clear, PZS from the
    /// result.
    pub(crate) fn alu_bitwise(&mut self, bits: u32, data: u32) {
        self.alu_data = data;
        self.flags &= !(CPU_FLAG_CARRY | CPU_FLAG_AUX_CARRY | CPU_FLAG_OVERFLOW);
        self.set_pzs(bits);
    }

    pub(crate) fn alu_test(&mut self, bits: u32, dest: u32, src: u32) {
        self.alu_dest = dest;
        self.alu_src = src;
        self.alu_bitwise(bits, dest & src);
    }

    /// Dispatch the staged operation. CMP shares the SUB path; the caller
    /// is responsible for not writing alu_data back.
    pub(crate) fn alu_do_op(&mut self, bits: u32) {
        match self.alu_op {
            AluOp::Or => {
                let data = self.alu_dest | self.alu_src;
                self.alu_bitwise(bits, data);
            }
            AluOp::Adc => {
                if self.get_flag(Flag::Carry) {
                    self.alu_src = self.alu_src.wrapping_add(1);
                }
                self.alu_add(bits);
            }
            AluOp::Add => {
                self.alu_add(bits);
            }
            AluOp::Sbb => {
                if self.get_flag(Flag::Carry) {
                    self.alu_src = self.alu_src.wrapping_add(1);
                }
                self.alu_sub(bits);
            }
            AluOp::Sub | AluOp::Cmp => {
                self.alu_sub(bits);
            }
            AluOp::And => {
                self.alu_test(bits, self.alu_dest, self.alu_src);
            }
            AluOp::Xor => {
                let data = self.alu_dest ^ self.alu_src;
                self.alu_bitwise(bits, data);
            }
        }
    }

    pub(crate) fn set_of_rotate(&mut self, bits: u32) {
        self.set_of(Cpu::top_bit(self.alu_data ^ self.alu_dest, bits));
    }

    /// Multiply result flags. Zero tracks !carry on the Intel parts; the
    /// low-cycle path also burns a tick.
    pub(crate) fn set_co_mul(&mut self, carry: bool) {
        self.set_cf(carry);
        self.set_of(carry);
        if !self.cpu_type.is_nec() {
            self.set_zf_ex(!carry);
        }
        if !carry {
            self.cycles(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bus::BusInterface, cpu_common::CpuType};

    struct NullBus;
    impl BusInterface for NullBus {
        fn read_u8(&mut self, _addr: u32) -> u8 {
            0x90
        }
        fn write_u8(&mut self, _addr: u32, _data: u8) {}
        fn io_read_u8(&mut self, _port: u16) -> u8 {
            0xFF
        }
        fn io_write_u8(&mut self, _port: u16, _data: u8) {}
        fn irq_ack(&mut self) -> u8 {
            0
        }
    }

    fn cpu() -> Cpu {
        Cpu::new(CpuType::Intel8088, Box::new(NullBus))
    }

    /// Reference flag computation for the binary ALU group. ADC/SBB fold
    /// the carry into the source first, as the hardware does; a source of
    /// all-ones plus carry therefore leaves the value unchanged with the
    /// carry on and OF/AF clear.
    fn reference_flags(op: AluOp, bits: u32, dest: u32, src: u32, carry_in: bool) -> (u32, [bool; 6]) {
        let mask = (1u32 << bits) - 1;
        let sign = 1u32 << (bits - 1);
        let cin = carry_in as u32;

        let (result, carry, overflow, aux);
        match op {
            AluOp::Add | AluOp::Adc => {
                let src_eff = (src & mask) + if op == AluOp::Adc { cin } else { 0 };
                if src_eff > mask {
                    result = dest & mask;
                    carry = true;
                    overflow = false;
                    aux = false;
                }
                else {
                    let full = (dest & mask) + src_eff;
                    result = full & mask;
                    carry = full > mask;
                    overflow = ((dest ^ src_eff) & sign == 0) && ((dest ^ result) & sign != 0);
                    aux = (dest & 0x0F) + (src_eff & 0x0F) > 0x0F;
                }
            }
            AluOp::Sub | AluOp::Cmp | AluOp::Sbb => {
                let src_eff = (src & mask) + if op == AluOp::Sbb { cin } else { 0 };
                if src_eff > mask {
                    result = dest & mask;
                    carry = true;
                    overflow = false;
                    aux = false;
                }
                else {
                    result = (dest & mask).wrapping_sub(src_eff) & mask;
                    carry = src_eff > (dest & mask);
                    overflow = ((dest ^ src_eff) & sign != 0) && ((dest ^ result) & sign != 0);
                    aux = (dest & 0x0F) < (src_eff & 0x0F);
                }
            }
            AluOp::And => {
                result = dest & src & mask;
                carry = false;
                overflow = false;
                aux = false;
            }
            AluOp::Or => {
                result = (dest | src) & mask;
                carry = false;
                overflow = false;
                aux = false;
            }
            AluOp::Xor => {
                result = (dest ^ src) & mask;
                carry = false;
                overflow = false;
                aux = false;
            }
        }

        let zero = result == 0;
        let s = result & sign != 0;
        let parity = (result & 0xFF).count_ones() % 2 == 0;
        (result, [carry, overflow, aux, zero, s, parity])
    }

    fn check(cpu: &mut Cpu, op: AluOp, bits: u32, dest: u32, src: u32, carry_in: bool) {
        cpu.set_flag_state(Flag::Carry, carry_in);
        cpu.alu_op = op;
        cpu.alu_dest = dest;
        cpu.alu_src = src;
        cpu.alu_do_op(bits);

        let (result, f) = reference_flags(op, bits, dest, src, carry_in);
        let mask = (1u32 << bits) - 1;
        assert_eq!(cpu.alu_data & mask, result, "{:?} {}b {:X},{:X}", op, bits, dest, src);
        assert_eq!(cpu.get_flag(Flag::Carry), f[0], "CF {:?} {:X},{:X}", op, dest, src);
        assert_eq!(cpu.get_flag(Flag::Overflow), f[1], "OF {:?} {:X},{:X}", op, dest, src);
        // Logical ops leave AF cleared on this core.
        assert_eq!(cpu.get_flag(Flag::AuxCarry), f[2], "AF {:?} {:X},{:X}", op, dest, src);
        assert_eq!(cpu.get_flag(Flag::Zero), f[3], "ZF {:?} {:X},{:X}", op, dest, src);
        assert_eq!(cpu.get_flag(Flag::Sign), f[4], "SF {:?} {:X},{:X}", op, dest, src);
        assert_eq!(cpu.get_flag(Flag::Parity), f[5], "PF {:?} {:X},{:X}", op, dest, src);
    }

    const OPS: [AluOp; 8] = [
        AluOp::Add,
        AluOp::Adc,
        AluOp::Sub,
        AluOp::Sbb,
        AluOp::Cmp,
        AluOp::And,
        AluOp::Or,
        AluOp::Xor,
    ];

    #[test]
    fn flags_exhaustive_u8() {
        let mut cpu = cpu();
        for op in OPS {
            for dest in 0..=255u32 {
                for src in 0..=255u32 {
                    check(&mut cpu, op, 8, dest, src, false);
                    if matches!(op, AluOp::Adc | AluOp::Sbb) {
                        check(&mut cpu, op, 8, dest, src, true);
                    }
                }
            }
        }
    }

    #[test]
    fn flags_sampled_u16() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x8088_1987);
        let mut cpu = cpu();
        for op in OPS {
            for _ in 0..20_000 {
                let dest = rng.random::<u16>() as u32;
                let src = rng.random::<u16>() as u32;
                let cin = rng.random::<bool>();
                check(&mut cpu, op, 16, dest, src, cin);
            }
            // Corner cases the sampler can miss.
            for &(dest, src) in &[(0x7FFFu32, 1u32), (0x8000, 1), (0xFFFF, 0xFFFF), (0, 0), (0x8000, 0x8000)] {
                check(&mut cpu, op, 16, dest, src, false);
                check(&mut cpu, op, 16, dest, src, true);
            }
        }
    }
}
