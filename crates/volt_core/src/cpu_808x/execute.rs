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

    cpu_808x::execute.rs

    The opcode dispatch table and the bulk of the opcode handlers. All
    256 encodings dispatch somewhere; the undocumented aliases (0x60-0x6F
    conditional jumps, 0xC0/0xC1/0xC8/0xC9 returns, 0xD6 SALC, 0xF1 LOCK)
    land on the same handlers as their documented twins, as on the real
    part. Handlers charge their internal delay cycles inline so the BIU
    keeps prefetching in the gaps.

*/

use crate::cpu_808x::*;

pub(crate) type OpFn = fn(&mut Cpu);

#[rustfmt::skip]
pub(crate) const OPCODE_TABLE: [OpFn; 256] = [
    // 0x00: ADD/OR groups, segment ops
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_push_sreg,   Cpu::op_pop_sreg,
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_push_sreg,   Cpu::op_0f,
    // 0x10: ADC/SBB groups
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_push_sreg,   Cpu::op_pop_sreg,
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_push_sreg,   Cpu::op_pop_sreg,
    // 0x20: AND/SUB groups, overrides, decimal adjust
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_seg_override, Cpu::op_daa,
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_seg_override, Cpu::op_das,
    // 0x30: XOR/CMP groups, overrides, ASCII adjust
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_seg_override, Cpu::op_aaa,
    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,    Cpu::op_alu_rm_r,
    Cpu::op_alu_a_imm,   Cpu::op_alu_a_imm,   Cpu::op_seg_override, Cpu::op_aas,
    // 0x40: INC/DEC r16
    Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16,
    Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16,
    Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16,
    Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16, Cpu::op_inc_dec_r16,
    // 0x50: PUSH/POP r16
    Cpu::op_push_r16,    Cpu::op_push_r16,    Cpu::op_push_r16,    Cpu::op_push_r16,
    Cpu::op_push_r16,    Cpu::op_push_r16,    Cpu::op_push_r16,    Cpu::op_push_r16,
    Cpu::op_pop_r16,     Cpu::op_pop_r16,     Cpu::op_pop_r16,     Cpu::op_pop_r16,
    Cpu::op_pop_r16,     Cpu::op_pop_r16,     Cpu::op_pop_r16,     Cpu::op_pop_r16,
    // 0x60: undocumented aliases of the conditional jumps
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    // 0x70: conditional jumps
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc, Cpu::op_jcc,
    // 0x80: immediate ALU group, data movement
    Cpu::op_alu_rm_imm,  Cpu::op_alu_rm_imm,  Cpu::op_alu_rm_imm,  Cpu::op_alu_rm_imm,
    Cpu::op_test_rm_r,   Cpu::op_test_rm_r,   Cpu::op_xchg_rm_r,   Cpu::op_xchg_rm_r,
    Cpu::op_mov_rm_r,    Cpu::op_mov_rm_r,    Cpu::op_mov_r_rm,    Cpu::op_mov_r_rm,
    Cpu::op_mov_rm_sreg, Cpu::op_lea,         Cpu::op_mov_sreg_rm, Cpu::op_pop_rm,
    // 0x90: XCHG AX, conversions, far call, flags transport
    Cpu::op_xchg_ax_r,   Cpu::op_xchg_ax_r,   Cpu::op_xchg_ax_r,   Cpu::op_xchg_ax_r,
    Cpu::op_xchg_ax_r,   Cpu::op_xchg_ax_r,   Cpu::op_xchg_ax_r,   Cpu::op_xchg_ax_r,
    Cpu::op_cbw,         Cpu::op_cwd,         Cpu::op_call_far,    Cpu::op_wait,
    Cpu::op_pushf,       Cpu::op_popf,        Cpu::op_sahf,        Cpu::op_lahf,
    // 0xA0: accumulator moves, string group, TEST imm
    Cpu::op_mov_a_offset, Cpu::op_mov_a_offset, Cpu::op_mov_offset_a, Cpu::op_mov_offset_a,
    Cpu::op_movs_lods,   Cpu::op_movs_lods,   Cpu::op_cmps_scas,   Cpu::op_cmps_scas,
    Cpu::op_test_a_imm,  Cpu::op_test_a_imm,  Cpu::op_stos,        Cpu::op_stos,
    Cpu::op_movs_lods,   Cpu::op_movs_lods,   Cpu::op_cmps_scas,   Cpu::op_cmps_scas,
    // 0xB0: MOV reg, imm
    Cpu::op_mov_r8_imm,  Cpu::op_mov_r8_imm,  Cpu::op_mov_r8_imm,  Cpu::op_mov_r8_imm,
    Cpu::op_mov_r8_imm,  Cpu::op_mov_r8_imm,  Cpu::op_mov_r8_imm,  Cpu::op_mov_r8_imm,
    Cpu::op_mov_r16_imm, Cpu::op_mov_r16_imm, Cpu::op_mov_r16_imm, Cpu::op_mov_r16_imm,
    Cpu::op_mov_r16_imm, Cpu::op_mov_r16_imm, Cpu::op_mov_r16_imm, Cpu::op_mov_r16_imm,
    // 0xC0: returns (with aliases), far pointer loads, interrupts
    Cpu::ret_routine,    Cpu::ret_routine,    Cpu::ret_routine,    Cpu::ret_routine,
    Cpu::op_les_lds,     Cpu::op_les_lds,     Cpu::op_mov_rm_imm,  Cpu::op_mov_rm_imm,
    Cpu::ret_routine,    Cpu::ret_routine,    Cpu::ret_routine,    Cpu::ret_routine,
    Cpu::op_int3,        Cpu::op_int,         Cpu::op_into,        Cpu::op_iret,
    // 0xD0: shifts/rotates, ASCII math, XLAT, coprocessor escape
    Cpu::op_rotate_shift, Cpu::op_rotate_shift, Cpu::op_rotate_shift, Cpu::op_rotate_shift,
    Cpu::op_aam,         Cpu::op_aad,         Cpu::op_salc,        Cpu::op_xlat,
    Cpu::op_esc,         Cpu::op_esc,         Cpu::op_esc,         Cpu::op_esc,
    Cpu::op_esc,         Cpu::op_esc,         Cpu::op_esc,         Cpu::op_esc,
    // 0xE0: loops, port IO, transfers
    Cpu::op_loop,        Cpu::op_loop,        Cpu::op_loop,        Cpu::op_loop,
    Cpu::op_in_out,      Cpu::op_in_out,      Cpu::op_in_out,      Cpu::op_in_out,
    Cpu::op_call_near,   Cpu::op_jmp_near,    Cpu::op_jmp_far,     Cpu::op_jmp_short,
    Cpu::op_in_out,      Cpu::op_in_out,      Cpu::op_in_out,      Cpu::op_in_out,
    // 0xF0: prefixes, halt, group opcodes
    Cpu::op_lock,        Cpu::op_lock,        Cpu::op_rep,         Cpu::op_rep,
    Cpu::op_hlt,         Cpu::op_cmc,         Cpu::op_group_f6f7,  Cpu::op_group_f6f7,
    Cpu::op_clc_stc,     Cpu::op_clc_stc,     Cpu::op_cli_sti,     Cpu::op_cli_sti,
    Cpu::op_cld_std,     Cpu::op_cld_std,     Cpu::op_group_fe_ff, Cpu::op_group_fe_ff,
];

impl Cpu {
    // -- Prefixes ---------------------------------------------------------

    /// 26/2E/36/3E: segment override. Prefixes leave the instruction
    /// open; the next dispatch continues under the accumulated state.
    fn op_seg_override(&mut self) {
        self.cycles(1);
        self.ovr_seg = Some(SEGMENT_REGISTER_LUT[((self.opcode >> 3) & 0x03) as usize]);
        self.completed = false;
    }

    /// F0/F1: LOCK. Held until the end of the next full instruction;
    /// the DMA arbiter will not take the bus while it is asserted.
    fn op_lock(&mut self) {
        self.in_lock = true;
        self.cycles(1);
        self.completed = false;
    }

    /// F2/F3: REPNE/REPE.
    fn op_rep(&mut self) {
        self.cycles(1);
        self.in_rep = if self.opcode == 0xF2 {
            RepMode::Repne
        }
        else {
            RepMode::Repe
        };
        self.completed = false;
    }

    // -- ALU group --------------------------------------------------------

    /// The register/memory ALU block: 00-3B column pattern, direction
    /// and width in the low opcode bits, operation in bits 3-5.
    fn op_alu_rm_r(&mut self) {
        let bits = self.op_bits();
        self.do_mod_rm();
        self.access(46);
        let ea_val = self.get_ea() as u32;
        self.alu_op = AluOp::from_bits(self.opcode >> 3);
        if (self.opcode & 0x02) == 0 {
            self.alu_dest = ea_val;
            self.alu_src = self.get_reg(self.cpu_reg) as u32;
        }
        else {
            self.alu_dest = self.get_reg(self.cpu_reg) as u32;
            self.alu_src = ea_val;
        }
        if self.cpu_mod != 3 {
            self.cycles(2);
        }
        self.cycles(1);
        self.alu_do_op(bits);
        if self.alu_op != AluOp::Cmp {
            if (self.opcode & 0x02) == 0 {
                self.access(10);
                let data = self.alu_data;
                self.set_ea(data as u16);
                if self.cpu_mod == 3 {
                    self.cycles(1);
                }
            }
            else {
                let data = self.alu_data;
                self.set_reg(self.cpu_reg, data as u16);
                self.cycles(1);
            }
        }
        else {
            self.cycles(1);
        }
    }

    /// 04/05 column: ALU accumulator, immediate.
    fn op_alu_a_imm(&mut self) {
        let bits = self.op_bits();
        self.cycles(1);
        let imm = self.q_read() as u32;
        self.alu_dest = self.get_accum() as u32;
        self.alu_src = imm;
        self.alu_op = AluOp::from_bits(self.opcode >> 3);
        self.alu_do_op(bits);
        if self.alu_op != AluOp::Cmp {
            let data = self.alu_data;
            self.set_accum(data as u16);
        }
        self.cycles(1);
    }

    /// 80-83: ALU rm, immediate. 82 aliases 80; 83 sign-extends.
    fn op_alu_rm_imm(&mut self) {
        let bits = self.op_bits();
        self.do_mod_rm();
        self.access(47);
        self.alu_data = self.get_ea() as u32;
        self.alu_dest = self.alu_data;
        if self.cpu_mod != 3 {
            self.cycles(3);
        }
        if self.opcode == 0x81 {
            if self.cpu_mod == 3 {
                self.cycles(1);
            }
            self.alu_src = self.q_read_u16() as u32;
        }
        else {
            if self.cpu_mod == 3 {
                self.cycles(1);
            }
            if self.opcode == 0x83 {
                self.alu_src = Cpu::sign_extend(self.q_read_u8()) as u32;
            }
            else {
                self.alu_src = (self.q_read_u8() as u32) | 0xFF00;
            }
        }
        self.cycles(1);
        self.alu_op = AluOp::from_bits(self.rmdat >> 3);
        self.alu_do_op(bits);
        if self.alu_op != AluOp::Cmp {
            self.access(11);
            let data = self.alu_data;
            self.set_ea(data as u16);
        }
        else if self.cpu_mod != 3 {
            self.cycles(1);
        }
    }

    /// 84/85: TEST rm, reg.
    fn op_test_rm_r(&mut self) {
        let bits = self.op_bits();
        self.do_mod_rm();
        self.access(48);
        let ea_val = self.get_ea() as u32;
        let reg_val = self.get_reg(self.cpu_reg) as u32;
        self.alu_test(bits, ea_val, reg_val);
        if self.cpu_mod == 3 {
            self.cycles(2);
        }
        self.cycles(2);
    }

    /// A8/A9: TEST accumulator, immediate.
    fn op_test_a_imm(&mut self) {
        let bits = self.op_bits();
        self.cycles(1);
        let imm = self.q_read() as u32;
        let accum = self.get_accum() as u32;
        self.alu_test(bits, accum, imm);
        self.cycles(1);
    }

    /// 40-4F: INC/DEC r16. Carry is untouched.
    fn op_inc_dec_r16(&mut self) {
        self.cycles(1);
        self.alu_dest = self.get_r16(self.opcode & 0x07) as u32;
        self.alu_src = 1;
        if (self.opcode & 0x08) == 0 {
            self.alu_data = self.alu_dest.wrapping_add(self.alu_src);
            self.set_of_add(16);
        }
        else {
            self.alu_data = self.alu_dest.wrapping_sub(self.alu_src);
            self.set_of_sub(16);
        }
        self.do_af();
        self.set_pzs(16);
        let data = self.alu_data;
        self.set_r16(self.opcode & 0x07, data as u16);
    }

    // -- Stack group ------------------------------------------------------

    /// 06/0E/16/1E: PUSH sreg.
    fn op_push_sreg(&mut self) {
        self.access(29);
        let seg = SEGMENT_REGISTER_LUT[((self.opcode >> 3) & 0x03) as usize];
        let val = self.seg_value(seg);
        self.push_u16(val);
    }

    /// 07/17/1F: POP sreg. Suppresses interrupts for one instruction.
    fn op_pop_sreg(&mut self) {
        self.access(22);
        let val = self.pop_u16();
        let seg = SEGMENT_REGISTER_LUT[((self.opcode >> 3) & 0x03) as usize];
        self.set_seg_value(seg, val);
        self.cycles(1);
        self.noint = true;
    }

    /// 50-57: PUSH r16. The register is read after SP moves, so PUSH SP
    /// stores the decremented value, as the original part does.
    fn op_push_r16(&mut self) {
        self.access(30);
        self.sp = self.sp.wrapping_sub(2);
        let val = self.get_r16(self.opcode & 0x07);
        self.ea_addr = self.sp;
        self.biu_write_u16(self.ss, self.ea_addr, val);
    }

    /// 58-5F: POP r16.
    fn op_pop_r16(&mut self) {
        self.access(23);
        let val = self.pop_u16();
        self.set_r16(self.opcode & 0x07, val);
        self.cycles(1);
    }

    /// 8F: POP rm. The EA survives the stack read.
    fn op_pop_rm(&mut self) {
        self.do_mod_rm();
        self.cycles(1);
        let saved_ea = self.ea_addr;
        self.access(24);
        if self.cpu_mod != 3 {
            self.cycles(2);
        }
        let val = self.pop_u16();
        self.ea_addr = saved_ea;
        self.cycles(2);
        self.access(15);
        self.set_ea16(val);
    }

    /// 9C: PUSHF.
    fn op_pushf(&mut self) {
        self.access(33);
        let flags = self.flags_word();
        self.push_u16(flags);
    }

    /// 9D: POPF.
    fn op_popf(&mut self) {
        self.access(25);
        let flags = self.pop_u16();
        self.set_flags(flags);
        self.cycles(1);
    }

    // -- Data movement ----------------------------------------------------

    /// 88/89: MOV rm, reg.
    fn op_mov_rm_r(&mut self) {
        self.do_mod_rm();
        self.cycles(1);
        self.access(13);
        let val = self.get_reg(self.cpu_reg);
        self.set_ea(val);
    }

    /// 8A/8B: MOV reg, rm.
    fn op_mov_r_rm(&mut self) {
        self.do_mod_rm();
        self.access(50);
        let val = self.get_ea();
        self.set_reg(self.cpu_reg, val);
        self.cycles(1);
        if self.cpu_mod != 3 {
            self.cycles(2);
        }
    }

    /// 8C: MOV rm16, sreg.
    fn op_mov_rm_sreg(&mut self) {
        self.do_mod_rm();
        if self.cpu_mod == 3 {
            self.cycles(1);
        }
        self.access(14);
        let seg = SEGMENT_REGISTER_LUT[((self.rmdat & 0x18) >> 3) as usize];
        let val = self.seg_value(seg);
        self.set_ea16(val);
    }

    /// 8E: MOV sreg, rm16. Loading CS drops the queue contents; loading
    /// SS suppresses interrupts for one instruction.
    fn op_mov_sreg_rm(&mut self) {
        self.do_mod_rm();
        self.access(51);
        let val = self.get_ea16();
        let seg = SEGMENT_REGISTER_LUT[((self.rmdat & 0x18) >> 3) as usize];
        if seg == Segment::CS {
            self.load_cs(val);
            self.queue.flush();
        }
        else {
            self.set_seg_value(seg, val);
        }
        self.cycles(1);
        if self.cpu_mod != 3 {
            self.cycles(2);
        }
        if seg == Segment::SS {
            self.noint = true;
        }
    }

    /// 8D: LEA.
    fn op_lea(&mut self) {
        self.do_mod_rm();
        let addr = self.ea_addr;
        self.set_r16(self.cpu_reg, addr);
        self.cycles(1);
        if self.cpu_mod != 3 {
            self.cycles(2);
        }
    }

    /// 86/87: XCHG rm, reg.
    fn op_xchg_rm_r(&mut self) {
        self.do_mod_rm();
        self.access(49);
        let ea_val = self.get_ea();
        let reg_val = self.get_reg(self.cpu_reg);
        self.set_reg(self.cpu_reg, ea_val);
        self.cycles(3);
        self.access(12);
        self.set_ea(reg_val);
    }

    /// 90-97: XCHG AX, r16 (90 is NOP).
    fn op_xchg_ax_r(&mut self) {
        self.cycles(1);
        let tmp = self.get_r16(self.opcode & 0x07);
        let ax = self.a.x();
        self.set_r16(self.opcode & 0x07, ax);
        self.a.set_x(tmp);
        self.cycles(1);
    }

    /// A0/A1: MOV accumulator, [moffs].
    fn op_mov_a_offset(&mut self) {
        self.cycles(1);
        self.ea_addr = self.q_read_u16();
        self.access(1);
        let seg = self.data_segment();
        let val = if self.wide() {
            self.biu_read_u16(seg, self.ea_addr)
        }
        else {
            self.biu_read_u8(seg, self.ea_addr) as u16
        };
        self.set_accum(val);
        self.cycles(1);
    }

    /// A2/A3: MOV [moffs], accumulator.
    fn op_mov_offset_a(&mut self) {
        self.cycles(1);
        self.ea_addr = self.q_read_u16();
        self.access(7);
        let seg = self.data_segment();
        let val = self.get_accum();
        if self.wide() {
            self.biu_write_u16(seg, self.ea_addr, val);
        }
        else {
            self.biu_write_u8(seg, self.ea_addr, (val & 0xFF) as u8);
        }
    }

    /// B0-B7: MOV r8, imm8.
    fn op_mov_r8_imm(&mut self) {
        self.cycles(1);
        let val = self.q_read_u8();
        self.set_r8(self.opcode & 0x07, val);
        self.cycles(1);
    }

    /// B8-BF: MOV r16, imm16.
    fn op_mov_r16_imm(&mut self) {
        self.cycles(1);
        let val = self.q_read_u16();
        self.set_r16(self.opcode & 0x07, val);
        self.cycles(1);
    }

    /// C6/C7: MOV rm, imm.
    fn op_mov_rm_imm(&mut self) {
        self.do_mod_rm();
        self.cycles(1);
        if self.cpu_mod != 3 {
            self.cycles(2);
        }
        let val = self.q_read();
        if self.cpu_mod == 3 {
            self.cycles(1);
        }
        self.access(16);
        self.set_ea(val);
    }

    /// C4/C5: LES/LDS r16, m32.
    fn op_les_lds(&mut self) {
        self.do_mod_rm();
        self.access(52);
        self.read_ea(true, true);
        let offset = (self.alu_data & 0xFFFF) as u16;
        self.set_r16(self.cpu_reg, offset);
        self.access(57);
        self.read_ea2(true);
        let seg_val = (self.alu_data & 0xFFFF) as u16;
        let seg = if (self.opcode & 0x01) != 0 {
            Segment::DS
        }
        else {
            Segment::ES
        };
        self.set_seg_value(seg, seg_val);
        self.cycles(1);
    }

    /// D7: XLAT.
    fn op_xlat(&mut self) {
        self.ea_addr = self.b.x().wrapping_add(self.a.l() as u16);
        self.access(4);
        let seg = self.data_segment();
        let val = self.biu_read_u8(seg, self.ea_addr);
        self.a.set_l(val);
        self.cycles(1);
    }

    // -- Accumulator conversions and flag transport -----------------------

    /// 98: CBW.
    fn op_cbw(&mut self) {
        self.cycles(1);
        let val = Cpu::sign_extend(self.a.l());
        self.a.set_x(val);
    }

    /// 99: CWD.
    fn op_cwd(&mut self) {
        self.cycles(4);
        if !Cpu::top_bit(self.a.x() as u32, 16) {
            self.d.set_x(0);
        }
        else {
            self.cycles(1);
            self.d.set_x(0xFFFF);
        }
    }

    /// 9E: SAHF.
    fn op_sahf(&mut self) {
        self.cycles(1);
        self.flags = (self.flags & 0xFF02) | self.a.h() as u16;
        self.cycles(2);
    }

    /// 9F: LAHF.
    fn op_lahf(&mut self) {
        self.cycles(1);
        self.a.set_h((self.flags & 0xD7) as u8);
    }

    /// F5: CMC.
    fn op_cmc(&mut self) {
        self.cycles(1);
        self.flags ^= CPU_FLAG_CARRY;
    }

    /// F8/F9: CLC/STC.
    fn op_clc_stc(&mut self) {
        self.cycles(1);
        self.set_cf(self.opcode & 0x01 != 0);
    }

    /// FA/FB: CLI/STI.
    fn op_cli_sti(&mut self) {
        self.cycles(1);
        self.set_if(self.opcode & 0x01 != 0);
    }

    /// FC/FD: CLD/STD.
    fn op_cld_std(&mut self) {
        self.cycles(1);
        self.set_df(self.opcode & 0x01 != 0);
    }

    /// D6: SALC, undocumented.
    fn op_salc(&mut self) {
        self.cycles(1);
        let val = if self.get_flag(Flag::Carry) { 0xFF } else { 0x00 };
        self.a.set_l(val);
        self.cycles(1);
    }

    // -- Control transfer -------------------------------------------------

    /// 60-7F: conditional short jumps (60-6F are aliases on this family).
    fn op_jcc(&mut self) {
        self.cycles(1);
        let disp = self.q_read_u8();
        self.cycles(1);
        let cond = match (self.opcode >> 1) & 0x07 {
            0 => self.get_flag(Flag::Overflow),
            1 => self.get_flag(Flag::Carry),
            2 => self.get_flag(Flag::Zero),
            3 => self.get_flag(Flag::Carry) || self.get_flag(Flag::Zero),
            4 => self.get_flag(Flag::Sign),
            5 => self.get_flag(Flag::Parity),
            6 => self.get_flag(Flag::Sign) != self.get_flag(Flag::Overflow),
            _ => {
                self.get_flag(Flag::Zero)
                    || (self.get_flag(Flag::Sign) != self.get_flag(Flag::Overflow))
            }
        };
        if cond != (self.opcode & 0x01 != 0) {
            self.jump_short(disp);
        }
    }

    /// E0-E3: LOOPNE/LOOPE/LOOP/JCXZ.
    fn op_loop(&mut self) {
        self.cycles(3);
        let disp = self.q_read_u8();
        if self.opcode != 0xE2 {
            self.cycles(1);
        }
        let taken;
        if self.opcode != 0xE3 {
            self.c.set_x(self.c.x().wrapping_sub(1));
            taken = match self.opcode {
                0xE0 => self.c.x() != 0 && !self.get_flag(Flag::Zero),
                0xE1 => self.c.x() != 0 && self.get_flag(Flag::Zero),
                _ => self.c.x() != 0,
            };
        }
        else {
            taken = self.c.x() == 0;
        }
        if taken {
            self.jump_short(disp);
        }
    }

    /// E8: CALL rel16.
    fn op_call_near(&mut self) {
        self.cycles(1);
        let old_ip = self.jump_near();
        self.access(34);
        self.push_u16(old_ip);
    }

    /// E9: JMP rel16.
    fn op_jmp_near(&mut self) {
        self.cycles(1);
        self.jump_near();
    }

    /// EB: JMP rel8.
    fn op_jmp_short(&mut self) {
        self.cycles(1);
        let disp = self.q_read_u8();
        self.jump_short(disp);
        self.cycles(1);
    }

    /// EA: JMP far.
    fn op_jmp_far(&mut self) {
        self.cycles(1);
        let new_ip = self.q_read_u16();
        self.cycles(1);
        let new_cs = self.q_read_u16();
        self.load_cs(new_cs);
        self.access(70);
        self.pfq_clear();
        self.set_ip(new_ip);
    }

    /// 9A: CALL far imm32.
    fn op_call_far(&mut self) {
        self.cycles(1);
        let new_ip = self.q_read_u16();
        self.cycles(1);
        let new_cs = self.q_read_u16();
        self.pfq_clear();
        self.access(31);
        let old_cs = self.cs;
        self.push_u16(old_cs);
        self.access(60);
        let old_ip = self.pc;
        self.load_cs(new_cs);
        self.set_ip(new_ip);
        self.access(32);
        self.push_u16(old_ip);
    }

    // -- IO ---------------------------------------------------------------

    /// E4-E7, EC-EF: IN/OUT with immediate or DX port.
    fn op_in_out(&mut self) {
        let bits = self.op_bits();
        if (self.opcode & 0x0E) != 0x0C {
            self.cycles(1);
        }
        let port = if (self.opcode & 0x08) == 0 {
            self.q_read_u8() as u16
        }
        else {
            self.d.x()
        };
        self.ea_addr = port;
        if (self.opcode & 0x02) == 0 {
            self.access(3);
            self.cpu_io(bits, false, port);
            self.cycles(1);
        }
        else {
            if (self.opcode & 0x08) == 0 {
                self.access(8);
            }
            else {
                self.access(9);
            }
            self.cpu_io(bits, true, port);
        }
    }

    // -- Halt and wait ----------------------------------------------------

    /// F4: HLT. Re-dispatches itself through the repeating latch,
    /// burning ticks until an interrupt is observed.
    fn op_hlt(&mut self) {
        if !self.repeating {
            self.cycles(1);
            self.pfq_clear();
        }
        self.cycles(1);
        if self.irq_pending() {
            self.halted = false;
            self.check_interrupts();
        }
        else {
            self.halted = true;
            self.repeating = true;
            self.completed = false;
        }
    }

    /// 9B: WAIT. With no TEST pin modeled, behaves as a long delay that
    /// polls for interrupts before completing.
    fn op_wait(&mut self) {
        if !self.repeating {
            self.cycles(2);
        }
        self.cycles(5);
        self.cycles(7);
        self.check_interrupts();
    }

    // -- Coprocessor escape -----------------------------------------------

    /// D8-DF: ESC. The ModRM and effective address are handed to the
    /// attached coprocessor; without one the memory operand is read and
    /// discarded, exactly as a socket with no 8087 behaves.
    fn op_esc(&mut self) {
        self.do_mod_rm();
        self.access(54);
        let ea = if self.cpu_mod != 3 {
            Some((self.ea_seg, self.ea_addr))
        }
        else {
            None
        };
        if let Some(mut fpu) = self.fpu.take() {
            fpu.esc(self.opcode, self.rmdat, ea);
            self.fpu = Some(fpu);
        }
        else if self.cpu_mod != 3 {
            let _ = self.biu_read_u16(self.ea_seg, self.ea_addr);
        }
        self.cycles(1);
        if self.cpu_mod != 3 {
            self.cycles(2);
        }
    }

    // -- FE/FF group ------------------------------------------------------

    /// Byte-width CALL/JMP through rm fold the missing high byte to ones,
    /// the same garbage the real part produces.
    fn data_opff_rm(&mut self) {
        if !self.wide() {
            if self.cpu_mod != 3 {
                self.alu_data |= 0xFF00;
            }
            else {
                self.alu_data = self.get_r16(self.cpu_rm) as u32;
            }
        }
    }

    /// FE/FF: INC/DEC/CALL/CALL far/JMP/JMP far/PUSH rm.
    fn op_group_fe_ff(&mut self) {
        let bits = self.op_bits();
        self.do_mod_rm();
        self.access(56);
        let memory_only = matches!(self.rmdat & 0x38, 0x18 | 0x28);
        self.read_ea(memory_only, self.wide());

        match self.rmdat & 0x38 {
            0x00 | 0x08 => {
                // INC/DEC rm
                self.alu_dest = self.alu_data;
                self.alu_src = 1;
                if (self.rmdat & 0x38) == 0x00 {
                    self.alu_data = self.alu_dest.wrapping_add(self.alu_src);
                    self.set_of_add(bits);
                }
                else {
                    self.alu_data = self.alu_dest.wrapping_sub(self.alu_src);
                    self.set_of_sub(bits);
                }
                self.do_af();
                self.set_pzs(bits);
                self.cycles(2);
                self.access(19);
                let data = self.alu_data;
                self.set_ea(data as u16);
            }
            0x10 => {
                // CALL rm
                self.data_opff_rm();
                self.access(63);
                self.cycles(1);
                self.pfq_clear();
                self.cycles(4);
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
                self.cycles(1);
                let old_ip = self.pc;
                let new_ip = (self.alu_data & 0xFFFF) as u16;
                self.set_ip(new_ip);
                self.cycles(2);
                self.access(35);
                self.push_u16(old_ip);
            }
            0x18 => {
                // CALL far rm
                let new_ip = (self.alu_data & 0xFFFF) as u16;
                self.access(58);
                self.read_ea2(self.wide());
                if !self.wide() {
                    self.alu_data |= 0xFF00;
                }
                let new_cs = (self.alu_data & 0xFFFF) as u16;
                self.access(36);
                let old_cs = self.cs;
                self.push_u16(old_cs);
                self.access(64);
                self.cycles(4);
                let old_ip = self.pc;
                self.load_cs(new_cs);
                self.set_ip(new_ip);
                self.access(37);
                self.push_u16(old_ip);
            }
            0x20 => {
                // JMP rm
                self.data_opff_rm();
                self.access(65);
                let new_ip = (self.alu_data & 0xFFFF) as u16;
                self.set_ip(new_ip);
            }
            0x28 => {
                // JMP far rm
                let new_ip = (self.alu_data & 0xFFFF) as u16;
                self.access(59);
                self.read_ea2(self.wide());
                if !self.wide() {
                    self.alu_data |= 0xFF00;
                }
                let new_cs = (self.alu_data & 0xFFFF) as u16;
                self.load_cs(new_cs);
                self.access(66);
                self.set_ip(new_ip);
            }
            _ => {
                // PUSH rm (38 aliases 30)
                if self.cpu_mod != 3 {
                    self.cycles(1);
                }
                self.access(38);
                let data = (self.alu_data & 0xFFFF) as u16;
                self.push_u16(data);
            }
        }
    }
}
