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

    cpu_808x::cycle.rs

    The single-tick pipeline. Every suspension point in the core funnels
    through cycle(): DMA arbitration is evaluated, the BIU state machine
    advances one T-state, the tick counter moves, and wait-state counters
    drain. Instructions charge time by calling cycles(n).

*/

use crate::cpu_808x::*;

impl Cpu {
    /// Advance the simulation by exactly one tick.
    pub fn cycle(&mut self) {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", self.cycle_state_string());
        }

        // An idle BIU with a pending refill delay (armed by reset) kicks
        // into its resume countdown as soon as fetching is allowed.
        if self.biu_state == BiuState::Idle
            && self.biu_next_state == BiuState::Idle
            && !self.fetch_suspended
            && self.pending_fetch_delay > 0
            && self.queue.has_room()
        {
            let delay = self.pending_fetch_delay;
            self.pending_fetch_delay = 0;
            self.biu_resume(delay);
        }

        if matches!(self.biu_state, BiuState::Prefetch | BiuState::Eu) {
            match self.bus_cycle {
                TCycle::T2 => self.biu_schedule_next(),
                TCycle::T3 if !self.biu_wait => {
                    if !self.bus_access_done {
                        self.do_bus_access();
                        self.bus_access_done = true;
                    }
                }
                _ => {
                    if self.biu_is_last_tw() && !self.bus_access_done {
                        self.do_bus_access();
                        self.bus_access_done = true;
                    }
                }
            }
        }

        self.run_dma_cycle();

        self.biu_advance_state();

        self.cycles_left -= 1;
        self.cycle_num += 1;

        self.do_wait();
    }

    #[inline]
    pub fn cycles(&mut self, ct: u32) {
        for _ in 0..ct {
            self.cycle();
        }
    }

    /// A tick spent while the BIU is being held off its state machine
    /// (catch-up and abort penalties). DMA still arbitrates and wait
    /// counters still drain.
    pub(crate) fn cycle_idle(&mut self) {
        self.run_dma_cycle();
        self.cycles_left -= 1;
        self.cycle_num += 1;
        self.do_wait();
    }

    #[inline]
    fn do_wait(&mut self) {
        self.wait_states = self.wait_states.saturating_sub(1);
        self.dma_wait_states = self.dma_wait_states.saturating_sub(1);
        if self.wait_states == 0 && self.dma_wait_states == 0 {
            self.ready = true;
        }
    }

    /// True on the final wait-state repetition of T3.
    #[inline]
    pub(crate) fn biu_is_last_tw(&self) -> bool {
        matches!(self.biu_state, BiuState::Prefetch | BiuState::Eu)
            && self.biu_wait
            && (self.wait_states + self.dma_wait_states) == 1
    }

    /// Perform the data transfer for the bus cycle in flight. Runs once
    /// per bus cycle, on T3 (or the last Tw when wait states stretched it).
    fn do_bus_access(&mut self) {
        if self.biu_state == BiuState::Eu {
            let Some(req) = self.bus_request else {
                return;
            };
            self.wait_states = 0;
            match req.kind {
                BusRequestKind::Mem => self.bus_do_mem(req),
                BusRequestKind::Io => self.bus_do_io(req),
                BusRequestKind::Pic => {
                    self.pic_data = self.bus.irq_ack();
                }
            }
        }
        else {
            // Code fetch on the BIU's own behalf.
            let addr = Cpu::calc_linear_address(self.cs, self.pfq_ip);
            self.wait_states = 0;
            if self.cpu_type.is_wide_bus() {
                self.fetch_latch = self.bus.read_u16(addr);
            }
            else {
                self.fetch_latch = self.bus.read_u8(addr) as u16;
            }
            if self.enable_wait_states {
                self.wait_states += self.bus.read_wait(addr);
            }
        }
    }

    fn bus_do_mem(&mut self, req: BusRequest) {
        let addr = Cpu::calc_linear_address(self.mem_seg, self.mem_addr);
        let addr_high = Cpu::calc_linear_address(self.mem_seg, self.mem_addr.wrapping_add(1));

        if req.out {
            if req.wide {
                self.bus.write_u16(addr, self.mem_data);
            }
            else if req.high {
                self.bus.write_u8(addr_high, (self.mem_data >> 8) as u8);
            }
            else {
                self.bus.write_u8(addr, (self.mem_data & 0xFF) as u8);
            }
            if self.enable_wait_states {
                self.wait_states += self.bus.write_wait(addr);
            }

            let last = if req.high { addr_high } else { addr };
            if (0xF0000..=0xFFFFF).contains(&last) {
                self.last_addr = (last & 0xFFFF) as u16;
            }
        }
        else {
            if req.wide {
                self.mem_data = self.bus.read_u16(addr);
            }
            else if req.high {
                self.mem_data = (self.mem_data & 0x00FF) | ((self.bus.read_u8(addr_high) as u16) << 8);
            }
            else {
                self.mem_data = (self.mem_data & 0xFF00) | self.bus.read_u8(addr) as u16;
            }
            if self.enable_wait_states {
                self.wait_states += self.bus.read_wait(addr);
            }
        }
    }

    /// IO transfers move data directly between the accumulator and the
    /// port, as the hardware does.
    fn bus_do_io(&mut self, req: BusRequest) {
        let port = self.mem_addr;
        if req.out {
            if req.wide {
                self.bus.io_write_u16(port, self.a.x());
            }
            else if req.high {
                self.bus.io_write_u8(port.wrapping_add(1), self.a.h());
            }
            else {
                self.bus.io_write_u8(port, self.a.l());
            }
        }
        else if req.wide {
            let w = self.bus.io_read_u16(port);
            self.a.set_x(w);
        }
        else if req.high {
            let b = self.bus.io_read_u8(port.wrapping_add(1));
            self.a.set_h(b);
        }
        else {
            let b = self.bus.io_read_u8(port);
            self.a.set_l(b);
        }
        if self.enable_wait_states {
            self.wait_states += self.bus.io_wait(port);
        }
    }

    /// One transition of the BIU state machine.
    fn biu_advance_state(&mut self) {
        match self.biu_state {
            BiuState::Resume => {
                if self.biu_state_length > 0 {
                    self.biu_state_length -= 1;
                    if self.biu_state_length == 0 {
                        self.biu_state = BiuState::Prefetch;
                        self.biu_next_state = BiuState::Prefetch;
                    }
                }
                else {
                    self.biu_state = BiuState::Prefetch;
                    self.biu_next_state = BiuState::Prefetch;
                }
            }
            BiuState::Idle | BiuState::Suspended => {
                self.biu_state = self.biu_next_state;
            }
            BiuState::Delay => {
                if self.biu_state_length > 0 {
                    self.biu_state_length -= 1;
                }
                if self.biu_state_length == 0 {
                    if self.biu_queue_has_room() {
                        self.biu_state = BiuState::Prefetch;
                        self.biu_next_state = BiuState::Prefetch;
                    }
                    else {
                        self.biu_state = BiuState::Idle;
                        self.biu_next_state = BiuState::Idle;
                    }
                }
            }
            BiuState::Prefetch | BiuState::Eu => {
                if self.biu_wait {
                    if self.wait_states == 0 && self.dma_wait_states == 0 {
                        self.biu_wait = false;
                        self.bus_cycle = self.bus_cycle.next();
                    }
                }
                else {
                    if self.bus_cycle == TCycle::T4 {
                        if self.biu_state == BiuState::Prefetch {
                            self.pfq_add();
                        }
                        self.biu_state = self.biu_next_state;
                    }

                    // IO devices are never zero-wait on this bus.
                    if self.bus_cycle == TCycle::T3 && self.biu_state == BiuState::Eu {
                        if let Some(req) = self.bus_request {
                            if req.kind == BusRequestKind::Io {
                                self.wait_states += 1;
                            }
                        }
                    }

                    if self.bus_cycle == TCycle::T3 && (self.wait_states != 0 || self.dma_wait_states != 0) {
                        self.biu_wait = true;
                        self.ready = false;
                    }
                    else {
                        self.biu_wait = false;
                        self.bus_cycle = self.bus_cycle.next();
                    }
                }

                if self.bus_access_done && !self.biu_wait {
                    self.bus_access_done = false;
                }
            }
        }
    }

    /// Commit the fetched datum into the queue on T4 of a code fetch.
    /// The wide-bus part commits two bytes when it fetched from an even
    /// address and the queue has room for both.
    fn pfq_add(&mut self) {
        if !self.queue.has_room() {
            return;
        }

        let fetch_word = self.cpu_type.is_wide_bus() && (self.pfq_ip & 1) == 0;

        if fetch_word && self.queue.len() < self.queue.size() - 1 {
            self.queue.push16(self.fetch_latch);
            self.pfq_ip = self.pfq_ip.wrapping_add(2);
        }
        else if !fetch_word {
            self.queue.push8((self.fetch_latch & 0xFF) as u8);
            self.pfq_ip = self.pfq_ip.wrapping_add(1);
        }
    }
}
