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

    cpu_808x::biu.rs

    Implement CPU behavior specific to the BIU (Bus Interface Unit):
    EU-issued bus requests, instruction queue reads, and prefetch
    suspend/resume/flush control.

*/

use crate::cpu_808x::*;

/// Abort penalty when the EU claims the bus out from under a code fetch
/// caught in its back half.
const FETCH_ABORT_CYCLES: u32 = 2;
/// Catch-up cost for claiming an idle or suspended bus.
const IDLE_CLAIM_CYCLES: u32 = 3;
/// Ticks the EU waits for an empty queue before the core declares the
/// prefetcher wedged. Generously above the worst legitimate refill
/// (bus cycle + DMA + device wait states).
const FETCH_TIMEOUT: u32 = 100;

impl Cpu {
    // -- Prefetch scheduling ----------------------------------------------

    /// Room check used by fetch scheduling. The wide-bus part fetches two
    /// bytes at a time and so wants two bytes free.
    pub(crate) fn biu_queue_has_room(&self) -> bool {
        if self.cpu_type.is_wide_bus() {
            self.queue.len() < self.queue.size() - 1
        }
        else {
            self.queue.has_room()
        }
    }

    /// Restart prefetching, optionally after a refill delay. The V20
    /// resumes immediately.
    pub(crate) fn biu_resume(&mut self, delay: u32) {
        if self.cpu_type.is_nec() {
            self.biu_state = BiuState::Prefetch;
        }
        else {
            self.biu_state = BiuState::Resume;
            self.biu_state_length = delay;
            self.biu_state_total = delay;
        }
    }

    fn biu_switch_to_pf(&mut self, delay: u32) {
        if self.cpu_type.is_nec() {
            self.biu_next_state = BiuState::Prefetch;
        }
        else {
            self.biu_next_state = BiuState::Resume;
            self.biu_state_length = delay;
            self.biu_state_total = delay;
        }
    }

    /// Decide the state the BIU takes after the bus cycle in flight.
    /// Called on T2.
    pub(crate) fn biu_schedule_next(&mut self) {
        if self.biu_state == BiuState::Eu {
            if (self.cpu_type.is_nec() || !self.fetch_suspended) && self.biu_queue_has_room() {
                self.biu_next_state = BiuState::Prefetch;
            }
            else {
                self.biu_next_state = BiuState::Idle;
            }
        }
        else if !self.cpu_type.is_nec() && self.queue.at_policy_len() {
            // Queue is about to top off; take the post-access breather
            // instead of streaming another fetch.
            self.biu_next_state = BiuState::Delay;
            self.biu_state_length = 3;
            self.biu_state_total = 3;
        }
        else {
            self.biu_next_state = BiuState::Prefetch;
        }
    }

    // -- EU bus requests --------------------------------------------------

    /// Claim the bus for the EU, paying the turnaround cost appropriate
    /// to whatever the BIU was doing.
    fn biu_eu_request(&mut self) {
        match self.biu_state {
            BiuState::Resume => {
                // Pay out whatever is left of the resume countdown.
                if !self.cpu_type.is_nec() {
                    for _ in 0..(self.biu_state_total - self.biu_state_length) {
                        self.cycle_idle();
                    }
                }
            }
            BiuState::Idle | BiuState::Suspended => {
                if !self.cpu_type.is_nec() {
                    for _ in 0..IDLE_CLAIM_CYCLES {
                        self.cycle_idle();
                    }
                }
            }
            BiuState::Delay | BiuState::Eu => {
                // Request is honored immediately.
                self.biu_state_length = 0;
            }
            BiuState::Prefetch => {
                // Let the fetch in flight finish its current bus cycle.
                loop {
                    self.cycle();
                    if self.bus_cycle == TCycle::T1 {
                        break;
                    }
                }
                // A fetch interrupted in its back half costs two abort
                // cycles on top.
                if matches!(self.bus_cycle_at_claim, TCycle::T3 | TCycle::T4) && !self.cpu_type.is_nec() {
                    for _ in 0..FETCH_ABORT_CYCLES {
                        self.cycle_idle();
                    }
                }
            }
        }

        self.biu_state = BiuState::Eu;
        self.biu_next_state = BiuState::Eu;
        self.biu_state_length = 0;
    }

    /// Begin an EU bus request. The request descriptor must already be
    /// staged in bus_request/mem_seg/mem_addr/mem_data.
    fn biu_begin_eu(&mut self) {
        self.bus_cycle_at_claim = self.bus_cycle;
        self.biu_eu_request();
    }

    #[inline]
    fn biu_restart_eu(&mut self) {
        // Second half of a split word transfer re-enters EU service
        // without a fresh claim.
        self.biu_state = BiuState::Eu;
        self.biu_next_state = BiuState::Eu;
        self.biu_state_length = 0;
    }

    fn biu_bus_wait_write_finish(&mut self) {
        while self.bus_cycle != TCycle::T4 {
            self.cycle();
        }
    }

    fn biu_bus_wait_read_finish(&mut self) {
        self.biu_bus_wait_write_finish();
        self.cycle();
    }

    /// Align a back-to-back EU request onto a fresh T1.
    #[inline]
    fn biu_align_t1(&mut self) {
        if self.bus_cycle == TCycle::T4 && self.biu_state == BiuState::Eu {
            self.bus_cycle = TCycle::T1;
        }
    }

    /// Read a byte through the BIU, blocking for the full bus cycle.
    pub(crate) fn biu_read_u8(&mut self, seg: u16, offset: u16) -> u8 {
        self.mem_seg = seg;
        self.mem_addr = offset;
        self.biu_align_t1();
        self.bus_request = Some(BusRequest {
            kind: BusRequestKind::Mem,
            out:  false,
            wide: false,
            high: false,
        });
        self.biu_begin_eu();
        self.biu_bus_wait_read_finish();
        let ret = (self.mem_data & 0xFF) as u8;
        self.bus_request = None;
        ret
    }

    /// Read a word through the BIU. A single wide cycle on the 16-bit bus
    /// at even addresses, otherwise two byte cycles, high byte first.
    pub(crate) fn biu_read_u16(&mut self, seg: u16, offset: u16) -> u16 {
        self.mem_seg = seg;
        self.mem_addr = offset;
        self.biu_align_t1();
        if self.cpu_type.is_wide_bus() && (offset & 1) == 0 {
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Mem,
                out:  false,
                wide: true,
                high: false,
            });
            self.biu_begin_eu();
            self.biu_bus_wait_read_finish();
        }
        else {
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Mem,
                out:  false,
                wide: false,
                high: true,
            });
            self.biu_begin_eu();
            self.biu_bus_wait_read_finish();
            self.biu_restart_eu();
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Mem,
                out:  false,
                wide: false,
                high: false,
            });
            self.biu_bus_wait_read_finish();
        }
        let ret = self.mem_data;
        self.bus_request = None;
        ret
    }

    /// Write a byte through the BIU.
    pub(crate) fn biu_write_u8(&mut self, seg: u16, offset: u16, data: u8) {
        self.mem_seg = seg;
        self.mem_addr = offset;
        self.mem_data = data as u16;
        self.biu_align_t1();
        self.bus_request = Some(BusRequest {
            kind: BusRequestKind::Mem,
            out:  true,
            wide: false,
            high: false,
        });
        self.biu_begin_eu();
        self.biu_bus_wait_write_finish();
        self.bus_request = None;
    }

    /// Write a word through the BIU, split as biu_read_u16 describes.
    pub(crate) fn biu_write_u16(&mut self, seg: u16, offset: u16, data: u16) {
        self.mem_seg = seg;
        self.mem_addr = offset;
        self.mem_data = data;
        self.biu_align_t1();
        if self.cpu_type.is_wide_bus() && (offset & 1) == 0 {
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Mem,
                out:  true,
                wide: true,
                high: false,
            });
            self.biu_begin_eu();
            self.biu_bus_wait_write_finish();
        }
        else {
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Mem,
                out:  true,
                wide: false,
                high: true,
            });
            self.biu_begin_eu();
            self.biu_bus_wait_write_finish();
            self.cycle();
            self.biu_restart_eu();
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Mem,
                out:  true,
                wide: false,
                high: false,
            });
            self.biu_bus_wait_write_finish();
        }
        self.bus_request = None;
    }

    /// Perform an IN/OUT transfer of the given width against the
    /// accumulator, one or two full bus cycles.
    pub(crate) fn cpu_io(&mut self, bits: u32, out: bool, port: u16) {
        self.mem_addr = port;
        self.biu_align_t1();

        let wide_ok = self.cpu_type.is_wide_bus() && (port & 1) == 0;

        if bits == 16 && wide_ok {
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Io,
                out,
                wide: true,
                high: false,
            });
            self.biu_begin_eu();
            if out {
                self.biu_bus_wait_write_finish();
            }
            else {
                self.biu_bus_wait_read_finish();
            }
        }
        else if bits == 16 {
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Io,
                out,
                wide: false,
                high: false,
            });
            self.biu_begin_eu();
            if out {
                self.biu_bus_wait_write_finish();
                self.cycle();
            }
            else {
                self.biu_bus_wait_read_finish();
            }
            self.biu_restart_eu();
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Io,
                out,
                wide: false,
                high: true,
            });
            if out {
                self.biu_bus_wait_write_finish();
            }
            else {
                self.biu_bus_wait_read_finish();
            }
        }
        else {
            self.bus_request = Some(BusRequest {
                kind: BusRequestKind::Io,
                out,
                wide: false,
                high: false,
            });
            self.biu_begin_eu();
            if out {
                self.biu_bus_wait_write_finish();
            }
            else {
                self.biu_bus_wait_read_finish();
            }
        }

        self.bus_request = None;
    }

    /// One INTA bus cycle. Two of these make up the PIC acknowledge
    /// protocol; only the second carries the vector.
    pub(crate) fn biu_inta(&mut self) -> u8 {
        self.biu_align_t1();
        self.bus_request = Some(BusRequest {
            kind: BusRequestKind::Pic,
            out:  false,
            wide: false,
            high: false,
        });
        self.biu_begin_eu();
        self.biu_bus_wait_read_finish();
        self.bus_request = None;
        self.pic_data
    }

    // -- Queue reads ------------------------------------------------------

    /// Pop the queue head and commit a byte of program: the committed PC
    /// advances by exactly one.
    fn pfq_pop(&mut self) -> u8 {
        let byte = self.queue.pop();
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    /// When a pop makes room in a queue the BIU had parked on, restart
    /// the prefetcher.
    fn biu_fetch_on_queue_read(&mut self) {
        if self.biu_next_state == BiuState::Idle && self.queue.at_policy_len() {
            self.biu_switch_to_pf(0);
        }
    }

    /// Fetch one instruction byte: from the queue if it has one, else
    /// tick until the BIU delivers one. Costs one tick on top of any
    /// refill.
    pub(crate) fn q_read_u8(&mut self) -> u8 {
        let byte;

        if self.queue.len() > 0 {
            while self.biu_state == BiuState::Delay {
                self.cycle();
            }
            byte = self.pfq_pop();
            self.biu_fetch_on_queue_read();
        }
        else {
            let mut timeout = 0;
            while self.queue.len() == 0 {
                self.cycle();
                timeout += 1;
                if timeout == FETCH_TIMEOUT {
                    panic!("{}", CpuError::BiuDesync("prefetch never refilled", self.cs, self.pc));
                }
            }
            byte = self.pfq_pop();
        }

        self.cycle();
        byte
    }

    pub(crate) fn q_read_u16(&mut self) -> u16 {
        let lo = self.q_read_u8() as u16;
        let hi = self.q_read_u8() as u16;
        (hi << 8) | lo
    }

    /// Width-sensitive immediate fetch keyed by bit 0 of the opcode.
    pub(crate) fn q_read(&mut self) -> u16 {
        if self.wide() {
            self.q_read_u16()
        }
        else {
            self.q_read_u8() as u16
        }
    }

    // -- Suspend / resume / flush -----------------------------------------

    /// Suspend prefetching. A code fetch caught in flight completes its
    /// current bus cycle first; the EU-service and idle cases drop the
    /// phase counter straight back to T1.
    pub(crate) fn biu_fetch_suspend(&mut self) {
        self.biu_state_length = 0;
        self.fetch_suspended = true;

        if self.biu_state == BiuState::Prefetch {
            if self.cpu_type.is_nec() {
                self.bus_cycle = TCycle::T1;
            }
            else {
                self.biu_bus_wait_write_finish();
                self.cycle();
            }
        }
        else if self.biu_state == BiuState::Eu {
            self.bus_cycle = TCycle::T1;
        }

        self.biu_state = BiuState::Idle;
        self.biu_next_state = BiuState::Idle;
    }

    /// Suspend and drop the queue contents ahead of a control transfer.
    /// The queue program counter is reset when the transfer target is
    /// loaded (set_ip -> biu_queue_flush).
    pub(crate) fn pfq_clear(&mut self) {
        self.biu_fetch_suspend();
        self.queue.flush();
    }

    /// Empty the queue, point the fetch pointer at the committed PC and
    /// restart prefetching. A flush landing on an idle or suspended BIU
    /// pays the documented refill latency instead of fetching at once.
    pub(crate) fn biu_queue_flush(&mut self) {
        self.queue.flush();
        self.pfq_ip = self.pc;
        self.fetch_suspended = false;

        if matches!(self.biu_state, BiuState::Suspended | BiuState::Idle) {
            self.biu_resume(FLUSH_RESUME_DELAY);
        }
    }

    /// Commit a control transfer: load the PC and restart fetching at the
    /// target.
    pub(crate) fn set_ip(&mut self, new_ip: u16) {
        self.pc = new_ip;
        self.biu_queue_flush();
    }
}
