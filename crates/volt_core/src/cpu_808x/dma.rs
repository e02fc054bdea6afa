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

    cpu_808x::dma.rs

    DRAM refresh arbitration. Channel 0 of the DMA controller periodically
    steals the bus for a refresh read, inserting wait states the CPU has
    to eat. The handoff can only happen at points where the CPU is not
    driving the bus: an idle BIU, the back half of a bus cycle, or a wait
    state - and never while LOCK is asserted.

*/

use crate::cpu_808x::*;

/// Wait states imposed on the CPU by one refresh DMA transfer. This is
/// decremented on the same tick it is asserted, so it acts as 6.
const DMA_WAIT_STATES: u32 = 7;
/// Bus cycles the DMA controller holds the bus per transfer.
const DMA_OPERATING_LEN: u8 = 4;

impl Cpu {
    /// Evaluate the refresh arbiter for this tick. Runs before the BIU's
    /// own phase transition.
    pub(crate) fn run_dma_cycle(&mut self) {
        if !self.enable_wait_states || self.dram_refresh_period == 0 {
            return;
        }

        // Terminal count on the refresh timer raises the next request.
        self.dram_refresh_counter = self.dram_refresh_counter.saturating_sub(1);
        if self.dram_refresh_counter == 0 {
            self.dram_refresh_counter = self.dram_refresh_period;
            if self.dma_state == DmaState::Idle {
                self.dma_state = DmaState::Timer;
            }
        }

        let bus_available = (!matches!(self.biu_state, BiuState::Prefetch | BiuState::Eu)
            || matches!(self.bus_cycle, TCycle::T3 | TCycle::T4)
            || self.biu_wait)
            && !self.in_lock;

        match self.dma_state {
            DmaState::Idle => {}
            DmaState::Timer => {
                // Timer output rises slowly enough that DREQ lands a
                // tick after terminal count.
                self.dma_state = DmaState::Dreq;
            }
            DmaState::Dreq => {
                // Request latched by the DMA controller; HRQ next tick.
                self.dma_state = DmaState::Hrq;
            }
            DmaState::Hrq => {
                // Hold request waits for hold-acknowledge, which the
                // glue logic only grants at an arbitration point.
                if bus_available {
                    self.dma_state = DmaState::Holda;
                }
            }
            DmaState::Holda => {
                self.dma_state = DmaState::Operating(DMA_OPERATING_LEN);
            }
            DmaState::Operating(cycles) => {
                let cycles = cycles.saturating_sub(1);
                if cycles == 3 {
                    self.dma_wait_states = DMA_WAIT_STATES;
                    self.ready = false;
                }
                if cycles == 0 {
                    self.dma_state = DmaState::Idle;
                }
                else {
                    self.dma_state = DmaState::Operating(cycles);
                }
            }
        }
    }
}
