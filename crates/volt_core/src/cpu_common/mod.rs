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

    cpu_common::mod.rs

    Types shared between CPU implementations.

*/

use strum_macros::Display;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display)]
pub enum CpuType {
    #[default]
    Intel8088,
    Intel8086,
    NecV20,
}

impl CpuType {
    /// Prefetch queue capacity: 4 bytes on the narrow-bus parts,
    /// 6 bytes on the 8086.
    #[inline]
    pub fn queue_size(&self) -> usize {
        match self {
            CpuType::Intel8086 => 6,
            _ => 4,
        }
    }

    /// The 8086 fetches code 16 bits at a time from even addresses.
    #[inline]
    pub fn is_wide_bus(&self) -> bool {
        matches!(self, CpuType::Intel8086)
    }

    #[inline]
    pub fn is_nec(&self) -> bool {
        matches!(self, CpuType::NecV20)
    }
}

/// Runtime-adjustable core options, applied via Cpu::set_option().
#[derive(Copy, Clone, Debug)]
pub enum CpuOption {
    /// Honor device wait states and DMA wait states. Off makes every
    /// bus cycle exactly four ticks.
    EnableWaitStates(bool),
    /// Simulate the periodic DRAM refresh DMA with the given tick period
    /// (0 disables).
    DramRefresh(u32),
}
