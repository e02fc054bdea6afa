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

    bus.rs

    The interface the CPU core uses to reach the rest of the machine.
    The core owns bus *timing*; the implementor owns bus *contents*.

*/

/// Callbacks the CPU uses for memory, port IO and interrupt acknowledge.
///
/// Addresses are 20-bit linear addresses; the core has already applied
/// segmentation. All accesses happen on the T-state the real part would
/// have driven them, so implementations may count accesses for their own
/// device timing.
///
/// The wait-state hooks report how many extra T3 repetitions the
/// addressed device requires. They are consulted once per bus cycle,
/// at the point the transfer is performed.
pub trait BusInterface {
    fn read_u8(&mut self, addr: u32) -> u8;
    fn write_u8(&mut self, addr: u32, data: u8);

    /// Single-cycle word fetch used by the 16-bit bus variant for even
    /// addresses. The default splits into two byte reads.
    fn read_u16(&mut self, addr: u32) -> u16 {
        let lo = self.read_u8(addr) as u16;
        let hi = self.read_u8(addr.wrapping_add(1) & 0xFFFFF) as u16;
        (hi << 8) | lo
    }

    fn write_u16(&mut self, addr: u32, data: u16) {
        self.write_u8(addr, (data & 0xFF) as u8);
        self.write_u8(addr.wrapping_add(1) & 0xFFFFF, (data >> 8) as u8);
    }

    fn io_read_u8(&mut self, port: u16) -> u8;
    fn io_write_u8(&mut self, port: u16, data: u8);

    /// Single-cycle word IO used by the 16-bit bus variant for even
    /// ports. The defaults split into two byte transfers.
    fn io_read_u16(&mut self, port: u16) -> u16 {
        let lo = self.io_read_u8(port) as u16;
        let hi = self.io_read_u8(port.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    fn io_write_u16(&mut self, port: u16, data: u16) {
        self.io_write_u8(port, (data & 0xFF) as u8);
        self.io_write_u8(port.wrapping_add(1), (data >> 8) as u8);
    }

    /// Answer one INTA bus cycle. Called twice per acknowledged
    /// interrupt: the first cycle is address-only (the PIC freezes its
    /// request state), the second must return the vector number.
    fn irq_ack(&mut self) -> u8;

    fn read_wait(&self, _addr: u32) -> u32 {
        0
    }
    fn write_wait(&self, _addr: u32) -> u32 {
        0
    }
    fn io_wait(&self, _port: u16) -> u32 {
        0
    }
}
