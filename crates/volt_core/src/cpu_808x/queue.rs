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

    cpu_808x::queue.rs

    Implements the data structure for the processor instruction queue.

*/

pub const QUEUE_MAX: usize = 6;

pub struct PrefetchQueue {
    size: usize,
    len: usize,
    back: usize,
    front: usize,
    q: [u8; QUEUE_MAX],
}

impl Default for PrefetchQueue {
    fn default() -> Self {
        Self {
            size: QUEUE_MAX,
            len: 0,
            back: 0,
            front: 0,
            q: [0; QUEUE_MAX],
        }
    }
}

impl PrefetchQueue {
    pub fn new(size: usize) -> Self {
        assert!(size <= QUEUE_MAX);
        Self {
            size,
            ..Self::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.size
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fill level at which the prefetcher takes its post-access breather:
    /// one byte short of full.
    #[inline]
    pub fn policy_len(&self) -> usize {
        self.size - 1
    }

    #[inline]
    pub fn at_policy_len(&self) -> bool {
        self.len == self.policy_len()
    }

    #[inline]
    pub fn has_room(&self) -> bool {
        self.len < self.size
    }

    pub fn push8(&mut self, byte: u8) {
        if self.len < self.size {
            self.q[self.front] = byte;
            self.front = (self.front + 1) % self.size;
            self.len += 1;
        }
        else {
            panic!("Queue overrun!");
        }
    }

    pub fn push16(&mut self, word: u16) {
        self.push8((word & 0xFF) as u8);
        self.push8(((word >> 8) & 0xFF) as u8);
    }

    pub fn pop(&mut self) -> u8 {
        if self.len > 0 {
            let byte = self.q[self.back];
            self.back = (self.back + 1) % self.size;
            self.len -= 1;
            return byte;
        }
        panic!("Queue underrun!");
    }

    /// Reset the queue to an empty state.
    pub fn flush(&mut self) {
        self.len = 0;
        self.back = 0;
        self.front = 0;
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.len);
        for i in 0..self.len {
            v.push(self.q[(self.back + i) % self.size]);
        }
        v
    }

    pub fn load(&mut self, bytes: &[u8]) {
        self.flush();
        for &b in bytes.iter().take(self.size) {
            self.push8(b);
        }
    }

    /// Contents of the queue as a hexadecimal string, head first.
    pub fn to_string(&self) -> String {
        let mut base_str = "".to_string();
        for i in 0..self.len {
            base_str.push_str(&format!("{:02X}", self.q[(self.back + i) % self.size]));
        }
        base_str
    }
}
