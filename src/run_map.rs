use crate::{hash_table::Bh, mixer::Mixer, stream::Stream, tables::ilog};

// Run Context Map ---------------------------------------------------------------------------------------------------- Run Context Map

/// Tracks the byte last seen in a context and how many times in a row it
/// has repeated. One slot per whole-byte context: `[count, byte]` behind
/// the checksum and priority, with the count doubling as the priority.
pub struct RunContextMap {
    t: Bh<4>,
    cp: usize, // Offset of the count byte of the current slot
}

impl RunContextMap {
    /// `m` is the memory budget in bytes, a power of two.
    pub fn new(m: usize) -> RunContextMap {
        let mut t = Bh::new(m / 4);
        let cp = t.get(0) + 2;
        RunContextMap { t, cp }
    }

    /// Fold the byte just completed into the current run, then move to
    /// context `cx`. Call before the first bit of each byte.
    pub fn set(&mut self, cx: u32, s: &Stream) {
        let c1 = s.buf(1) as u8;
        if self.t[self.cp] == 0 || self.t[self.cp + 1] != c1 {
            self.t[self.cp] = 1;
            self.t[self.cp + 1] = c1;
        } else if self.t[self.cp] < 255 {
            self.t[self.cp] += 1;
        }
        self.cp = self.t.get(cx) + 2;
    }

    /// Vote for the remembered byte while the partial byte still agrees
    /// with it; longer runs vote louder.
    pub fn p(&self, s: &Stream) -> i32 {
        let b = self.t[self.cp + 1] as u32;
        if (b + 256) >> (8 - s.bpos) == s.c0 {
            let sign = ((b >> (7 - s.bpos)) & 1) as i32 * 2 - 1;
            sign * ilog(self.t[self.cp] as u16 + 1) * 8
        } else {
            0
        }
    }

    /// Returns whether the current context has any history.
    pub fn mix(&mut self, m: &mut Mixer, s: &Stream) -> bool {
        m.add(self.p(s));
        self.t[self.cp] != 0
    }
}
