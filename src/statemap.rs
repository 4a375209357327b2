use crate::tables::nex;

// State Map ---------------------------------------------------------------------------------------------------------------- State Map

/// Maps a bit-history state (0-255) to an adaptive probability. The map is
/// trained lazily: each call first adjusts the entry returned by the
/// previous call toward the bit that actually arrived, then reads the new
/// context. Entries are probabilities scaled by 64K.
#[derive(Clone)]
pub struct StateMap {
    cxt: usize,  // Context of last prediction
    t: Vec<u16>, // State -> probability * 64K
}

impl StateMap {
    pub fn new() -> StateMap {
        let mut t = vec![0u16; 256];
        for (i, e) in t.iter_mut().enumerate() {
            let mut n0 = nex(i as u8, 2) as u32;
            let mut n1 = nex(i as u8, 3) as u32;
            // A one-sided state is worth far more than its raw count
            if n0 == 0 {
                n1 *= 64;
            }
            if n1 == 0 {
                n0 *= 64;
            }
            *e = (65536 * (n1 + 1) / (n0 + n1 + 2)) as u16;
        }
        StateMap { cxt: 0, t }
    }

    /// Train the previous state with `bit`, then return the probability
    /// for state `cx` scaled to 12 bits.
    pub fn p(&mut self, bit: i32, cx: usize) -> i32 {
        debug_assert!(bit == 0 || bit == 1);
        debug_assert!(cx < self.t.len());
        let prev = self.t[self.cxt] as i32;
        self.t[self.cxt] = (prev + (((bit << 16) - prev + 128) >> 8)) as u16;
        self.cxt = cx;
        (self.t[cx] >> 4) as i32
    }
}

impl Default for StateMap {
    fn default() -> StateMap {
        StateMap::new()
    }
}
