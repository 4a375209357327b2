use crate::{logistic::stretch, mixer::Mixer, stream::Stream};

// Small Stationary Context Map ---------------------------------------------------------------------------- Small Stationary Context Map

/// Direct-lookup map from a small context and the partial byte to a
/// 16-bit probability, adjusted after every prediction. Best for contexts
/// whose statistics do not drift, where a plain running probability beats
/// a bit-history state.
pub struct SmallStationaryContextMap {
    t: Vec<u16>,
    cxt: usize, // Row of the current whole-byte context
    cp: usize,  // Cell behind the last prediction
}

impl SmallStationaryContextMap {
    /// `m` is the memory budget in bytes, a power of two; contexts above
    /// `m / 512` are masked off.
    pub fn new(m: usize) -> SmallStationaryContextMap {
        assert!((m / 2).is_power_of_two());
        SmallStationaryContextMap {
            t: vec![32768; m / 2],
            cxt: 0,
            cp: 0,
        }
    }

    pub fn set(&mut self, cx: u32) {
        self.cxt = (cx as usize * 256) & (self.t.len() - 256);
    }

    pub fn mix(&mut self, m: &mut Mixer, s: &Stream, bit: i32, rate: i32) {
        let p = self.t[self.cp] as i32;
        self.t[self.cp] = (p + (((bit << 16) - p + (1 << (rate - 1))) >> rate)) as u16;
        self.cp = self.cxt + s.c0 as usize;
        m.add(stretch((self.t[self.cp] >> 4) as i32));
    }
}
