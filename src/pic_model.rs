use crate::{
    logistic::stretch,
    mixer::Mixer,
    statemap::StateMap,
    stream::Stream,
    tables::nex,
};

// Pic Model ---------------------------------------------------------------------------------------------------------------- Pic Model

/// Models a 1728 by 2376 two-color bitmap image, scanned left to right,
/// MSB first (216 bytes per row). Three contexts are built from the
/// pixels surrounding the predicted one in the last four scanlines.
pub struct PicModel {
    r0: u32, // Last 4 rows of pixels, bit 8 over the current one
    r1: u32,
    r2: u32,
    r3: u32,
    t: Vec<u8>,      // Context -> bit history state
    cxt: [usize; 3],
    sm: Vec<StateMap>,
}

impl PicModel {
    pub fn new() -> PicModel {
        PicModel {
            r0: 0,
            r1: 0,
            r2: 0,
            r3: 0,
            t: vec![0; 0x10200],
            cxt: [0; 3],
            sm: vec![StateMap::new(); 3],
        }
    }

    pub fn mix(&mut self, m: &mut Mixer, s: &Stream, bit: i32) {
        // Advance the states under the contexts of the previous bit
        for &cx in self.cxt.iter() {
            self.t[cx] = nex(self.t[cx], bit as usize);
        }

        // Shift in the current pixel column of the last 4 rows
        self.r0 = (self.r0 << 1) + bit as u32;
        self.r1 = (self.r1 << 1) + ((s.buf(215) >> (7 - s.bpos)) & 1);
        self.r2 = (self.r2 << 1) + ((s.buf(431) >> (7 - s.bpos)) & 1);
        self.r3 = (self.r3 << 1) + ((s.buf(647) >> (7 - s.bpos)) & 1);
        self.cxt[0] = ((self.r0 & 0x7) | (self.r1 >> 4) & 0x38 | (self.r2 >> 3) & 0xc0) as usize;
        self.cxt[1] = 0x100
            + ((self.r0 & 1)
                | (self.r1 >> 4) & 0x3e
                | (self.r2 >> 2) & 0x40
                | (self.r3 >> 1) & 0x80) as usize;
        self.cxt[2] = 0x200
            + ((self.r0 & 0x3f)
                ^ (self.r1 & 0x3ffe)
                ^ (self.r2 << 2) & 0x7f00
                ^ (self.r3 << 5) & 0xf800) as usize;

        // Predict
        for i in 0..3 {
            let state = self.t[self.cxt[i]];
            m.add(stretch(self.sm[i].p(bit, state as usize)));
        }
    }
}

impl Default for PicModel {
    fn default() -> PicModel {
        PicModel::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_an_all_white_page() {
        let mut pic = PicModel::new();
        let mut s = Stream::new();
        let mut m = Mixer::new(8, 1, 1, 0);
        let mut p = 2048;
        // Four blank scanlines: the surrounding-pixel contexts settle and
        // the mixed prediction follows them toward zero.
        for _ in 0..216 * 4 * 8 {
            s.update(0);
            m.update(0);
            pic.mix(&mut m, &s, 0);
            m.set(0, 1);
            p = m.p(0);
        }
        assert!(p < 1024);
    }

    #[test]
    fn noisy_input_stays_in_bounds() {
        let mut pic = PicModel::new();
        let mut s = Stream::new();
        let mut m = Mixer::new(8, 1, 1, 0);
        let mut rnd = crate::random::Random::new();
        for _ in 0..5000 {
            let bit = (rnd.next() & 1) as i32;
            s.update(bit);
            m.update(bit);
            pic.mix(&mut m, &s, bit);
            m.set(0, 1);
            let p = m.p(bit);
            assert!((0..4096).contains(&p));
        }
    }
}
