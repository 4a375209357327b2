use std::iter::repeat;

use crate::logistic::{squash, stretch};

// Adaptive Probability Map -------------------------------------------------------------------------------------- Adaptive Probability Map

/// Refines a probability given a context. Each context owns a row of 33
/// anchor points on the stretched scale; a prediction is interpolated
/// between the two nearest anchors, and the anchors used for the previous
/// prediction are trained toward the bit that actually arrived.
pub struct Apm {
    bin: usize,       // Anchor pair used for the last prediction
    num_cxts: usize,  // Number of context rows
    bin_map: Vec<u16>, // num_cxts rows of 33 squashed 16-bit anchors
}

impl Apm {
    pub fn new(n: usize) -> Apm {
        Apm {
            bin: 0,
            num_cxts: n,
            bin_map: repeat(
                     (0..33).map(|i| (squash((i - 16) * 128) * 16) as u16)
                     .collect::<Vec<u16>>().into_iter())
                     .take(n)
                     .flatten()
                     .collect::<Vec<u16>>(),
        }
    }

    /// Train the anchors of the previous call with `bit`, then map `pr`
    /// through the row selected by `cxt`. `rate` trades adaptation speed
    /// for smoothness; smaller is faster.
    pub fn p(&mut self, bit: i32, rate: i32, pr: i32, cxt: u32) -> i32 {
        debug_assert!(bit == 0 || bit == 1);
        debug_assert!(rate > 0 && rate < 32);
        debug_assert!(pr >= 0 && pr < 4096);
        debug_assert!((cxt as usize) < self.num_cxts);
        self.update(bit, rate);

        let d = stretch(pr);
        let w = d & 127; // Interpolation weight (33 points)
        self.bin = (((d + 2048) >> 7) + (cxt as i32) * 33) as usize;

        let l = self.bin_map[self.bin] as i32;
        let u = self.bin_map[self.bin + 1] as i32;
        (l * (128 - w) + u * w) >> 11
    }

    fn update(&mut self, bit: i32, rate: i32) {
        // Direction of the pull: toward 64K for a 1, toward 0 for a 0
        let g = (bit << 16) + (bit << rate) - bit - bit;
        let l = self.bin_map[self.bin] as i32;
        let u = self.bin_map[self.bin + 1] as i32;
        self.bin_map[self.bin] = (l + ((g - l) >> rate)) as u16;
        self.bin_map[self.bin + 1] = (u + ((g - u) >> rate)) as u16;
    }
}
