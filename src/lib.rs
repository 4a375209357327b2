//! Bitwise context-mixing predictor for PAQ-family compressors.
//!
//! The predictor consumes the stream of already-coded bits and, before
//! each new bit, produces `p(next bit = 1)` as a 12-bit integer. An
//! arithmetic coder codes the bit with that probability and feeds the
//! actual bit back, which trains every model online:
//!
//! * a shared nonstationary bit-history state machine,
//! * a hash table of bit histories for the order 0-14 byte contexts,
//! * run models for three further orders,
//! * a scanline model for two-color bitmap data,
//! * a logistic mixer that combines all model votes with weights trained
//!   by gradient descent, and
//! * a stack of adaptive probability maps that refine the mixed output.
//!
//! ```
//! use paqmix::Predictor;
//!
//! let mut p = Predictor::new(5)?;
//! assert_eq!(p.p(), 2048); // even odds before the first bit
//! for bit in [0, 1, 1, 0, 1] {
//!     let _prob = p.p(); // hand this to the coder
//!     p.update(bit);     // then tell the model what the bit was
//! }
//! # Ok::<(), paqmix::ModelError>(())
//! ```
//!
//! One predictor instance models one stream and is driven by one thread;
//! independent instances never interact. All memory is allocated up
//! front, scaled by the level passed to [`Predictor::new`].

pub mod apm;
pub mod context_map;
mod context_model;
mod error;
pub mod hash_table;
pub mod logistic;
pub mod mixer;
mod pic_model;
mod predictor;
pub mod random;
pub mod run_map;
pub mod statemap;
pub mod stationary;
pub mod stream;
pub mod tables;

pub use crate::{error::ModelError, predictor::Predictor, stream::Stream};
