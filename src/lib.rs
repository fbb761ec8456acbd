extern crate csv;
extern crate failure;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate ord_subset;
extern crate ordered_float;
extern crate rand;
extern crate rayon;
#[macro_use]
extern crate serde_derive;

mod data;
mod error;
mod evaluate;
mod gbt;
mod losses;
mod math;
mod matrix;
mod preprocess;
mod report;
mod rf;
mod split;
mod table;
mod tree;
mod tree_bin;
mod tree_direct;

pub use crate::data::*;
pub use crate::error::*;
pub use crate::evaluate::*;
pub use crate::gbt::*;
pub use crate::losses::*;
pub use crate::math::*;
pub use crate::matrix::*;
pub use crate::preprocess::*;
pub use crate::report::*;
pub use crate::rf::*;
pub use crate::split::*;
pub use crate::table::*;
pub use crate::tree::*;

pub static TARGET_COL: &str = "target";
pub static DEFAULT_WEIGHT_COL: &str = "w";
pub static DEFAULT_TEST_SIZE: f64 = 0.2;
pub static DEFAULT_SEED: u64 = 42;

pub(crate) static DEFAULT_GAMMA: f64 = 0.;
pub(crate) static DEFAULT_LAMBDA: f64 = 1.;
pub(crate) static DEFAULT_MIN_CHILD_WEIGHT: f64 = 1.;
pub(crate) static DEFAULT_LEARNING_RATE: f64 = 0.1;
pub(crate) static DEFAULT_MAX_DEPTH: usize = 6;
pub(crate) static DEFAULT_N_ROUNDS: usize = 100;
pub(crate) static DEFAULT_N_BINS: usize = 256;
pub(crate) static DEFAULT_N_TREES: usize = 100;
