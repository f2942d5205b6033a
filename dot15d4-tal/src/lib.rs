#![no_std]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
pub(crate) mod utils;

pub use dot15d4_tal_frame as frame;

pub mod buffer;
pub mod config;
pub mod constants;
mod error;
pub mod pib;
pub mod qmm;
mod shared;
mod tal;
pub mod time;
pub mod timer;
pub mod trx;
mod upper;

pub use error::{Error, Fault, TxStatus};
pub use pib::{PibAttribute, PibId};
pub use shared::SharedTal;
pub use tal::{CsmaMode, CsmaState, SwCsmaState, Tal, TalState, TalStats, RX_BUFFER_SIZE};
pub use timer::{Timeout, Timer, TimerId};
pub use upper::{RxFrame, TxFrame, UpperLayer};
