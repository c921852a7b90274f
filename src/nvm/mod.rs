pub mod builder;
pub mod bus;
mod bulk;
mod cache;
pub mod controller;
pub mod driver;
pub mod error;
pub mod helpers;
mod programmer;
pub mod types;
mod window;

#[cfg(test)]
mod test_support;

pub use builder::BufferedNvmBuilder;
pub use bus::{BusArbiter, NoBusArbiter};
pub use controller::{Command, NvmController};
pub use driver::BufferedNvm;
pub use error::{HardwareFault, NvmError};
pub use types::{Dest, EraseMode, NvmRegion, Src};

pub mod prelude {
    pub use super::{
        BufferedNvm, BufferedNvmBuilder, BusArbiter, Command, Dest, EraseMode, HardwareFault,
        NoBusArbiter, NvmController, NvmError, NvmRegion, Src,
    };
}
