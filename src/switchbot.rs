mod client;
mod command;
mod device;

pub use client::*;
pub use command::*;
pub use device::*;
