mod access;
mod config;
mod material;
mod persist;
mod plug;
mod rubble;
mod sandbox;
mod slab;

pub use access::*;
pub use config::*;
pub use material::*;
pub use persist::*;
pub use plug::*;
pub use rubble::*;
pub use sandbox::*;
pub use slab::*;
