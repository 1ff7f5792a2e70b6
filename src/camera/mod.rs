// Camera domain: frame source contract, simulated device and frame types.

pub mod backend;
pub mod dummy;
pub mod error;
pub mod types;
