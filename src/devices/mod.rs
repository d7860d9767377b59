//! Household device model.

pub mod types;

pub use types::Device;
pub use types::DeviceKind;
