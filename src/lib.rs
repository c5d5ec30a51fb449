//! Static device descriptions of the RoomSensor KNX sensor node.
//!
//! Each [`schema::DeviceSchema`] lists the communication objects the bus stack addresses by
//! index and the parameters the provisioning stack stores in configuration memory.

pub mod commands;
pub mod datatypes;
pub mod devices;
pub mod output;
pub mod param_image;
pub mod schema;
