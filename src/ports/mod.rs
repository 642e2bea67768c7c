//! Port traits: the narrow interfaces between the decision core and the
//! outside world.

pub mod config_port;
pub mod data_port;
pub mod order_port;
pub mod snapshot_port;
