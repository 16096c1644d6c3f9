//! Out-of-band file transfer: control-port brokering plus the
//! auxiliary-port byte relay.

pub mod broker;
pub mod relay;
