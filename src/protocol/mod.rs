/// RESP2 wire protocol: frame codec, command builder and reply conversions
pub mod command;
pub mod reply;
pub mod resp;

pub use command::Command;
pub use resp::{RespEncoder, RespParseError, RespParser, RespValue};
