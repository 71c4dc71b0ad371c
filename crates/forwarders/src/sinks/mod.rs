//! Built-in forwarders

mod console;
mod file;
mod tcp;
mod udp;

pub use console::ConsoleForwarder;
pub use file::FileForwarder;
pub use tcp::TcpServerForwarder;
pub use udp::UdpForwarder;
