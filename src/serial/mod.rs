pub mod discovery;
pub mod fake;
pub mod protocol;
pub mod transport;

pub use discovery::{candidate_ports, select_port};
pub use protocol::format_record;
pub use transport::{SerialTransport, Transport, TransportState};
