//! Compressed spectrum packets: wire format, encoder, decoder

pub mod decoder;
pub mod encoder;
pub mod stats;

pub use decoder::{Frame, PacketDecoder, Reconstructor};
pub use encoder::{PacketEncoder, ENTRY_SIZE, FIELD_SIZE, PACKET_END, PACKET_END_BYTES};
pub use stats::CompressionStats;
