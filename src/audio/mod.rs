pub mod decode;

pub use decode::{decode_file, Waveform};
