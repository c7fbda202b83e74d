pub mod aec;
pub mod bitreader;
pub mod consts;
pub mod decoder;
pub mod enums;
pub mod error;
pub mod frame;
pub mod headers;
pub mod idct;
pub mod intra;
pub mod inter;
pub mod loopfilter;
pub mod mb;
pub mod pipeline;
pub mod slice;
pub mod vlc;

pub use decoder::{Decoder, DecoderConfig, StreamInfo};
pub use error::{Error, Result};
