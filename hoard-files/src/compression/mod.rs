use std::fmt::Debug;
use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

/// A byte-stream compressor used for compressed payload chunks and whole compressed
/// containers. The engine treats it as a black box.
pub trait Compressor: Debug {
    /// The extension a compressed container carries, without the dot.
    fn suffix(&self) -> &str;

    /// Decompresses all of `input` into `output`, returning the number of bytes written.
    fn decode(&self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<u64>;

    fn encode(&self, input: &[u8], sink: &mut dyn Write) -> io::Result<()>;
}

#[derive(Debug, Copy, Clone)]
pub struct ZlibCompressor {
    level: u32,
}

impl ZlibCompressor {
    pub fn new(level: u32) -> Self {
        ZlibCompressor { level: level.min(9) }
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        ZlibCompressor::new(6)
    }
}

impl Compressor for ZlibCompressor {
    fn suffix(&self) -> &str {
        "zlib"
    }

    fn decode(&self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<u64> {
        let mut decoder = ZlibDecoder::new(input);
        io::copy(&mut decoder, output)
    }

    fn encode(&self, input: &[u8], sink: &mut dyn Write) -> io::Result<()> {
        let mut encoder = ZlibEncoder::new(sink, Compression::new(self.level));
        encoder.write_all(input)?;
        encoder.finish()?;
        Ok(())
    }
}
