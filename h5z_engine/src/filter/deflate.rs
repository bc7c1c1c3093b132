use std::io::{Cursor, Read};

use flate2::bufread::{ZlibDecoder, ZlibEncoder};

/// zlib compression.
#[derive(Clone, Debug)]
pub(super) struct DeflateFilter {
    level: u32,
}

impl DeflateFilter {
    pub(super) fn new(level: u32) -> Self {
        Self { level }
    }

    pub(super) fn encode(&self, decoded: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut encoder = ZlibEncoder::new(
            Cursor::new(decoded),
            flate2::Compression::new(self.level.min(9)),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    pub(super) fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut decoder = ZlibDecoder::new(Cursor::new(encoded));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate() {
        let filter = DeflateFilter::new(6);
        let decoded: Vec<u8> = (0..4096u32).map(|i| (i % 7) as u8).collect();
        let encoded = filter.encode(&decoded).unwrap();
        assert!(encoded.len() < decoded.len());
        assert_eq!(filter.decode(&encoded).unwrap(), decoded);
        assert!(filter.decode(&[1, 2, 3]).is_err());
    }
}
