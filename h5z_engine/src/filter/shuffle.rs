/// Byte transposition: the `i`th byte of every element is stored contiguously.
///
/// Trailing bytes which do not form a whole element are left in place.
#[derive(Clone, Debug)]
pub(super) struct ShuffleFilter {
    element_size: usize,
}

impl ShuffleFilter {
    pub(super) fn new(element_size: usize) -> Self {
        Self {
            element_size: element_size.max(1),
        }
    }

    pub(super) fn encode(&self, decoded: &[u8]) -> Vec<u8> {
        let mut encoded = decoded.to_vec();
        let count = decoded.len() / self.element_size;
        for i in 0..count {
            let offset = i * self.element_size;
            for byte_index in 0..self.element_size {
                encoded[byte_index * count + i] = decoded[offset + byte_index];
            }
        }
        encoded
    }

    pub(super) fn decode(&self, encoded: &[u8]) -> Vec<u8> {
        let mut decoded = encoded.to_vec();
        let count = encoded.len() / self.element_size;
        for byte_index in 0..self.element_size {
            let offset = byte_index * count;
            for i in 0..count {
                decoded[i * self.element_size + byte_index] = encoded[offset + i];
            }
        }
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle() {
        let filter = ShuffleFilter::new(4);
        let decoded: Vec<u8> = (0..14).collect();
        let encoded = filter.encode(&decoded);
        assert_eq!(
            encoded,
            vec![0, 4, 8, 1, 5, 9, 2, 6, 10, 3, 7, 11, 12, 13]
        );
        assert_eq!(filter.decode(&encoded), decoded);
    }
}
