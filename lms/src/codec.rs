//! Big-endian cursor used by the nested decoders.

use crate::error::DecodeError;

#[derive(Debug)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reads the leading typecode; an input shorter than 4 bytes carries none.
    pub(crate) fn typecode(&mut self) -> Result<u32, DecodeError> {
        self.u32().map_err(|_| DecodeError::NoAlgorithm)
    }

    pub(crate) fn peek_u32(&self) -> Result<u32, DecodeError> {
        let head = self.buf.get(..4).ok_or(DecodeError::TooShort)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(head);
        Ok(u32::from_be_bytes(word))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, DecodeError> {
        let v = self.peek_u32()?;
        self.buf = &self.buf[4..];
        Ok(v)
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() < n {
            return Err(DecodeError::TooShort);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    /// Fails if trailing bytes remain.
    pub(crate) fn finish(self) -> Result<(), DecodeError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TooLong)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_order() {
        let data = [0, 0, 0, 5, 0xaa, 0xbb, 0xcc];
        let mut r = Reader::new(&data);
        assert_eq!(r.u32(), Ok(5));
        assert_eq!(r.array::<2>(), Ok([0xaa, 0xbb]));
        assert!(!r.is_empty());
        assert_eq!(r.bytes(2), Err(DecodeError::TooShort));
        assert_eq!(r.finish(), Err(DecodeError::TooLong));
    }

    #[test]
    fn missing_typecode() {
        let mut r = Reader::new(&[0, 1]);
        assert_eq!(r.typecode(), Err(DecodeError::NoAlgorithm));
    }
}
