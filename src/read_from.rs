use std::io::{self, Read};
use byteorder::{ReadBytesExt, LE};

pub trait ReadFrom: Sized {
    fn read_from<R: Read + ?Sized>(r: &mut R) -> io::Result<Self>;
}

macro_rules! read_byteorder {
    ($($ty:ty, $read_one:ident;)*) => {
        $(
            impl ReadFrom for $ty {
                fn read_from<R: Read + ?Sized>(r: &mut R) -> io::Result<Self> {
                    r.$read_one::<LE>()
                }
            }
        )*
    };
}

read_byteorder! {
    u32, read_u32;
}

/// Four-byte tags (`glTF`, `JSON`, `BIN\0`) are read verbatim.
impl ReadFrom for [u8; 4] {
    fn read_from<R: Read + ?Sized>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0; 4];
        r.read_exact(&mut buf)?;
        Ok(buf)
    }
}


pub trait ReadExt: Read {
    fn read_one<T: ReadFrom>(&mut self) -> io::Result<T> {
        T::read_from(self)
    }

    /// Read exactly `len` bytes into a fresh buffer.
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read + ?Sized> ReadExt for R {}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_little_endian_words_and_tags() {
        let mut r = Cursor::new(b"glTF\x02\x00\x00\x00\x34\x12\x00\x00".to_vec());
        assert_eq!(r.read_one::<[u8; 4]>().unwrap(), *b"glTF");
        assert_eq!(r.read_one::<u32>().unwrap(), 2);
        assert_eq!(r.read_one::<u32>().unwrap(), 0x1234);
    }

    #[test]
    fn short_input_is_an_eof_error() {
        let mut r = Cursor::new(vec![1, 2]);
        let err = r.read_one::<u32>().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let mut r = Cursor::new(vec![1, 2]);
        assert!(r.read_bytes(3).is_err());
    }
}
