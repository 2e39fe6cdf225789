//! Binary glTF (GLB) container.
//!
//! A GLB file is a 12-byte header followed by a `JSON` chunk and an optional
//! `BIN` chunk. All words are little-endian and chunks are 4-byte aligned.

use std::io::{self, Cursor, Write};
use byteorder::{WriteBytesExt, LE};
use crate::error::{Error, Result};
use crate::read_from::{ReadFrom, ReadExt};

pub const MAGIC: [u8; 4] = *b"glTF";
pub const VERSION: u32 = 2;
pub const CHUNK_JSON: [u8; 4] = *b"JSON";
pub const CHUNK_BIN: [u8; 4] = *b"BIN\0";

const HEADER_SIZE: usize = 12;
const CHUNK_HEADER_SIZE: usize = 8;


pub struct GlbHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub length: u32,
}

impl ReadFrom for GlbHeader {
    fn read_from<R: io::Read + ?Sized>(r: &mut R) -> io::Result<Self> {
        Ok(GlbHeader {
            magic: r.read_one()?,
            version: r.read_one()?,
            length: r.read_one()?,
        })
    }
}

pub struct ChunkHeader {
    pub length: u32,
    pub kind: [u8; 4],
}

impl ReadFrom for ChunkHeader {
    fn read_from<R: io::Read + ?Sized>(r: &mut R) -> io::Result<Self> {
        Ok(ChunkHeader {
            length: r.read_one()?,
            kind: r.read_one()?,
        })
    }
}


/// Returns `true` if `bytes` starts with the GLB magic.
pub fn is_glb(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == MAGIC
}


/// The two payloads of a GLB file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Glb {
    pub json: Vec<u8>,
    pub bin: Option<Vec<u8>>,
}

impl Glb {
    pub fn from_slice(bytes: &[u8]) -> Result<Glb> {
        let mut r = Cursor::new(bytes);
        let header = r.read_one::<GlbHeader>().map_err(truncated)?;
        if header.magic != MAGIC {
            return Err(Error::Container("bad magic".into()));
        }
        if header.version != VERSION {
            return Err(Error::Container(format!("unsupported version {}", header.version)));
        }
        let total = header.length as usize;
        if total > bytes.len() {
            return Err(Error::Container(format!(
                "header declares {} bytes, but file has {}", total, bytes.len())));
        }
        let mut r = Cursor::new(&bytes[..total]);
        r.set_position(HEADER_SIZE as u64);

        let mut json = None;
        let mut bin = None;
        while (r.position() as usize) < total {
            let chunk = r.read_one::<ChunkHeader>().map_err(truncated)?;
            let remaining = total - r.position() as usize;
            if chunk.length as usize > remaining {
                return Err(Error::Container(format!(
                    "chunk declares {} bytes, but only {} remain", chunk.length, remaining)));
            }
            let data = r.read_bytes(chunk.length as usize).map_err(truncated)?;
            match chunk.kind {
                CHUNK_JSON if json.is_none() => json = Some(data),
                CHUNK_BIN if json.is_some() && bin.is_none() => bin = Some(data),
                _ if json.is_none() => {
                    return Err(Error::Container("first chunk is not JSON".into()));
                },
                // Unknown chunk types are skipped.
                _ => {},
            }
        }

        match json {
            Some(json) => Ok(Glb { json, bin }),
            None => Err(Error::Container("missing JSON chunk".into())),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let json_len = padded(self.json.len());
        let bin_len = self.bin.as_ref().map(|b| padded(b.len()));
        let total = HEADER_SIZE
            + CHUNK_HEADER_SIZE + json_len
            + bin_len.map_or(0, |l| CHUNK_HEADER_SIZE + l);

        let mut out = Vec::with_capacity(total);
        self.write_to(&mut out, total, json_len, bin_len)
            .expect("writing into a Vec cannot fail");
        out
    }

    fn write_to<W: Write>(
        &self,
        w: &mut W,
        total: usize,
        json_len: usize,
        bin_len: Option<usize>,
    ) -> io::Result<()> {
        // File header
        w.write_all(&MAGIC)?;
        w.write_u32::<LE>(VERSION)?;
        w.write_u32::<LE>(total as u32)?;

        // JSON chunk, space padded
        w.write_u32::<LE>(json_len as u32)?;
        w.write_all(&CHUNK_JSON)?;
        w.write_all(&self.json)?;
        for _ in self.json.len() .. json_len {
            w.write_u8(b' ')?;
        }

        // Binary chunk, zero padded
        if let (Some(bin), Some(bin_len)) = (&self.bin, bin_len) {
            w.write_u32::<LE>(bin_len as u32)?;
            w.write_all(&CHUNK_BIN)?;
            w.write_all(bin)?;
            for _ in bin.len() .. bin_len {
                w.write_u8(0)?;
            }
        }
        Ok(())
    }
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

fn truncated(e: io::Error) -> Error {
    Error::Container(format!("truncated: {}", e))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_aligned_chunks() {
        let glb = Glb {
            json: b"{\"a\":1}".to_vec(),
            bin: Some(vec![1, 2, 3, 4, 5]),
        };
        let bytes = glb.to_vec();
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(&bytes[..4], b"glTF");
        assert_eq!(u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize, bytes.len());
        // JSON chunk: 7 bytes of payload padded to 8 with a space.
        assert_eq!(&bytes[12..16], &8u32.to_le_bytes());
        assert_eq!(&bytes[16..20], b"JSON");
        assert_eq!(bytes[27], b' ');
        // BIN chunk: 5 bytes padded to 8 with zeros.
        assert_eq!(&bytes[28..32], &8u32.to_le_bytes());
        assert_eq!(&bytes[32..36], b"BIN\0");
        assert_eq!(&bytes[36..44], &[1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn reads_back_what_it_writes() {
        let glb = Glb {
            json: b"{}".to_vec(),
            bin: Some(vec![9; 8]),
        };
        let back = Glb::from_slice(&glb.to_vec()).unwrap();
        assert_eq!(back.json, b"{}  ");
        assert_eq!(back.bin, Some(vec![9; 8]));

        let no_bin = Glb { json: b"{}  ".to_vec(), bin: None };
        assert_eq!(Glb::from_slice(&no_bin.to_vec()).unwrap(), no_bin);
    }

    #[test]
    fn skips_unknown_chunks() {
        let mut bytes = Glb { json: b"{}  ".to_vec(), bin: None }.to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(b"XTRA");
        bytes.extend_from_slice(&[0; 4]);
        let total = bytes.len() as u32;
        bytes[8..12].copy_from_slice(&total.to_le_bytes());

        let glb = Glb::from_slice(&bytes).unwrap();
        assert_eq!(glb.json, b"{}  ");
        assert_eq!(glb.bin, None);
    }

    #[test]
    fn rejects_broken_containers() {
        assert!(Glb::from_slice(b"glTF").is_err());
        assert!(Glb::from_slice(b"nope\x02\x00\x00\x00\x0c\x00\x00\x00").is_err());

        let mut bytes = Glb { json: b"{}  ".to_vec(), bin: None }.to_vec();
        bytes[4] = 1;
        assert!(Glb::from_slice(&bytes).is_err());

        // Declared length larger than the file.
        let mut bytes = Glb { json: b"{}  ".to_vec(), bin: None }.to_vec();
        bytes[8] = 0xff;
        assert!(Glb::from_slice(&bytes).is_err());

        // Header only, no JSON chunk.
        let mut bytes = b"glTF".to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&12u32.to_le_bytes());
        assert!(matches!(Glb::from_slice(&bytes), Err(Error::Container(_))));
    }

    #[test]
    fn detects_magic() {
        assert!(is_glb(b"glTF\x02\x00"));
        assert!(!is_glb(b"{\"asset\":{}}"));
        assert!(!is_glb(b"gl"));
    }
}
