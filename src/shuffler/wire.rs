//! Shuffler wire format (spec.md §6, bit-exact): handshake plus a tagged
//! frame format, all multi-byte integers big-endian. Mirrors the teacher's
//! `processors/common/tcp.rs` length-prefixed framing
//! (`write_all(&len.to_be_bytes())` then payload), generalized from one
//! point-to-point connection to N-1 peer connections.

use std::io::{Read, Write};

use crate::error::PipeError;

pub const MAGIC: &[u8; 4] = b"SHUF";
pub const VERSION: u8 = 1;

const TAG_DATA: u8 = 0x01;
const TAG_END_OK: u8 = 0x02;
const TAG_END_ERR: u8 = 0x03;

/// Writes the handshake sent on every socket, both directions: `MAGIC` +
/// `VERSION` + this side's `SHARD_ID`.
pub fn write_handshake<W: Write>(w: &mut W, shard_id: u32) -> Result<(), PipeError> {
    w.write_all(MAGIC)?;
    w.write_all(&[VERSION])?;
    w.write_all(&shard_id.to_be_bytes())?;
    w.flush()?;
    Ok(())
}

/// Reads the peer's handshake, returning its shard id.
pub fn read_handshake<R: Read>(r: &mut R) -> Result<u32, PipeError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(PipeError::validation("bad shuffler handshake magic"));
    }
    let mut version = [0u8; 1];
    r.read_exact(&mut version)?;
    if version[0] != VERSION {
        return Err(PipeError::validation(format!("unsupported shuffler version {}", version[0])));
    }
    let mut shard_id = [0u8; 4];
    r.read_exact(&mut shard_id)?;
    Ok(u32::from_be_bytes(shard_id))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Vec<u8>),
    EndOk,
    EndErr(String),
}

pub fn write_frame<W: Write>(w: &mut W, frame: &Frame) -> Result<(), PipeError> {
    match frame {
        Frame::Data(bytes) => {
            w.write_all(&[TAG_DATA])?;
            w.write_all(&(bytes.len() as u32).to_be_bytes())?;
            w.write_all(bytes)?;
        }
        Frame::EndOk => {
            w.write_all(&[TAG_END_OK])?;
        }
        Frame::EndErr(message) => {
            w.write_all(&[TAG_END_ERR])?;
            let bytes = message.as_bytes();
            w.write_all(&(bytes.len() as u32).to_be_bytes())?;
            w.write_all(bytes)?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn read_frame<R: Read>(r: &mut R) -> Result<Frame, PipeError> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag)?;
    match tag[0] {
        TAG_DATA => Ok(Frame::Data(read_length_prefixed(r)?)),
        TAG_END_OK => Ok(Frame::EndOk),
        TAG_END_ERR => {
            let bytes = read_length_prefixed(r)?;
            Ok(Frame::EndErr(String::from_utf8_lossy(&bytes).into_owned()))
        }
        other => Err(PipeError::validation(format!("unknown shuffler frame tag {other}"))),
    }
}

fn read_length_prefixed<R: Read>(r: &mut R) -> Result<Vec<u8>, PipeError> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn handshake_round_trips() {
        let mut buf = Vec::new();
        write_handshake(&mut buf, 7).unwrap();
        assert_eq!(read_handshake(&mut Cursor::new(buf)).unwrap(), 7);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = vec![b'X', b'X', b'X', b'X', VERSION, 0, 0, 0, 0];
        assert!(read_handshake(&mut Cursor::new(&mut buf)).is_err());
    }

    #[test]
    fn data_frame_round_trips() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Frame::Data(vec![1, 2, 3])).unwrap();
        assert_eq!(read_frame(&mut Cursor::new(buf)).unwrap(), Frame::Data(vec![1, 2, 3]));
    }

    #[test]
    fn end_ok_frame_has_no_payload() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Frame::EndOk).unwrap();
        assert_eq!(buf, vec![TAG_END_OK]);
        assert_eq!(read_frame(&mut Cursor::new(buf)).unwrap(), Frame::EndOk);
    }

    #[test]
    fn end_err_frame_carries_message() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Frame::EndErr("boom".to_string())).unwrap();
        assert_eq!(read_frame(&mut Cursor::new(buf)).unwrap(), Frame::EndErr("boom".to_string()));
    }
}
