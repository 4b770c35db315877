use std::io::{Cursor, Read};

use crate::error::{DecodeError, VmError};

/// Little-endian decoder over an in-memory bytecode image.
///
/// Unlike the teacher's `FromByteStream`, every read here advances the same
/// cursor the dispatch loop itself steps through, so `offset` and `stream`
/// position always agree.
pub(crate) struct ByteReader<'i> {
	stream: Cursor<&'i [u8]>,
}

impl<'i> ByteReader<'i> {
	pub fn new(image: &'i [u8]) -> Self {
		Self { stream: Cursor::new(image) }
	}

	#[inline]
	pub fn position(&self) -> usize {
		self.stream.position() as usize
	}

	#[inline]
	pub fn set_position(&mut self, position: usize) {
		self.stream.set_position(position as u64);
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.stream.get_ref().len()
	}

	pub fn read_u8(&mut self) -> Result<u8, VmError> {
		let mut byte = 0u8;
		self.stream.read_exact(std::slice::from_mut(&mut byte)).map_err(eof)?;
		Ok(byte)
	}

	/// A single signed opcode byte.
	pub fn read_opcode_byte(&mut self) -> Result<i8, VmError> {
		Ok(self.read_u8()? as i8)
	}

	pub fn read_u32(&mut self) -> Result<i32, VmError> {
		let mut bytes = [0u8; 4];
		self.stream.read_exact(&mut bytes).map_err(eof)?;
		Ok(i32::from_le_bytes(bytes))
	}

	pub fn read_f32(&mut self) -> Result<f32, VmError> {
		let mut bytes = [0u8; 4];
		self.stream.read_exact(&mut bytes).map_err(eof)?;
		Ok(f32::from_le_bytes(bytes))
	}

	/// A `u32` length prefix followed by that many UTF-8 bytes.
	pub fn read_str(&mut self) -> Result<String, VmError> {
		let len = self.read_u32()? as usize;
		let mut bytes = vec![0u8; len];
		self.stream.read_exact(&mut bytes).map_err(eof)?;
		let s = std::str::from_utf8(&bytes)?;
		Ok(s.to_owned())
	}
}

#[inline]
fn eof(_: std::io::Error) -> VmError {
	VmError::DecodeError(DecodeError::UnexpectedEof)
}
