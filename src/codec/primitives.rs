//! Little-endian vector codecs layered on `byteorder`.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec2, Vec3};
use std::io::{self, Read, Write};

pub trait ReadVecExt: Read {
    fn read_vec2(&mut self) -> io::Result<Vec2> {
        Ok(Vec2::new(
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
        ))
    }

    fn read_vec3(&mut self) -> io::Result<Vec3> {
        Ok(Vec3::new(
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
        ))
    }

    /// `x, y, z, w` order.
    fn read_quat(&mut self) -> io::Result<Quat> {
        Ok(Quat::from_xyzw(
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
        ))
    }

    fn read_vec3_array(&mut self, count: usize) -> io::Result<Vec<Vec3>> {
        let mut out = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            out.push(self.read_vec3()?);
        }
        Ok(out)
    }

    fn read_vec2_array(&mut self, count: usize) -> io::Result<Vec<Vec2>> {
        let mut out = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            out.push(self.read_vec2()?);
        }
        Ok(out)
    }
}

impl<R: Read + ?Sized> ReadVecExt for R {}

pub trait WriteVecExt: Write {
    fn write_vec2(&mut self, v: Vec2) -> io::Result<()> {
        self.write_f32::<LittleEndian>(v.x)?;
        self.write_f32::<LittleEndian>(v.y)
    }

    fn write_vec3(&mut self, v: Vec3) -> io::Result<()> {
        self.write_f32::<LittleEndian>(v.x)?;
        self.write_f32::<LittleEndian>(v.y)?;
        self.write_f32::<LittleEndian>(v.z)
    }

    fn write_quat(&mut self, q: Quat) -> io::Result<()> {
        self.write_f32::<LittleEndian>(q.x)?;
        self.write_f32::<LittleEndian>(q.y)?;
        self.write_f32::<LittleEndian>(q.z)?;
        self.write_f32::<LittleEndian>(q.w)
    }

    fn write_vec3_array(&mut self, vs: &[Vec3]) -> io::Result<()> {
        vs.iter().try_for_each(|v| self.write_vec3(*v))
    }

    fn write_vec2_array(&mut self, vs: &[Vec2]) -> io::Result<()> {
        vs.iter().try_for_each(|v| self.write_vec2(*v))
    }

    /// Write `text` into a fixed `width`-byte slot, cut at a char boundary
    /// and zero-padded.  Returns the number of name bytes kept.
    fn write_fixed_str(&mut self, text: &str, width: usize) -> io::Result<usize> {
        let kept = fixed_str_len(text, width);
        self.write_all(&text.as_bytes()[..kept])?;
        for _ in kept..width {
            self.write_u8(0)?;
        }
        Ok(kept)
    }
}

impl<W: Write + ?Sized> WriteVecExt for W {}

/// Upper bound on up-front allocation driven by counts read off the wire.
const PREALLOC_LIMIT: usize = 1 << 16;

/// Longest prefix of `text` that fits `width` bytes without splitting a char.
pub fn fixed_str_len(text: &str, width: usize) -> usize {
    if text.len() <= width {
        return text.len();
    }
    let mut end = width;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Decode a zero-padded fixed-width name slot.
pub fn str_from_fixed(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
