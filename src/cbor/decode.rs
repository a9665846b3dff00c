use std::rc::Rc;

use cid::Cid;

use crate::order::cmp_cbor_keys;
use crate::{DecodeOptions, Error, ErrorCode, Kind, Value};

/// Decoder over a complete dag-cbor byte slice.
///
/// The decoder validates while it reads: framing errors, integer overflow,
/// and (in strict mode) any non-canonical encoding surface as typed errors at
/// the offending byte offset.
pub struct Decoder<'de> {
    data: &'de [u8],
    pos: usize,
    opts: DecodeOptions,
}

impl<'de> Decoder<'de> {
    /// Create a strict decoder over `data`.
    #[must_use]
    pub fn new(data: &'de [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    /// Create a decoder with explicit options.
    #[must_use]
    pub const fn with_options(data: &'de [u8], opts: DecodeOptions) -> Self {
        Self {
            data,
            pos: 0,
            opts,
        }
    }

    /// Current byte offset into the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Whether the decoder enforces canonical encoding.
    #[must_use]
    pub const fn strict(&self) -> bool {
        self.opts.strict
    }

    /// Require that the input is fully consumed.
    ///
    /// # Errors
    ///
    /// Returns `ExtraneousData` if bytes remain.
    pub fn finish(&self) -> Result<(), Error> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(Error::new(ErrorCode::ExtraneousData, self.pos))
        }
    }

    fn read_u8(&mut self, err_off: usize) -> Result<u8, Error> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(Error::new(ErrorCode::UnexpectedEof, err_off))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, n: usize, err_off: usize) -> Result<&'de [u8], Error> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(Error::new(ErrorCode::LengthOverflow, err_off))?;
        if end > self.data.len() {
            return Err(Error::new(ErrorCode::UnexpectedEof, err_off));
        }
        let s = &self.data[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    fn read_be_u16(&mut self, err_off: usize) -> Result<u16, Error> {
        let s = self.read_exact(2, err_off)?;
        Ok(u16::from_be_bytes([s[0], s[1]]))
    }

    fn read_be_u32(&mut self, err_off: usize) -> Result<u32, Error> {
        let s = self.read_exact(4, err_off)?;
        Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }

    fn read_be_u64(&mut self, err_off: usize) -> Result<u64, Error> {
        let s = self.read_exact(8, err_off)?;
        Ok(u64::from_be_bytes([
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
        ]))
    }

    /// Read the first byte of the next item, split into major type and
    /// argument info. Returns `(major, ai, offset)`.
    fn head(&mut self) -> Result<(u8, u8, usize), Error> {
        let off = self.pos;
        let ib = self.read_u8(off)?;
        Ok((ib >> 5, ib & 0x1f, off))
    }

    /// Read an argument integer for additional-info `ai`.
    ///
    /// In strict mode any non-minimal follow-up form is rejected.
    fn read_uint(&mut self, ai: u8, off: usize) -> Result<u64, Error> {
        match ai {
            0..=23 => Ok(u64::from(ai)),
            24 => {
                let v = self.read_u8(off)?;
                if self.opts.strict && v < 24 {
                    return Err(Error::new(ErrorCode::Strict, off));
                }
                Ok(u64::from(v))
            }
            25 => {
                let v = u64::from(self.read_be_u16(off)?);
                if self.opts.strict && u8::try_from(v).is_ok() {
                    return Err(Error::new(ErrorCode::Strict, off));
                }
                Ok(v)
            }
            26 => {
                let v = u64::from(self.read_be_u32(off)?);
                if self.opts.strict && u16::try_from(v).is_ok() {
                    return Err(Error::new(ErrorCode::Strict, off));
                }
                Ok(v)
            }
            27 => {
                let v = self.read_be_u64(off)?;
                if self.opts.strict && u32::try_from(v).is_ok() {
                    return Err(Error::new(ErrorCode::Strict, off));
                }
                Ok(v)
            }
            // Indefinite lengths and reserved additional info are outside the
            // profile in both modes.
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    fn read_payload_len(&mut self, ai: u8, off: usize) -> Result<usize, Error> {
        let len = self.read_uint(ai, off)?;
        usize::try_from(len).map_err(|_| Error::new(ErrorCode::LengthOverflow, off))
    }

    /// The kind of the next item, without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` at end of input, `InvalidType` for bytes
    /// outside the profile.
    pub fn peek_kind(&self) -> Result<Kind, Error> {
        let ib = *self
            .data
            .get(self.pos)
            .ok_or(Error::new(ErrorCode::UnexpectedEof, self.pos))?;
        match ib >> 5 {
            0 | 1 => Ok(Kind::Integer),
            2 => Ok(Kind::Bytes),
            3 => Ok(Kind::String),
            4 => Ok(Kind::List),
            5 => Ok(Kind::Map),
            6 => Ok(Kind::Link),
            _ => match ib & 0x1f {
                20 | 21 => Ok(Kind::Bool),
                22 | 23 => Ok(Kind::Null),
                25..=27 => Ok(Kind::Float),
                _ => Err(Error::new(ErrorCode::InvalidType, self.pos)),
            },
        }
    }

    /// Consume a null.
    ///
    /// In lenient mode `undefined` is accepted and treated as null.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for any other item; `Strict` for `undefined` in
    /// strict mode.
    pub fn null(&mut self) -> Result<(), Error> {
        let (major, ai, off) = self.head()?;
        match (major, ai) {
            (7, 22) => Ok(()),
            (7, 23) => {
                if self.opts.strict {
                    Err(Error::new(ErrorCode::Strict, off))
                } else {
                    Ok(())
                }
            }
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    /// Consume a boolean.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for any other item.
    pub fn bool(&mut self) -> Result<bool, Error> {
        let (major, ai, off) = self.head()?;
        match (major, ai) {
            (7, 20) => Ok(false),
            (7, 21) => Ok(true),
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    /// Consume an integer.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` for magnitudes outside the i64 range,
    /// `InvalidType` for non-integer items.
    pub fn int(&mut self) -> Result<i64, Error> {
        let (major, ai, off) = self.head()?;
        match major {
            0 => {
                let v = self.read_uint(ai, off)?;
                i64::try_from(v).map_err(|_| Error::new(ErrorCode::Overflow, off))
            }
            1 => {
                let n = self.read_uint(ai, off)?;
                let n = i64::try_from(n).map_err(|_| Error::new(ErrorCode::Overflow, off))?;
                Ok(-1 - n)
            }
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    /// Consume a float.
    ///
    /// Strict mode accepts only the 8-byte form; lenient mode widens 2- and
    /// 4-byte floats to binary64.
    ///
    /// # Errors
    ///
    /// Returns `Strict` for narrow forms in strict mode, `InvalidValue` for
    /// NaN or infinities, `InvalidType` for non-float items.
    pub fn float(&mut self) -> Result<f64, Error> {
        let (major, ai, off) = self.head()?;
        if major != 7 {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let v = match ai {
            25 => {
                if self.opts.strict {
                    return Err(Error::new(ErrorCode::Strict, off));
                }
                half_to_f64(self.read_be_u16(off)?)
            }
            26 => {
                if self.opts.strict {
                    return Err(Error::new(ErrorCode::Strict, off));
                }
                f64::from(f32::from_bits(self.read_be_u32(off)?))
            }
            27 => f64::from_bits(self.read_be_u64(off)?),
            _ => return Err(Error::new(ErrorCode::InvalidType, off)),
        };
        if v.is_finite() {
            Ok(v)
        } else {
            Err(Error::new(ErrorCode::InvalidValue, off))
        }
    }

    /// Consume a text string, borrowing it from the input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtf8` for malformed text, `InvalidType` for
    /// non-string items.
    pub fn text(&mut self) -> Result<&'de str, Error> {
        let (major, ai, off) = self.head()?;
        if major != 3 {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let len = self.read_payload_len(ai, off)?;
        let payload = self.read_exact(len, off)?;
        core::str::from_utf8(payload).map_err(|_| Error::new(ErrorCode::InvalidUtf8, off))
    }

    /// Consume a byte string, borrowing it from the input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for non-bytes items.
    pub fn bytes(&mut self) -> Result<&'de [u8], Error> {
        let (major, ai, off) = self.head()?;
        if major != 2 {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let len = self.read_payload_len(ai, off)?;
        self.read_exact(len, off)
    }

    /// Consume a link: tag 42 over an identity-prefixed CID byte string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for a tag other than 42 or a missing `0x00`
    /// prefix, `InvalidValue` when the CID bytes fail to parse.
    pub fn link(&mut self) -> Result<Cid, Error> {
        let (major, ai, off) = self.head()?;
        if major != 6 {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let tag = self.read_uint(ai, off)?;
        if tag != 42 {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let payload = self.bytes()?;
        match payload.split_first() {
            Some((0x00, cid_bytes)) => {
                Cid::try_from(cid_bytes).map_err(|_| Error::new(ErrorCode::InvalidValue, off))
            }
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    /// Consume an array header and return the element count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for non-array items, `UnexpectedEof` when the
    /// declared length cannot fit in the remaining input.
    pub fn list_begin(&mut self) -> Result<usize, Error> {
        let (major, ai, off) = self.head()?;
        if major != 4 {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let len = self.read_payload_len(ai, off)?;
        // Every element takes at least one byte.
        if len > self.data.len() - self.pos {
            return Err(Error::new(ErrorCode::UnexpectedEof, off));
        }
        Ok(len)
    }

    /// Consume a map header and return the entry count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for non-map items, `UnexpectedEof` when the
    /// declared length cannot fit in the remaining input.
    pub fn map_begin(&mut self) -> Result<usize, Error> {
        let (major, ai, off) = self.head()?;
        if major != 5 {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let len = self.read_payload_len(ai, off)?;
        // Every entry takes at least two bytes.
        if len > (self.data.len() - self.pos) / 2 {
            return Err(Error::new(ErrorCode::UnexpectedEof, off));
        }
        Ok(len)
    }

    /// Consume a map key (a text string).
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for non-string keys.
    pub fn key(&mut self) -> Result<&'de str, Error> {
        self.text()
    }

    /// Decode the next item as a dynamic value.
    ///
    /// # Errors
    ///
    /// Returns a typed error for malformed or (in strict mode) non-canonical
    /// input.
    pub fn value(&mut self) -> Result<Value, Error> {
        self.parse_value(0)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, Error> {
        if depth > self.opts.max_depth {
            return Err(Error::new(ErrorCode::DepthLimitExceeded, self.pos));
        }
        match self.peek_kind()? {
            Kind::Null => self.null().map(|()| Value::Null),
            Kind::Bool => self.bool().map(Value::Bool),
            Kind::Integer => self.int().map(Value::Integer),
            Kind::Float => self.float().map(Value::Float),
            Kind::String => self.text().map(Value::string),
            Kind::Bytes => self.bytes().map(Value::bytes),
            Kind::Link => self.link().map(Value::link),
            Kind::List => {
                let off = self.pos;
                let len = self.list_begin()?;
                let mut items = Vec::new();
                items
                    .try_reserve_exact(len)
                    .map_err(|_| Error::new(ErrorCode::AllocationFailed, off))?;
                for _ in 0..len {
                    items.push(self.parse_value(depth + 1)?);
                }
                Ok(Value::List(crate::List::from_values(items)))
            }
            Kind::Map => {
                let off = self.pos;
                let len = self.map_begin()?;
                let mut entries: Vec<(Rc<str>, Value)> = Vec::new();
                entries
                    .try_reserve_exact(len)
                    .map_err(|_| Error::new(ErrorCode::AllocationFailed, off))?;
                for _ in 0..len {
                    let key_off = self.pos;
                    let key = self.key()?;
                    if self.opts.strict {
                        if let Some((prev, _)) = entries.last() {
                            match cmp_cbor_keys(prev, key) {
                                core::cmp::Ordering::Less => {}
                                core::cmp::Ordering::Equal => {
                                    return Err(Error::new(ErrorCode::InvalidValue, key_off));
                                }
                                core::cmp::Ordering::Greater => {
                                    return Err(Error::new(ErrorCode::Strict, key_off));
                                }
                            }
                        }
                    } else if entries.iter().any(|(k, _)| k.as_ref() == key) {
                        return Err(Error::new(ErrorCode::InvalidValue, key_off));
                    }
                    let val = self.parse_value(depth + 1)?;
                    entries.push((Rc::from(key), val));
                }
                Ok(Value::Map(crate::Map::from_raw_entries(entries)))
            }
        }
    }
}

/// Widen an IEEE-754 binary16 bit pattern to binary64.
fn half_to_f64(bits: u16) -> f64 {
    let sign = if bits >> 15 == 0 { 1.0 } else { -1.0 };
    let exp = i32::from((bits >> 10) & 0x1f);
    let mant = f64::from(bits & 0x3ff);
    match exp {
        0 => sign * mant * (-24f64).exp2(),
        31 => {
            if mant == 0.0 {
                sign * f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => sign * (mant + 1024.0) * f64::from(exp - 25).exp2(),
    }
}

#[cfg(test)]
mod tests {
    use super::half_to_f64;

    #[test]
    fn half_widening() {
        assert_eq!(half_to_f64(0x3c00), 1.0);
        assert_eq!(half_to_f64(0xc000), -2.0);
        assert_eq!(half_to_f64(0x7bff), 65504.0);
        assert_eq!(half_to_f64(0x0001), 5.960_464_477_539_063e-8);
        assert!(half_to_f64(0x7c00).is_infinite());
        assert!(half_to_f64(0x7e00).is_nan());
    }
}
