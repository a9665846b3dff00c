use core::mem;

use cid::Cid;

use crate::order::cmp_cbor_keys;
use crate::repr::{BytesRepr, StringRepr};
use crate::{Error, ErrorCode, Value, DEFAULT_MAX_DEPTH};

/// Streaming encoder producing canonical dag-cbor bytes.
///
/// The encoder owns a growable output buffer reused across calls (clear, then
/// append) plus separate staging buffers for string/bytes adapters.
pub struct Encoder {
    buf: Vec<u8>,
    scratch: Vec<u8>,
    scratch_str: String,
}

impl Encoder {
    /// Create an empty encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            scratch: Vec::new(),
            scratch_str: String::new(),
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the bytes emitted so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Clear the output while retaining allocated capacity.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Consume the encoder and return the emitted bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let available = self.buf.capacity().saturating_sub(self.buf.len());
        if additional <= available {
            return Ok(());
        }
        let offset = self.buf.len();
        self.buf
            .try_reserve(additional)
            .map_err(|_| Error::new(ErrorCode::AllocationFailed, offset))
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn put_u8(&mut self, byte: u8) -> Result<(), Error> {
        self.reserve(1)?;
        self.buf.push(byte);
        Ok(())
    }

    /// Write a header byte with the minimal argument encoding for `value`.
    fn write_head(&mut self, major: u8, value: u64) -> Result<(), Error> {
        debug_assert!(major <= 7);
        if value < 24 {
            return self.put_u8((major << 5) | value as u8);
        }
        if value <= 0xff {
            self.put_u8((major << 5) | 24)?;
            return self.put_u8(value as u8);
        }
        if value <= 0xffff {
            self.put_u8((major << 5) | 25)?;
            return self.put(&(value as u16).to_be_bytes());
        }
        if value <= 0xffff_ffff {
            self.put_u8((major << 5) | 26)?;
            return self.put(&(value as u32).to_be_bytes());
        }
        self.put_u8((major << 5) | 27)?;
        self.put(&value.to_be_bytes())
    }

    fn write_len(&mut self, major: u8, len: usize) -> Result<(), Error> {
        let len = u64::try_from(len)
            .map_err(|_| Error::new(ErrorCode::LengthOverflow, self.position()))?;
        self.write_head(major, len)
    }

    /// Encode CBOR null.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn null(&mut self) -> Result<(), Error> {
        self.put_u8(0xf6)
    }

    /// Encode a boolean.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn bool(&mut self, v: bool) -> Result<(), Error> {
        self.put_u8(if v { 0xf5 } else { 0xf4 })
    }

    /// Encode an integer with the minimal argument class.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn int(&mut self, v: i64) -> Result<(), Error> {
        if v >= 0 {
            self.write_head(0, v as u64)
        } else {
            self.write_head(1, (-1 - v) as u64)
        }
    }

    /// Encode a float in the 8-byte form.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedValue` for NaN or infinities.
    pub fn float(&mut self, v: f64) -> Result<(), Error> {
        if !v.is_finite() {
            return Err(Error::new(ErrorCode::UnsupportedValue, self.position()));
        }
        self.put_u8(0xfb)?;
        self.put(&v.to_bits().to_be_bytes())
    }

    /// Encode a text string.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn text(&mut self, s: &str) -> Result<(), Error> {
        self.write_len(3, s.len())?;
        self.put(s.as_bytes())
    }

    /// Encode a byte string.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn bytes(&mut self, b: &[u8]) -> Result<(), Error> {
        self.write_len(2, b.len())?;
        self.put(b)
    }

    /// Encode a link: tag 42 over the identity-prefixed CID bytes.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn link(&mut self, cid: &Cid) -> Result<(), Error> {
        self.write_head(6, 42)?;
        let raw = cid.to_bytes();
        let len = raw
            .len()
            .checked_add(1)
            .ok_or_else(|| Error::new(ErrorCode::LengthOverflow, self.position()))?;
        self.write_len(2, len)?;
        self.put_u8(0x00)?;
        self.put(&raw)
    }

    /// Write the header of a definite-length array of `len` elements.
    ///
    /// The caller must emit exactly `len` values afterwards.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn list_begin(&mut self, len: usize) -> Result<(), Error> {
        self.write_len(4, len)
    }

    /// Write the header of a definite-length map of `len` entries.
    ///
    /// The caller must emit exactly `len` key/value pairs afterwards, keys in
    /// the length-then-lexicographic canonical order.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn map_begin(&mut self, len: usize) -> Result<(), Error> {
        self.write_len(5, len)
    }

    /// Encode a value through its string adapter.
    ///
    /// # Errors
    ///
    /// Propagates adapter and allocation failures.
    pub fn text_adapter<T: StringRepr>(&mut self, v: &T) -> Result<(), Error> {
        let mut staged = mem::take(&mut self.scratch_str);
        staged.clear();
        let res = v.write_string(&mut staged).and_then(|()| self.text(&staged));
        self.scratch_str = staged;
        res
    }

    /// Encode a value through its bytes adapter.
    ///
    /// # Errors
    ///
    /// Propagates adapter and allocation failures.
    pub fn bytes_adapter<T: BytesRepr>(&mut self, v: &T) -> Result<(), Error> {
        let mut staged = mem::take(&mut self.scratch);
        staged.clear();
        let res = v.write_bytes(&mut staged).and_then(|()| self.bytes(&staged));
        self.scratch = staged;
        res
    }

    /// Encode a dynamic value.
    ///
    /// The exact encoded length is computed first and reserved in one step,
    /// so emission never reallocates. Map entries are written through a
    /// sorted index projection; the source map is not mutated.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedValue` for NaN or infinite floats and
    /// `DepthLimitExceeded` for pathologically deep trees.
    pub fn value(&mut self, v: &Value) -> Result<(), Error> {
        let len = self.measure(v, 0)?;
        self.reserve(len)?;
        let before = self.buf.len();
        self.emit(v)?;
        debug_assert_eq!(self.buf.len() - before, len);
        Ok(())
    }

    fn measure(&self, v: &Value, depth: usize) -> Result<usize, Error> {
        if depth > DEFAULT_MAX_DEPTH {
            return Err(Error::new(ErrorCode::DepthLimitExceeded, self.buf.len()));
        }
        let err_len = || Error::new(ErrorCode::LengthOverflow, self.buf.len());
        match v {
            Value::Null | Value::Bool(_) => Ok(1),
            Value::Integer(i) => {
                let arg = if *i >= 0 { *i as u64 } else { (-1 - *i) as u64 };
                Ok(head_len(arg))
            }
            Value::Float(f) => {
                if f.is_finite() {
                    Ok(9)
                } else {
                    Err(Error::new(ErrorCode::UnsupportedValue, self.buf.len()))
                }
            }
            Value::String(s) => head_len(s.len() as u64)
                .checked_add(s.len())
                .ok_or_else(err_len),
            Value::Bytes(b) => head_len(b.len() as u64)
                .checked_add(b.len())
                .ok_or_else(err_len),
            Value::Link(cid) => {
                let payload = cid.encoded_len().checked_add(1).ok_or_else(err_len)?;
                let mut total = head_len(42);
                total = total
                    .checked_add(head_len(payload as u64))
                    .ok_or_else(err_len)?;
                total.checked_add(payload).ok_or_else(err_len)
            }
            Value::List(list) => {
                let mut total = head_len(list.len() as u64);
                for item in list {
                    total = total
                        .checked_add(self.measure(item, depth + 1)?)
                        .ok_or_else(err_len)?;
                }
                Ok(total)
            }
            Value::Map(map) => {
                let mut total = head_len(map.len() as u64);
                for (key, val) in map.iter() {
                    let key_len = head_len(key.len() as u64)
                        .checked_add(key.len())
                        .ok_or_else(err_len)?;
                    total = total.checked_add(key_len).ok_or_else(err_len)?;
                    total = total
                        .checked_add(self.measure(val, depth + 1)?)
                        .ok_or_else(err_len)?;
                }
                Ok(total)
            }
        }
    }

    fn emit(&mut self, v: &Value) -> Result<(), Error> {
        match v {
            Value::Null => self.null(),
            Value::Bool(b) => self.bool(*b),
            Value::Integer(i) => self.int(*i),
            Value::Float(f) => self.float(*f),
            Value::String(s) => self.text(s),
            Value::Bytes(b) => self.bytes(b),
            Value::Link(cid) => self.link(cid),
            Value::List(list) => {
                self.list_begin(list.len())?;
                for item in list {
                    self.emit(item)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                self.map_begin(map.len())?;
                let entries = map.raw_entries();
                let mut order: Vec<usize> = (0..entries.len()).collect();
                order.sort_unstable_by(|&a, &b| cmp_cbor_keys(&entries[a].0, &entries[b].0));
                for idx in order {
                    let (key, val) = &entries[idx];
                    self.text(key)?;
                    self.emit(val)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Length in bytes of a minimal header carrying argument `value`.
const fn head_len(value: u64) -> usize {
    if value < 24 {
        1
    } else if value <= 0xff {
        2
    } else if value <= 0xffff {
        3
    } else if value <= 0xffff_ffff {
        5
    } else {
        9
    }
}
