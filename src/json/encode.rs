use core::mem;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use cid::Cid;

use super::{EncodeOptions, FloatFormat};
use crate::order::cmp_json_keys;
use crate::repr::{BytesRepr, StringRepr};
use crate::{Error, ErrorCode, Value, DEFAULT_MAX_DEPTH};

/// Streaming encoder producing canonical dag-json bytes.
///
/// Output uses minimal separators and no whitespace. The encoder owns a
/// growable output buffer reused across calls plus separate staging buffers
/// for string/bytes adapters.
pub struct Encoder {
    buf: Vec<u8>,
    opts: EncodeOptions,
    scratch: Vec<u8>,
    scratch_str: String,
}

impl Encoder {
    /// Create an encoder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EncodeOptions::default())
    }

    /// Create an encoder with explicit options.
    #[must_use]
    pub const fn with_options(opts: EncodeOptions) -> Self {
        Self {
            buf: Vec::new(),
            opts,
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

    fn put(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let available = self.buf.capacity().saturating_sub(self.buf.len());
        if bytes.len() > available {
            let offset = self.buf.len();
            self.buf
                .try_reserve(bytes.len())
                .map_err(|_| Error::new(ErrorCode::AllocationFailed, offset))?;
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Emit `null`.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn null(&mut self) -> Result<(), Error> {
        self.put(b"null")
    }

    /// Emit a boolean literal.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn bool(&mut self, v: bool) -> Result<(), Error> {
        if v {
            self.put(b"true")
        } else {
            self.put(b"false")
        }
    }

    /// Emit an integer in decimal form.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn int(&mut self, v: i64) -> Result<(), Error> {
        let text = v.to_string();
        self.put(text.as_bytes())
    }

    /// Emit a float per the configured [`FloatFormat`].
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedValue` for NaN or infinities.
    pub fn float(&mut self, v: f64) -> Result<(), Error> {
        if !v.is_finite() {
            return Err(Error::new(ErrorCode::UnsupportedValue, self.position()));
        }
        if v == 0.0 && v.is_sign_negative() {
            return self.put(b"-0.0");
        }
        let text = match self.opts.float_format {
            FloatFormat::Scientific => format!("{v:e}"),
            FloatFormat::Decimal => decimal_form(v),
            FloatFormat::DecimalInRange {
                min_exp10,
                max_exp10,
            } => {
                let e = exp10(v);
                let in_range = min_exp10.map_or(true, |m| e >= m)
                    && max_exp10.map_or(true, |m| e <= m);
                if in_range {
                    decimal_form(v)
                } else {
                    format!("{v:e}")
                }
            }
        };
        self.put(text.as_bytes())
    }

    /// Emit a JSON-quoted string.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn str(&mut self, s: &str) -> Result<(), Error> {
        self.put(b"\"")?;
        let escape_unicode = self.opts.escape_unicode;
        let mut tmp = [0u8; 6];
        for c in s.chars() {
            match c {
                '"' => self.put(b"\\\"")?,
                '\\' => self.put(b"\\\\")?,
                '\u{08}' => self.put(b"\\b")?,
                '\u{0c}' => self.put(b"\\f")?,
                '\n' => self.put(b"\\n")?,
                '\r' => self.put(b"\\r")?,
                '\t' => self.put(b"\\t")?,
                c if (c as u32) < 0x20 => {
                    let text = format!("\\u{:04x}", c as u32);
                    self.put(text.as_bytes())?;
                }
                c if escape_unicode && !c.is_ascii() => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        let text = format!("\\u{unit:04x}");
                        self.put(text.as_bytes())?;
                    }
                }
                c => self.put(c.encode_utf8(&mut tmp).as_bytes())?,
            }
        }
        self.put(b"\"")
    }

    /// Emit a byte string as `{"/":{"bytes":"<base64url-nopad>"}}`.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn bytes(&mut self, b: &[u8]) -> Result<(), Error> {
        self.put(b"{\"/\":{\"bytes\":\"")?;
        let encoded = URL_SAFE_NO_PAD.encode(b);
        self.put(encoded.as_bytes())?;
        self.put(b"\"}}")
    }

    /// Emit a link as `{"/":"<cid>"}`.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn link(&mut self, cid: &Cid) -> Result<(), Error> {
        self.put(b"{\"/\":\"")?;
        let text = cid.to_string();
        self.put(text.as_bytes())?;
        self.put(b"\"}")
    }

    /// Open a list. Call [`Encoder::elem`] before each element and close with
    /// [`Encoder::list_end`].
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn list_begin(&mut self) -> Result<(), Error> {
        self.put(b"[")
    }

    /// Element separator: emits `,` unless this is the first element.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn elem(&mut self, first: bool) -> Result<(), Error> {
        if first {
            Ok(())
        } else {
            self.put(b",")
        }
    }

    /// Close a list.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn list_end(&mut self) -> Result<(), Error> {
        self.put(b"]")
    }

    /// Open a map. Call [`Encoder::key`] before each value, keys in
    /// byte-wise lexicographic order, and close with [`Encoder::map_end`].
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn map_begin(&mut self) -> Result<(), Error> {
        self.put(b"{")
    }

    /// Emit a map key (with its separator) followed by `:`.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn key(&mut self, name: &str, first: bool) -> Result<(), Error> {
        self.elem(first)?;
        self.str(name)?;
        self.put(b":")
    }

    /// Close a map.
    ///
    /// # Errors
    ///
    /// Propagates allocation failure.
    pub fn map_end(&mut self) -> Result<(), Error> {
        self.put(b"}")
    }

    /// Encode a value through its string adapter.
    ///
    /// # Errors
    ///
    /// Propagates adapter and allocation failures.
    pub fn str_adapter<T: StringRepr>(&mut self, v: &T) -> Result<(), Error> {
        let mut staged = mem::take(&mut self.scratch_str);
        staged.clear();
        let res = v.write_string(&mut staged).and_then(|()| self.str(&staged));
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
    /// Map entries are written through a sorted index projection in
    /// byte-wise lexicographic key order; the source map is not mutated.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedValue` for NaN or infinite floats,
    /// `InvalidValue` for maps containing the reserved `"/"` key, and
    /// `DepthLimitExceeded` for pathologically deep trees.
    pub fn value(&mut self, v: &Value) -> Result<(), Error> {
        self.emit(v, 0)
    }

    fn emit(&mut self, v: &Value, depth: usize) -> Result<(), Error> {
        if depth > DEFAULT_MAX_DEPTH {
            return Err(Error::new(ErrorCode::DepthLimitExceeded, self.position()));
        }
        match v {
            Value::Null => self.null(),
            Value::Bool(b) => self.bool(*b),
            Value::Integer(i) => self.int(*i),
            Value::Float(f) => self.float(*f),
            Value::String(s) => self.str(s),
            Value::Bytes(b) => self.bytes(b),
            Value::Link(cid) => self.link(cid),
            Value::List(list) => {
                self.list_begin()?;
                for (i, item) in list.iter().enumerate() {
                    self.elem(i == 0)?;
                    self.emit(item, depth + 1)?;
                }
                self.list_end()
            }
            Value::Map(map) => {
                self.map_begin()?;
                let entries = map.raw_entries();
                let mut order: Vec<usize> = (0..entries.len()).collect();
                order.sort_unstable_by(|&a, &b| cmp_json_keys(&entries[a].0, &entries[b].0));
                for (i, idx) in order.into_iter().enumerate() {
                    let (key, val) = &entries[idx];
                    if key.as_ref() == "/" {
                        return Err(Error::new(ErrorCode::InvalidValue, self.position()));
                    }
                    self.key(key, i == 0)?;
                    self.emit(val, depth + 1)?;
                }
                self.map_end()
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shortest decimal rendering, with `.0` appended for integral values.
fn decimal_form(v: f64) -> String {
    let mut s = format!("{v}");
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// `⌊log10 |v|⌋` with correction for boundary rounding; zero maps to 0.
fn exp10(v: f64) -> i32 {
    let a = v.abs();
    if a == 0.0 {
        return 0;
    }
    let mut e = a.log10().floor() as i32;
    if 10f64.powi(e) > a {
        e -= 1;
    } else if e < i32::MAX && 10f64.powi(e + 1) <= a {
        e += 1;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::{decimal_form, exp10};
    use crate::json::{encode_value_with, EncodeOptions, FloatFormat};
    use crate::Value;

    fn fmt(v: f64, float_format: FloatFormat) -> String {
        let opts = EncodeOptions {
            float_format,
            ..EncodeOptions::default()
        };
        let bytes = encode_value_with(&Value::Float(v), opts).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn decimal_appends_point_zero() {
        assert_eq!(decimal_form(10.0), "10.0");
        assert_eq!(decimal_form(99.99), "99.99");
        assert_eq!(decimal_form(0.5), "0.5");
    }

    #[test]
    fn exp10_boundaries() {
        assert_eq!(exp10(1.0), 0);
        assert_eq!(exp10(9.99), 0);
        assert_eq!(exp10(10.0), 1);
        assert_eq!(exp10(100.111), 2);
        assert_eq!(exp10(0.1), -1);
        assert_eq!(exp10(0.05), -2);
    }

    #[test]
    fn scientific_format_matches_wire_form() {
        assert_eq!(fmt(1.0, FloatFormat::Scientific), "1e0");
        assert_eq!(
            fmt(core::f64::consts::PI, FloatFormat::Scientific),
            "3.141592653589793e0"
        );
    }

    #[test]
    fn decimal_in_range_policy() {
        let policy = FloatFormat::DecimalInRange {
            min_exp10: Some(-1),
            max_exp10: Some(1),
        };
        assert_eq!(fmt(100.111, policy), "1.00111e2");
        assert_eq!(fmt(10.0, policy), "10.0");
        assert_eq!(fmt(99.99, policy), "99.99");
    }

    #[test]
    fn negative_zero_has_one_form() {
        assert_eq!(fmt(-0.0, FloatFormat::Scientific), "-0.0");
        assert_eq!(fmt(-0.0, FloatFormat::Decimal), "-0.0");
    }
}
