//! NumPy `.npy` array format
//!
//! Keypoint arrays are handed between stages as `.npy` files so they stay
//! readable by the wider Python tooling.
//!
//! # Layout
//! ```text
//! 0x00: magic "\x93NUMPY"
//! 0x06: major u8, minor u8
//! 0x08: header_len u16 (v1.0) or u32 (v2.0, v3.0), little-endian
//! ....: header text, a Python dict literal padded with spaces and '\n'
//! ....: raw element data
//! ```
//!
//! The header dict carries `descr` (dtype, e.g. `'<f8'`), `fortran_order`
//! and `shape`. Magic + length fields + header are padded to a multiple of
//! 64 bytes. Arrays are always written as little-endian `f64` in C order;
//! `f32`/`f64` of either byte order and either memory order can be read.

use anyhow::{Context, Result};
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn, ShapeBuilder};
use std::path::Path;

/// File magic
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Magic + length fields + header are padded to this alignment
const HEADER_ALIGN: usize = 64;

/// Error type for decoding `.npy` data.
#[derive(Debug, thiserror::Error)]
pub enum NpyError {
    #[error("Not a .npy file (bad magic)")]
    BadMagic,

    #[error("Unsupported .npy version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("Malformed .npy header: {0}")]
    BadHeader(String),

    #[error("Unsupported dtype '{0}' (expected f4 or f8)")]
    UnsupportedDtype(String),

    #[error("Expected {expected} bytes of array data, found {found}")]
    DataLength { expected: usize, found: usize },

    #[error("Array data does not fit shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Floating point element type of a `.npy` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtype {
    /// Element size in bytes (4 or 8)
    pub size: usize,
    pub big_endian: bool,
}

impl Dtype {
    /// Little-endian f64, the dtype this crate writes
    pub const F8_LE: Self = Self {
        size: 8,
        big_endian: false,
    };

    /// Parse a numpy type string such as `<f8` or `>f4`
    pub fn parse(descr: &str) -> Result<Self, NpyError> {
        let unsupported = || NpyError::UnsupportedDtype(descr.to_string());
        let mut chars = descr.chars();
        let big_endian = match chars.next() {
            Some('<') => false,
            Some('>') => true,
            Some('=') => cfg!(target_endian = "big"),
            _ => return Err(unsupported()),
        };
        let size = match chars.as_str() {
            "f4" => 4,
            "f8" => 8,
            _ => return Err(unsupported()),
        };
        Ok(Self { size, big_endian })
    }

    pub fn descr(&self) -> String {
        let order = if self.big_endian { '>' } else { '<' };
        format!("{}f{}", order, self.size)
    }

    fn decode(&self, bytes: &[u8]) -> f64 {
        match (self.size, self.big_endian) {
            (4, false) => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            (4, true) => f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            (_, false) => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
            (_, true) => f64::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}

/// Parsed `.npy` header dict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    pub dtype: Dtype,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl NpyHeader {
    /// Number of elements described by `shape`, `None` on overflow
    pub fn element_count(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |count, &dim| count.checked_mul(dim))
    }

    /// Render the header dict (unpadded)
    pub fn to_dict(&self) -> String {
        let shape = match self.shape.as_slice() {
            [] => "()".to_string(),
            [n] => format!("({},)", n),
            dims => {
                let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                format!("({})", dims.join(", "))
            }
        };
        format!(
            "{{'descr': '{}', 'fortran_order': {}, 'shape': {}, }}",
            self.dtype.descr(),
            if self.fortran_order { "True" } else { "False" },
            shape
        )
    }

    /// Parse a header dict
    pub fn from_dict(dict: &str) -> Result<Self, NpyError> {
        let descr = parse_quoted(dict_value(dict, "descr")?)?;
        let dtype = Dtype::parse(descr)?;

        let order = dict_value(dict, "fortran_order")?;
        let fortran_order = if order.starts_with("True") {
            true
        } else if order.starts_with("False") {
            false
        } else {
            return Err(NpyError::BadHeader(format!(
                "fortran_order is not a bool: {}",
                order
            )));
        };

        let shape = parse_shape(dict_value(dict, "shape")?)?;

        Ok(Self {
            dtype,
            fortran_order,
            shape,
        })
    }
}

/// Text following `'key':` in the header dict
fn dict_value<'a>(dict: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let start = [format!("'{}'", key), format!("\"{}\"", key)]
        .iter()
        .find_map(|quoted| dict.find(quoted.as_str()).map(|i| i + quoted.len()))
        .ok_or_else(|| NpyError::BadHeader(format!("missing key '{}'", key)))?;
    dict[start..]
        .trim_start()
        .strip_prefix(':')
        .map(str::trim_start)
        .ok_or_else(|| NpyError::BadHeader(format!("missing ':' after key '{}'", key)))
}

fn parse_quoted(value: &str) -> Result<&str, NpyError> {
    let quote = value
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| NpyError::BadHeader(format!("expected quoted string: {}", value)))?;
    let body = &value[1..];
    let end = body
        .find(quote)
        .ok_or_else(|| NpyError::BadHeader(format!("unterminated string: {}", value)))?;
    Ok(&body[..end])
}

fn parse_shape(value: &str) -> Result<Vec<usize>, NpyError> {
    let body = value
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map(|(body, _)| body)
        .ok_or_else(|| NpyError::BadHeader(format!("shape is not a tuple: {}", value)))?;
    body.split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            // Python 2 era files may write long literals such as `3L`
            dim.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| NpyError::BadHeader(format!("invalid dimension '{}'", dim)))
        })
        .collect()
}

/// Encode an array as a complete `.npy` file (little-endian f64, C order)
pub fn to_bytes<S, D>(array: &ArrayBase<S, D>) -> Vec<u8>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let header = NpyHeader {
        dtype: Dtype::F8_LE,
        fortran_order: false,
        shape: array.shape().to_vec(),
    };
    let dict = header.to_dict();

    // v1.0 stores the header length as u16; fall back to v2.0 for huge shapes
    let v1_header_len = (10 + dict.len() + 1).next_multiple_of(HEADER_ALIGN) - 10;
    let (major, length_field) = if v1_header_len <= u16::MAX as usize {
        (1u8, 2usize)
    } else {
        (2u8, 4usize)
    };
    let prefix_len = NPY_MAGIC.len() + 2 + length_field;
    let total = (prefix_len + dict.len() + 1).next_multiple_of(HEADER_ALIGN);
    let header_len = total - prefix_len;

    let mut bytes = Vec::with_capacity(total + array.len() * 8);
    bytes.extend_from_slice(NPY_MAGIC);
    bytes.push(major);
    bytes.push(0);
    if major == 1 {
        bytes.extend_from_slice(&(header_len as u16).to_le_bytes());
    } else {
        bytes.extend_from_slice(&(header_len as u32).to_le_bytes());
    }
    bytes.extend_from_slice(dict.as_bytes());
    bytes.resize(total - 1, b' ');
    bytes.push(b'\n');

    // iter() walks in logical (row-major) order regardless of memory layout
    for value in array.iter() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a complete `.npy` file
pub fn from_bytes(bytes: &[u8]) -> Result<ArrayD<f64>, NpyError> {
    if bytes.len() < NPY_MAGIC.len() + 2 || &bytes[..NPY_MAGIC.len()] != NPY_MAGIC {
        return Err(NpyError::BadMagic);
    }
    let (major, minor) = (bytes[6], bytes[7]);

    let (header_len, prefix_len) = match major {
        1 => {
            if bytes.len() < 10 {
                return Err(NpyError::BadHeader("truncated length field".to_string()));
            }
            (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10)
        }
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(NpyError::BadHeader("truncated length field".to_string()));
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        _ => return Err(NpyError::UnsupportedVersion { major, minor }),
    };

    let data_start = prefix_len + header_len;
    if bytes.len() < data_start {
        return Err(NpyError::BadHeader(format!(
            "header claims {} bytes, file has {}",
            header_len,
            bytes.len() - prefix_len
        )));
    }
    let dict = std::str::from_utf8(&bytes[prefix_len..data_start])
        .map_err(|_| NpyError::BadHeader("header is not valid text".to_string()))?;
    let header = NpyHeader::from_dict(dict)?;

    let data = &bytes[data_start..];
    let expected = header
        .element_count()
        .and_then(|count| count.checked_mul(header.dtype.size))
        .ok_or_else(|| {
            NpyError::BadHeader(format!("shape {:?} is too large", header.shape))
        })?;
    if data.len() != expected {
        return Err(NpyError::DataLength {
            expected,
            found: data.len(),
        });
    }

    let values: Vec<f64> = data
        .chunks_exact(header.dtype.size)
        .map(|chunk| header.dtype.decode(chunk))
        .collect();

    let array = if header.fortran_order {
        ArrayD::from_shape_vec(IxDyn(&header.shape).f(), values)?
    } else {
        ArrayD::from_shape_vec(IxDyn(&header.shape), values)?
    };
    Ok(array)
}

/// Save an array to a `.npy` file, replacing any existing file
pub fn save_npy<S, D>(path: &Path, array: &ArrayBase<S, D>) -> Result<()>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    std::fs::write(path, to_bytes(array))
        .with_context(|| format!("Failed to write keypoint array: {:?}", path))
}

/// Load a `.npy` file
pub fn load_npy(path: &Path) -> Result<ArrayD<f64>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to load keypoint array: {:?}", path))?;
    let array = from_bytes(&bytes).with_context(|| format!("Invalid .npy file: {:?}", path))?;
    Ok(array)
}
