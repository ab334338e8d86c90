//! Packed codec for rectangular numeric arrays.
//!
//! An independent, opt-in encoding path beside [`crate::codec`]: the host
//! application calls it explicitly (via [`crate::DirectClient::set_tensor`] or
//! directly) rather than through the default encode/decode chain.
//!
//! ## Wire format
//!
//! A fixed 16-byte big-endian header of four `u32` fields — element-type
//! code, dim1, dim2, dim3, with unused dims set to 0 — followed by the raw
//! contiguous element bytes in native byte order.
//!
//! ```text
//! +-----------+--------+--------+--------+----------------------+
//! | type code | dim1   | dim2   | dim3   | element bytes ...    |
//! | u32 BE    | u32 BE | u32 BE | u32 BE | native byte order    |
//! +-----------+--------+--------+--------+----------------------+
//! ```
//!
//! Arrays of more than 3 dimensions are rejected with
//! [`Error::UnsupportedShape`]; since dim 0 marks "unused" on the wire,
//! zero-size dimensions are rejected at construction.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Header length in bytes: four big-endian `u32` fields.
pub const HEADER_LEN: usize = 16;

/// Supported element types and their stable wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// 32-bit IEEE-754 float.
    F32,
    /// 64-bit IEEE-754 float.
    F64,
}

impl ElementType {
    /// Wire code written into the header.
    pub fn code(self) -> u32 {
        match self {
            ElementType::U8 => 0,
            ElementType::I8 => 1,
            ElementType::U16 => 2,
            ElementType::I16 => 3,
            ElementType::U32 => 4,
            ElementType::I32 => 5,
            ElementType::U64 => 6,
            ElementType::I64 => 7,
            ElementType::F32 => 8,
            ElementType::F64 => 9,
        }
    }

    /// Reverse of [`ElementType::code`].
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(ElementType::U8),
            1 => Some(ElementType::I8),
            2 => Some(ElementType::U16),
            3 => Some(ElementType::I16),
            4 => Some(ElementType::U32),
            5 => Some(ElementType::I32),
            6 => Some(ElementType::U64),
            7 => Some(ElementType::I64),
            8 => Some(ElementType::F32),
            9 => Some(ElementType::F64),
            _ => None,
        }
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::U64 | ElementType::I64 | ElementType::F64 => 8,
        }
    }

    /// Type name, for error messages.
    pub fn name(self) -> &'static str {
        match self {
            ElementType::U8 => "u8",
            ElementType::I8 => "i8",
            ElementType::U16 => "u16",
            ElementType::I16 => "i16",
            ElementType::U32 => "u32",
            ElementType::I32 => "i32",
            ElementType::U64 => "u64",
            ElementType::I64 => "i64",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
        }
    }
}

/// A numeric type storable as tensor elements.
///
/// Implemented for the ten types in [`ElementType`]; elements cross the wire
/// in native byte order.
pub trait Element: Copy {
    /// The wire-level element type for `Self`.
    const DTYPE: ElementType;

    /// Append the native-byte-order encoding of `self`.
    fn write_to(self, out: &mut Vec<u8>);

    /// Read one element from exactly `DTYPE.size()` bytes.
    fn read_from(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: ElementType = $dtype;

                fn write_to(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_ne_bytes());
                }

                fn read_from(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(buf)
                }
            }
        )*
    };
}

impl_element! {
    u8 => ElementType::U8,
    i8 => ElementType::I8,
    u16 => ElementType::U16,
    i16 => ElementType::I16,
    u32 => ElementType::U32,
    i32 => ElementType::I32,
    u64 => ElementType::U64,
    i64 => ElementType::I64,
    f32 => ElementType::F32,
    f64 => ElementType::F64,
}

/// Element count of a shape, or `None` when the product overflows `usize`.
fn checked_element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// A rectangular numeric array of 1 to 3 dimensions.
///
/// Elements are held as raw bytes plus an [`ElementType`]; typed access goes
/// through [`Tensor::from_vec`] and [`Tensor::to_vec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dtype: ElementType,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl Tensor {
    /// Build a tensor from a flat element vector and a shape.
    ///
    /// The shape must have 1 to 3 nonzero dimensions whose product equals the
    /// element count.
    ///
    /// ```
    /// use directkv::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.shape(), &[2, 3]);
    /// ```
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        if shape.is_empty() || shape.len() > 3 {
            return Err(Error::UnsupportedShape { dims: shape.len() });
        }
        if shape.iter().any(|&d| d == 0) {
            return Err(Error::InvalidArgument(
                "tensor dimensions must be nonzero".to_owned(),
            ));
        }
        if shape.iter().any(|&d| d > u32::MAX as usize) {
            return Err(Error::InvalidArgument(
                "tensor dimension exceeds u32 range".to_owned(),
            ));
        }
        match checked_element_count(shape) {
            Some(expected) if expected == data.len() => {}
            expected => {
                return Err(Error::InvalidArgument(format!(
                    "shape {:?} holds {} elements but {} were given",
                    shape,
                    expected.map_or_else(|| "too many".to_owned(), |n| n.to_string()),
                    data.len()
                )));
            }
        }

        let mut bytes = Vec::with_capacity(data.len() * T::DTYPE.size());
        for element in data {
            element.write_to(&mut bytes);
        }
        Ok(Tensor {
            dtype: T::DTYPE,
            shape: shape.to_vec(),
            data: bytes,
        })
    }

    /// Element type of this tensor.
    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    /// Shape of this tensor (1 to 3 dimensions).
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        // The element bytes are materialized, so this never overflows.
        self.data.len() / self.dtype.size()
    }

    /// Raw element bytes in native byte order.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Read the elements back as a flat vector of `T`.
    ///
    /// Fails with [`Error::WrongType`] when `T` does not match the stored
    /// element type.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(Error::WrongType {
                expected: self.dtype.name().to_owned(),
                actual: T::DTYPE.name().to_owned(),
            });
        }
        let size = self.dtype.size();
        Ok(self
            .data
            .chunks_exact(size)
            .map(T::read_from)
            .collect())
    }

    /// Encode to the packed wire form: 16-byte big-endian header, then the
    /// raw element bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut header = [0u8; HEADER_LEN];
        BigEndian::write_u32(&mut header[0..4], self.dtype.code());
        for (i, &dim) in self.shape.iter().enumerate() {
            BigEndian::write_u32(&mut header[4 + i * 4..8 + i * 4], dim as u32);
        }
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len());
        out.extend_from_slice(&header);
        out.extend_from_slice(&self.data);
        out
    }

    /// Decode from the packed wire form.
    ///
    /// Fails with [`Error::InvalidTensor`] on a short header, unknown element
    /// type code, inconsistent dims, or a body length that does not match the
    /// declared shape.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::InvalidTensor(format!(
                "truncated header: {} bytes",
                bytes.len()
            )));
        }
        let code = BigEndian::read_u32(&bytes[0..4]);
        let dtype = ElementType::from_code(code)
            .ok_or_else(|| Error::InvalidTensor(format!("unknown element type code {code}")))?;
        let d1 = BigEndian::read_u32(&bytes[4..8]) as usize;
        let d2 = BigEndian::read_u32(&bytes[8..12]) as usize;
        let d3 = BigEndian::read_u32(&bytes[12..16]) as usize;

        // Dim 0 marks "unused"; used dims must be contiguous from dim1.
        let shape = match (d1, d2, d3) {
            (0, _, _) => {
                return Err(Error::InvalidTensor("zero leading dimension".to_owned()));
            }
            (_, 0, 0) => vec![d1],
            (_, 0, _) => {
                return Err(Error::InvalidTensor(
                    "dim3 set while dim2 is unused".to_owned(),
                ));
            }
            (_, _, 0) => vec![d1, d2],
            _ => vec![d1, d2, d3],
        };

        // The header is attacker-controlled: the dim product must not be
        // trusted to fit in usize.
        let expected = checked_element_count(&shape)
            .and_then(|n| n.checked_mul(dtype.size()))
            .ok_or_else(|| {
                Error::InvalidTensor(format!(
                    "shape {:?} of {} overflows the addressable size",
                    shape,
                    dtype.name()
                ))
            })?;
        let body = &bytes[HEADER_LEN..];
        if body.len() != expected {
            return Err(Error::InvalidTensor(format!(
                "shape {:?} of {} expects {} body bytes, got {}",
                shape,
                dtype.name(),
                expected,
                body.len()
            )));
        }

        Ok(Tensor {
            dtype,
            shape,
            data: body.to_vec(),
        })
    }
}
