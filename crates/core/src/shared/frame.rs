use std::fmt;

use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};

use crate::shared::error::InputError;

/// Pixel layout of an image frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Rgb,
    Ir,
}

impl ImageFormat {
    pub fn channels(&self) -> u8 {
        match self {
            ImageFormat::Rgb => 3,
            ImageFormat::Ir => 1,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Rgb => write!(f, "RGB"),
            ImageFormat::Ir => write!(f, "IR"),
        }
    }
}

/// A captured image: contiguous bytes in row-major order, tagged with its format.
///
/// Frames are owned by the caller. Every stage receives `&Frame` and none
/// of them keeps the reference past the call that received it.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: ImageFormat,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: ImageFormat, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (format.channels() as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
        }
    }

    /// Checked constructor for buffers coming from outside the process.
    pub fn try_new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: ImageFormat,
        index: usize,
    ) -> Result<Self, InputError> {
        let frame = Self {
            data,
            width,
            height,
            format,
            index,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// A uniformly filled frame, mostly useful for replayed captures.
    pub fn filled(value: u8, width: u32, height: u32, format: ImageFormat, index: usize) -> Self {
        let len = (width as usize) * (height as usize) * (format.channels() as usize);
        Self::new(vec![value; len], width, height, format, index)
    }

    /// Rejects empty or truncated buffers.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.width == 0 || self.height == 0 {
            return Err(InputError::MalformedFrame(format!(
                "zero-sized frame {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.expected_len();
        if self.data.len() != expected {
            return Err(InputError::MalformedFrame(format!(
                "{} frame {}x{} needs {expected} bytes, got {}",
                self.format,
                self.width,
                self.height,
                self.data.len()
            )));
        }
        Ok(())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn channels(&self) -> u8 {
        self.format.channels()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> Result<ArrayView3<'_, u8>, InputError> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .map_err(|e| InputError::MalformedFrame(e.to_string()))
    }

    fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * (self.channels() as usize)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels() as usize,
        )
    }
}
