//! Detection-head tensors and their per-cell decoding.
//!
//! A detection head emits a `[batch, channels, cells]` buffer where
//! `channels = 4 + num_classes`. Channel-major storage means one cell's values
//! are spread across the buffer with a stride of `cells`; the decoder exposes
//! them as rows of a logical `[cells, channels]` transpose without copying.

use crate::util::{PostError, PostResult};

mod cells;

pub use cells::{decode, Cell, DecodedCells};

/// Number of leading box channels (`cx, cy, w, h`).
pub const BOX_CHANNELS: usize = 4;

/// Borrowed `[batch, channels, cells]` view into a contiguous `f32` buffer.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    shape: [usize; 3],
}

impl<'a> TensorView<'a> {
    /// Creates a view, validating that `data` holds exactly `shape` elements.
    pub fn new(data: &'a [f32], shape: [usize; 3]) -> PostResult<Self> {
        let needed = required_len(shape, data.len())?;
        if data.len() != needed {
            return Err(PostError::InvalidShape {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Returns `[batch, channels, cells]`.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn batch(&self) -> usize {
        self.shape[0]
    }

    pub fn channels(&self) -> usize {
        self.shape[1]
    }

    pub fn cells(&self) -> usize {
        self.shape[2]
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the channel-major plane of one batch element.
    pub fn batch_plane(&self, index: usize) -> Option<&'a [f32]> {
        if index >= self.batch() {
            return None;
        }
        let plane = self.channels() * self.cells();
        let start = index.checked_mul(plane)?;
        self.data.get(start..start + plane)
    }

    /// Returns the value at `(batch, channel, cell)` if it is within bounds.
    pub fn get(&self, batch: usize, channel: usize, cell: usize) -> Option<f32> {
        if batch >= self.batch() || channel >= self.channels() || cell >= self.cells() {
            return None;
        }
        let idx = (batch * self.channels() + channel) * self.cells() + cell;
        self.data.get(idx).copied()
    }
}

/// Owned detection-head output for one branch of one request.
#[derive(Clone, Debug, PartialEq)]
pub struct RawOutputTensor {
    data: Vec<f32>,
    shape: [usize; 3],
}

impl RawOutputTensor {
    /// Wraps a contiguous channel-major buffer.
    pub fn new(data: Vec<f32>, shape: [usize; 3]) -> PostResult<Self> {
        TensorView::new(&data, shape)?;
        Ok(Self { data, shape })
    }

    /// Encodes per-cell `(box, scores)` rows into a `[1, 4 + C, N]` tensor.
    ///
    /// Every row must carry exactly `num_classes` scores. This is the inverse
    /// of [`decode`].
    pub fn from_cells(num_classes: usize, cells: &[([f32; 4], Vec<f32>)]) -> PostResult<Self> {
        let channels = BOX_CHANNELS + num_classes;
        let n = cells.len();
        let shape = [1, channels, n];
        let len = required_len(shape, 0)?;
        let mut data = vec![0.0f32; len];
        for (i, (bbox, scores)) in cells.iter().enumerate() {
            if scores.len() != num_classes {
                return Err(PostError::InvalidShape {
                    shape,
                    len: BOX_CHANNELS + scores.len(),
                });
            }
            for (c, value) in bbox.iter().chain(scores.iter()).enumerate() {
                data[c * n + i] = *value;
            }
        }
        Ok(Self { data, shape })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns a borrowed view of the tensor.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            data: &self.data,
            shape: self.shape,
        }
    }
}

fn required_len(shape: [usize; 3], got: usize) -> PostResult<usize> {
    let invalid = PostError::InvalidShape { shape, len: got };
    if shape[0] == 0 || shape[1] == 0 {
        return Err(invalid);
    }
    shape[0]
        .checked_mul(shape[1])
        .and_then(|v| v.checked_mul(shape[2]))
        .ok_or(invalid)
}
