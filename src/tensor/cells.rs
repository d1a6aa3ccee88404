//! Strided per-cell view over a detection-head tensor.

use crate::tensor::{TensorView, BOX_CHANNELS};
use crate::util::{PostError, PostResult};

/// Logical `[cells, 4 + C]` transpose of batch element 0 of a tensor.
#[derive(Copy, Clone, Debug)]
pub struct DecodedCells<'a> {
    plane: &'a [f32],
    cells: usize,
    num_classes: usize,
}

/// Decodes a `[1, 4 + C, N]` tensor into `N` cells.
///
/// Only batch element 0 is read. Fails with `ShapeMismatch` when the channel
/// count is not `4 + num_classes`.
pub fn decode<'a>(
    view: TensorView<'a>,
    num_classes: usize,
    branch: &str,
) -> PostResult<DecodedCells<'a>> {
    let expected = BOX_CHANNELS + num_classes;
    if view.channels() != expected {
        return Err(PostError::ShapeMismatch {
            branch: branch.to_owned(),
            expected,
            got: view.channels(),
        });
    }
    let plane = view.batch_plane(0).ok_or(PostError::InvalidShape {
        shape: view.shape(),
        len: view.as_slice().len(),
    })?;
    Ok(DecodedCells {
        plane,
        cells: view.cells(),
        num_classes,
    })
}

impl<'a> DecodedCells<'a> {
    /// Number of cells (rows of the transposed view).
    pub fn len(&self) -> usize {
        self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells == 0
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns row `index` of the transposed view.
    pub fn cell(&self, index: usize) -> Option<Cell<'a>> {
        if index >= self.cells {
            return None;
        }
        Some(Cell {
            plane: self.plane,
            stride: self.cells,
            index,
            num_classes: self.num_classes,
        })
    }

    /// Iterates cells in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Cell<'a>> + '_ {
        let this = *self;
        (0..self.cells).map(move |index| Cell {
            plane: this.plane,
            stride: this.cells,
            index,
            num_classes: this.num_classes,
        })
    }
}

/// One cell: a center-form box followed by `C` class scores.
#[derive(Copy, Clone, Debug)]
pub struct Cell<'a> {
    plane: &'a [f32],
    stride: usize,
    index: usize,
    num_classes: usize,
}

impl<'a> Cell<'a> {
    /// Cell index within the tensor.
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    fn channel(&self, channel: usize) -> f32 {
        self.plane[channel * self.stride + self.index]
    }

    /// Returns `[cx, cy, w, h]`.
    pub fn bbox(&self) -> [f32; 4] {
        [
            self.channel(0),
            self.channel(1),
            self.channel(2),
            self.channel(3),
        ]
    }

    /// Returns the score of class `class`, if in range.
    pub fn score(&self, class: usize) -> Option<f32> {
        (class < self.num_classes).then(|| self.channel(BOX_CHANNELS + class))
    }

    /// Iterates class scores in class order.
    pub fn scores(&self) -> impl ExactSizeIterator<Item = f32> + 'a {
        let this = *self;
        (0..self.num_classes).map(move |c| this.channel(BOX_CHANNELS + c))
    }

    /// Returns `(class_index, score)` of the best class.
    ///
    /// Ties resolve to the lowest index. NaN scores never win; `None` when
    /// every score is NaN or there are no classes.
    pub fn best_class(&self) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (class, score) in self.scores().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, max)) if score <= max => {}
                _ => best = Some((class, score)),
            }
        }
        best
    }

    /// Copies the row as `(box, scores)`.
    pub fn to_row(&self) -> ([f32; 4], Vec<f32>) {
        (self.bbox(), self.scores().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::decode;
    use crate::tensor::RawOutputTensor;
    use crate::util::PostError;

    #[test]
    fn rejects_wrong_channel_count() {
        let t = RawOutputTensor::new(vec![0.0; 14], [1, 7, 2]).unwrap();
        let err = decode(t.view(), 2, "INPUT_0").unwrap_err();
        assert_eq!(
            err,
            PostError::ShapeMismatch {
                branch: "INPUT_0".into(),
                expected: 6,
                got: 7,
            }
        );
    }

    #[test]
    fn best_class_takes_first_of_ties() {
        let t = RawOutputTensor::from_cells(3, &[([0.0; 4], vec![0.4, 0.7, 0.7])]).unwrap();
        let cells = decode(t.view(), 3, "b").unwrap();
        assert_eq!(cells.cell(0).unwrap().best_class(), Some((1, 0.7)));
    }

    #[test]
    fn best_class_skips_nan() {
        let t =
            RawOutputTensor::from_cells(3, &[([0.0; 4], vec![f32::NAN, 0.2, f32::NAN])]).unwrap();
        let cells = decode(t.view(), 3, "b").unwrap();
        assert_eq!(cells.cell(0).unwrap().best_class(), Some((1, 0.2)));

        let t = RawOutputTensor::from_cells(2, &[([0.0; 4], vec![f32::NAN, f32::NAN])]).unwrap();
        let cells = decode(t.view(), 2, "b").unwrap();
        assert_eq!(cells.cell(0).unwrap().best_class(), None);
    }

    #[test]
    fn only_first_batch_element_is_decoded() {
        let mut data = vec![1.0f32; 5];
        data.extend(vec![2.0f32; 5]);
        let t = RawOutputTensor::new(data, [2, 5, 1]).unwrap();
        let cells = decode(t.view(), 1, "b").unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells.cell(0).unwrap().bbox(), [1.0; 4]);
    }
}
