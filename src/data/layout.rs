use crate::math::Matrix;
use crate::models::InputShape;

/// How a feature matrix becomes a single-channel 2-D model input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputLayout {
    /// Use the feature's own `rows x cols` (spectrograms).
    AsIs,
    /// Fold the flattened feature row-major into rows of `width` values,
    /// zero-filling the last row (waveforms).
    Folded { width: usize },
}

impl InputLayout {
    /// Model input shape for features of `rows x cols`.
    pub fn input_shape(&self, rows: usize, cols: usize) -> InputShape {
        match *self {
            InputLayout::AsIs => InputShape::new(rows, cols),
            InputLayout::Folded { width } => {
                let width = width.max(1);
                let total = rows * cols;
                InputShape::new(total.div_ceil(width), width)
            }
        }
    }

    /// Write `feature` into `out`, a row of `input_shape(..).len()` values.
    ///
    /// Both layouts keep the row-major order of the feature, so this is a
    /// copy followed by zero fill of any folding tail.
    pub fn write_row(&self, feature: &Matrix, out: &mut [f32]) {
        let n = feature.data.len().min(out.len());
        out[..n].copy_from_slice(&feature.data[..n]);
        out[n..].iter_mut().for_each(|v| *v = 0.0);
    }
}
