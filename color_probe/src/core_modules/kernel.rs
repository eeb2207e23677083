// THEORY:
// A `Kernel` is a square matrix of weights describing how much each neighbor of a
// center pixel contributes to the smoothed value at that center. Kernels are data,
// not behavior: the convolution engine reads them, nothing ever mutates them.
//
// Key architectural principles:
// 1.  **Validated at the door**: `Kernel::new` rejects empty, non-square, even-sized
//     and non-finite matrices. Once a `Kernel` exists the engine can index it
//     without further checks.
// 2.  **Shared presets**: the four shipped presets are built once behind a
//     `OnceLock` and handed out as `&'static Kernel`, so every consumer thread
//     reads the same immutable weights.
// 3.  **No normalization**: weights are not forced to sum to 1.0. All presets do,
//     which is what makes averaging a uniform region reproduce its color.

pub mod kernel {
    use crate::error::{Result, VisionError};
    use serde::{Deserialize, Serialize};
    use std::sync::OnceLock;

    pub type Weight = f64;

    const GAUSSIAN_3X3: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];
    const GAUSSIAN_3X3_SUM: f64 = 16.0;

    const GAUSSIAN_5X5: [[u32; 5]; 5] = [
        [1, 4, 7, 4, 1],
        [4, 16, 26, 16, 4],
        [7, 26, 41, 26, 7],
        [4, 16, 26, 16, 4],
        [1, 4, 7, 4, 1],
    ];
    const GAUSSIAN_5X5_SUM: f64 = 273.0;

    // Row 6 of Pascal's triangle; the 7x7 preset is its outer product with itself.
    const BINOMIAL_7: [u32; 7] = [1, 6, 15, 20, 15, 6, 1];
    const GAUSSIAN_7X7_SUM: f64 = 4096.0;

    static IDENTITY: OnceLock<Kernel> = OnceLock::new();
    static GAUSSIAN_3: OnceLock<Kernel> = OnceLock::new();
    static GAUSSIAN_5: OnceLock<Kernel> = OnceLock::new();
    static GAUSSIAN_7: OnceLock<Kernel> = OnceLock::new();

    /// An immutable, odd-sized square matrix of weights stored row-major.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Kernel {
        size: usize,
        weights: Vec<Weight>,
    }

    impl Kernel {
        /// Builds a kernel from its rows, validating shape and weights.
        pub fn new(rows: Vec<Vec<Weight>>) -> Result<Self> {
            let size = rows.len();
            if size == 0 {
                return Err(VisionError::invalid_kernel("kernel has no rows"));
            }
            if size % 2 == 0 {
                return Err(VisionError::invalid_kernel(format!(
                    "side length {size} is even"
                )));
            }

            let mut weights = Vec::with_capacity(size * size);
            for (index, row) in rows.into_iter().enumerate() {
                if row.len() != size {
                    return Err(VisionError::invalid_kernel(format!(
                        "row {index} has {} weights, expected {size}",
                        row.len()
                    )));
                }
                if let Some(bad) = row.iter().find(|w| !w.is_finite()) {
                    return Err(VisionError::invalid_kernel(format!(
                        "row {index} holds non-finite weight {bad}"
                    )));
                }
                weights.extend(row);
            }

            Ok(Self { size, weights })
        }

        /// The 1x1 pass-through kernel.
        pub fn identity() -> &'static Kernel {
            IDENTITY.get_or_init(|| Kernel {
                size: 1,
                weights: vec![1.0],
            })
        }

        /// 3x3 binomial kernel, weights over 16.
        pub fn gaussian_3x3() -> &'static Kernel {
            GAUSSIAN_3.get_or_init(|| Kernel::from_integer_table(&GAUSSIAN_3X3, GAUSSIAN_3X3_SUM))
        }

        /// 5x5 Gaussian-like kernel, weights over 273.
        pub fn gaussian_5x5() -> &'static Kernel {
            GAUSSIAN_5.get_or_init(|| Kernel::from_integer_table(&GAUSSIAN_5X5, GAUSSIAN_5X5_SUM))
        }

        /// 7x7 binomial kernel, weights over 4096.
        pub fn gaussian_7x7() -> &'static Kernel {
            GAUSSIAN_7.get_or_init(|| {
                let mut table = [[0u32; 7]; 7];
                for (i, row) in table.iter_mut().enumerate() {
                    for (j, cell) in row.iter_mut().enumerate() {
                        *cell = BINOMIAL_7[i] * BINOMIAL_7[j];
                    }
                }
                Kernel::from_integer_table(&table, GAUSSIAN_7X7_SUM)
            })
        }

        fn from_integer_table<const N: usize>(table: &[[u32; N]; N], divisor: f64) -> Kernel {
            let weights = table
                .iter()
                .flat_map(|row| row.iter().map(|&w| w as Weight / divisor))
                .collect();
            Kernel { size: N, weights }
        }

        pub fn size(&self) -> usize {
            self.size
        }

        /// Half the side length, rounded down. A 5x5 kernel has `half() == 2`.
        pub fn half(&self) -> usize {
            self.size / 2
        }

        /// Weight at `(row, col)`. Panics if either index is `>= size()`.
        #[inline]
        pub fn weight(&self, row: usize, col: usize) -> Weight {
            self.weights[row * self.size + col]
        }

        pub fn sum(&self) -> Weight {
            self.weights.iter().sum()
        }

        pub fn rows(&self) -> impl Iterator<Item = &[Weight]> {
            self.weights.chunks(self.size)
        }
    }

    impl TryFrom<Vec<Vec<Weight>>> for Kernel {
        type Error = VisionError;

        fn try_from(rows: Vec<Vec<Weight>>) -> Result<Self> {
            Kernel::new(rows)
        }
    }

    /// Names of the shipped presets, as written in configuration files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum KernelPreset {
        Identity,
        #[default]
        Gaussian3,
        Gaussian5,
        Gaussian7,
    }

    impl KernelPreset {
        pub fn kernel(self) -> &'static Kernel {
            match self {
                KernelPreset::Identity => Kernel::identity(),
                KernelPreset::Gaussian3 => Kernel::gaussian_3x3(),
                KernelPreset::Gaussian5 => Kernel::gaussian_5x5(),
                KernelPreset::Gaussian7 => Kernel::gaussian_7x7(),
            }
        }

        pub fn parse(name: &str) -> Option<Self> {
            match name.trim().to_ascii_lowercase().as_str() {
                "identity" | "1x1" => Some(KernelPreset::Identity),
                "gaussian3" | "3x3" => Some(KernelPreset::Gaussian3),
                "gaussian5" | "5x5" => Some(KernelPreset::Gaussian5),
                "gaussian7" | "7x7" => Some(KernelPreset::Gaussian7),
                _ => None,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn presets_have_expected_sizes_and_unit_sum() {
            for (preset, size) in [
                (KernelPreset::Identity, 1),
                (KernelPreset::Gaussian3, 3),
                (KernelPreset::Gaussian5, 5),
                (KernelPreset::Gaussian7, 7),
            ] {
                let kernel = preset.kernel();
                assert_eq!(kernel.size(), size);
                assert_eq!(kernel.half(), size / 2);
                assert!((kernel.sum() - 1.0).abs() < 1e-12, "{preset:?} sums to {}", kernel.sum());
            }
        }

        #[test]
        fn preset_weights_match_tables() {
            let k3 = Kernel::gaussian_3x3();
            assert_eq!(k3.weight(1, 1), 4.0 / 16.0);
            assert_eq!(k3.weight(0, 2), 1.0 / 16.0);

            let k5 = Kernel::gaussian_5x5();
            assert_eq!(k5.weight(2, 2), 41.0 / 273.0);
            assert_eq!(k5.weight(1, 2), 26.0 / 273.0);

            let k7 = Kernel::gaussian_7x7();
            assert_eq!(k7.weight(3, 3), 400.0 / 4096.0);
            assert_eq!(k7.weight(2, 4), 225.0 / 4096.0);
            assert_eq!(k7.weight(0, 6), 1.0 / 4096.0);
        }

        #[test]
        fn presets_are_shared() {
            assert!(std::ptr::eq(Kernel::gaussian_5x5(), KernelPreset::Gaussian5.kernel()));
        }

        #[test]
        fn rejects_malformed_matrices() {
            assert!(matches!(Kernel::new(vec![]), Err(VisionError::InvalidKernel { .. })));
            assert!(matches!(
                Kernel::new(vec![vec![0.25, 0.25], vec![0.25, 0.25]]),
                Err(VisionError::InvalidKernel { .. })
            ));
            assert!(matches!(
                Kernel::new(vec![vec![1.0; 3], vec![1.0; 2], vec![1.0; 3]]),
                Err(VisionError::InvalidKernel { .. })
            ));
            assert!(matches!(
                Kernel::new(vec![vec![f64::NAN]]),
                Err(VisionError::InvalidKernel { .. })
            ));
        }

        #[test]
        fn accepts_custom_odd_square() {
            let kernel = Kernel::try_from(vec![vec![1.0 / 9.0; 3]; 3]).expect("valid kernel");
            assert_eq!(kernel.size(), 3);
            assert_eq!(kernel.rows().count(), 3);
        }

        #[test]
        fn parses_preset_names() {
            assert_eq!(KernelPreset::parse("5x5"), Some(KernelPreset::Gaussian5));
            assert_eq!(KernelPreset::parse(" Identity "), Some(KernelPreset::Identity));
            assert_eq!(KernelPreset::parse("9x9"), None);
        }
    }
}
