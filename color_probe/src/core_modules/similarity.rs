// THEORY:
// Similarity compares two colors and nothing else. The metric is plain Euclidean
// distance in RGB space: cheap, symmetric, and good enough for thresholding a
// smoothed sample against a handful of reference colors in real time.
//
// A `Palette` is the classification layer built on top of that metric. It holds
// named reference colors and answers "which of these is the sample closest to, if
// any is close enough".

pub mod similarity {
    use crate::core_modules::color::color::Color;
    use serde::{Deserialize, Serialize};

    pub type Distance = f64;

    /// Largest possible distance, between black and white.
    pub const MAX_DISTANCE: Distance = 441.672_955_930_063_7;

    /// Euclidean distance between two colors treated as points in RGB space.
    pub fn distance(c1: Color, c2: Color) -> Distance {
        let dr = c2.red() as Distance - c1.red() as Distance;
        let dg = c2.green() as Distance - c1.green() as Distance;
        let db = c2.blue() as Distance - c1.blue() as Distance;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// A reference color with a human-readable label.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct NamedColor {
        pub name: String,
        #[serde(with = "rgb_triplet")]
        pub rgb: Color,
    }

    impl NamedColor {
        pub fn new(name: impl Into<String>, rgb: Color) -> Self {
            Self {
                name: name.into(),
                rgb,
            }
        }
    }

    /// Outcome of classifying one sample against a palette.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ColorMatch {
        pub name: String,
        pub reference: Color,
        pub distance: Distance,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Palette {
        entries: Vec<NamedColor>,
    }

    impl Palette {
        pub fn new(entries: Vec<NamedColor>) -> Self {
            Self { entries }
        }

        /// The seven named colors: red, green, blue, yellow, orange, purple, pink.
        pub fn standard() -> Self {
            Self::new(vec![
                NamedColor::new("red", Color::RED),
                NamedColor::new("green", Color::GREEN),
                NamedColor::new("blue", Color::BLUE),
                NamedColor::new("yellow", Color::YELLOW),
                NamedColor::new("orange", Color::ORANGE),
                NamedColor::new("purple", Color::PURPLE),
                NamedColor::new("pink", Color::PINK),
            ])
        }

        pub fn entries(&self) -> &[NamedColor] {
            &self.entries
        }

        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }

        /// Nearest entry, regardless of how far away it is. Ties go to the earlier entry.
        pub fn nearest(&self, color: Color) -> Option<ColorMatch> {
            let mut best: Option<(&NamedColor, Distance)> = None;
            for entry in &self.entries {
                let d = distance(color, entry.rgb);
                if best.is_none_or(|(_, best_d)| d < best_d) {
                    best = Some((entry, d));
                }
            }
            best.map(|(entry, d)| ColorMatch {
                name: entry.name.clone(),
                reference: entry.rgb,
                distance: d,
            })
        }

        /// Nearest entry within `max_distance` (inclusive), or `None`.
        pub fn classify(&self, color: Color, max_distance: Distance) -> Option<ColorMatch> {
            self.nearest(color).filter(|m| m.distance <= max_distance)
        }
    }

    mod rgb_triplet {
        use crate::core_modules::color::color::Color;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
            color.channels().serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
            <[u8; 3]>::deserialize(deserializer).map(Color::from)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const SAMPLES: [Color; 6] = [
            Color::RED,
            Color::BLACK,
            Color::WHITE,
            Color::new(12, 200, 99),
            Color::new(255, 1, 128),
            Color::new(64, 64, 64),
        ];

        #[test]
        fn distance_to_self_is_zero() {
            for c in SAMPLES {
                assert_eq!(distance(c, c), 0.0);
            }
        }

        #[test]
        fn distance_is_symmetric_and_non_negative() {
            for a in SAMPLES {
                for b in SAMPLES {
                    assert_eq!(distance(a, b), distance(b, a));
                    assert!(distance(a, b) >= 0.0);
                    if a != b {
                        assert!(distance(a, b) > 0.0);
                    }
                }
            }
        }

        #[test]
        fn red_to_green() {
            let d = distance(Color::RED, Color::GREEN);
            assert!((d - (2.0f64 * 255.0 * 255.0).sqrt()).abs() < 1e-9);
            assert!((d - 360.62).abs() < 0.01);
        }

        #[test]
        fn black_to_white_is_the_maximum() {
            assert!((distance(Color::BLACK, Color::WHITE) - MAX_DISTANCE).abs() < 1e-9);
        }

        #[test]
        fn classify_picks_nearest_within_threshold() {
            let palette = Palette::standard();
            let sample = Color::new(240, 20, 10);
            let hit = palette.classify(sample, 50.0).expect("close to red");
            assert_eq!(hit.name, "red");
            assert_eq!(hit.reference, Color::RED);

            assert!(palette.classify(Color::GRAY, 50.0).is_none());
            assert!(palette.nearest(Color::GRAY).is_some());
        }

        #[test]
        fn ties_resolve_to_first_entry() {
            let palette = Palette::new(vec![
                NamedColor::new("a", Color::new(0, 0, 10)),
                NamedColor::new("b", Color::new(0, 0, 30)),
            ]);
            assert_eq!(palette.nearest(Color::new(0, 0, 20)).unwrap().name, "a");
        }

        #[test]
        fn empty_palette_never_matches() {
            assert!(Palette::default().classify(Color::RED, MAX_DISTANCE).is_none());
        }
    }
}
