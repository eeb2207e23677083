// THEORY:
// `Color` is the leaf data type of the whole engine: a plain 8-bit RGB triple.
// It is a "dumb" container. It knows how to pack and
// unpack itself and nothing else; every comparison between colors lives in
// `similarity`, every neighborhood computation lives in `convolution`.
//
// Channel range is enforced by the type (`u8`) rather than by runtime checks. The
// packed constructor accepts any 32-bit word and masks each channel on the way in,
// so an ARGB word from a bitmap can be handed over directly and its alpha byte is
// simply ignored.

pub mod color {
    use std::fmt;

    pub type Channel = u8;
    pub type PackedRgb = u32;

    /// An immutable RGB color with 8 bits per channel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Color {
        red: Channel,
        green: Channel,
        blue: Channel,
    }

    impl Color {
        pub const RED: Color = Color::new(255, 0, 0);
        pub const GREEN: Color = Color::new(0, 255, 0);
        pub const BLUE: Color = Color::new(0, 0, 255);
        pub const YELLOW: Color = Color::new(255, 255, 0);
        pub const ORANGE: Color = Color::new(255, 128, 0);
        pub const PURPLE: Color = Color::new(128, 0, 255);
        pub const PINK: Color = Color::new(255, 0, 255);

        /// Neutral gray used as the fill value for samples outside a grid.
        pub const GRAY: Color = Color::new(128, 128, 128);
        pub const BLACK: Color = Color::new(0, 0, 0);
        pub const WHITE: Color = Color::new(255, 255, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Builds a color from a `0x??RRGGBB` word. The top byte is ignored.
        pub const fn from_packed(rgb: PackedRgb) -> Self {
            Self {
                red: ((rgb >> 16) & 0xFF) as Channel,
                green: ((rgb >> 8) & 0xFF) as Channel,
                blue: (rgb & 0xFF) as Channel,
            }
        }

        /// Builds a color from wide channel values, clamping each into `0..=255`.
        pub fn from_clamped(red: i64, green: i64, blue: i64) -> Self {
            Self {
                red: clamp_channel(red),
                green: clamp_channel(green),
                blue: clamp_channel(blue),
            }
        }

        pub const fn red(&self) -> Channel {
            self.red
        }

        pub const fn green(&self) -> Channel {
            self.green
        }

        pub const fn blue(&self) -> Channel {
            self.blue
        }

        /// The color as a `0x00RRGGBB` word.
        pub const fn packed(&self) -> PackedRgb {
            (self.red as PackedRgb) << 16 | (self.green as PackedRgb) << 8 | self.blue as PackedRgb
        }

        pub const fn channels(&self) -> [Channel; 3] {
            [self.red, self.green, self.blue]
        }
    }

    fn clamp_channel(value: i64) -> Channel {
        value.clamp(0, Channel::MAX as i64) as Channel
    }

    impl fmt::Display for Color {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
        }
    }

    impl From<[Channel; 3]> for Color {
        fn from(channels: [Channel; 3]) -> Self {
            Color::new(channels[0], channels[1], channels[2])
        }
    }

    impl From<Color> for [Channel; 3] {
        fn from(color: Color) -> Self {
            color.channels()
        }
    }

    impl From<image::Rgb<Channel>> for Color {
        fn from(pixel: image::Rgb<Channel>) -> Self {
            Color::from(pixel.0)
        }
    }

    impl From<image::Rgba<Channel>> for Color {
        fn from(pixel: image::Rgba<Channel>) -> Self {
            let [red, green, blue, _alpha] = pixel.0;
            Color::new(red, green, blue)
        }
    }

    impl From<Color> for image::Rgb<Channel> {
        fn from(color: Color) -> Self {
            image::Rgb(color.channels())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn channels_read_back_unchanged() {
            for (r, g, b) in [(0, 0, 0), (255, 255, 255), (1, 128, 254), (17, 0, 200)] {
                let color = Color::new(r, g, b);
                assert_eq!((color.red(), color.green(), color.blue()), (r, g, b));
            }
        }

        #[test]
        fn packed_round_trip_and_alpha_is_ignored() {
            let color = Color::new(0x12, 0x34, 0x56);
            assert_eq!(color.packed(), 0x0012_3456);
            assert_eq!(Color::from_packed(0xFF12_3456), color);
            assert_eq!(Color::from_packed(color.packed()), color);
        }

        #[test]
        fn named_constants_match_reference_values() {
            assert_eq!(Color::RED.channels(), [255, 0, 0]);
            assert_eq!(Color::GREEN.channels(), [0, 255, 0]);
            assert_eq!(Color::BLUE.channels(), [0, 0, 255]);
            assert_eq!(Color::YELLOW.channels(), [255, 255, 0]);
            assert_eq!(Color::ORANGE.channels(), [255, 128, 0]);
            assert_eq!(Color::PURPLE.channels(), [128, 0, 255]);
            assert_eq!(Color::PINK.channels(), [255, 0, 255]);
        }

        #[test]
        fn clamped_constructor_saturates() {
            assert_eq!(Color::from_clamped(-5, 300, 42), Color::new(0, 255, 42));
        }

        #[test]
        fn display_is_hex() {
            assert_eq!(Color::ORANGE.to_string(), "#FF8000");
        }

        #[test]
        fn image_pixel_conversions() {
            let color: Color = image::Rgba([9u8, 8, 7, 0]).into();
            assert_eq!(color, Color::new(9, 8, 7));
            let pixel: image::Rgb<u8> = color.into();
            assert_eq!(pixel.0, [9, 8, 7]);
        }
    }
}
