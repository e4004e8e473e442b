//! Shape colors and the GOOD/BAD tag derived from them

use rand::Rng;

/// Palette a spawned shape's color is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeColor {
    Black,
    White,
    Red,
    Lime,
    Blue,
    Yellow,
    Cyan,
    Silver,
    Gray,
    Maroon,
    Olive,
    Brown,
    Green,
    LightGray,
    Magenta,
    Orange,
    Purple,
    Teal,
}

impl ShapeColor {
    pub const ALL: [ShapeColor; 18] = [
        ShapeColor::Black,
        ShapeColor::White,
        ShapeColor::Red,
        ShapeColor::Lime,
        ShapeColor::Blue,
        ShapeColor::Yellow,
        ShapeColor::Cyan,
        ShapeColor::Silver,
        ShapeColor::Gray,
        ShapeColor::Maroon,
        ShapeColor::Olive,
        ShapeColor::Brown,
        ShapeColor::Green,
        ShapeColor::LightGray,
        ShapeColor::Magenta,
        ShapeColor::Orange,
        ShapeColor::Purple,
        ShapeColor::Teal,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn is_black(self) -> bool {
        self == ShapeColor::Black
    }

    /// Linear RGBA in 0..1
    pub fn rgba(self) -> [f32; 4] {
        match self {
            ShapeColor::Black => [0.0, 0.0, 0.0, 1.0],
            ShapeColor::White => [1.0, 1.0, 1.0, 1.0],
            ShapeColor::Red => [1.0, 0.0, 0.0, 1.0],
            ShapeColor::Lime => [0.75, 1.0, 0.0, 1.0],
            ShapeColor::Blue => [0.0, 0.0, 1.0, 1.0],
            ShapeColor::Yellow => [1.0, 1.0, 0.0, 1.0],
            ShapeColor::Cyan => [0.0, 1.0, 1.0, 1.0],
            ShapeColor::Silver => [0.75, 0.75, 0.75, 1.0],
            ShapeColor::Gray => [0.5, 0.5, 0.5, 1.0],
            ShapeColor::Maroon => [0.5, 0.0, 0.0, 1.0],
            ShapeColor::Olive => [0.5, 0.5, 0.0, 1.0],
            ShapeColor::Brown => [0.6, 0.4, 0.2, 1.0],
            ShapeColor::Green => [0.0, 1.0, 0.0, 1.0],
            ShapeColor::LightGray => [0.67, 0.67, 0.67, 1.0],
            ShapeColor::Magenta => [1.0, 0.0, 1.0, 1.0],
            ShapeColor::Orange => [1.0, 0.5, 0.0, 1.0],
            ShapeColor::Purple => [0.5, 0.0, 0.5, 1.0],
            ShapeColor::Teal => [0.0, 0.5, 0.5, 1.0],
        }
    }
}

/// Tap classification of a spawned shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    /// Tapping scores a point
    Good,
    /// Tapping costs a life
    Bad,
}

impl ShapeTag {
    /// Black shapes are bad, everything else is good
    pub fn for_color(color: ShapeColor) -> Self {
        if color.is_black() {
            ShapeTag::Bad
        } else {
            ShapeTag::Good
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeTag::Good => "GOOD",
            ShapeTag::Bad => "BAD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_only_black_is_bad() {
        for color in ShapeColor::ALL {
            let expected = if color == ShapeColor::Black {
                ShapeTag::Bad
            } else {
                ShapeTag::Good
            };
            assert_eq!(ShapeTag::for_color(color), expected, "{:?}", color);
        }
    }

    #[test]
    fn test_black_is_the_only_zero_rgb() {
        for color in ShapeColor::ALL {
            let [r, g, b, a] = color.rgba();
            assert_eq!(a, 1.0);
            assert_eq!(r + g + b == 0.0, color.is_black());
        }
    }

    proptest! {
        #[test]
        fn random_color_tag_matches_blackness(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let color = ShapeColor::random(&mut rng);
            let tag = ShapeTag::for_color(color);
            prop_assert_eq!(tag == ShapeTag::Bad, color.is_black());
        }
    }
}
