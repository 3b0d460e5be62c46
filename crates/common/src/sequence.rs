use crate::color::Color;

/// Number of completed frames between two rotations of the clear colors.
pub const DEFAULT_ROTATION_PERIOD: u32 = 100;

/// Rotate `seq` left by one position in place.
///
/// `[a, b, c, d]` becomes `[b, c, d, a]`. Empty slices are left untouched.
pub fn move_forward<T>(seq: &mut [T]) {
    if !seq.is_empty() {
        seq.rotate_left(1);
    }
}

/// Fixed-length color sequence, one entry per window slot, rotated on a frame
/// schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSequence {
    colors: Vec<Color>,
    period: u32,
    frames: u32,
}

impl ColorSequence {
    /// A period of zero is treated as one.
    pub fn new(colors: Vec<Color>, period: u32) -> Self {
        Self {
            colors,
            period: period.max(1),
            frames: 0,
        }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Color currently assigned to the given window slot.
    pub fn color_at(&self, slot: usize) -> Option<Color> {
        self.colors.get(slot).copied()
    }

    /// Rotate immediately, without touching the frame counter.
    pub fn rotate(&mut self) {
        move_forward(&mut self.colors);
    }

    /// Count one completed frame. When the counter reaches the period the
    /// sequence rotates, the counter resets, and `true` is returned.
    pub fn frame_completed(&mut self) -> bool {
        self.frames += 1;
        if self.frames < self.period {
            return false;
        }
        self.frames = 0;
        self.rotate();
        tracing::debug!(colors = ?self.colors, "rotated clear colors");
        true
    }

    /// Frames counted since the last rotation.
    pub fn frames_since_rotation(&self) -> u32 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn counts(colors: &[Color]) -> HashMap<Color, usize> {
        let mut map = HashMap::new();
        for c in colors {
            *map.entry(*c).or_insert(0) += 1;
        }
        map
    }

    #[test]
    fn move_forward_rotates_left() {
        let mut v = [1, 2, 3, 4];
        move_forward(&mut v);
        assert_eq!(v, [2, 3, 4, 1]);
    }

    #[test]
    fn move_forward_handles_tiny_slices() {
        let mut empty: [u8; 0] = [];
        move_forward(&mut empty);
        let mut one = [9];
        move_forward(&mut one);
        assert_eq!(one, [9]);
    }

    #[test]
    fn rotation_preserves_multiset_and_cycles_after_len() {
        let original = vec![
            Color::Black,
            Color::Teal,
            Color::Teal,
            Color::Gray,
            Color::Olive,
        ];
        let mut seq = ColorSequence::new(original.clone(), 1);
        for n in 1..=original.len() {
            seq.rotate();
            assert_eq!(counts(seq.colors()), counts(&original));
            if n < original.len() {
                assert_ne!(seq.colors(), original.as_slice(), "returned early at {n}");
            }
        }
        assert_eq!(seq.colors(), original.as_slice());
    }

    #[test]
    fn rotates_only_on_period_boundary() {
        let mut seq = ColorSequence::new(
            vec![Color::Black, Color::Teal, Color::Gray, Color::Olive],
            100,
        );
        for _ in 0..99 {
            assert!(!seq.frame_completed());
        }
        assert_eq!(seq.color_at(0), Some(Color::Black));
        assert_eq!(seq.frames_since_rotation(), 99);

        assert!(seq.frame_completed());
        assert_eq!(
            seq.colors(),
            &[Color::Teal, Color::Gray, Color::Olive, Color::Black]
        );
        assert_eq!(seq.frames_since_rotation(), 0);
    }

    #[test]
    fn zero_period_rotates_every_frame() {
        let mut seq = ColorSequence::new(vec![Color::Red, Color::Blue], 0);
        assert_eq!(seq.period(), 1);
        assert!(seq.frame_completed());
        assert_eq!(seq.color_at(0), Some(Color::Blue));
    }

    #[test]
    fn color_at_out_of_range() {
        let seq = ColorSequence::new(vec![Color::Red], 10);
        assert_eq!(seq.color_at(1), None);
    }
}
