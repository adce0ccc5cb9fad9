use crate::LoadError;
use crate::node::tree::NodeId;

/// Used for frames when the file carries no durations.
pub const DEFAULT_FRAME_DURATION: u32 = 42;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AnimationFrame {
    /// The image node, a child of the animation.
    pub image: NodeId,
    pub duration: u32,
    /// Time offset of the frame from the start of the animation.
    pub start: u32,
}

/// A sequence of images with per-frame durations in milliseconds.
#[derive(Debug, Default)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
    duration: u32,
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame. The total length has to fit in a `u32` of milliseconds.
    pub fn push(&mut self, image: NodeId, duration: u32) -> Result<(), LoadError> {
        let total = self.duration.checked_add(duration).ok_or(LoadError::FormatError {
            reason: "the animation is longer than its duration can express",
        })?;
        self.frames.push(AnimationFrame {
            image,
            duration,
            start: self.duration,
        });
        self.duration = total;
        Ok(())
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total length of one loop.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// The frame shown `time` milliseconds in, looping.
    pub fn frame_at(&self, time: u32) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }

        let time = if self.duration > 0 { time % self.duration } else { 0 };
        let next = self.frames.partition_point(|frame| frame.start <= time);
        Some(next.saturating_sub(1))
    }

    pub fn image_at(&self, time: u32) -> Option<NodeId> {
        self.frame_at(time).map(|index| self.frames[index].image)
    }
}
