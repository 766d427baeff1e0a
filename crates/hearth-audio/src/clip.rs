use std::fmt;
use std::rc::Rc;

/// Decoded clip metadata, as handed over by the host's asset library.
#[derive(Debug)]
pub struct AudioClip {
    name: String,
    /// Playback length in seconds at pitch 1.0.
    length: f32,
}

/// Shared, opaque handle to an [`AudioClip`].
///
/// Handles compare by identity: two handles are equal only if they point to
/// the same loaded clip.
#[derive(Clone)]
pub struct ClipHandle(Rc<AudioClip>);

impl ClipHandle {
    /// Negative or non-finite lengths are stored as 0.
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        let length = if length.is_finite() { length.max(0.0) } else { 0.0 };
        Self(Rc::new(AudioClip { name: name.into(), length }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.0.length
    }

    #[inline]
    pub fn ptr_eq(a: &ClipHandle, b: &ClipHandle) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for ClipHandle {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for ClipHandle {}

impl fmt::Debug for ClipHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClipHandle({:?}, {:.3}s)", self.0.name, self.0.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality() {
        let a = ClipHandle::new("river", 30.0);
        let b = ClipHandle::new("river", 30.0);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn bad_length_is_zero() {
        assert_eq!(ClipHandle::new("x", -2.0).length(), 0.0);
        assert_eq!(ClipHandle::new("x", f32::INFINITY).length(), 0.0);
    }
}
