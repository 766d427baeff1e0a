/// Priority tier of a per-frame callback.
///
/// Tiers run in declaration order: every `Normal` callback of a frame runs
/// before any `Late` callback. Presentation code registers at `Late` to observe
/// the state produced by `Normal` logic in the same frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub enum TickPriority {
    #[default]
    Normal,
    Late,
}

impl TickPriority {
    /// All tiers in evaluation order.
    pub const ALL: [TickPriority; Self::COUNT] = [TickPriority::Normal, TickPriority::Late];

    pub(crate) const COUNT: usize = 2;

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Handle identifying one registration in a [`super::TickScheduler`].
///
/// Ids are never reused within a scheduler; registering the same logic twice
/// yields two distinct ids.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TickId(pub(crate) u64);

impl TickId {
    /// Insertion sequence number.
    #[inline]
    pub fn sequence(self) -> u64 {
        self.0
    }
}
