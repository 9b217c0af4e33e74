pub type Millis = u64;

/// Identifies one typing instance. Keys per-instance cursor styles and seeds pacing jitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl InstanceId {
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Nested inline elements holding character leaves.
    #[default]
    Container,
    /// Flat text value; markup is never interpreted.
    Input,
}
