use crate::constants::{DEFAULT_BUFFER_SIZE, MAX_DEPTH};

/// How quoted text is turned into a `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Assume mostly-ASCII input: scan with `memchr` and take the byte-to-char shortcut
    /// whenever the token holds no high-bit bytes.
    Ascii,
    #[default]
    Utf8,
}

/// Concrete sequence used for `Seq` members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceKind {
    #[default]
    Vec,
    Deque,
    Linked,
}

/// Concrete map used for `Dict` members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapKind {
    #[default]
    Hash,
    BTree,
}

/// What happens to a member name the target type does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownMembers {
    #[default]
    Error,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerKinds {
    pub sequence: SequenceKind,
    pub map: MapKind,
}

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub member_mode: TextMode,
    pub value_mode: TextMode,
    pub containers: ContainerKinds,
    pub unknown_members: UnknownMembers,
    pub buffer_size: usize,
    pub max_depth: usize,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member_mode(mut self, mode: TextMode) -> Self {
        self.member_mode = mode;
        self
    }

    pub fn with_value_mode(mut self, mode: TextMode) -> Self {
        self.value_mode = mode;
        self
    }

    pub fn with_sequence_kind(mut self, kind: SequenceKind) -> Self {
        self.containers.sequence = kind;
        self
    }

    pub fn with_map_kind(mut self, kind: MapKind) -> Self {
        self.containers.map = kind;
        self
    }

    pub fn with_unknown_members(mut self, policy: UnknownMembers) -> Self {
        self.unknown_members = policy;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            member_mode: TextMode::default(),
            value_mode: TextMode::default(),
            containers: ContainerKinds::default(),
            unknown_members: UnknownMembers::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_depth: MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_defaults() {
        let options = DecodeOptions::default();
        assert_eq!(options.member_mode, TextMode::Utf8);
        assert_eq!(options.value_mode, TextMode::Utf8);
        assert_eq!(options.containers.sequence, SequenceKind::Vec);
        assert_eq!(options.containers.map, MapKind::Hash);
        assert_eq!(options.unknown_members, UnknownMembers::Error);
        assert_eq!(options.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(options.max_depth, MAX_DEPTH);
    }

    #[rstest::rstest]
    fn test_buffer_size_floor() {
        let options = DecodeOptions::new().with_buffer_size(0);
        assert_eq!(options.buffer_size, 1);
    }
}
