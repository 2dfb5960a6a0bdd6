//! Identity shared by catalog records.

/// A record addressed by a stable, typed id. The in-memory tables key their
/// insertion-ordered rows on it and report it in conflict messages.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
