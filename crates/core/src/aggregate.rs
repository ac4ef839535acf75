//! Aggregate traits for records whose state evolves through events.

/// A record with a stable identity and an event counter.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied to this record so far.
    fn version(&self) -> u64;
}

/// Command handling split into a pure decision and a state transition.
///
/// `handle` checks every precondition against the current state and either
/// rejects the command or returns the events it produces. `apply` folds one
/// event into the state and bumps the version. A rejected command therefore
/// never touches state. Neither step performs IO.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    /// Must not mutate state.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
