use supplychain_core::Aggregate;

/// Execute a command against an aggregate: decide, then evolve.
///
/// 1. `aggregate.handle(command)` produces events without touching state.
/// 2. Each event is applied in order.
///
/// A rejected command returns the aggregate's error and leaves it unchanged.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: Aggregate,
{
    let events = aggregate.handle(command)?;
    for ev in &events {
        aggregate.apply(ev);
    }
    Ok(events)
}
