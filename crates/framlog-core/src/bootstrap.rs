//! Startup recovery of the ring counter and cursor
//!
//! A factory-fresh or tampered medium holds arbitrary metadata. Bootstrap
//! turns any out-of-range counter or cursor into a well-defined empty ring
//! instead of trusting it:
//!
//! 1. Read count; if it exceeds capacity, persist 0
//! 2. Read cursor; if it is not a slot inside the ring, persist the first slot
//! 3. Only then hand the values to the ring cache

use tracing::{debug, warn};

use crate::bus::Bus;
use crate::config::Config;
use crate::error::FramResult;
use crate::ring::{RingGeometry, RingState};
use crate::transport::Transport;

/// Load the persistent ring state from `bus`, repairing invalid values on the medium.
pub fn load_ring_state<T: Transport>(bus: &mut Bus<T>, config: &Config) -> FramResult<RingState> {
    let geometry = RingGeometry::from_config(config);

    let mut count = bus.read_u16(config.count_address)?;
    if count > geometry.capacity() {
        warn!(count, capacity = geometry.capacity(), "record count out of range, resetting ring");
        bus.write_u16_verified(config.count_address, 0)?;
        count = 0;
    }

    let mut cursor = bus.read_u16(config.cursor_address)?;
    if !geometry.contains(cursor) {
        warn!(cursor, start = geometry.start(), end = geometry.end(), "write cursor out of range, rewinding");
        bus.write_u16_verified(config.cursor_address, geometry.start())?;
        cursor = geometry.start();
    }

    debug!(count, cursor, "ring bootstrapped");
    Ok(RingState { count, cursor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FramError;
    use crate::format::{CAPACITY, COUNT_ADDRESS, CURSOR_ADDRESS, RING_START};
    use crate::sim::{MediumHandle, SimulatedFram};
    use crate::transport::TransportFault;

    fn bus_over(sim: SimulatedFram) -> (Bus<SimulatedFram>, MediumHandle) {
        let handle = sim.handle();
        (Bus::new(sim, Config::default().transport_timeout), handle)
    }

    #[test]
    fn test_zero_filled_medium() {
        let (mut bus, medium) = bus_over(SimulatedFram::new());
        let state = load_ring_state(&mut bus, &Config::default()).unwrap();

        assert_eq!(state, RingState { count: 0, cursor: RING_START });
        assert_eq!(medium.peek_u16(CURSOR_ADDRESS), RING_START);
    }

    #[test]
    fn test_ff_filled_medium() {
        let (mut bus, medium) = bus_over(SimulatedFram::filled(0xFF));
        let state = load_ring_state(&mut bus, &Config::default()).unwrap();

        assert_eq!(state, RingState { count: 0, cursor: RING_START });
        assert_eq!(medium.peek_u16(COUNT_ADDRESS), 0);
        assert_eq!(medium.peek_u16(CURSOR_ADDRESS), RING_START);
    }

    #[test]
    fn test_valid_state_untouched() {
        let (mut bus, medium) = bus_over(SimulatedFram::new());
        medium.poke_u16(COUNT_ADDRESS, CAPACITY);
        medium.poke_u16(CURSOR_ADDRESS, RING_START + 40);
        let writes_before = medium.write_commands();

        let state = load_ring_state(&mut bus, &Config::default()).unwrap();
        assert_eq!(state, RingState { count: CAPACITY, cursor: RING_START + 40 });
        assert_eq!(medium.write_commands(), writes_before);
    }

    #[test]
    fn test_misaligned_cursor_rewound() {
        let (mut bus, medium) = bus_over(SimulatedFram::new());
        medium.poke_u16(COUNT_ADDRESS, 3);
        medium.poke_u16(CURSOR_ADDRESS, RING_START + 3);

        let state = load_ring_state(&mut bus, &Config::default()).unwrap();
        assert_eq!(state, RingState { count: 3, cursor: RING_START });
    }

    #[test]
    fn test_count_one_past_capacity_reset() {
        let (mut bus, medium) = bus_over(SimulatedFram::new());
        medium.poke_u16(COUNT_ADDRESS, CAPACITY + 1);
        medium.poke_u16(CURSOR_ADDRESS, RING_START);

        let state = load_ring_state(&mut bus, &Config::default()).unwrap();
        assert_eq!(state.count, 0);
    }

    #[test]
    fn test_heal_failure_propagates() {
        let (mut bus, medium) = bus_over(SimulatedFram::filled(0xFF));
        medium.stick(COUNT_ADDRESS, 0xFF);

        let result = load_ring_state(&mut bus, &Config::default());
        assert!(matches!(result, Err(FramError::WriteFailed { address: COUNT_ADDRESS, .. })));
    }

    #[test]
    fn test_read_failure_propagates() {
        let (mut bus, medium) = bus_over(SimulatedFram::new());
        medium.fail_after(0, TransportFault::Timeout);
        assert_eq!(load_ring_state(&mut bus, &Config::default()), Err(FramError::TransportTimeout));
    }
}
