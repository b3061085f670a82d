//! At-most-one concurrent build per key

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

enum FlightSlot<V> {
    Pending,
    Done(Option<V>),
}

struct FlightState<V> {
    slot: Mutex<FlightSlot<V>>,
    done: Condvar,
}

/// Coordinates concurrent builders of the same cache key: the first caller
/// becomes the leader and runs the build, later callers block until the
/// leader publishes its result and then share it.
///
/// A failed leader publishes nothing; its followers fall back to building
/// for themselves so one transient failure does not poison every waiter.
pub struct Singleflight<V> {
    flights: Mutex<HashMap<String, Arc<FlightState<V>>>>,
}

impl<V: Clone> Singleflight<V> {
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    pub fn run<E>(&self, key: &str, build: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        let (state, is_leader) = {
            let mut flights = self.flights.lock();
            match flights.get(key) {
                Some(state) => (state.clone(), false),
                None => {
                    let state = Arc::new(FlightState {
                        slot: Mutex::new(FlightSlot::Pending),
                        done: Condvar::new(),
                    });
                    flights.insert(key.to_string(), state.clone());
                    (state, true)
                }
            }
        };

        if is_leader {
            let result = build();
            {
                let mut slot = state.slot.lock();
                *slot = FlightSlot::Done(result.as_ref().ok().cloned());
                state.done.notify_all();
            }
            self.flights.lock().remove(key);
            result
        } else {
            let mut slot = state.slot.lock();
            while matches!(*slot, FlightSlot::Pending) {
                state.done.wait(&mut slot);
            }
            match &*slot {
                FlightSlot::Done(Some(value)) => Ok(value.clone()),
                _ => {
                    drop(slot);
                    build()
                }
            }
        }
    }
}

impl<V: Clone> Default for Singleflight<V> {
    fn default() -> Self {
        Self::new()
    }
}
