use crate::components::{EntityId, Outcome, Tick};

/// Everything the simulation reports to the driver. Every variant carries
/// the step it happened on.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    OutcomeResolved {
        entity: EntityId,
        outcome: Outcome,
        tick: Tick,
    },
    FuelDepleted {
        entity: EntityId,
        tick: Tick,
    },
    /// The player fell past the end-of-world line.
    LeftWorld {
        entity: EntityId,
        tick: Tick,
    },
}

impl SimEvent {
    pub fn tick(&self) -> Tick {
        match self {
            SimEvent::OutcomeResolved { tick, .. } => *tick,
            SimEvent::FuelDepleted { tick, .. } => *tick,
            SimEvent::LeftWorld { tick, .. } => *tick,
        }
    }
}

/// Ring buffer for events. Fixed capacity, overwrites oldest entries.
pub struct EventLog {
    buffer: Vec<Option<SimEvent>>,
    capacity: usize,
    write_pos: usize,
    count: usize,
    /// Events pushed since the last `take_unread`.
    unread: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: (0..capacity).map(|_| None).collect(),
            capacity,
            write_pos: 0,
            count: 0,
            unread: 0,
        }
    }

    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    pub fn push(&mut self, event: SimEvent) {
        self.buffer[self.write_pos] = Some(event);
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
        self.unread = (self.unread + 1).min(self.capacity);
    }

    /// Iterate over all events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        let start = if self.count < self.capacity {
            0
        } else {
            self.write_pos
        };

        (0..self.count).filter_map(move |i| {
            let idx = (start + i) % self.capacity;
            self.buffer[idx].as_ref()
        })
    }

    /// Return the most recent n events (newest last).
    pub fn recent(&self, n: usize) -> Vec<&SimEvent> {
        let n = n.min(self.count);
        let start = (self.write_pos + self.capacity - n) % self.capacity;

        (0..n)
            .filter_map(|i| {
                let idx = (start + i) % self.capacity;
                self.buffer[idx].as_ref()
            })
            .collect()
    }

    /// Events pushed since the previous call, oldest first. Used by the
    /// driver to log each event exactly once.
    pub fn take_unread(&mut self) -> Vec<SimEvent> {
        let n = self.unread;
        self.unread = 0;
        self.recent(n).into_iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
