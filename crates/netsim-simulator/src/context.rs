use crate::error::SimError;
use crate::scheduler::{Event, EventScheduler};
use netsim_abstract::MetricsSink;

/// Handles every component needs while reacting to one event.
pub struct SimulationContext<'a> {
    pub scheduler: &'a mut EventScheduler,
    pub metrics: &'a mut dyn MetricsSink,
}

impl<'a> SimulationContext<'a> {
    pub fn new(scheduler: &'a mut EventScheduler, metrics: &'a mut dyn MetricsSink) -> Self {
        Self { scheduler, metrics }
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn schedule_after(&mut self, delay: f64, event: Event) -> Result<(), SimError> {
        self.scheduler.schedule_after(delay, event)
    }

    pub fn schedule_now(&mut self, event: Event) -> Result<(), SimError> {
        self.scheduler.schedule_now(event)
    }
}
