use std::collections::HashMap;

use log::{debug, info, warn};
use thiserror::Error;

use crate::animation::config::AnimationConfig;
use crate::animation::flight::{Advance, FlightRecord, FlightState, ManagedFlight};
use crate::animation::render::FlightRenderer;

#[derive(Debug, Error, PartialEq)]
pub enum SchedulerError {
    #[error("flight {0} is already registered")]
    DuplicateFlight(String),
    #[error("flight {0} is not registered")]
    UnknownFlight(String),
    #[error("flight {identifier} rejected: {reason}")]
    InvalidRecord {
        identifier: String,
        reason: &'static str,
    },
}

/// What the frame source should do after a call to
/// [`FlightAnimationScheduler::on_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameRequest {
    /// Arm the next tick.
    Next,
    /// The loop was stopped; do not call again until restarted.
    Stop,
}

/// Owns every managed flight and advances them once per frame.
///
/// All mutation goes through `&mut self`; the frame source must not call
/// [`on_frame`](Self::on_frame) re-entrantly.
pub struct FlightAnimationScheduler<R> {
    config: AnimationConfig,
    /// Registration order, used to rebuild on reset.
    records: Vec<FlightRecord>,
    flights: HashMap<String, ManagedFlight>,
    renderer: R,
    animating: bool,
}

impl<R: FlightRenderer> FlightAnimationScheduler<R> {
    pub fn new(config: AnimationConfig, renderer: R) -> Self {
        FlightAnimationScheduler {
            config,
            records: Vec::new(),
            flights: HashMap::new(),
            renderer,
            animating: false,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Registers a new flight and draws it.
    ///
    /// An identifier that is already registered is rejected and the existing
    /// flight is left untouched.
    pub fn register_flight(&mut self, record: FlightRecord) -> Result<(), SchedulerError> {
        if let Err(e) = record.validate() {
            warn!("{e}");
            return Err(e);
        }
        if self.flights.contains_key(&record.identifier)
            || self.record_index(&record.identifier).is_some()
        {
            warn!(
                "Flight {} already exists, skipping duplicate",
                record.identifier
            );
            return Err(SchedulerError::DuplicateFlight(record.identifier));
        }

        debug!(
            "Registered flight {} (updated at {})",
            record.identifier, record.last_updated_at
        );
        self.records.push(record.clone());
        self.create_managed(record);
        Ok(())
    }

    /// Replaces a registered flight: the old instance is retired from the
    /// renderer before the new one is planned and drawn.
    pub fn update_flight(&mut self, record: FlightRecord) -> Result<(), SchedulerError> {
        if let Err(e) = record.validate() {
            warn!("{e}");
            return Err(e);
        }
        let Some(index) = self.record_index(&record.identifier) else {
            warn!(
                "Flight {} does not exist, cannot update",
                record.identifier
            );
            return Err(SchedulerError::UnknownFlight(record.identifier));
        };

        self.records[index] = record.clone();
        if self.flights.remove(&record.identifier).is_some() {
            self.renderer.retire(&record.identifier);
        }
        self.create_managed(record);
        Ok(())
    }

    /// Forgets a flight entirely, removes it from the renderer and hands back
    /// its record.
    pub fn retire_flight(&mut self, identifier: &str) -> Result<FlightRecord, SchedulerError> {
        let Some(index) = self.record_index(identifier) else {
            warn!("Flight {identifier} does not exist, cannot retire");
            return Err(SchedulerError::UnknownFlight(identifier.to_string()));
        };
        self.flights.remove(identifier);
        self.renderer.retire(identifier);
        Ok(self.records.remove(index))
    }

    /// Full reset: stops the loop, retires every managed flight and rebuilds
    /// them all from the registered records under the new tracking flag.
    pub fn add_flights(&mut self, currently_tracking: bool) {
        self.stop_animation();
        self.config.currently_tracking = currently_tracking;

        for identifier in self.flights.keys() {
            self.renderer.retire(identifier);
        }
        self.flights.clear();

        let records = self.records.clone();
        for record in records {
            self.create_managed(record);
        }
        info!(
            "Rebuilt {} flights (tracking: {})",
            self.flights.len(),
            currently_tracking
        );
    }

    /// Arms the frame loop. Returns false if it was already running.
    pub fn start_animation(&mut self) -> bool {
        if self.animating {
            return false;
        }
        self.animating = true;
        true
    }

    /// Cancels the pending tick; later frames do nothing until restarted.
    pub fn stop_animation(&mut self) {
        self.animating = false;
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Frame callback. Runs one update at `now_ms` if the loop is armed.
    pub fn on_frame(&mut self, now_ms: u64) -> FrameRequest {
        if !self.animating {
            return FrameRequest::Stop;
        }
        self.update_flight_positions(now_ms);
        FrameRequest::Next
    }

    /// Advances every active flight to `now_ms` and redraws it. Landed
    /// flights are skipped. Nothing moves while tracking is off.
    ///
    /// Returns the number of flights that landed during this update.
    pub fn update_flight_positions(&mut self, now_ms: u64) -> usize {
        if !self.config.currently_tracking {
            return 0;
        }

        let mut landed = 0;
        for flight in self.flights.values_mut() {
            match flight.advance(now_ms) {
                Advance::Idle => continue,
                Advance::Moved => {}
                Advance::Landed => {
                    info!("Flight {} landed", flight.identifier());
                    landed += 1;
                }
            }

            self.renderer.draw(&flight.frame(&self.config));
        }
        landed
    }

    pub fn flight(&self, identifier: &str) -> Option<&ManagedFlight> {
        self.flights.get(identifier)
    }

    pub fn flights(&self) -> impl Iterator<Item = &ManagedFlight> {
        self.flights.values()
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.flights
            .values()
            .filter(|f| f.state() == FlightState::Active)
            .count()
    }

    pub fn all_landed(&self) -> bool {
        self.active_count() == 0
    }

    fn record_index(&self, identifier: &str) -> Option<usize> {
        self.records.iter().position(|r| r.identifier == identifier)
    }

    fn create_managed(&mut self, record: FlightRecord) {
        let flight = ManagedFlight::new(record);
        debug!(
            "Planned flight {} ({} points, antimeridian: {})",
            flight.identifier(),
            flight.full_path_points().len(),
            flight.is_antimeridian_path()
        );
        self.renderer.draw(&flight.frame(&self.config));
        self.flights.insert(flight.identifier().to_string(), flight);
    }
}
