//! Display mode state machine
//!
//! Tracks which of the display loop's modes owns the strip: the boot fade, holding the
//! bottom of the scale, tracking the CO2 gradient, or flashing the alarm.

use log::{info, warn};

use crate::gradient::Co2Scale;

/// Display modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// Boot fade running, sensor data not trusted yet
    Startup,
    /// CO2 at or below the bottom of the scale, strip left as is
    Holding,
    /// CO2 inside the scale, gradient follows the smoothed value
    Tracking,
    /// CO2 at or above the top of the scale, strip flashes
    Alarm,
}

/// Display events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    StartupFinished,
    /// Reading at or below the scale minimum
    BelowScale,
    /// Reading strictly inside the scale
    WithinScale,
    /// Reading at or above the scale maximum
    AboveScale,
}

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    /// Keep the current state
    Stay,
    /// Move to a new state
    Transition(DisplayState),
}

impl DisplayEvent {
    /// Classify a CO2 reading against the scale
    pub fn from_reading(co2: u16, scale: &Co2Scale) -> Self {
        if co2 >= scale.max_ppm {
            DisplayEvent::AboveScale
        } else if co2 <= scale.min_ppm {
            DisplayEvent::BelowScale
        } else {
            DisplayEvent::WithinScale
        }
    }
}

pub struct DisplayStateMachine {
    current_state: DisplayState,
    previous_state: Option<DisplayState>,
}

impl DisplayStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: DisplayState::Startup,
            previous_state: None,
        }
    }

    pub fn get_current_state(&self) -> DisplayState {
        self.current_state
    }

    pub fn get_previous_state(&self) -> Option<DisplayState> {
        self.previous_state
    }

    pub fn is_alarm(&self) -> bool {
        self.current_state == DisplayState::Alarm
    }

    /// Handle an event and apply the resulting transition
    pub fn handle_event(&mut self, event: DisplayEvent) -> StateTransition {
        let transition = self.get_state_transition(self.current_state, event);

        if let StateTransition::Transition(new_state) = transition {
            self.transition_to_state(new_state);
        }

        transition
    }

    fn transition_to_state(&mut self, new_state: DisplayState) {
        if new_state == self.current_state {
            return;
        }

        match (self.current_state, new_state) {
            (_, DisplayState::Alarm) => warn!("[LED] CO2 above scale, alarm flashing"),
            (DisplayState::Alarm, _) => info!("[LED] CO2 back in range, alarm cleared"),
            (DisplayState::Startup, _) => info!("[LED] Startup fade finished"),
            _ => {} // Silent for normal transitions
        }

        self.previous_state = Some(self.current_state);
        self.current_state = new_state;
    }

    fn get_state_transition(
        &self,
        current_state: DisplayState,
        event: DisplayEvent,
    ) -> StateTransition {
        match (current_state, event) {
            // Readings are ignored until the fade is done
            (DisplayState::Startup, DisplayEvent::StartupFinished) => {
                StateTransition::Transition(DisplayState::Holding)
            }
            (DisplayState::Startup, _) => StateTransition::Stay,

            (_, DisplayEvent::StartupFinished) => StateTransition::Stay,

            (DisplayState::Alarm, DisplayEvent::AboveScale) => StateTransition::Stay,
            (_, DisplayEvent::AboveScale) => StateTransition::Transition(DisplayState::Alarm),

            (DisplayState::Holding, DisplayEvent::BelowScale) => StateTransition::Stay,
            (_, DisplayEvent::BelowScale) => StateTransition::Transition(DisplayState::Holding),

            (DisplayState::Tracking, DisplayEvent::WithinScale) => StateTransition::Stay,
            (_, DisplayEvent::WithinScale) => StateTransition::Transition(DisplayState::Tracking),
        }
    }
}

impl Default for DisplayStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
