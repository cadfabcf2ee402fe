//! Display loop: startup fade, smoothed CO2 gradient, alarm flash.
//!
//! [`Co2Display`] holds everything the loop owns (smoothed value, hue, mode) and exposes
//! one step per frame or alarm cycle, so the behaviour can be driven in tests without a
//! timer. [`run_display`] wraps those steps in the timed loop.

use embassy_time::{Duration, Ticker, Timer};
use log::{debug, info, warn};

use crate::brightness::AmbientDimmer;
use crate::config;
use crate::gradient::{Co2Scale, OFF, hsb_to_rgb};
use crate::led_control::{PixelStrip, StartupFade, StripDriver};
use crate::signals::SharedSignals;
use crate::smoothing::ema_step;
use crate::state_machine::{DisplayEvent, DisplayState, DisplayStateMachine, StateTransition};

/// What a frame did to the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Startup fade still running, reading ignored
    Startup,
    /// At or below the scale minimum, strip left as is
    Holding,
    /// Reading equals the smoothed value, nothing written
    Unchanged,
    /// Gradient recomputed and pushed
    Rendered,
    /// Reading reached the top of the scale, the alarm owns the strip now
    Alarm,
}

/// Result of one alarm on/off pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmCycle {
    /// Still above the scale, keep flashing
    Flash,
    /// Back under the scale, gradient repainted from the current reading
    Cleared { seconds: u64 },
}

pub struct Co2Display {
    scale: Co2Scale,
    state_machine: DisplayStateMachine,
    smoothed: u16,
    hue: f32,
    alarm_cycles: u64,
}

impl Co2Display {
    pub fn new(scale: Co2Scale) -> Self {
        Self {
            scale,
            state_machine: DisplayStateMachine::new(),
            smoothed: scale.min_ppm,
            hue: scale.hue_at_min,
            alarm_cycles: 0,
        }
    }

    pub fn smoothed(&self) -> u16 {
        self.smoothed
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn state(&self) -> DisplayState {
        self.state_machine.get_current_state()
    }

    pub fn is_alarm(&self) -> bool {
        self.state_machine.is_alarm()
    }

    /// Readings are accepted from here on
    pub fn finish_startup(&mut self) {
        self.state_machine.handle_event(DisplayEvent::StartupFinished);
    }

    /// One frame of the normal path
    pub fn render_frame<D: StripDriver>(
        &mut self,
        co2: u16,
        strip: &mut PixelStrip<D>,
    ) -> FrameOutcome {
        let event = DisplayEvent::from_reading(co2, &self.scale);
        let transition = self.state_machine.handle_event(event);

        match self.state_machine.get_current_state() {
            DisplayState::Startup => FrameOutcome::Startup,
            DisplayState::Holding => FrameOutcome::Holding,
            DisplayState::Alarm => {
                if transition == StateTransition::Transition(DisplayState::Alarm) {
                    strip.set_luminance(config::MAX_LUMINANCE);
                    self.alarm_cycles = 0;
                }
                FrameOutcome::Alarm
            }
            DisplayState::Tracking => {
                if co2 == self.smoothed {
                    return FrameOutcome::Unchanged;
                }

                self.smoothed = ema_step(self.smoothed, co2, config::CO2_SMOOTHING_FACTOR);
                self.paint(strip);
                FrameOutcome::Rendered
            }
        }
    }

    /// Called after each on/off pair with a fresh reading
    pub fn alarm_cycle<D: StripDriver>(
        &mut self,
        co2: u16,
        strip: &mut PixelStrip<D>,
    ) -> AlarmCycle {
        self.alarm_cycles += 1;

        let event = DisplayEvent::from_reading(co2, &self.scale);
        self.state_machine.handle_event(event);
        if self.state_machine.is_alarm() {
            return AlarmCycle::Flash;
        }

        // Smoothing history from before the alarm is stale
        self.smoothed = co2;
        self.paint(strip);

        let seconds = self.alarm_cycles * (config::ALARM_ON_MS + config::ALARM_OFF_MS) / 1000;
        info!("[LED] Alarm lasted {}s, resuming at {} ppm", seconds, co2);
        AlarmCycle::Cleared { seconds }
    }

    /// Whole strip to the alarm colour (`on`) or off
    pub fn flash<D: StripDriver>(&self, on: bool, strip: &mut PixelStrip<D>) {
        let color = if on { self.scale.alarm_color() } else { OFF };
        strip.clear_to(color);
        push(strip);
    }

    /// Full pixels below the smoothed value, one partial pixel, the rest off
    fn paint<D: StripDriver>(&mut self, strip: &mut PixelStrip<D>) {
        let hue = self.scale.hue_for(self.smoothed);
        let partition = self.scale.partition(self.smoothed, strip.len());

        strip.clear_to(OFF);
        strip.clear_range(0, partition.fully_lit, hsb_to_rgb(hue, 1.0));
        strip.set_pixel(partition.partial, hsb_to_rgb(hue, partition.fraction));

        self.hue = hue;
        debug!("[LED] smoothed {} ppm, hue {:.3}", self.smoothed, self.hue);
        push(strip);
    }
}

/// Show the buffer, a failed write only costs this frame
fn push<D: StripDriver>(strip: &mut PixelStrip<D>) {
    if let Err(e) = strip.show() {
        warn!("[LED] Strip write failed: {:?}", e);
    }
}

/// Green fade in and out, then a dark strip
pub async fn play_startup_fade<D: StripDriver>(strip: &mut PixelStrip<D>) {
    let step = Duration::from_millis(StartupFade::step_delay_ms());
    for color in StartupFade::new() {
        strip.clear_to(color);
        push(strip);
        Timer::after(step).await;
    }

    strip.clear_to(OFF);
    push(strip);
}

/// Display loop, never returns
pub async fn run_display<D: StripDriver>(driver: D, signals: &SharedSignals) -> ! {
    let mut strip = PixelStrip::new(driver);
    let mut display = Co2Display::new(Co2Scale::DEFAULT);
    let mut dimmer = AmbientDimmer::new();

    strip.set_luminance(config::MAX_LUMINANCE);
    push(&mut strip);

    info!("[LED] Startup fade ({} ms)", config::STARTUP_FADE_MS);
    play_startup_fade(&mut strip).await;
    display.finish_startup();

    let mut ticker = Ticker::every(Duration::from_millis(config::FRAME_TIME_MS));
    info!("[LED] Frame loop started, {} ms per frame", config::FRAME_TIME_MS);

    loop {
        let dimmed = cfg!(feature = "ambient-dimming")
            && strip.set_luminance(dimmer.update(signals.lux.latest()));

        match display.render_frame(signals.co2.latest(), &mut strip) {
            FrameOutcome::Alarm => {
                loop {
                    display.flash(true, &mut strip);
                    Timer::after_millis(config::ALARM_ON_MS).await;
                    display.flash(false, &mut strip);
                    Timer::after_millis(config::ALARM_OFF_MS).await;

                    let cycle = display.alarm_cycle(signals.co2.latest(), &mut strip);
                    if let AlarmCycle::Cleared { .. } = cycle {
                        break;
                    }
                }
                dimmer.force(config::MAX_LUMINANCE);
                ticker.reset();
            }
            FrameOutcome::Rendered => {}
            _ if dimmed => push(&mut strip),
            _ => {}
        }

        ticker.next().await;
    }
}
