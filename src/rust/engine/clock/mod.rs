/// The 1/64-beat metronome that drives the session.
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::engine::dispatch::Dispatcher;
use crate::engine::improvise::ImprovisationTrigger;
use crate::engine::notes::{Beat, TICKS_PER_BEAT};
use crate::engine::shutdown::ShutdownSignal;
use crate::shared::store::SessionStore;
use crate::tools::logger::Logger;

/// Length of one tick at `bpm`: `(60000 / bpm) / 64` milliseconds.
pub fn tick_period(bpm: u32) -> Duration {
    Duration::from_secs_f64(60.0 / f64::from(bpm.max(1)) / TICKS_PER_BEAT as f64)
}

pub struct TickClock {
    bpm: u32,
    period: Duration,
    store: Arc<SessionStore>,
    dispatcher: Dispatcher,
    auto_improvise: Option<Arc<ImprovisationTrigger>>,
    logger: Arc<Logger>,
}

impl TickClock {
    pub fn new(
        bpm: u32,
        store: Arc<SessionStore>,
        dispatcher: Dispatcher,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            bpm,
            period: tick_period(bpm),
            store,
            dispatcher,
            auto_improvise: None,
            logger,
        }
    }

    /// Check the silence trigger on every tick.
    pub fn with_auto_improvise(mut self, trigger: Arc<ImprovisationTrigger>) -> Self {
        self.auto_improvise = Some(trigger);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// One tick: advance the beat, queue its dispatch, give the silence
    /// trigger a look, and report every 64 ticks. Never waits.
    pub fn tick(&self) -> Beat {
        let beat = self.store.advance_beat();
        self.dispatcher.issue(beat);

        if let Some(trigger) = &self.auto_improvise {
            trigger.evaluate();
        }

        if beat % TICKS_PER_BEAT == 0 {
            let counters = self.store.counters();
            self.logger.debug(format!(
                "metronome beat={} last_activity={} keys_down={}",
                beat, counters.last_activity, counters.pressed_keys
            ));
        }
        beat
    }

    /// Tick until `shutdown` fires. When a tick and the shutdown are ready at
    /// the same time, shutdown wins. Late ticks are caught up in a burst so
    /// the beat count keeps pace with wall-clock time. Returns the number of
    /// ticks taken.
    pub async fn run(&self, mut shutdown: ShutdownSignal) -> u64 {
        self.logger.info(format!(
            "BPM: {}, tick size: {:.1} ms",
            self.bpm,
            self.period.as_secs_f64() * 1000.0
        ));

        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let mut ticks = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = interval.tick() => {
                    self.tick();
                    ticks += 1;
                }
            }
        }
        self.logger
            .debug(format!("Clock stopped after {ticks} ticks"));
        ticks
    }
}

#[cfg(test)]
#[path = "test_clock.rs"]
mod tests;
