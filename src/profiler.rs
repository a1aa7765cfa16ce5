use std::{collections::HashMap, time::Duration};

use instant::Instant;

/// Named CPU time blocks.
///
/// A block is opened with [`time_block_start`](Profiler::time_block_start) and
/// closed with [`time_block_end`](Profiler::time_block_end); the elapsed time
/// of the last completed run is kept per name.
#[derive(Debug, Default)]
pub struct Profiler {
    open: HashMap<&'static str, Instant>,
    durations: HashMap<&'static str, Duration>,
    enabled: bool,
}

impl Profiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.open.clear();
        }
    }

    pub fn time_block_start(&mut self, name: &'static str) {
        if self.enabled {
            self.open.insert(name, Instant::now());
        }
    }

    pub fn time_block_end(&mut self, name: &'static str) {
        if !self.enabled {
            return;
        }
        match self.open.remove(name) {
            Some(start) => {
                let elapsed = start.elapsed();
                log::trace!("{}: {:.3} ms", name, elapsed.as_secs_f64() * 1000.0);
                self.durations.insert(name, elapsed);
            }
            None => log::warn!("Time block {} ended without being started", name),
        }
    }

    /// Duration of the last completed run of `name`.
    pub fn last_duration(&self, name: &str) -> Option<Duration> {
        self.durations.get(name).copied()
    }
}
