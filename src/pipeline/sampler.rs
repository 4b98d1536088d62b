// SPDX-License-Identifier: GPL-3.0-only

//! Decides which pipeline ticks pay for a fresh recognition pass

/// Tick counter cycling through `1..=interval`
///
/// The tick on which the counter reads 1 is a sampling tick; every other tick
/// reuses the cached result.
#[derive(Debug, Clone)]
pub struct ThrottledSampler {
    interval: u32,
    counter: u32,
}

impl ThrottledSampler {
    /// An interval of 0 is treated as 1 (recognise every tick)
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            counter: 1,
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Current position in `1..=interval`
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Whether the current tick should run recognition
    pub fn is_sampling_tick(&self) -> bool {
        self.counter == 1
    }

    /// Move to the next tick
    pub fn advance(&mut self) {
        if self.counter >= self.interval {
            self.counter = 1;
        } else {
            self.counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_first_of_every_interval() {
        let mut sampler = ThrottledSampler::new(100);
        let mut sampled = Vec::new();
        for tick in 1..=250 {
            if sampler.is_sampling_tick() {
                sampled.push(tick);
            }
            sampler.advance();
        }
        assert_eq!(sampled, vec![1, 101, 201]);
    }

    #[test]
    fn test_interval_one_samples_every_tick() {
        let mut sampler = ThrottledSampler::new(1);
        for _ in 0..5 {
            assert!(sampler.is_sampling_tick());
            sampler.advance();
        }
    }

    #[test]
    fn test_zero_interval_clamped() {
        assert_eq!(ThrottledSampler::new(0).interval(), 1);
    }

    #[test]
    fn test_counter_stays_in_range() {
        let mut sampler = ThrottledSampler::new(3);
        for _ in 0..10 {
            assert!((1..=3).contains(&sampler.counter()));
            sampler.advance();
        }
    }
}
