//! Critic-step schedule and logging/evaluation cadence

use serde::{Deserialize, Serialize};

/// When to take extra critic steps, log, and snapshot samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Outer iterations at the start that use `heavy_critic_iters`
    pub warmup_iters: usize,
    /// Every this many iterations the critic is re-anchored with `heavy_critic_iters`
    pub anchor_every: usize,
    /// Critic steps during warm-up and anchor iterations
    pub heavy_critic_iters: usize,
    /// Critic steps otherwise
    pub critic_iters: usize,
    /// Log every N iterations
    pub log_every: usize,
    /// Also log every iteration before this one
    pub log_warmup: usize,
    /// Save a sample grid every N iterations
    pub eval_every: usize,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            warmup_iters: 25,
            anchor_every: 500,
            heavy_critic_iters: 100,
            critic_iters: 5,
            log_every: 100,
            log_warmup: 100,
            eval_every: 100,
        }
    }
}

impl Schedule {
    /// Number of critic steps for outer iteration `t`
    pub fn critic_iters(&self, t: usize) -> usize {
        if t < self.warmup_iters || every(t, self.anchor_every) {
            self.heavy_critic_iters
        } else {
            self.critic_iters
        }
    }

    /// Whether iteration `t` reports fresh losses
    pub fn should_log(&self, t: usize) -> bool {
        every(t, self.log_every) || t < self.log_warmup
    }

    /// Whether iteration `t` saves a sample grid
    pub fn should_eval(&self, t: usize) -> bool {
        every(t, self.eval_every)
    }

    /// Index of the snapshot taken at iteration `t`
    pub fn snapshot_index(&self, t: usize) -> usize {
        if self.eval_every == 0 {
            0
        } else {
            t / self.eval_every
        }
    }
}

/// `t % period == 0`, with a zero period meaning "never"
fn every(t: usize, period: usize) -> bool {
    period != 0 && t % period == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critic_iters_table() {
        let schedule = Schedule::default();

        for t in 0..25 {
            assert_eq!(schedule.critic_iters(t), 100, "t = {t}");
        }
        assert_eq!(schedule.critic_iters(25), 5);
        assert_eq!(schedule.critic_iters(30), 5);
        assert_eq!(schedule.critic_iters(499), 5);
        assert_eq!(schedule.critic_iters(500), 100);
        assert_eq!(schedule.critic_iters(501), 5);
        assert_eq!(schedule.critic_iters(1000), 100);
        assert_eq!(schedule.critic_iters(1001), 5);
    }

    #[test]
    fn test_critic_iters_light_below_anchor() {
        let schedule = Schedule::default();
        let heavy = (25..500).filter(|&t| schedule.critic_iters(t) == 100).count();
        assert_eq!(heavy, 0);
    }

    #[test]
    fn test_logging_cadence() {
        let schedule = Schedule::default();

        assert!(schedule.should_log(0));
        assert!(schedule.should_log(99));
        assert!(!schedule.should_log(101));
        assert!(schedule.should_log(200));
        assert!(!schedule.should_log(250));
    }

    #[test]
    fn test_eval_cadence() {
        let schedule = Schedule::default();

        assert!(schedule.should_eval(0));
        assert!(!schedule.should_eval(50));
        assert!(schedule.should_eval(300));
        assert_eq!(schedule.snapshot_index(300), 3);
        assert_eq!(schedule.snapshot_index(0), 0);
    }

    #[test]
    fn test_zero_period_disables() {
        let schedule = Schedule {
            eval_every: 0,
            anchor_every: 0,
            ..Default::default()
        };
        assert!(!schedule.should_eval(0));
        assert_eq!(schedule.critic_iters(1000), 5);
    }
}
