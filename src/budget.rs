use std::convert::Infallible;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::ConversionError;

/// Number of steps between two looks at the clock.
const CLOCK_INTERVAL: u64 = 256;

/// A cooperative resource budget. Long running algorithms call [`Budget::step`] once per unit
/// of work and [`Budget::admit`] whenever they produce states, and abort with the returned
/// error as soon as the budget is exhausted.
pub trait Budget {
    /// The error produced on exhaustion.
    type Error;

    /// Accounts for one unit of work.
    fn step(&mut self) -> Result<(), Self::Error>;

    /// Checks that an automaton with `states` states may be produced.
    fn admit(&mut self, states: usize) -> Result<(), Self::Error>;
}

/// A budget that never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Budget for Unbounded {
    type Error = Infallible;

    fn step(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn admit(&mut self, _states: usize) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Extracts the value of a computation that ran with an [`Unbounded`] budget.
pub(crate) fn unbounded<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// A budget limited by a wall-clock deadline and/or a ceiling on the number of states.
#[derive(Debug, Clone)]
pub struct Bounded {
    operation: &'static str,
    started: Instant,
    timeout: Option<Duration>,
    max_states: Option<usize>,
    steps: u64,
}

impl Bounded {
    /// Starts the clock for `operation`.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
            timeout: None,
            max_states: None,
            steps: 0,
        }
    }

    /// Aborts once `timeout` has elapsed.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Aborts once more than `max_states` states are produced.
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    /// Time spent since the budget was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn check_clock(&self) -> Result<(), ConversionError> {
        let Some(budget) = self.timeout else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed > budget {
            warn!("`{}` exceeded its time budget of {budget:?}", self.operation);
            return Err(ConversionError::Timeout {
                operation: self.operation,
                elapsed,
                budget,
            });
        }
        Ok(())
    }
}

impl Budget for Bounded {
    type Error = ConversionError;

    fn step(&mut self) -> Result<(), ConversionError> {
        self.steps += 1;
        if self.steps % CLOCK_INTERVAL == 0 {
            self.check_clock()?;
        }
        Ok(())
    }

    fn admit(&mut self, states: usize) -> Result<(), ConversionError> {
        match self.max_states {
            Some(max_states) if states > max_states => {
                warn!(
                    "`{}` exceeded the state ceiling of {max_states}",
                    self.operation
                );
                Err(ConversionError::Memory {
                    operation: self.operation,
                    states,
                    max_states,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ceiling() {
        let mut budget = Bounded::new("test").with_max_states(3);
        assert!(budget.admit(3).is_ok());
        assert_eq!(
            budget.admit(4),
            Err(ConversionError::Memory {
                operation: "test",
                states: 4,
                max_states: 3
            })
        );
    }

    #[test]
    fn zero_timeout_aborts_on_clock_check() {
        let mut budget = Bounded::new("test").with_timeout(Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(1));
        let result = (0..CLOCK_INTERVAL).try_for_each(|_| budget.step());
        assert!(matches!(result, Err(ConversionError::Timeout { .. })));
    }

    #[test]
    fn unbounded_never_fails() {
        let mut budget = Unbounded;
        assert_eq!(unbounded(budget.admit(usize::MAX).map(|_| 1)), 1);
    }
}
