// Host lifecycle for routines run on the control loop
//
// A routine is initialized once, executed every tick, polled for
// completion, and ended exactly once. The runner guarantees `end` on every
// exit path: natural completion, explicit cancel, or being dropped.

use tracing::debug;

/// Callbacks invoked by the control loop
pub trait Routine {
    fn initialize(&mut self);

    fn execute(&mut self);

    /// Polled after every `execute`; `true` ends the routine normally
    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self, interrupted: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Scheduled,
    Running,
    Ended { interrupted: bool },
}

/// Drives a `Routine` through its lifecycle one tick at a time
pub struct RoutineRunner<R: Routine> {
    routine: R,
    state: RunnerState,
}

impl<R: Routine> RoutineRunner<R> {
    pub fn new(routine: R) -> Self {
        Self {
            routine,
            state: RunnerState::Scheduled,
        }
    }

    /// Run one tick. Returns false once the routine has ended.
    pub fn tick(&mut self) -> bool {
        match self.state {
            RunnerState::Ended { .. } => return false,
            RunnerState::Scheduled => {
                debug!("Initializing routine");
                self.routine.initialize();
                self.state = RunnerState::Running;
            }
            RunnerState::Running => {}
        }

        self.routine.execute();
        if self.routine.is_finished() {
            self.finish(false);
            return false;
        }
        true
    }

    /// End the routine as interrupted. A routine that never started is
    /// just marked ended.
    pub fn cancel(&mut self) {
        match self.state {
            RunnerState::Running => self.finish(true),
            RunnerState::Scheduled => self.state = RunnerState::Ended { interrupted: true },
            RunnerState::Ended { .. } => {}
        }
    }

    fn finish(&mut self, interrupted: bool) {
        debug!("Ending routine (interrupted={})", interrupted);
        self.routine.end(interrupted);
        self.state = RunnerState::Ended { interrupted };
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunnerState::Running
    }

    pub fn routine(&self) -> &R {
        &self.routine
    }

    pub fn routine_mut(&mut self) -> &mut R {
        &mut self.routine
    }
}

impl<R: Routine> Drop for RoutineRunner<R> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every callback; finishes after `limit` executes if set
    struct Scripted {
        log: Rc<RefCell<Vec<String>>>,
        executes: usize,
        limit: Option<usize>,
    }

    impl Scripted {
        fn new(limit: Option<usize>) -> (Self, Rc<RefCell<Vec<String>>>) {
            let log = Rc::new(RefCell::new(Vec::new()));
            let scripted = Scripted {
                log: Rc::clone(&log),
                executes: 0,
                limit,
            };
            (scripted, log)
        }
    }

    impl Routine for Scripted {
        fn initialize(&mut self) {
            self.log.borrow_mut().push("init".to_string());
        }

        fn execute(&mut self) {
            self.executes += 1;
            self.log.borrow_mut().push("exec".to_string());
        }

        fn is_finished(&self) -> bool {
            self.limit.is_some_and(|limit| self.executes >= limit)
        }

        fn end(&mut self, interrupted: bool) {
            self.log.borrow_mut().push(format!("end({})", interrupted));
        }
    }

    #[test]
    fn test_natural_completion() {
        let (scripted, log) = Scripted::new(Some(2));
        let mut runner = RoutineRunner::new(scripted);
        assert!(runner.tick());
        assert!(!runner.tick());
        assert!(!runner.tick());
        assert_eq!(runner.state(), RunnerState::Ended { interrupted: false });
        drop(runner);
        assert_eq!(*log.borrow(), vec!["init", "exec", "exec", "end(false)"]);
    }

    #[test]
    fn test_cancel_ends_once() {
        let (scripted, log) = Scripted::new(None);
        let mut runner = RoutineRunner::new(scripted);
        runner.tick();
        runner.tick();
        runner.cancel();
        runner.cancel();
        assert!(!runner.tick());
        drop(runner);
        assert_eq!(*log.borrow(), vec!["init", "exec", "exec", "end(true)"]);
    }

    #[test]
    fn test_drop_while_running_interrupts() {
        let (scripted, log) = Scripted::new(None);
        {
            let mut runner = RoutineRunner::new(scripted);
            runner.tick();
            assert!(runner.is_running());
        }
        assert_eq!(*log.borrow(), vec!["init", "exec", "end(true)"]);
    }

    #[test]
    fn test_cancel_before_start_skips_end() {
        let (scripted, log) = Scripted::new(None);
        let mut runner = RoutineRunner::new(scripted);
        runner.cancel();
        assert_eq!(runner.state(), RunnerState::Ended { interrupted: true });
        drop(runner);
        assert!(log.borrow().is_empty());
    }
}
