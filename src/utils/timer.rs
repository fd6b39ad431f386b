//! A step-driven task timer. Each game state owns one and advances it with
//! the state's scaled time, so paused states never fire their tasks and a
//! slowed state fires them late, in step with everything else it runs.

use std::cell::{Cell, RefCell};
use std::mem;

/// A resumable task. Returning `Some(delay)` schedules the next resume that
/// many seconds after the previous due time; returning `None` retires the
/// task.
pub trait Routine {
    fn resume(&mut self) -> Option<f64>;
}

impl<F> Routine for F
where
    F: FnMut() -> Option<f64>,
{
    fn resume(&mut self) -> Option<f64> {
        self()
    }
}

enum TaskKind {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn Routine>),
}

struct Task {
    run_at: f64,
    kind: TaskKind,
}

/// An ordered collection of delayed tasks over a local timeline.
///
/// All methods take `&self`; callbacks running inside [`progress`] may
/// schedule further tasks on the same timer, and those become due on a
/// later step, never the current one.
///
/// [`progress`]: Timer::progress
#[derive(Default)]
pub struct Timer {
    total: Cell<f64>,
    tasks: RefCell<Vec<Task>>,
}

impl Timer {
    pub fn new() -> Self {
        Timer::default()
    }

    /// Seconds accumulated over the timer's lifetime.
    #[inline]
    pub fn total(&self) -> f64 {
        self.total.get()
    }

    /// The number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Runs `f` once, on the first step that passes `delay` seconds from
    /// now. The boundary is exclusive: a task scheduled with delay zero
    /// still waits for the next non-empty step.
    pub fn run_after<F>(&self, delay: f64, f: F)
    where
        F: FnOnce() + 'static,
    {
        self.tasks.borrow_mut().push(Task {
            run_at: self.total.get() + delay,
            kind: TaskKind::Once(Box::new(f)),
        });
    }

    /// Schedules a recurring routine, first resumed after `delay` seconds.
    /// The routine's own return values space out the resumes that follow.
    pub fn schedule<R>(&self, delay: f64, routine: R)
    where
        R: Routine + 'static,
    {
        self.tasks.borrow_mut().push(Task {
            run_at: self.total.get() + delay,
            kind: TaskKind::Repeat(Box::new(routine)),
        });
    }

    /// Advances the timeline by `dt` seconds and runs everything that came
    /// due. A routine that falls behind is resumed once per step, its next
    /// due time pushed to at least the current total, so a long hitch never
    /// causes a burst of catch-up resumes.
    pub fn progress(&self, dt: f64) {
        let total = self.total.get() + dt;
        self.total.set(total);

        // Steal the task list; the cell stays unlocked while callbacks run.
        let drained = mem::replace(&mut *self.tasks.borrow_mut(), Vec::new());

        let mut survivors = Vec::with_capacity(drained.len());
        for task in drained {
            if total > task.run_at {
                match task.kind {
                    TaskKind::Once(f) => f(),
                    TaskKind::Repeat(mut routine) => {
                        if let Some(delay) = routine.resume() {
                            let next = task.run_at + delay;
                            survivors.push(Task {
                                run_at: if next > total { next } else { total },
                                kind: TaskKind::Repeat(routine),
                            });
                        }
                    }
                }
            } else {
                survivors.push(task);
            }
        }

        // Callbacks may have scheduled new tasks in the meantime; keep them
        // behind the survivors.
        let mut tasks = self.tasks.borrow_mut();
        let fresh = mem::replace(&mut *tasks, survivors);
        tasks.extend(fresh);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn fires_strictly_after_the_delay() {
        let hits = Rc::new(Cell::new(0));
        let timer = Timer::new();

        let h = Rc::clone(&hits);
        timer.run_after(1.0, move || h.set(h.get() + 1));

        timer.progress(1.0);
        assert_eq!(hits.get(), 0);

        timer.progress(0.001);
        assert_eq!(hits.get(), 1);
        assert!(timer.is_empty());

        // One-shot: no further firing.
        timer.progress(10.0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn routines_reschedule_themselves() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let timer = Timer::new();

        let l = Rc::clone(&log);
        let mut remaining = 3;
        timer.schedule(0.5, move || {
            l.borrow_mut().push(remaining);
            remaining -= 1;
            if remaining > 0 {
                Some(0.5)
            } else {
                None
            }
        });

        for _ in 0..6 {
            timer.progress(0.3);
        }

        assert_eq!(*log.borrow(), vec![3, 2, 1]);
        assert!(timer.is_empty());
    }

    #[test]
    fn late_routines_resume_once_per_step() {
        let hits = Rc::new(Cell::new(0));
        let timer = Timer::new();

        let h = Rc::clone(&hits);
        timer.schedule(1.0, move || {
            h.set(h.get() + 1);
            Some(1.0)
        });

        // Ten seconds in a single hitch still resumes just once.
        timer.progress(10.0);
        assert_eq!(hits.get(), 1);

        // The next due time was dragged up to the present.
        timer.progress(1.5);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn tasks_scheduled_by_callbacks_wait_for_the_next_step() {
        let hits = Rc::new(Cell::new(0));
        let timer = Rc::new(Timer::new());

        let t = Rc::clone(&timer);
        let h = Rc::clone(&hits);
        timer.run_after(0.5, move || {
            let h2 = Rc::clone(&h);
            t.run_after(0.0, move || h2.set(h2.get() + 1));
        });

        timer.progress(1.0);
        assert_eq!(hits.get(), 0);
        assert_eq!(timer.len(), 1);

        timer.progress(0.1);
        assert_eq!(hits.get(), 1);
    }
}
