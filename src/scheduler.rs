//! Multi-display rotation scheduling.
//!
//! Each display cycles through an ordered sequence of [`Frame`]s on its own
//! long-lived background task: render the current frame, advance, sleep for
//! the frame's duration, repeat. The orchestration layer swaps frame
//! sequences in at any time with [`RotationScheduler::set_rotation`] without
//! ever stopping a task — restarting mid-cycle would reset timing and make
//! the display flicker.
//!
//! Two locks keep this safe:
//!
//! - a **render lock** (async) around the read-frame/render/advance sequence,
//!   shared across all displays when they multiplex one output channel
//!   ([`RotationScheduler::shared_channel`]), otherwise scoped per display;
//! - an **update lock** (sync, short critical sections only) around the frame
//!   sequence and index, so `set_rotation` is never stuck behind a full
//!   render-plus-sleep cycle.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use kitchenpi::{Frame, MockDisplay, RotationScheduler};
//!
//! # async fn example() -> Result<(), kitchenpi::Error> {
//! let scheduler = RotationScheduler::new(vec![Box::new(MockDisplay::new(16, 2))]);
//!
//! scheduler.set_rotation(0, vec![
//!     Frame::new(vec![vec!["=72°".into(), "Clear".into()]], Duration::from_secs(5)),
//!     Frame::new(vec![vec!["≋5/10NW".into(), "⸪40%".into()]], Duration::from_secs(5)),
//! ])?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::display::DisplayHandle;
use crate::error::Error;
use crate::layout::justify;

/// One timed screenful of content: lines of 1–3 text segments plus how long
/// to show them before the rotation advances.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Rows of text segments, outermost first; justified at render time.
    pub lines: Vec<Vec<String>>,
    /// How long the frame stays on screen. Must be positive.
    pub duration: Duration,
}

impl Frame {
    /// Create a frame from lines of segments and a display duration.
    pub fn new(lines: Vec<Vec<String>>, duration: Duration) -> Self {
        Self { lines, duration }
    }

    /// Justify every line to `width` and join them into one display buffer.
    fn render(&self, width: usize) -> Result<String, Error> {
        let lines = self
            .lines
            .iter()
            .map(|segments| justify(segments, width))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }
}

/// Per-display rotation state, guarded by the update lock.
#[derive(Debug, Default)]
struct RotationState {
    frames: Vec<Frame>,
    current: usize,
    last_text: String,
}

impl RotationState {
    /// Replace the frame sequence, keeping the current position whenever
    /// possible. The index is clamped to 0 only when it points past the end
    /// of the new sequence.
    fn replace(&mut self, frames: Vec<Frame>) {
        self.frames = frames;
        if self.current >= self.frames.len() {
            self.current = 0;
        }
    }

    /// Take the frame to render now and advance the index, wrapping modulo
    /// the frame count.
    fn advance(&mut self) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.current].clone();
        self.current = (self.current + 1) % self.frames.len();
        Some(frame)
    }
}

struct DisplaySlot {
    handle: Arc<AsyncMutex<Box<dyn DisplayHandle>>>,
    state: Arc<Mutex<RotationState>>,
    render_lock: Arc<AsyncMutex<()>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Drives a set of displays, one background rotation task per display.
///
/// Tasks are created lazily on the first rotation for a display and then
/// live for the process lifetime; they are daemonic and never prevent
/// shutdown. A fault on one display is contained to that display's loop.
pub struct RotationScheduler {
    slots: Vec<DisplaySlot>,
}

impl RotationScheduler {
    /// Create a scheduler for physically independent displays, each with its
    /// own render lock.
    pub fn new(displays: Vec<Box<dyn DisplayHandle>>) -> Self {
        Self::build(displays, false)
    }

    /// Create a scheduler for displays multiplexed over one shared output
    /// channel (e.g. several [`crate::ConsoleDisplay`]s printing to stdout).
    /// Renders are mutually exclusive across all displays so output never
    /// interleaves.
    pub fn shared_channel(displays: Vec<Box<dyn DisplayHandle>>) -> Self {
        Self::build(displays, true)
    }

    fn build(displays: Vec<Box<dyn DisplayHandle>>, shared: bool) -> Self {
        let shared_lock = Arc::new(AsyncMutex::new(()));
        let slots = displays
            .into_iter()
            .map(|handle| DisplaySlot {
                handle: Arc::new(AsyncMutex::new(handle)),
                state: Arc::new(Mutex::new(RotationState::default())),
                render_lock: if shared {
                    Arc::clone(&shared_lock)
                } else {
                    Arc::new(AsyncMutex::new(()))
                },
                task: Mutex::new(None),
            })
            .collect();
        Self { slots }
    }

    /// Number of displays this scheduler owns.
    pub fn display_count(&self) -> usize {
        self.slots.len()
    }

    /// Assign a rotation to a display, replacing any previous one.
    ///
    /// The first call for a display spawns its background task; later calls
    /// atomically swap the frames under the update lock without touching the
    /// task, so the current frame position and timing survive updates. If the
    /// new sequence is shorter than the preserved index, the index resets
    /// to 0.
    ///
    /// Safe to call from any task at any time, including while a render for
    /// the same display is in flight. Must be called from within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyRotation`] for an empty frame list,
    /// [`Error::UnknownDisplay`] for an out-of-range display index.
    pub fn set_rotation(&self, display_index: usize, frames: Vec<Frame>) -> Result<(), Error> {
        if frames.is_empty() {
            return Err(Error::EmptyRotation);
        }
        let slot = self
            .slots
            .get(display_index)
            .ok_or(Error::UnknownDisplay(display_index))?;

        slot.state
            .lock()
            .expect("rotation state lock poisoned")
            .replace(frames);

        let mut task = slot.task.lock().expect("task handle lock poisoned");
        if task.is_none() {
            tracing::debug!(display = display_index, "starting rotation task");
            *task = Some(tokio::spawn(run_display(
                display_index,
                Arc::clone(&slot.state),
                Arc::clone(&slot.handle),
                Arc::clone(&slot.render_lock),
            )));
        }

        Ok(())
    }

    /// The index of the frame the display will render next, or `None` if no
    /// rotation has been set.
    pub fn frame_index(&self, display: usize) -> Option<usize> {
        let slot = self.slots.get(display)?;
        let state = slot.state.lock().expect("rotation state lock poisoned");
        if state.frames.is_empty() {
            None
        } else {
            Some(state.current)
        }
    }

    /// The last successfully rendered buffer of every display, in display
    /// order. Debugging surface for the console presentation.
    pub fn snapshot(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| {
                slot.state
                    .lock()
                    .expect("rotation state lock poisoned")
                    .last_text
                    .clone()
            })
            .collect()
    }

    /// Immediately blank one display. The rotation and frame index are left
    /// untouched; the next cycle repaints as scheduled.
    pub async fn clear(&self, display: usize) -> Result<(), Error> {
        let slot = self
            .slots
            .get(display)
            .ok_or(Error::UnknownDisplay(display))?;
        // Same lock order as the rotation loop (render, then handle) so a
        // clear never interleaves with an in-flight render on a shared
        // output channel.
        let _render = slot.render_lock.lock().await;
        slot.handle.lock().await.clear()?;
        slot.state
            .lock()
            .expect("rotation state lock poisoned")
            .last_text
            .clear();
        Ok(())
    }

    /// Immediately blank every display.
    pub async fn clear_all(&self) -> Result<(), Error> {
        for display in 0..self.slots.len() {
            self.clear(display).await?;
        }
        Ok(())
    }
}

/// The per-display rotation loop. Runs forever; every fault is logged and
/// contained so one bad cycle (or one bad device) never stops the rotation
/// or leaks into other displays.
async fn run_display(
    display_index: usize,
    state: Arc<Mutex<RotationState>>,
    handle: Arc<AsyncMutex<Box<dyn DisplayHandle>>>,
    render_lock: Arc<AsyncMutex<()>>,
) {
    loop {
        let frame = {
            let _render = render_lock.lock().await;

            // Update lock held only long enough to copy the frame out;
            // never across an await point.
            let frame = state
                .lock()
                .expect("rotation state lock poisoned")
                .advance();
            let Some(frame) = frame else {
                drop(_render);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            };

            let mut device = handle.lock().await;
            match frame.render(device.width()) {
                Ok(text) => match device.set_text(&text) {
                    Ok(()) => {
                        state
                            .lock()
                            .expect("rotation state lock poisoned")
                            .last_text = text;
                    }
                    Err(e) => {
                        tracing::warn!(display = display_index, error = %e, "render failed, skipping cycle");
                    }
                },
                Err(e) => {
                    tracing::warn!(display = display_index, error = %e, "frame layout failed, skipping cycle");
                }
            }

            frame
        };

        tokio::time::sleep(frame.duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MockDisplay;

    struct FailingDisplay;

    impl DisplayHandle for FailingDisplay {
        fn set_text(&mut self, _text: &str) -> Result<(), Error> {
            Err(Error::Render("device unplugged".to_string()))
        }

        fn clear(&mut self) -> Result<(), Error> {
            Err(Error::Render("device unplugged".to_string()))
        }

        fn width(&self) -> usize {
            16
        }

        fn height(&self) -> usize {
            2
        }
    }

    fn frames(count: usize, duration: Duration) -> Vec<Frame> {
        (0..count)
            .map(|i| {
                Frame::new(
                    vec![vec![format!("frame {i}"), "x".to_string()]],
                    duration,
                )
            })
            .collect()
    }

    fn mock_scheduler(displays: usize) -> RotationScheduler {
        RotationScheduler::new(
            (0..displays)
                .map(|_| Box::new(MockDisplay::new(16, 2)) as Box<dyn DisplayHandle>)
                .collect(),
        )
    }

    #[test]
    fn test_frame_render_justifies_each_line() {
        let frame = Frame::new(
            vec![
                vec!["abc".to_string(), "xyz".to_string()],
                vec!["hi".to_string()],
            ],
            Duration::from_secs(5),
        );
        assert_eq!(frame.render(16).unwrap(), "abc          xyz\nhi");
    }

    #[test]
    fn test_replace_clamps_only_past_end() {
        let mut state = RotationState::default();
        state.replace(frames(3, Duration::from_secs(1)));
        state.advance();
        state.advance();
        assert_eq!(state.current, 2);

        // same length: position preserved
        state.replace(frames(3, Duration::from_secs(1)));
        assert_eq!(state.current, 2);

        // shorter, index now past the end: clamp to 0
        state.replace(frames(2, Duration::from_secs(1)));
        assert_eq!(state.current, 0);
    }

    #[tokio::test]
    async fn test_set_rotation_validation() {
        let scheduler = mock_scheduler(1);
        assert!(matches!(
            scheduler.set_rotation(0, vec![]),
            Err(Error::EmptyRotation)
        ));
        assert!(matches!(
            scheduler.set_rotation(5, frames(1, Duration::from_secs(1))),
            Err(Error::UnknownDisplay(5))
        ));
        assert_eq!(scheduler.frame_index(0), None);
    }

    #[tokio::test]
    async fn test_set_rotation_is_idempotent_on_index() {
        let scheduler = mock_scheduler(1);
        let rotation = frames(3, Duration::from_secs(5));

        scheduler.set_rotation(0, rotation.clone()).unwrap();
        assert_eq!(scheduler.frame_index(0), Some(0));

        // no implicit reset when re-applying the same frames
        scheduler.set_rotation(0, rotation).unwrap();
        assert_eq!(scheduler.frame_index(0), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_advances_and_wraps() {
        let scheduler = mock_scheduler(1);
        scheduler
            .set_rotation(0, frames(3, Duration::from_secs(5)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(scheduler.frame_index(0), Some(1));
        assert_eq!(scheduler.snapshot()[0], "frame 0        x");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(scheduler.frame_index(0), Some(2));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(scheduler.frame_index(0), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shrinking_rotation_clamps_index() {
        let scheduler = mock_scheduler(1);
        scheduler
            .set_rotation(0, frames(3, Duration::from_secs(5)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(scheduler.frame_index(0), Some(2));

        scheduler
            .set_rotation(0, frames(2, Duration::from_secs(5)))
            .unwrap();
        assert_eq!(scheduler.frame_index(0), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_leaves_rotation_state_alone() {
        let scheduler = mock_scheduler(1);
        scheduler
            .set_rotation(0, frames(2, Duration::from_secs(5)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!scheduler.snapshot()[0].is_empty());
        let index_before = scheduler.frame_index(0);

        scheduler.clear(0).await.unwrap();
        assert_eq!(scheduler.snapshot()[0], "");
        assert_eq!(scheduler.frame_index(0), index_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_takes_the_shared_render_lock() {
        let scheduler = RotationScheduler::shared_channel(vec![
            Box::new(MockDisplay::new(16, 2)) as Box<dyn DisplayHandle>,
            Box::new(MockDisplay::new(16, 2)) as Box<dyn DisplayHandle>,
        ]);
        scheduler
            .set_rotation(0, frames(2, Duration::from_secs(5)))
            .unwrap();
        scheduler
            .set_rotation(1, frames(2, Duration::from_secs(5)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1)).await;
        let index_before = scheduler.frame_index(0);

        // clear contends on the same render lock as both rotation tasks;
        // it must serialize against them, not deadlock or skip
        scheduler.clear_all().await.unwrap();
        assert!(scheduler.snapshot().iter().all(String::is_empty));
        assert_eq!(scheduler.frame_index(0), index_before);

        // next cycle repaints both displays as scheduled
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(scheduler.snapshot().iter().all(|text| !text.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failure_is_contained() {
        let scheduler = RotationScheduler::new(vec![
            Box::new(FailingDisplay) as Box<dyn DisplayHandle>,
            Box::new(MockDisplay::new(16, 2)) as Box<dyn DisplayHandle>,
        ]);
        scheduler
            .set_rotation(0, frames(2, Duration::from_secs(1)))
            .unwrap();
        scheduler
            .set_rotation(1, frames(2, Duration::from_secs(1)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;

        // the failing display's task keeps cycling
        assert!(scheduler.frame_index(0).is_some());
        // and the healthy display is unaffected
        assert!(!scheduler.snapshot()[1].is_empty());
        assert!(scheduler.snapshot()[0].is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_set_rotation_is_safe() {
        let scheduler = Arc::new(mock_scheduler(1));
        scheduler
            .set_rotation(0, frames(3, Duration::from_millis(2)))
            .unwrap();

        let mut tasks = Vec::new();
        for worker in 0..8usize {
            let scheduler = Arc::clone(&scheduler);
            tasks.push(tokio::spawn(async move {
                for n in 0..50usize {
                    let len = 1 + (worker + n) % 4;
                    scheduler
                        .set_rotation(0, frames(len, Duration::from_millis(2)))
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // whatever the interleaving, the index stayed inside the rotation
        let index = scheduler.frame_index(0).unwrap();
        assert!(index < 4);
    }
}
