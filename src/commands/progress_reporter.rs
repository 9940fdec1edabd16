use crate::stats::Progress;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

type ProgressCallback = Box<dyn Fn() -> (u64, u64, String) + Send + Sync>;

/// Refresh rate for progress updates (10 Hz).
const REFRESH_INTERVAL_MS: u64 = 100;

const BAR_TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {msg}";
const BAR_TEMPLATE_NO_COLOR: &str = "{prefix:>12} [{bar:25}] {msg}";
const SPINNER_TEMPLATE: &str = "{prefix:>12.bold.cyan} {spinner} {msg}";
const SPINNER_TEMPLATE_NO_COLOR: &str = "{prefix:>12} {spinner} {msg}";

/// Progress shown on stderr once a run has been going for longer than a grace period.
///
/// Short runs finish without ever drawing anything.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    visible_after: Instant,
    visible: Arc<AtomicBool>,
    callback: Arc<Mutex<ProgressCallback>>,
    refresh_task: Arc<JoinHandle<()>>,
    use_colors: bool,
}

impl ProgressReporter {
    /// Create a reporter that stays hidden for `delay`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let bar = ProgressBar::hidden();
        let visible_after = Instant::now() + delay;
        let visible = Arc::new(AtomicBool::new(false));
        let callback = Arc::new(Mutex::new(Box::new(|| (0u64, 0u64, String::new())) as ProgressCallback));

        let refresh_task = tokio::spawn(refresh(bar.clone(), visible_after, Arc::clone(&visible), Arc::clone(&callback)));

        Self {
            bar,
            visible_after,
            visible,
            callback,
            refresh_task: Arc::new(refresh_task),
            use_colors,
        }
    }

    fn template(&self, spinner: bool) -> &'static str {
        match (spinner, self.use_colors) {
            (false, true) => BAR_TEMPLATE,
            (false, false) => BAR_TEMPLATE_NO_COLOR,
            (true, true) => SPINNER_TEMPLATE,
            (true, false) => SPINNER_TEMPLATE_NO_COLOR,
        }
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.bar.set_prefix(phase.to_string());
    }

    fn set_determinate(&self, callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>) {
        *self.callback.lock().expect("lock poisoned") = callback;
        self.bar.disable_steady_tick();
        self.bar.set_length(0);
        self.bar.set_position(0);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template(self.template(false))
                .expect("could not create progress bar style")
                .progress_chars("=> "),
        );
    }

    fn set_indeterminate(&self, callback: Box<dyn Fn() -> String + Send + Sync + 'static>) {
        *self.callback.lock().expect("lock poisoned") = Box::new(move || (0, 0, callback()));
        self.bar.set_style(
            ProgressStyle::default_spinner()
                .template(self.template(true))
                .expect("could not create progress bar style"),
        );
        self.bar.enable_steady_tick(Duration::from_millis(REFRESH_INTERVAL_MS));
    }

    fn done(&self) {
        self.refresh_task.abort();
        if self.visible.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("bar", &self.bar)
            .field("visible_after", &self.visible_after)
            .field("visible", &self.visible)
            .field("callback", &"<callback>")
            .field("refresh_task", &"<task>")
            .field("use_colors", &self.use_colors)
            .finish()
    }
}

/// Background task that reveals the bar after the delay and keeps it current.
async fn refresh(bar: ProgressBar, visible_after: Instant, visible: Arc<AtomicBool>, callback: Arc<Mutex<ProgressCallback>>) {
    let mut interval = tokio::time::interval(Duration::from_millis(REFRESH_INTERVAL_MS));
    #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
    loop {
        let _ = interval.tick().await;

        if !visible.load(Ordering::Relaxed) {
            if Instant::now() < visible_after {
                continue;
            }
            visible.store(true, Ordering::Relaxed);
            bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }

        let (length, position, message) = {
            let guard = callback.lock().expect("lock poisoned");
            guard()
        };

        if length > 0 {
            bar.set_length(length);
            bar.set_position(position);
        }
        bar.set_message(message);
    }
}
