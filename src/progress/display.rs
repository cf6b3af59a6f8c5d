//! Terminal progress bars for batch downloads.

use super::{ProgressEvent, ProgressListener, StyleOptions};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::sync::Arc;

/// Coordinates the main bar (files finished) and one byte bar per running task.
pub struct ProgressDisplay {
    multi: Arc<MultiProgress>,
    main: ProgressBar,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    pub fn new(style_options: StyleOptions, total_tasks: usize) -> Self {
        let multi = match style_options.is_enabled() {
            true => Arc::new(MultiProgress::new()),
            false => Arc::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden())),
        };
        let main = multi.add(style_options.main().to_progress_bar(total_tasks as u64));
        main.tick();

        Self {
            multi,
            main,
            style_options,
        }
    }

    /// Create a byte bar for one task, labelled with `name`.
    pub fn create_child(&self, name: &str) -> ChildProgress {
        let bar = self.multi.add(self.style_options.child().to_progress_bar(0));
        bar.set_message(name.to_owned());
        ChildProgress { bar }
    }

    /// Finish a child bar and advance the main bar.
    pub fn finish_child(&self, child: ChildProgress) {
        if self.style_options.child().clear {
            child.bar.finish_and_clear();
        } else {
            child.bar.finish();
        }
        self.main.inc(1);
    }

    pub fn finish(self) {
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}

/// Byte bar of a single task, driven by its progress events.
#[derive(Debug, Clone)]
pub struct ChildProgress {
    bar: ProgressBar,
}

impl ProgressListener for ChildProgress {
    fn on_progress(&self, event: ProgressEvent) {
        if let Some(total) = event.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(event.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressBarOpts;

    #[test]
    fn test_child_follows_events() {
        let display = ProgressDisplay::new(
            StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden()),
            1,
        );
        let child = display.create_child("a.jar");
        child.on_progress(ProgressEvent::chunk(10, 10, Some(40)));
        assert_eq!(child.bar.position(), 10);
        assert_eq!(child.bar.length(), Some(40));

        display.finish_child(child);
        assert_eq!(display.main.position(), 1);
        display.finish();
    }
}
