use indicatif::{ProgressBar, ProgressStyle};
use std::{future::Future, io::IsTerminal, time::Duration};

/// Awaits `fut` while a spinner with `msg` runs on stderr. Silent when
/// stderr is not a terminal. The line is cleared however `fut` ends.
pub async fn with_spinner<Fut: Future>(msg: impl Into<String>, fut: Fut) -> Fut::Output {
    let pb = std::io::stderr().is_terminal().then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(msg.into());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    });

    struct Clear(Option<ProgressBar>);
    impl Drop for Clear {
        fn drop(&mut self) {
            if let Some(pb) = self.0.take() {
                pb.finish_and_clear();
            }
        }
    }
    let _clear = Clear(pb);

    fut.await
}
