use tokio::sync::mpsc::UnboundedSender;

/// Loading progress for one source, reported in order:
/// `Started`, then `Parsing`, then either `Completed` or `Failed`.
/// A failed read skips `Parsing`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadProgress {
    Started { source: String },
    Parsing { source: String, bytes: usize },
    /// `items` counts months for a dataset and boundaries for a boundary source.
    Completed { source: String, items: usize },
    Failed { source: String, message: String },
}

pub type ProgressSender = UnboundedSender<LoadProgress>;

/// Sends `event` if someone is listening. A dropped receiver is not an error.
pub(crate) fn report(progress: Option<&ProgressSender>, event: LoadProgress) {
    if let Some(sender) = progress {
        let _ = sender.send(event);
    }
}
