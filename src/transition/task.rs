use crate::transition::easing::Easing;
use log::debug;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Identifies one transition so late events of a replaced one can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u64);

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionEvent {
    /// Eased progress in `[0, 1]`, non-decreasing.
    Progress(f64),
    /// Sent once after `Progress(1.0)`.
    Completed,
    Cancelled,
}

/// A running transition. Dropping the handle cancels it.
#[derive(Debug)]
pub struct TransitionHandle {
    id: TransitionId,
    events: UnboundedReceiver<TransitionEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TransitionHandle {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// `None` once the task has finished and every event was received.
    pub async fn next_event(&mut self) -> Option<TransitionEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TransitionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns a task that emits eased progress every `frame_interval` for `duration`.
///
/// Frames are dropped rather than bunched up if the receiver falls behind.
/// The task stops early when cancelled or when the handle's receiver is gone.
pub fn spawn_transition(
    id: TransitionId,
    duration: Duration,
    frame_interval: Duration,
    easing: Easing,
) -> TransitionHandle {
    let (tx, events) = unbounded_channel();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(drive(
        id,
        duration,
        frame_interval.max(Duration::from_millis(1)),
        easing,
        tx,
        cancel.clone(),
    ));
    TransitionHandle {
        id,
        events,
        cancel,
        task,
    }
}

async fn drive(
    id: TransitionId,
    duration: Duration,
    frame_interval: Duration,
    easing: Easing,
    tx: UnboundedSender<TransitionEvent>,
    cancel: CancellationToken,
) {
    let start = Instant::now();
    let mut frames = time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Transition {} cancelled", id);
                let _ = tx.send(TransitionEvent::Cancelled);
                return;
            }
            _ = frames.tick() => {
                let elapsed = start.elapsed();
                if elapsed >= duration {
                    let _ = tx.send(TransitionEvent::Progress(1.0));
                    let _ = tx.send(TransitionEvent::Completed);
                    return;
                }
                let linear = elapsed.as_secs_f64() / duration.as_secs_f64();
                if tx.send(TransitionEvent::Progress(easing.apply(linear))).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_completion() {
        let mut handle = spawn_transition(
            TransitionId(1),
            Duration::from_millis(600),
            Duration::from_millis(16),
            Easing::QuadraticInOut,
        );
        let mut progress = Vec::new();
        let last = loop {
            match handle.next_event().await {
                Some(TransitionEvent::Progress(p)) => progress.push(p),
                other => break other,
            }
        };
        assert_eq!(last, Some(TransitionEvent::Completed));
        assert_eq!(progress.first(), Some(&0.0));
        assert_eq!(progress.last(), Some(&1.0));
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert!(progress.len() > 10);
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_transition() {
        let mut handle = spawn_transition(
            TransitionId(2),
            Duration::from_secs(10),
            Duration::from_millis(16),
            Easing::Linear,
        );
        assert_eq!(handle.id(), TransitionId(2));
        assert_eq!(handle.next_event().await, Some(TransitionEvent::Progress(0.0)));
        handle.cancel();
        let last = loop {
            match handle.next_event().await {
                Some(TransitionEvent::Progress(p)) => assert!(p < 1.0),
                other => break other,
            }
        };
        assert_eq!(last, Some(TransitionEvent::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_completes_immediately() {
        let mut handle = spawn_transition(
            TransitionId(3),
            Duration::ZERO,
            Duration::ZERO,
            Easing::Linear,
        );
        assert_eq!(handle.next_event().await, Some(TransitionEvent::Progress(1.0)));
        assert_eq!(handle.next_event().await, Some(TransitionEvent::Completed));
    }
}
