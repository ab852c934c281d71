//! Drives a [`PlaybackController`] in real time: a ticker while playing,
//! transition tasks for animated month changes, and a command channel for
//! user controls. Every state change happens inside the single runner task.

use crate::playback::config::PlaybackConfig;
use crate::playback::controller::{PlaybackController, PlaybackFrame};
use crate::playback::error::PlaybackStopped;
use crate::transition::task::{spawn_transition, TransitionEvent, TransitionHandle};
use crate::types::metric::Metric;
use log::{debug, info, warn};
use std::future::pending;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

const COMMAND_BUFFER: usize = 32;
const FRAME_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    SeekMonth(usize),
    SeekYear(i32),
    SetMetric(Metric),
    Shutdown,
}

/// Sends controls to a running playback task.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    commands: Sender<PlaybackCommand>,
}

impl PlaybackHandle {
    pub async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackStopped> {
        self.commands.send(command).await.map_err(|_| PlaybackStopped)
    }

    pub async fn play(&self) -> Result<(), PlaybackStopped> {
        self.send(PlaybackCommand::Play).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackStopped> {
        self.send(PlaybackCommand::Pause).await
    }

    pub async fn seek_month(&self, index: usize) -> Result<(), PlaybackStopped> {
        self.send(PlaybackCommand::SeekMonth(index)).await
    }

    pub async fn seek_year(&self, year: i32) -> Result<(), PlaybackStopped> {
        self.send(PlaybackCommand::SeekYear(year)).await
    }

    pub async fn set_metric(&self, metric: Metric) -> Result<(), PlaybackStopped> {
        self.send(PlaybackCommand::SetMetric(metric)).await
    }

    /// Asks the task to stop. The controller is handed back through its `JoinHandle`.
    pub async fn shutdown(&self) -> Result<(), PlaybackStopped> {
        self.send(PlaybackCommand::Shutdown).await
    }
}

enum Step {
    Command(Option<PlaybackCommand>),
    Tick,
    Transition(Option<TransitionEvent>),
}

pub struct PlaybackRunner {
    controller: PlaybackController,
    config: PlaybackConfig,
    commands: Receiver<PlaybackCommand>,
    frames: Sender<PlaybackFrame>,
    ticker: Option<Interval>,
    transition: Option<TransitionHandle>,
}

/// Spawns the playback task, switching the controller to `config.metric` first.
///
/// Frames are published after every accepted command, tick and transition
/// step. The task ends on [`PlaybackCommand::Shutdown`], when every handle is
/// dropped, or when the frame receiver is dropped, and returns the controller.
pub fn spawn_playback(
    mut controller: PlaybackController,
    config: PlaybackConfig,
) -> (
    PlaybackHandle,
    Receiver<PlaybackFrame>,
    JoinHandle<PlaybackController>,
) {
    controller.set_metric(config.metric);
    let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
    let (frames, frame_rx) = mpsc::channel(FRAME_BUFFER);
    let runner = PlaybackRunner {
        controller,
        config,
        commands,
        frames,
        ticker: None,
        transition: None,
    };
    let task = tokio::spawn(runner.run());
    (PlaybackHandle { commands: command_tx }, frame_rx, task)
}

impl PlaybackRunner {
    pub async fn run(mut self) -> PlaybackController {
        if !publish(&self.frames, self.controller.frame()).await {
            return self.controller;
        }
        loop {
            self.reconcile();
            self.controller.run_scheduled_precompute();

            let step = tokio::select! {
                command = self.commands.recv() => Step::Command(command),
                _ = next_tick(&mut self.ticker) => Step::Tick,
                event = next_transition_event(&mut self.transition) => Step::Transition(event),
            };

            let changed = match step {
                Step::Command(None) | Step::Command(Some(PlaybackCommand::Shutdown)) => break,
                Step::Command(Some(command)) => self.apply(command),
                Step::Tick => self.controller.tick().is_some(),
                Step::Transition(event) => self.on_transition_event(event),
            };
            if changed {
                self.reconcile();
                if !publish(&self.frames, self.controller.frame()).await {
                    debug!("Frame receiver dropped, stopping playback");
                    break;
                }
            }
        }
        info!("Playback stopped");
        self.transition = None;
        self.controller
    }

    fn apply(&mut self, command: PlaybackCommand) -> bool {
        match command {
            PlaybackCommand::Play => self.controller.play(),
            PlaybackCommand::Pause => self.controller.pause(),
            PlaybackCommand::SeekMonth(index) => self.controller.seek_month(index).is_some(),
            PlaybackCommand::SeekYear(year) => self.controller.seek_year(year).is_some(),
            PlaybackCommand::SetMetric(metric) => self.controller.set_metric(metric),
            PlaybackCommand::Shutdown => false,
        }
    }

    fn on_transition_event(&mut self, event: Option<TransitionEvent>) -> bool {
        let Some(id) = self.transition.as_ref().map(TransitionHandle::id) else {
            return false;
        };
        match event {
            Some(TransitionEvent::Progress(progress)) => self.controller.apply_progress(id, progress),
            Some(TransitionEvent::Completed) => {
                self.transition = None;
                self.controller.complete_transition(id)
            }
            Some(TransitionEvent::Cancelled) | None => {
                warn!("Transition {} ended without completing", id);
                self.transition = None;
                self.controller.active_transition() == Some(id) && self.controller.cancel_transition()
            }
        }
    }

    /// Brings the ticker and the transition task in line with the controller.
    fn reconcile(&mut self) {
        match (self.controller.is_playing(), self.ticker.is_some()) {
            (true, false) => {
                let period = self.config.tick_period;
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
            }
            (false, true) => self.ticker = None,
            _ => {}
        }

        let wanted = self.controller.active_transition();
        let running = self.transition.as_ref().map(TransitionHandle::id);
        if wanted == running {
            return;
        }
        // Dropping the old handle cancels its task.
        self.transition = wanted.map(|id| {
            spawn_transition(
                id,
                self.config.transition_duration,
                self.config.frame_interval,
                self.config.easing,
            )
        });
    }
}

/// `false` once nobody receives frames anymore.
async fn publish(frames: &Sender<PlaybackFrame>, frame: Option<PlaybackFrame>) -> bool {
    match frame {
        Some(frame) => frames.send(frame).await.is_ok(),
        None => !frames.is_closed(),
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}

async fn next_transition_event(
    transition: &mut Option<TransitionHandle>,
) -> Option<TransitionEvent> {
    match transition {
        Some(handle) => handle.next_event().await,
        None => pending().await,
    }
}
