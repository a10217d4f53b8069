use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::flow::Destination;
use crate::hands::{
    classify, GestureConfig, GestureSignal, HandFrame, Handedness, TouchFeedback,
    TouchFeedbackConfig,
};
use crate::stage::{Filter, Overlay, StageHandle};
use crate::{log_debug, log_info};

use super::jobs::JobPool;
use super::label::LabelGate;
use super::slot::{JobSlot, ResolveOutcome, SpawnOutcome};

const ENABLE_LOGS: bool = true;

/// Shown before the first job spawns.
pub const OPENING_LABEL: &str = "....Try to hold on to a job....";

/// Status line while the tracker reports no hands.
pub const NO_HANDS_STATUS: &str = "No hands detected";

/// Overlay text for a successful catch.
pub const SUCCESS_MESSAGE: &str = "You have successfully found a job you can apply to!";

#[derive(Debug, Clone)]
pub struct CatchConfig {
    pub gesture: GestureConfig,
    pub touch: TouchFeedbackConfig,
    /// How long the success treatment stays up before routing onward.
    pub redirect_delay: Duration,
}

impl Default for CatchConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            touch: TouchFeedbackConfig::default(),
            redirect_delay: Duration::from_secs(5),
        }
    }
}

enum FrameOutcome {
    Continue,
    Finished,
}

/// Runs the job-catching interaction over a stream of hand frames.
///
/// The right hand drives the job lifecycle, the left hand only pulses
/// the accent color. Acceptance ends the run: the success treatment
/// stays up through the redirect delay and the engine routes to the
/// stories page.
pub struct CatchEngine {
    config: CatchConfig,
    stage: StageHandle,
    label: LabelGate,
    pool: JobPool,
    slot: JobSlot,
    touch: TouchFeedback,
    rng: StdRng,
    hands_missing: bool,
}

impl CatchEngine {
    pub fn new(config: CatchConfig, stage: StageHandle, pool: JobPool) -> Self {
        Self::with_rng(config, stage, pool, StdRng::from_entropy())
    }

    pub fn with_rng(config: CatchConfig, stage: StageHandle, pool: JobPool, rng: StdRng) -> Self {
        let label = LabelGate::new(stage.clone());
        let touch = TouchFeedback::new(config.touch);
        Self {
            config,
            stage,
            label,
            pool,
            slot: JobSlot::Empty,
            touch,
            rng,
            hands_missing: false,
        }
    }

    /// Process frames until cancellation, the tracker hanging up, or an
    /// accepted job. Returns true when a job was accepted.
    pub async fn run(
        mut self,
        mut frames: mpsc::Receiver<HandFrame>,
        cancel: CancellationToken,
    ) -> bool {
        log_info!("catch engine started with {} listings", self.pool.len());
        let _ = self.label.request(OPENING_LABEL).await;

        let finished = loop {
            tokio::select! {
                _ = cancel.cancelled() => break false,
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        if matches!(self.handle_frame(frame).await, FrameOutcome::Finished) {
                            break true;
                        }
                    }
                    None => break false,
                },
            }
        };

        if finished {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.config.redirect_delay) => {
                    self.stage.navigate(Destination::Stories);
                }
            }
        }
        log_info!("catch engine stopped");
        finished
    }

    async fn handle_frame(&mut self, frame: HandFrame) -> FrameOutcome {
        if frame.is_empty() {
            if !self.hands_missing {
                self.hands_missing = true;
                self.stage.set_status(NO_HANDS_STATUS);
            }
            return FrameOutcome::Continue;
        }
        if self.hands_missing {
            self.hands_missing = false;
            self.stage.set_status("");
        }

        if let Some(distance) = frame
            .hand(Handedness::Right)
            .and_then(|hand| hand.pinch_distance())
        {
            match classify(distance, &self.config.gesture) {
                GestureSignal::Open => self.spawn_job().await,
                GestureSignal::Pinched => {
                    if matches!(self.resolve_job().await, FrameOutcome::Finished) {
                        return FrameOutcome::Finished;
                    }
                }
                GestureSignal::Neutral => {}
            }
        }

        if let Some(tip) = frame
            .hand(Handedness::Left)
            .and_then(|hand| hand.index_tip())
        {
            if self.touch.observe(tip, Instant::now()) {
                self.stage.pulse_accent();
            }
        }

        FrameOutcome::Continue
    }

    async fn spawn_job(&mut self) {
        match self.slot.try_spawn(&self.pool, &mut self.rng) {
            SpawnOutcome::Presented(job) => {
                self.stage.clear_filter();
                let queued = self.label.request(&job.title).await;
                log_info!("presented {:?} (label queued: {queued})", job.title);
                log_debug!("listing row: {:?}", job.fields);
            }
            SpawnOutcome::AlreadyHeld => {}
            SpawnOutcome::PoolEmpty => log_debug!("open hand but the pool is empty"),
        }
    }

    async fn resolve_job(&mut self) -> FrameOutcome {
        match self.slot.try_resolve() {
            ResolveOutcome::Accepted(job) => {
                log_info!("accepted {:?}", job.title);
                self.stage.apply_filter(Filter::Success);
                self.stage.show_overlay(Overlay::Success, SUCCESS_MESSAGE);
                FrameOutcome::Finished
            }
            ResolveOutcome::Rejected(job) => {
                log_info!("rejected {:?}", job.title);
                self.stage.apply_filter(Filter::Rejection);
                let _ = self.label.request(&job.extra).await;
                FrameOutcome::Continue
            }
            ResolveOutcome::NothingHeld => FrameOutcome::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catch::jobs::{Job, ACCEPTABLE_EXTRA};
    use crate::catch::label::display_text;
    use crate::hands::HandLandmarks;
    use crate::stage::StageCommand;
    use tokio::task::JoinHandle;

    /// Gap between frames, generous enough for each label build to ack
    /// and reopen the gate before the next request arrives.
    const PACE: Duration = Duration::from_millis(25);

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Status(String),
        Label(String),
        Filtered(Filter),
        Unfiltered,
        Overlay(Overlay, String),
        Navigated(Destination),
        Pulse,
    }

    fn spawn_recorder(
        mut rx: mpsc::UnboundedReceiver<StageCommand>,
    ) -> JoinHandle<Vec<Seen>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(command) = rx.recv().await {
                match command {
                    StageCommand::SetStatus(text) => seen.push(Seen::Status(text)),
                    StageCommand::BuildLabel { text, done } => {
                        let _ = done.send(());
                        seen.push(Seen::Label(text));
                    }
                    StageCommand::ApplyFilter(filter) => seen.push(Seen::Filtered(filter)),
                    StageCommand::ClearFilter => seen.push(Seen::Unfiltered),
                    StageCommand::ShowOverlay { overlay, text } => {
                        seen.push(Seen::Overlay(overlay, text));
                    }
                    StageCommand::Navigate(destination) => {
                        seen.push(Seen::Navigated(destination));
                    }
                    StageCommand::PulseAccent => seen.push(Seen::Pulse),
                    _ => {}
                }
            }
            seen
        })
    }

    fn test_config() -> CatchConfig {
        CatchConfig {
            redirect_delay: Duration::from_millis(30),
            ..CatchConfig::default()
        }
    }

    fn right_hand(gap: f32) -> HandFrame {
        HandFrame {
            hands: vec![HandLandmarks::with_pinch(Handedness::Right, gap)],
        }
    }

    fn left_touch(x: f32, y: f32) -> HandFrame {
        HandFrame {
            hands: vec![HandLandmarks::with_index_at(Handedness::Left, x, y)],
        }
    }

    fn start_engine(
        pool: JobPool,
    ) -> (
        mpsc::Sender<HandFrame>,
        CancellationToken,
        JoinHandle<bool>,
        JoinHandle<Vec<Seen>>,
    ) {
        let (stage, stage_rx) = StageHandle::channel();
        let recorder = spawn_recorder(stage_rx);
        let engine = CatchEngine::with_rng(test_config(), stage, pool, StdRng::seed_from_u64(42));
        let (frames, frames_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let run = tokio::spawn(engine.run(frames_rx, cancel.clone()));
        (frames, cancel, run, recorder)
    }

    async fn send_paced(frames: &mpsc::Sender<HandFrame>, frame: HandFrame) {
        tokio::time::sleep(PACE).await;
        frames.send(frame).await.unwrap();
    }

    #[tokio::test]
    async fn acceptable_job_is_caught_and_redirects() {
        let pool = JobPool::new(vec![Job::new("Baker", ACCEPTABLE_EXTRA)]);
        let (frames, _cancel, run, recorder) = start_engine(pool);

        send_paced(&frames, right_hand(0.4)).await;
        send_paced(&frames, right_hand(0.15)).await;
        send_paced(&frames, right_hand(0.01)).await;
        assert!(run.await.unwrap());
        drop(frames);

        let seen = recorder.await.unwrap();
        assert_eq!(
            seen,
            vec![
                Seen::Label(display_text(OPENING_LABEL)),
                Seen::Unfiltered,
                Seen::Label("Baker".into()),
                Seen::Filtered(Filter::Success),
                Seen::Overlay(Overlay::Success, SUCCESS_MESSAGE.into()),
                Seen::Navigated(Destination::Stories),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_job_shows_verdict_and_allows_retry() {
        let pool = JobPool::new(vec![Job::new("Visa Clerk", "Needs a sponsor")]);
        let (frames, _cancel, run, recorder) = start_engine(pool);

        send_paced(&frames, right_hand(0.4)).await;
        // Second open hand while held must not redraw.
        send_paced(&frames, right_hand(0.4)).await;
        send_paced(&frames, right_hand(0.01)).await;
        send_paced(&frames, right_hand(0.4)).await;
        tokio::time::sleep(PACE).await;
        drop(frames);
        assert!(!run.await.unwrap());

        let seen = recorder.await.unwrap();
        assert_eq!(
            seen,
            vec![
                Seen::Label(display_text(OPENING_LABEL)),
                Seen::Unfiltered,
                Seen::Label("Visa_Clerk".into()),
                Seen::Filtered(Filter::Rejection),
                Seen::Label("Needs_a_sponsor".into()),
                Seen::Unfiltered,
                Seen::Label("Visa_Clerk".into()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_hands_status_is_reported_once_per_gap() {
        let (frames, _cancel, run, recorder) = start_engine(JobPool::default());

        send_paced(&frames, HandFrame::default()).await;
        send_paced(&frames, HandFrame::default()).await;
        send_paced(&frames, right_hand(0.15)).await;
        send_paced(&frames, HandFrame::default()).await;
        drop(frames);
        assert!(!run.await.unwrap());

        let seen = recorder.await.unwrap();
        assert_eq!(
            seen,
            vec![
                Seen::Label(display_text(OPENING_LABEL)),
                Seen::Status(NO_HANDS_STATUS.into()),
                Seen::Status(String::new()),
                Seen::Status(NO_HANDS_STATUS.into()),
            ]
        );
    }

    #[tokio::test]
    async fn left_hand_pulses_but_never_touches_the_slot() {
        let pool = JobPool::new(vec![Job::new("Baker", ACCEPTABLE_EXTRA)]);
        let (frames, _cancel, run, recorder) = start_engine(pool);

        send_paced(&frames, left_touch(0.5, 0.5)).await;
        // Inside the 500ms cooldown: no second pulse.
        frames.send(left_touch(0.52, 0.5)).await.unwrap();
        send_paced(&frames, left_touch(0.1, 0.1)).await;
        drop(frames);
        assert!(!run.await.unwrap());

        let seen = recorder.await.unwrap();
        assert_eq!(
            seen,
            vec![Seen::Label(display_text(OPENING_LABEL)), Seen::Pulse]
        );
    }

    #[tokio::test]
    async fn cancellation_stops_the_run() {
        let (frames, cancel, run, recorder) = start_engine(JobPool::default());

        tokio::time::sleep(PACE).await;
        cancel.cancel();
        assert!(!run.await.unwrap());
        drop(frames);

        let seen = recorder.await.unwrap();
        assert_eq!(seen, vec![Seen::Label(display_text(OPENING_LABEL))]);
    }
}
