mod catch;
mod config;
mod flow;
mod form;
mod hands;
mod stage;
mod storage;
mod stories;
mod utils;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use catch::{load_jobs, CatchConfig, CatchEngine, JobPool};
use flow::{spawn_player_flow, Destination, PlayerEvent, PlayerFlowConfig};
use form::{
    default_form_schema, load_comments, load_form_schema, DecayConfig, FieldDecayEngine,
    FormSessionController, SessionConfig,
};
use hands::{HandFrame, HandLandmarks, Handedness};
use stage::StageHandle;
use storage::FormStore;
use stories::{normalized_level, StoryCard, StoryDeck, UnblurConfig};

const FORM_ID: &str = "ds160";
const CATCH_DEMO_LIMIT: Duration = Duration::from_secs(20);
const CATCH_GESTURE_PACE: Duration = Duration::from_millis(400);
const KEYSTROKE_PACE: Duration = Duration::from_millis(300);

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Precarity starting up...");

    let runtime = tokio::runtime::Runtime::new().expect("failed to start async runtime");
    runtime
        .block_on(run_app())
        .expect("error while running precarity");
}

/// Scripted walkthrough of the whole installation: the landing video,
/// the job-catching stage, the story wall, and the timed form. A
/// console stage stands in for the browser renderer.
async fn run_app() -> Result<()> {
    let (stage, stage_rx) = StageHandle::channel();
    let stage_task = tokio::spawn(stage::run_console_stage(stage_rx));

    demo_landing(&stage).await;
    let accepted = demo_catch(&stage).await?;
    if !accepted {
        stage.navigate(Destination::Stories);
    }
    demo_stories(&stage).await;
    demo_form(&stage).await?;

    drop(stage);
    let _ = stage_task.await;
    log::info!("walkthrough complete");
    Ok(())
}

async fn demo_landing(stage: &StageHandle) {
    let (events, events_rx) = mpsc::unbounded_channel();
    let player = spawn_player_flow(stage.clone(), PlayerFlowConfig::default(), events_rx);

    let _ = events.send(PlayerEvent::Loaded);
    sleep(Duration::from_millis(500)).await;
    let _ = events.send(PlayerEvent::Ended);
    let _ = player.await;

    // The visitor taps through to the job-catching stage.
    stage.navigate(Destination::Catch);
}

/// Returns true when a job was accepted and the engine redirected to
/// the stories page on its own.
async fn demo_catch(stage: &StageHandle) -> Result<bool> {
    let jobs = match load_jobs(&config::jobs_path()) {
        Ok(jobs) => jobs,
        Err(err) => {
            log::warn!("{err:#}; starting with no listings");
            Vec::new()
        }
    };
    if jobs.is_empty() {
        stage.set_status("No jobs available");
    }

    let engine = CatchEngine::new(CatchConfig::default(), stage.clone(), JobPool::new(jobs));
    let (frames, frames_rx) = mpsc::channel(32);
    let cancel = CancellationToken::new();
    let mut engine_task = tokio::spawn(engine.run(frames_rx, cancel.clone()));
    let driver = tokio::spawn(drive_catch(frames));

    let accepted = match tokio::time::timeout(CATCH_DEMO_LIMIT, &mut engine_task).await {
        Ok(joined) => joined.context("catch engine crashed")?,
        Err(_) => {
            log::warn!("catch demo hit its time limit without an accepted job");
            cancel.cancel();
            engine_task.await.context("catch engine crashed")?
        }
    };
    driver.await.context("catch driver crashed")?;
    Ok(accepted)
}

/// Synthetic tracker frames: a right hand cycling between open and
/// pinched, with the occasional left-hand touch and one empty frame to
/// exercise the status line. Stops once the engine hangs up.
async fn drive_catch(frames: mpsc::Sender<HandFrame>) {
    if frames.send(HandFrame::default()).await.is_err() {
        return;
    }
    sleep(CATCH_GESTURE_PACE).await;

    for cycle in 0..12 {
        if frames.send(right_gesture(0.4)).await.is_err() {
            return;
        }
        sleep(CATCH_GESTURE_PACE).await;
        if cycle % 3 == 0 {
            if frames.send(left_touch(0.5, 0.5)).await.is_err() {
                return;
            }
            sleep(Duration::from_millis(100)).await;
        }
        if frames.send(right_gesture(0.01)).await.is_err() {
            return;
        }
        sleep(CATCH_GESTURE_PACE).await;
    }
}

fn right_gesture(gap: f32) -> HandFrame {
    HandFrame {
        hands: vec![HandLandmarks::with_pinch(Handedness::Right, gap)],
    }
}

fn left_touch(x: f32, y: f32) -> HandFrame {
    HandFrame {
        hands: vec![HandLandmarks::with_index_at(Handedness::Left, x, y)],
    }
}

async fn demo_stories(stage: &StageHandle) {
    let mut deck = StoryDeck::new(
        vec![
            StoryCard::new(
                "story1.webp",
                "They took my bakery job because the papers came late.",
            ),
            StoryCard::new(
                "story2.webp",
                "Sixty seconds was never enough to explain a life.",
            ),
        ],
        UnblurConfig::default(),
    );
    if !deck.activate(0) {
        return;
    }

    // A steady voice at the microphone clears the first story.
    let spectrum = vec![250u8; 32];
    for _ in 0..60 {
        let level = normalized_level(&spectrum);
        if deck.on_loudness(level) {
            stage.set_story_blur(0, deck.blur());
        }
        if deck.reveal().is_clear() {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn demo_form(stage: &StageHandle) -> Result<()> {
    stage.navigate(Destination::Form);

    let store = FormStore::open(config::store_path())?;
    let schema = match load_form_schema(&config::form_fields_path()) {
        Ok(schema) => schema,
        Err(err) => {
            log::warn!("{err:#}; using the fallback form");
            default_form_schema()
        }
    };
    let comments = match load_comments(&config::comments_path()) {
        Ok(comments) => comments,
        Err(err) => {
            log::warn!("{err:#}; officer comments disabled");
            Vec::new()
        }
    };

    let decay = FieldDecayEngine::new(DecayConfig::default(), FORM_ID, stage.clone(), store.clone());
    decay
        .register_fields(schema.field_ids().map(str::to_string))
        .await;
    let restored = decay.restore().await?;
    if restored > 0 {
        log::info!("restored {restored} field(s) from the last session");
    }

    let mut session = FormSessionController::new(SessionConfig::default(), stage.clone(), decay.clone());
    session.start(comments);

    let lead_field = schema
        .fields
        .first()
        .map(|field| field.id.clone())
        .unwrap_or_else(|| "name-provided".to_string());
    drive_form(&decay, &lead_field).await;

    decay.save().await?;
    session.stop().await;
    store.close();
    Ok(())
}

/// Types a name, walks away long enough for the decay to eat part of
/// it, then comes back, finishes on top of whatever survived, and
/// saves.
async fn drive_form(decay: &FieldDecayEngine, field_id: &str) {
    let mut value = String::new();
    for ch in "Maria".chars() {
        value.push(ch);
        decay.handle_input(field_id, &value).await;
        sleep(KEYSTROKE_PACE).await;
    }

    sleep(Duration::from_millis(4500)).await;

    decay.handle_focus(field_id).await;
    let mut value = decay.value(field_id).await.unwrap_or_default();
    for ch in " Gonzalez".chars() {
        value.push(ch);
        decay.handle_input(field_id, &value).await;
        sleep(KEYSTROKE_PACE).await;
    }
}
