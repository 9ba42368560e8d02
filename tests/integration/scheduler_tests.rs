//! Control-loop scenarios driven tick by tick against probe actions.
//!
//! Logical time (`now`) advances one second per tick; probe actions run on
//! real threads with short real durations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use candymachine::actions::{ActionKind, Catalog, Stage};
use candymachine::app::ports::{ClockPort, DigitalIo, SoundPort};
use candymachine::app::events::AppEvent;
use candymachine::config::CandyConfig;
use candymachine::error::{Error, IoError};
use candymachine::pins::Pin;
use candymachine::runner::RunOutcome;
use candymachine::scheduler::{Phase, Scheduler, SchedulerConfig, TickOutcome};

use crate::mock_hw::*;

#[test]
fn switch_high_throughout_starts_one_random_action_on_tick_31() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_millis(1), Duration::from_millis(1), &journal);
    let io = MockIo::new();
    let mut sink = RecordingSink::default();

    for tick in 1..=30 {
        assert_eq!(
            sched.tick(SECOND * tick, &io, &mut sink).unwrap(),
            TickOutcome::Idle
        );
    }
    assert!(sink.started().is_empty());

    sched.tick(SECOND * 31, &io, &mut sink).unwrap();
    let started = sink.started();
    assert_eq!(started.len(), 1);
    assert!(ActionKind::RANDOM.contains(&started[0].0));
    assert_eq!(started[0].1, SECOND * 31);
    assert_eq!(sched.state().last_random_action, SECOND * 31);
}

#[test]
fn interval_boundary_is_strict() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_millis(1), Duration::from_millis(1), &journal);
    let io = MockIo::new();
    let mut sink = RecordingSink::default();

    sched.tick(SECOND * 30, &io, &mut sink).unwrap();
    assert!(sink.started().is_empty(), "elapsed == interval must not fire");

    sched
        .tick(SECOND * 30 + Duration::from_millis(1), &io, &mut sink)
        .unwrap();
    assert_eq!(sink.started().len(), 1);
}

#[test]
fn override_cancels_running_random_before_kahuna_starts() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_secs(10), Duration::from_secs(30), &journal);
    let io = MockIo::new();
    let mut sink = RecordingSink::default();

    sched.tick(SECOND * 31, &io, &mut sink).unwrap();
    let (random_kind, _) = sink.started()[0];
    for tick in 32..=34 {
        assert_eq!(
            sched.tick(SECOND * tick, &io, &mut sink).unwrap(),
            TickOutcome::Waiting
        );
    }

    io.press();
    let pressed_at = Instant::now();
    sched.tick(SECOND * 35, &io, &mut sink).unwrap();
    assert!(pressed_at.elapsed() < Duration::from_secs(1), "cancel must be prompt");

    let observed = journal
        .first(random_kind, Mark::CancelObserved)
        .expect("random action saw the cancellation");
    let kahuna_start = journal
        .first(ActionKind::Kahuna, Mark::Started)
        .expect("kahuna started");
    assert!(observed < kahuna_start);

    assert!(sink.events.contains(&AppEvent::CancelRequested {
        kind: random_kind,
        at: SECOND * 35,
    }));
    assert_eq!(sink.finished(), vec![(random_kind, RunOutcome::Cancelled)]);
    assert_eq!(sink.started().last(), Some(&(ActionKind::Kahuna, SECOND * 35)));
    assert_eq!(sched.phase(), Phase::RunningOverride);
    assert_eq!(journal.max_active(), 1);

    sched.shutdown(&mut sink);
}

#[test]
fn low_held_past_kahuna_duration_starts_kahuna_once() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_millis(1), Duration::from_millis(300), &journal);
    let io = MockIo::new();
    io.press();
    let mut sink = RecordingSink::default();

    for tick in 1..=40 {
        sched.tick(SECOND * tick, &io, &mut sink).unwrap();
        thread::sleep(Duration::from_millis(10));
    }
    // Make sure the run has been reaped even on a slow machine.
    let deadline = Instant::now() + Duration::from_secs(5);
    while sched.runner().has_run() && Instant::now() < deadline {
        sched.tick(SECOND * 41, &io, &mut sink).unwrap();
    }

    let starts: Vec<ActionKind> = sink.started().into_iter().map(|(k, _)| k).collect();
    assert_eq!(starts, vec![ActionKind::Kahuna]);
    assert_eq!(journal.count(ActionKind::Kahuna, Mark::Stopped), 1);
    assert_eq!(sink.finished(), vec![(ActionKind::Kahuna, RunOutcome::Completed)]);
    assert!(sched.state().override_active, "flag stays latched while LOW");
    assert!(sched.state().override_running);
}

#[test]
fn release_after_kahuna_finishes_clears_override() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_millis(1), Duration::from_millis(1), &journal);
    let io = MockIo::new();
    let mut sink = RecordingSink::default();

    io.press();
    sched.tick(SECOND, &io, &mut sink).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while sched.runner().has_run() && Instant::now() < deadline {
        sched.tick(SECOND, &io, &mut sink).unwrap();
    }
    assert!(!sched.runner().has_run());
    assert_eq!(sched.phase(), Phase::RunningOverride);

    io.release();
    sched.tick(SECOND * 2, &io, &mut sink).unwrap();
    assert!(!sched.state().override_active);
    assert!(!sched.state().override_running);
    assert_eq!(sched.phase(), Phase::Idle);

    // A second press starts a fresh override span.
    io.press();
    sched.tick(SECOND * 3, &io, &mut sink).unwrap();
    let kahunas = sink
        .started()
        .iter()
        .filter(|(k, _)| *k == ActionKind::Kahuna)
        .count();
    assert_eq!(kahunas, 2);
}

#[test]
fn release_while_kahuna_runs_keeps_override_latched() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_millis(1), Duration::from_secs(30), &journal);
    let io = MockIo::new();
    let mut sink = RecordingSink::default();

    io.press();
    sched.tick(SECOND, &io, &mut sink).unwrap();
    io.release();
    for tick in 2..=40 {
        sched.tick(SECOND * tick, &io, &mut sink).unwrap();
    }

    assert_eq!(sched.phase(), Phase::OverrideClearing);
    assert!(sched.state().override_active);
    assert_eq!(sink.started().len(), 1, "no random action while kahuna finishes");
    assert_eq!(journal.count(ActionKind::Kahuna, Mark::CancelObserved), 0);

    sched.shutdown(&mut sink);
    assert_eq!(sched.phase(), Phase::Idle);
}

#[test]
fn random_action_is_deferred_while_previous_one_runs() {
    let journal = Arc::new(Journal::default());
    let config = SchedulerConfig {
        poll_interval: SECOND,
        join_timeout: Duration::from_millis(1),
        random_interval: SECOND,
    };
    let mut sched = probe_scheduler_with(
        config,
        Duration::from_millis(200),
        Duration::from_millis(1),
        &journal,
    );
    let io = MockIo::new();
    let mut sink = RecordingSink::default();

    for tick in 2..=6 {
        sched.tick(SECOND * tick, &io, &mut sink).unwrap();
    }
    assert_eq!(sink.started().len(), 1);
    assert!(journal.max_active() <= 1);

    sched.shutdown(&mut sink);
}

#[test]
fn read_failure_surfaces_as_error_and_loop_recovers() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_millis(1), Duration::from_millis(1), &journal);
    let io = MockIo::new();
    let mut sink = RecordingSink::default();

    io.fail_reads(true);
    let err = sched.tick(SECOND * 31, &io, &mut sink).unwrap_err();
    assert_eq!(err, Error::HardwareIo(IoError::ReadFailed(Pin::KahunaSwitch)));
    assert!(sink.started().is_empty());

    io.fail_reads(false);
    sched.tick(SECOND * 32, &io, &mut sink).unwrap();
    assert_eq!(sink.started().len(), 1);
}

#[test]
fn run_loop_sleeps_on_idle_and_errors_then_shuts_down() {
    let journal = Arc::new(Journal::default());
    let mut sched = probe_scheduler(Duration::from_millis(1), Duration::from_secs(30), &journal);
    let io = MockIo::new();
    let clock = ManualClock::default();
    let mut sink = RecordingSink::default();

    io.fail_reads(true);
    let mut remaining = 3;
    sched.run(&io, &clock, &mut sink, || {
        remaining -= 1;
        remaining >= 0
    });
    assert_eq!(sink.tick_failures(), 3);
    assert_eq!(clock.now(), SECOND * 3);

    io.fail_reads(false);
    io.press();
    let mut remaining = 3;
    sched.run(&io, &clock, &mut sink, || {
        remaining -= 1;
        remaining >= 0
    });
    // The first tick starts kahuna; the rest are bounded joins, no sleeps.
    assert_eq!(clock.now(), SECOND * 3);
    assert_eq!(
        sink.finished(),
        vec![(ActionKind::Kahuna, RunOutcome::Cancelled)]
    );
    assert!(!sched.runner().has_run());
    assert_eq!(sched.phase(), Phase::Idle);
}

#[test]
fn stop_flag_ends_run_and_releases_outputs() {
    let io = Arc::new(MockIo::new());
    let sound = Arc::new(MockSound::default());
    let stage_io: Arc<dyn DigitalIo> = io.clone();
    let stage_sound: Arc<dyn SoundPort> = sound.clone();
    let catalog = Catalog::new(&CandyConfig::default(), Stage::new(stage_io, stage_sound));
    let config = SchedulerConfig {
        poll_interval: SECOND,
        join_timeout: Duration::from_millis(5),
        random_interval: SECOND,
    };
    let mut sched = Scheduler::new(config, catalog.random, catalog.kahuna).with_seed(3);
    let clock = ManualClock::default();
    let mut sink = RecordingSink::default();

    // Stands in for the SIGINT/SIGTERM handler.
    let running = Arc::new(AtomicBool::new(true));
    let signal = {
        let running = Arc::clone(&running);
        let sound = Arc::clone(&sound);
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while sound.calls().is_empty() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            running.store(false, Ordering::SeqCst);
        })
    };

    let stopped_at = Instant::now();
    sched.run(io.as_ref(), &clock, &mut sink, || running.load(Ordering::SeqCst));
    signal.join().unwrap();
    assert!(stopped_at.elapsed() < Duration::from_secs(5), "10 s effect was cut short");

    let (kind, _) = sink.started()[0];
    assert_eq!(sink.finished(), vec![(kind, RunOutcome::Cancelled)]);
    assert!(!sched.runner().has_run());
    assert_eq!(sched.phase(), Phase::Idle);

    let effect = kind.effect().expect("random actions play a sound");
    assert_eq!(
        sound.calls(),
        vec![SoundCall::Start(effect), SoundCall::Stop(effect)]
    );
    if let Some(pin) = kind.pin() {
        assert_eq!(io.calls(), vec![PinCall::High(pin), PinCall::Low(pin)]);
    } else {
        assert!(io.calls().is_empty());
    }
}
