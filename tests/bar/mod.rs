use crate::util::{assert_one_run, console, Calls, Recorder};
use rand::Rng;
use std::{sync::Arc, time::Duration};
use tickbar::{
    render::Policy, Bar, BarOptions, Category, Channel, DualState, Error, Frame, IndeterminateBar, ProgressBar,
};

fn bar(setup: &crate::util::Setup, policy: Policy, options: BarOptions) -> ProgressBar {
    Bar::with_console(Arc::clone(&setup.console), Channel::Stdout, policy, options).unwrap()
}

#[test]
fn ticking_to_the_total_paints_exactly_one_start_and_end_frame() {
    let setup = console(false);
    let recorder = Recorder::new("five");
    let bar = bar(&setup, Policy::Periodic, recorder.options(5));
    let calls = Calls::default();
    bar.on_finish(calls.hook());

    assert!(!bar.active());
    let mut seen_active = false;
    for _ in 0..5 {
        bar.tick().unwrap();
        seen_active |= bar.active();
    }
    bar.wait();

    assert!(seen_active);
    assert!(!bar.active());
    assert_eq!(bar.progress(), 5);
    assert_eq!(calls.get(), 1);

    let frames = recorder.frames();
    assert_one_run(&frames);
    let lines = setup.stdout.lines();
    assert_eq!(lines.len(), frames.len(), "every frame is a line of its own when piped");
    assert_eq!(lines.first().map(String::as_str), Some("five:Start:0/5"));
    assert_eq!(lines.last().map(String::as_str), Some("five:End:5/5"));
    assert!(setup.stderr.text().is_empty());
}

#[test]
fn on_demand_bars_paint_once_per_tick() {
    let setup = console(false);
    let recorder = Recorder::new("od");
    let bar = bar(&setup, Policy::OnDemand, recorder.options(3));
    for _ in 0..3 {
        bar.tick().unwrap();
    }
    assert!(!bar.active(), "on-demand runs end synchronously");
    assert_eq!(
        setup.stdout.lines(),
        vec!["od:Start:0/3", "od:Refresh:1/3", "od:Refresh:2/3", "od:Refresh:3/3", "od:End:3/3"]
    );
}

#[test]
fn a_channel_is_owned_by_one_bar_at_a_time() {
    let setup = console(false);
    let first = bar(&setup, Policy::Periodic, Recorder::new("first").options(2));
    let second = bar(&setup, Policy::Periodic, Recorder::new("second").options(2));
    let other_policy = bar(&setup, Policy::OnDemand, Recorder::new("third").options(2));

    first.tick().unwrap();
    assert!(matches!(second.tick(), Err(Error::Occupied(Channel::Stdout))));
    assert!(matches!(other_policy.tick(), Err(Error::Occupied(Channel::Stdout))));
    assert!(!second.active(), "a rejected bar stays stopped");
    assert!(!other_policy.active());

    first.tick().unwrap();
    first.wait();
    second.tick().unwrap();
    assert!(second.active());
    second.reset().unwrap();
    other_policy.tick().unwrap();
    other_policy.reset().unwrap();
}

#[test]
fn channels_are_independent() {
    let setup = console(false);
    let out = bar(&setup, Policy::Periodic, Recorder::new("out").options(2));
    let err: ProgressBar = Bar::with_console(
        Arc::clone(&setup.console),
        Channel::Stderr,
        Policy::Periodic,
        Recorder::new("err").options(2),
    )
    .unwrap();
    out.tick().unwrap();
    err.tick().unwrap();
    out.reset().unwrap();
    err.reset().unwrap();
    assert!(setup.stdout.text().contains("out:End:1/2"));
    assert!(setup.stderr.text().contains("err:End:1/2"));
}

#[test]
fn zero_totals_are_rejected_for_bounded_bars() {
    let setup = console(false);
    let rejected = Bar::<tickbar::State>::with_console(
        Arc::clone(&setup.console),
        Channel::Stdout,
        Policy::Periodic,
        BarOptions::default(),
    );
    assert!(matches!(rejected, Err(Error::InvalidTotal)));

    let bar = bar(&setup, Policy::Periodic, Recorder::new("b").options(4));
    assert!(matches!(bar.set_total(0), Err(Error::InvalidTotal)));
    assert_eq!(bar.total(), 4);
    bar.set_total(2).unwrap();
    bar.tick_by(2).unwrap();
    bar.wait();
    assert_eq!(bar.progress(), 2);
}

#[test]
fn tick_to_rejects_percentages_above_100_and_never_moves_back() {
    let setup = console(false);
    let bar = bar(&setup, Policy::OnDemand, Recorder::new("pct").options(10));
    let calls = Calls::default();
    bar.on_finish(calls.hook());

    assert!(matches!(bar.tick_to(101), Err(Error::InvalidPercentage(101))));
    assert!(!bar.active(), "the bar stays stopped");

    bar.tick_to(50).unwrap();
    assert_eq!(bar.progress(), 5);
    bar.tick_to(20).unwrap();
    assert_eq!(bar.progress(), 5);
    bar.tick_to(100).unwrap();
    assert!(!bar.active());
    assert_eq!(bar.progress(), 10);
    assert_eq!(calls.get(), 1);
}

#[test]
fn ticks_beyond_the_total_are_clamped() {
    let setup = console(false);
    let bar = bar(&setup, Policy::OnDemand, Recorder::new("c").options(3));
    bar.tick_by(100).unwrap();
    assert!(!bar.active());
    assert_eq!(bar.progress(), 3);
}

#[test]
fn activity_bars_only_finish_when_reset() {
    let setup = console(false);
    let recorder = Recorder::new("spin");
    let bar: IndeterminateBar = Bar::with_console(
        Arc::clone(&setup.console),
        Channel::Stdout,
        Policy::Periodic,
        recorder.options(0),
    )
    .unwrap();
    let calls = Calls::default();
    bar.on_finish(calls.hook());

    bar.tick_by(1000).unwrap();
    assert_eq!(bar.state(), DualState::ActivityRefresh);
    assert!(!bar.wait_for(Duration::from_millis(20)), "nothing ends an activity run but a reset");
    assert_eq!(bar.progress(), 1000);

    bar.reset().unwrap();
    assert!(!bar.active());
    assert_eq!(calls.get(), 1);
    assert_one_run(&recorder.frames());
}

#[test]
fn indeterminate_bars_with_a_total_count_towards_it() {
    let setup = console(false);
    let bar: IndeterminateBar = Bar::with_console(
        Arc::clone(&setup.console),
        Channel::Stdout,
        Policy::OnDemand,
        Recorder::new("dual").options(2),
    )
    .unwrap();
    bar.tick().unwrap();
    assert_eq!(bar.state(), DualState::ProgressRefresh);
    bar.tick().unwrap();
    assert_eq!(bar.state(), DualState::Stop);
}

#[test]
fn abort_stops_without_end_frame_or_hook() {
    let setup = console(false);
    let recorder = Recorder::new("gone");
    let bar = bar(&setup, Policy::Periodic, recorder.options(10));
    let calls = Calls::default();
    bar.on_finish(calls.hook());

    bar.abort();
    assert!(!bar.active(), "aborting a stopped bar does nothing");

    bar.tick().unwrap();
    bar.abort();
    bar.abort();
    assert!(!bar.active());
    assert_eq!(calls.get(), 0);
    assert_eq!(recorder.count(Frame::End), 0);

    let next = self::bar(&setup, Policy::Periodic, Recorder::new("next").options(1));
    next.tick().expect("an aborted bar releases the channel");
}

#[test]
fn dropping_a_running_bar_releases_the_channel() {
    let setup = console(false);
    {
        let bar = bar(&setup, Policy::OnDemand, Recorder::new("dropped").options(10));
        bar.tick().unwrap();
    }
    let next = bar(&setup, Policy::OnDemand, Recorder::new("next").options(1));
    next.tick().unwrap();
}

#[test]
fn reset_finishes_a_run_early_and_allows_a_new_one() {
    let setup = console(false);
    let recorder = Recorder::new("again");
    let bar = bar(&setup, Policy::Periodic, recorder.options(10));
    let progress_at_finish = Arc::new(parking_lot::Mutex::new(Vec::new()));
    bar.on_finish_with({
        let progress_at_finish = Arc::clone(&progress_at_finish);
        move |bar: &ProgressBar| progress_at_finish.lock().push((bar.progress(), bar.category()))
    });

    bar.reset().expect("resetting a stopped bar does nothing");
    bar.tick_by(3).unwrap();
    bar.reset().unwrap();
    assert!(!bar.active());
    bar.tick_by(10).unwrap();
    bar.wait();

    assert_eq!(
        *progress_at_finish.lock(),
        vec![(3, Category::Finish), (10, Category::Finish)],
        "hooks run before the bar stops"
    );
    assert_eq!(recorder.count(Frame::Start), 2);
    assert_eq!(recorder.count(Frame::End), 2);

    bar.clear_hook();
    bar.tick_by(10).unwrap();
    bar.wait();
    assert_eq!(progress_at_finish.lock().len(), 2);
}

#[test]
fn failing_start_frames_leave_the_bar_stopped() {
    let setup = console(false);
    let bar = bar(&setup, Policy::Periodic, Recorder::failing_at("f", 1).options(3));
    match bar.tick() {
        Err(Error::Frame(msg)) => assert_eq!(msg, "broken"),
        other => panic!("expected the start frame to fail, got {:?}", other),
    }
    assert!(!bar.active());
    bar.tick().expect("the failure was reported once, and the start frame paints now");
    assert!(bar.active());
    bar.reset().unwrap();
}

#[test]
fn on_demand_paint_failures_are_raised_by_the_tick() {
    let setup = console(false);
    let bar = bar(&setup, Policy::OnDemand, Recorder::failing_at("f", 2).options(5));
    assert!(matches!(bar.tick(), Err(Error::Frame(_))));
    assert!(bar.active(), "a failed paint doesn't stop the run");
    bar.tick().unwrap();
    bar.reset().unwrap();
}

#[test]
fn periodic_paint_failures_are_raised_by_a_later_tick() {
    let setup = console(false);
    let bar = bar(&setup, Policy::Periodic, Recorder::failing_at("f", 3).options(u64::MAX));
    bar.tick().unwrap();
    let mut failure = None;
    for _ in 0..100_000 {
        if let Err(err) = bar.tick() {
            failure = Some(err);
            break;
        }
        std::thread::sleep(Duration::from_micros(100));
    }
    assert!(matches!(failure, Some(Error::Frame(msg)) if msg == "broken"));
    bar.tick().expect("the failure is raised only once");
    bar.reset().unwrap();
}

#[test]
fn concurrent_ticks_finish_the_run_exactly_once() {
    let setup = console(false);
    let recorder = Recorder::new("many");
    let bar = bar(&setup, Policy::Periodic, recorder.options(1000));
    let calls = Calls::default();
    bar.on_finish(calls.hook());

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let mut rng = rand::thread_rng();
                for _ in 0..250 {
                    bar.tick().unwrap();
                    if rng.gen_ratio(1, 50) {
                        std::thread::yield_now();
                    }
                }
            });
        }
    });
    bar.wait();

    assert_eq!(bar.progress(), 1000);
    assert_eq!(calls.get(), 1);
    assert_one_run(&recorder.frames());
}

#[test]
fn bars_are_send_and_sync() {
    fn needs_send_sync<T: Send + Sync>(_: &T) {}
    let setup = console(false);
    let bar = bar(&setup, Policy::Periodic, Recorder::new("s").options(1));
    needs_send_sync(&bar);
}
