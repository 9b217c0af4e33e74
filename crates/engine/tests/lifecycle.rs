use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use core_types::InstanceId;
use engine::{
    AbortReason, Callbacks, Delay, InitOutcome, Instance, InstanceConfig, Options, RunOutcome,
    StyleRegistry, SystemTimer, VirtualTimer, VisibilityFlag,
};
use render::Container;

fn options(strings: &[&str]) -> Options {
    Options {
        strings: strings.iter().map(|s| s.to_string()).collect(),
        speed: 10,
        delete_speed: Some(5),
        life_like: false,
        next_string_delay: Delay::split(100),
        ..Options::default()
    }
}

fn config(options: Options, timer: &VirtualTimer) -> InstanceConfig {
    InstanceConfig::new(InstanceId(3), options).timer(Arc::new(timer.clone()))
}

#[test]
fn looping_erases_with_phantoms_and_replays() {
    let timer = VirtualTimer::new();
    let before_steps = Arc::new(AtomicUsize::new(0));
    let after_steps = Arc::new(AtomicUsize::new(0));
    let completions = Arc::new(AtomicUsize::new(0));
    let executed_at_completion = Arc::new(Mutex::new(Vec::new()));

    let callbacks = {
        let before_steps = Arc::clone(&before_steps);
        let after_steps = Arc::clone(&after_steps);
        let completions = Arc::clone(&completions);
        let executed_at_completion = Arc::clone(&executed_at_completion);
        Callbacks::default()
            .before_step(move |_, _, _| {
                before_steps.fetch_add(1, Ordering::SeqCst);
            })
            .after_step(move |action, _, _| {
                assert!(!action.is_phantom(), "phantom reached after_step");
                after_steps.fetch_add(1, Ordering::SeqCst);
            })
            .after_complete(move |instance| {
                executed_at_completion
                    .lock()
                    .unwrap()
                    .push(instance.queue().executed().len());
                if completions.fetch_add(1, Ordering::SeqCst) == 1 {
                    instance.destroy();
                }
            })
    };
    let options = Options {
        start_delay: 100,
        looping: true,
        loop_delay: Some(Delay::split(40)),
        ..options(&["ab"])
    };
    let mut instance = Instance::build(
        config(options, &timer).callbacks(callbacks),
        Box::new(Container::new()),
    );

    assert_eq!(
        instance.init(),
        InitOutcome::Ran(RunOutcome::Aborted(AbortReason::Destroyed))
    );
    assert_eq!(timer.waits(), [100, 10, 10, 20, 5, 5, 20, 10, 10]);
    assert_eq!(instance.text(), "ab");
    assert_eq!(completions.load(Ordering::SeqCst), 2);
    assert_eq!(before_steps.load(Ordering::SeqCst), 3 + 5);
    assert_eq!(after_steps.load(Ordering::SeqCst), 3 + 3);
    // Phantoms never land in the executed history; the home pause is replaced by the loop pause.
    assert_eq!(*executed_at_completion.lock().unwrap(), [3, 3]);
    assert!(instance.status().destroyed);
}

#[test]
fn freezing_stops_before_the_next_action_and_resume_continues() {
    let timer = VirtualTimer::new();
    let callbacks = Callbacks::default().after_step(|_, _, instance| {
        if instance.text() == "ab" {
            instance.pause();
        }
    });
    let mut instance = Instance::build(
        config(options(&["abcd"]), &timer).callbacks(callbacks),
        Box::new(Container::new()),
    );

    assert_eq!(
        instance.init(),
        InitOutcome::Ran(RunOutcome::Aborted(AbortReason::Frozen))
    );
    assert_eq!(instance.text(), "ab");
    assert!(instance.status().frozen);
    assert!(!instance.status().complete);
    assert_eq!(instance.queue().len(), 2);

    assert_eq!(instance.resume(), RunOutcome::Completed);
    assert_eq!(instance.text(), "abcd");
    assert!(instance.status().complete);
    assert_eq!(timer.waits(), [250, 10, 10, 10, 10]);
}

#[test]
fn destroy_from_another_thread_cuts_a_long_wait_short() {
    let options = Options {
        speed: 60_000,
        start_delay: 0,
        ..options(&["slow"])
    };
    let config = InstanceConfig::new(InstanceId(4), options).timer(Arc::new(SystemTimer::new()));
    let mut instance = Instance::build(config, Box::new(Container::new()));
    let handle = instance.handle();

    let started = Instant::now();
    let destroyer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(400));
        handle.destroy();
    });
    let outcome = instance.init();
    destroyer.join().expect("destroyer thread");

    assert_eq!(outcome, InitOutcome::Ran(RunOutcome::Aborted(AbortReason::Destroyed)));
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(instance.text(), "s");
    assert!(instance.status().destroyed);
    assert_eq!(instance.resume(), RunOutcome::Aborted(AbortReason::Destroyed));
}

#[test]
fn waiting_until_visible_starts_exactly_once() {
    let timer = VirtualTimer::new();
    let flag = VisibilityFlag::new(false);
    let options = Options {
        wait_until_visible: true,
        ..options(&["hi"])
    };
    let mut instance = Instance::build(
        config(options, &timer).visibility(Arc::new(flag.clone())),
        Box::new(Container::new()),
    );

    assert_eq!(instance.init(), InitOutcome::Deferred);
    assert!(!instance.status().started);
    assert_eq!(instance.notify_visibility(), InitOutcome::Deferred);

    flag.set_visible(true);
    assert_eq!(
        instance.notify_visibility(),
        InitOutcome::Ran(RunOutcome::Completed)
    );
    assert!(instance.status().started);
    assert_eq!(instance.text(), "hi");
    assert_eq!(instance.notify_visibility(), InitOutcome::AlreadyStarted);
    assert_eq!(instance.init(), InitOutcome::AlreadyStarted);
}

#[test]
fn cursor_styles_live_between_init_and_destroy() {
    let timer = VirtualTimer::new();
    let styles = StyleRegistry::new();
    let options = Options {
        cursor_char: "_".into(),
        cursor_speed: 800,
        ..options(&["x"])
    };
    let mut instance = Instance::build(
        config(options, &timer).styles(styles.clone()),
        Box::new(Container::new()),
    );
    assert!(styles.is_empty());

    instance.init();
    let style = styles.cursor_style(InstanceId(3)).expect("registered on init");
    assert_eq!(style.cursor_char, "_");
    assert_eq!(style.blink_period, 800);
    assert!(styles.stylesheet().contains("blink-3"));

    instance.destroy();
    assert!(styles.is_empty());
}

#[test]
fn reset_replays_the_whole_sequence_on_a_cleared_target() {
    let timer = VirtualTimer::new();
    let mut instance =
        Instance::build(config(options(&["ab"]), &timer), Box::new(Container::new()));
    instance.type_str("c");
    instance.init();
    assert_eq!(instance.text(), "abc");

    let mut again = instance.reset();
    assert_eq!(again.text(), "");
    assert!(!again.status().started);
    assert_eq!(again.queue().len(), 4);
    assert_eq!(again.init(), InitOutcome::Ran(RunOutcome::Completed));
    assert_eq!(again.text(), "abc");
}
