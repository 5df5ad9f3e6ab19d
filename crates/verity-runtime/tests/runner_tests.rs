//! Runner tests: interrupts, the shared registry and the binary entry point

mod common;

use common::{child_command, child_mode, entries, log, run_with, Recorder};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::panic::panic_any;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use verity_runtime::{
    context, install_interrupt_handler, main_with_settings, run_all_tests, set_autorun,
    with_registry, InterruptFlag, Interrupted, Registry, Report, ReportRegistry, RunOptions,
    RunSettings, Runner, Signal, Silent, Summary, TestInfo, VerityError,
};

/// Counts executed tests into a shared counter
struct Counting(Arc<AtomicUsize>);

impl Report for Counting {
    fn on_test(&mut self, _test: &TestInfo) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn same_code(left: ExitCode, right: ExitCode) -> bool {
    format!("{left:?}") == format!("{right:?}")
}

// ============================================================================
// Interrupts
// ============================================================================

#[test]
fn test_interrupt_inside_a_test_stops_the_run() {
    let log = log();
    let mut registry = Registry::new();
    let teardown_log = log.clone();
    registry.context("first", move |c| {
        c.teardown(move |_| {
            teardown_log.borrow_mut().push("teardown".to_string());
            Ok(())
        });
        c.test("interrupted", |_| panic_any(Interrupted));
        c.test("skipped", |ctx| ctx.assert(true));
    });
    registry.context("second", |c| {
        c.test("never entered", |ctx| ctx.assert(true));
    });

    let report = run_with(&registry, Recorder::default(), &RunOptions::default());
    assert_eq!(report.events, ["start", "enter", "test", "end"]);
    assert_eq!(entries(&log), ["teardown"]);
}

#[test]
fn test_raised_flag_stops_before_the_next_test() {
    let flag = InterruptFlag::new();
    let mut registry = Registry::new();
    let raiser = flag.clone();
    registry.context("", move |c| {
        c.test("raises the flag", move |_| {
            raiser.raise();
            Ok(())
        });
        c.test("never runs", |ctx| ctx.assert(true));
    });

    let mut runner = Runner::new(Recorder::default())
        .with_fail_fast(false)
        .with_interrupt(flag.clone());
    runner.run(&registry, &registry.ids(), &RunOptions::default());

    assert!(flag.is_raised());
    assert_eq!(
        runner.report().events,
        ["start", "enter", "test", "pass", "end"]
    );
}

#[test]
fn test_end_fires_when_a_report_panics() {
    struct Exploding<'a>(&'a mut Vec<&'static str>);

    impl Report for Exploding<'_> {
        fn on_pass(&mut self, _passed: &verity_runtime::PassedTest) {
            panic!("report bug");
        }
        fn on_end(&mut self) {
            self.0.push("end");
        }
    }

    let mut registry = Registry::new();
    registry.context("", |c| {
        c.test("passes", |_| Ok(()));
    });

    let mut events = Vec::new();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut runner = Runner::new(Exploding(&mut events)).with_fail_fast(false);
        runner.run(&registry, &registry.ids(), &RunOptions::default());
    }));

    assert!(result.is_err());
    assert_eq!(events, ["end"]);
}

#[test]
fn test_end_fires_when_start_panics() {
    struct BrokenStart<'a>(&'a mut Vec<&'static str>);

    impl Report for BrokenStart<'_> {
        fn on_start(&mut self) {
            panic!("report bug");
        }
        fn on_test(&mut self, _test: &TestInfo) {
            self.0.push("test");
        }
        fn on_end(&mut self) {
            self.0.push("end");
        }
    }

    let mut registry = Registry::new();
    registry.context("", |c| {
        c.test("never runs", |_| Ok(()));
    });

    let mut events = Vec::new();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut runner = Runner::new(BrokenStart(&mut events)).with_fail_fast(false);
        runner.run(&registry, &registry.ids(), &RunOptions::default());
    }));

    assert!(result.is_err());
    assert_eq!(events, ["end"]);
}

#[cfg(unix)]
#[test]
fn test_second_interrupt_aborts_a_stuck_test() {
    use std::process::Stdio;
    use std::thread::sleep;
    use std::time::{Duration, Instant};
    use verity_runtime::INTERRUPTED_EXIT_CODE;

    const NAME: &str = "test_second_interrupt_aborts_a_stuck_test";
    const READY_ENV: &str = "VERITY_TEST_READY";

    if child_mode().as_deref() == Some("stuck") {
        let flag = install_interrupt_handler().unwrap();
        std::fs::write(std::env::var_os(READY_ENV).unwrap(), "").unwrap();

        let mut registry = Registry::new();
        registry.context("", |c| {
            c.test("blocks", |_| {
                sleep(Duration::from_secs(10));
                Ok(())
            });
        });
        let mut runner = Runner::new(Silent)
            .with_fail_fast(false)
            .with_interrupt(flag);
        runner.run(&registry, &registry.ids(), &RunOptions::default());
        println!("SURVIVED");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let ready = dir.path().join("ready");
    let mut child = child_command(NAME, "stuck")
        .env(READY_ENV, &ready)
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !ready.exists() {
        assert!(Instant::now() < deadline, "child never installed its handler");
        sleep(Duration::from_millis(20));
    }

    let sigint = |pid: u32| {
        let status = std::process::Command::new("kill")
            .args(["-INT", &pid.to_string()])
            .status()
            .unwrap();
        assert!(status.success());
    };
    sigint(child.id());
    sleep(Duration::from_millis(300));
    sigint(child.id());

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(INTERRUPTED_EXIT_CODE));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("SURVIVED"));
}

// ============================================================================
// Fail-fast
// ============================================================================

/// Runs [offender, passes] with fail-fast in a child and checks it stopped
fn assert_fail_fast_stops(test_name: &str, mode: &str) {
    if child_mode().as_deref() == Some(mode) {
        let mut registry = Registry::new();
        registry.context("", |c| {
            match mode {
                "failure" => c.test("fails", |ctx| {
                    println!("RAN offender");
                    ctx.assert(false)
                }),
                _ => c.test("errors", |_| {
                    println!("RAN offender");
                    Err(Signal::error("boom"))
                }),
            };
            c.test("passes", |_| {
                println!("RAN passes");
                Ok(())
            });
        });

        let mut runner = Runner::new(Silent).with_fail_fast(true);
        runner.run(&registry, &registry.ids(), &RunOptions::default());
        println!("RAN to the end");
        return;
    }

    let output = child_command(test_name, mode).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "child stdout:\n{stdout}");
    assert!(stdout.contains("RAN offender"), "child stdout:\n{stdout}");
    assert!(!stdout.contains("RAN passes"));
    assert!(!stdout.contains("RAN to the end"));
}

#[test]
fn test_fail_fast_exits_on_first_failure() {
    assert_fail_fast_stops("test_fail_fast_exits_on_first_failure", "failure");
}

#[test]
fn test_fail_fast_exits_on_first_error() {
    assert_fail_fast_stops("test_fail_fast_exits_on_first_error", "error");
}

// ============================================================================
// Shared registry
// ============================================================================

#[test]
fn test_run_all_tests_runs_the_shared_registry() {
    context("A shared context", |c| {
        c.test("passes", |ctx| ctx.assert(true));
        c.context("nested", |c| {
            c.test("fails", |ctx| ctx.assert(false));
        });
    });
    with_registry(|registry| assert_eq!(registry.len(), 2));

    let mut summary = Summary::new();
    let success = run_all_tests(&mut summary, &RunOptions::default());

    assert!(!success);
    assert_eq!(summary.total_tests, 2);
    assert_eq!(summary.passes.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(
        summary.failures[0].test.description(),
        "A shared context nested"
    );
}

#[test]
fn test_run_all_tests_ignores_contexts_of_other_threads() {
    std::thread::spawn(|| {
        context("defined on another thread", |c| {
            c.test("never runs here", |ctx| ctx.assert(true));
        });
    })
    .join()
    .unwrap();

    let mut summary = Summary::new();
    assert!(run_all_tests(&mut summary, &RunOptions::default()));
    assert_eq!(summary.total_tests, 0);
}

// ============================================================================
// Entry point
// ============================================================================

#[test]
#[serial]
fn test_main_with_settings_skips_when_autorun_is_disabled() {
    let tests = Arc::new(AtomicUsize::new(0));
    let mut reports = ReportRegistry::new();
    let counter = Arc::clone(&tests);
    reports.add_report("counting", move || Box::new(Counting(Arc::clone(&counter))));

    context("", |c| {
        c.test("would run", |ctx| ctx.assert(true));
    });

    set_autorun(false);
    let result = main_with_settings(
        &RunSettings::default().with_report("counting"),
        &reports,
        &RunOptions::default(),
    );
    set_autorun(true);

    assert!(same_code(result.unwrap(), ExitCode::SUCCESS));
    assert_eq!(tests.load(Ordering::SeqCst), 0);
}

#[test]
#[serial]
fn test_main_with_settings_rejects_unknown_reports() {
    let result = main_with_settings(
        &RunSettings::default().with_report("fancy"),
        &ReportRegistry::new(),
        &RunOptions::default(),
    );

    match result {
        Err(VerityError::UnknownReport { name, available }) => {
            assert_eq!(name, "fancy");
            assert_eq!(available, "silent, summary");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
#[serial]
fn test_main_with_settings_runs_through_the_named_report() {
    let tests = Arc::new(AtomicUsize::new(0));
    let mut reports = ReportRegistry::new();
    let counter = Arc::clone(&tests);
    reports.add_report("counting", move || Box::new(Counting(Arc::clone(&counter))));

    context("", |c| {
        c.test("one", |ctx| ctx.assert(true));
        c.pending("two");
    });

    let code = main_with_settings(
        &RunSettings::default().with_report("counting"),
        &reports,
        &RunOptions::default(),
    )
    .unwrap();

    assert!(same_code(code, ExitCode::SUCCESS));
    assert_eq!(tests.load(Ordering::SeqCst), 2);
}

#[test]
#[serial]
fn test_main_with_settings_clears_a_previous_interrupt() {
    install_interrupt_handler().unwrap().raise();

    let tests = Arc::new(AtomicUsize::new(0));
    let mut reports = ReportRegistry::new();
    let counter = Arc::clone(&tests);
    reports.add_report("counting", move || Box::new(Counting(Arc::clone(&counter))));

    context("", |c| {
        c.test("runs anyway", |ctx| ctx.assert(true));
    });

    let code = main_with_settings(
        &RunSettings::default().with_report("counting"),
        &reports,
        &RunOptions::default(),
    )
    .unwrap();

    assert!(same_code(code, ExitCode::SUCCESS));
    assert_eq!(tests.load(Ordering::SeqCst), 1);
}
