//! Executing a single test
//!
//! The per-test boundary: setup, body and teardown run inside a fresh
//! [`Context`], panics are caught, and whatever escapes is classified into an
//! [`Outcome`]. Only an interrupt crosses this boundary.

use crate::context::Context;
use crate::outcome::{ErroredTest, FailedTest, Outcome, PassedTest, PendingTest, TestInfo};
use crate::report::Report;
use crate::signal::{Interrupted, PendingMarker, Signal, TestResult, DEFAULT_PENDING_MESSAGE};
use crate::test_case::{Block, Registry, Test};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Run `test` with its inherited setup and teardown and classify the result.
///
/// A test without a body is pending and runs neither setup nor teardown.
/// Otherwise teardown runs exactly once, whatever setup or the body did.
pub fn execute_test(
    registry: &Registry,
    test: &Test,
    report: &mut dyn Report,
) -> Result<Outcome, Interrupted> {
    let info = TestInfo::new(registry, test);

    let Some(action) = test.action() else {
        let marker = PendingMarker::new(DEFAULT_PENDING_MESSAGE, [test.location()]);
        return Ok(Outcome::Pending(PendingTest::new(info, marker)));
    };

    let mut ctx = Context::new(report, test.location());
    let setup = registry.setup_chain(test.test_case());
    let teardown = registry.teardown_chain(test.test_case());

    let body = guarded(&mut ctx, |ctx| {
        run_blocks(&setup, ctx)?;
        action(ctx)
    });
    let cleanup = guarded(&mut ctx, |ctx| run_blocks(&teardown, ctx));

    let result = match (body, cleanup) {
        (Err(Signal::Interrupt), _) | (_, Err(Signal::Interrupt)) => Err(Signal::Interrupt),
        // A teardown error replaces whatever the body produced
        (_, Err(signal)) => Err(signal),
        (body, Ok(())) => body,
    };

    let outcome = match result {
        Ok(()) => Outcome::Pass(PassedTest { test: info }),
        Err(Signal::Pending(marker)) => Outcome::Pending(PendingTest::new(info, marker)),
        Err(Signal::Failure(failure)) => Outcome::Failure(FailedTest::new(info, failure)),
        Err(Signal::Error(error)) => Outcome::Error(ErroredTest {
            test: info,
            error: Arc::from(error),
        }),
        Err(Signal::Interrupt) => {
            tracing::debug!(test = test.name(), "interrupt raised inside test");
            return Err(Interrupted);
        }
    };
    Ok(outcome)
}

fn run_blocks(blocks: &[&Block], ctx: &mut Context<'_>) -> TestResult {
    for block in blocks {
        block(ctx)?;
    }
    Ok(())
}

/// Run `f`, turning a panic into a [`Signal`]
fn guarded<'a, F>(ctx: &mut Context<'a>, f: F) -> TestResult
where
    F: FnOnce(&mut Context<'a>) -> TestResult,
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(ctx))) {
        Ok(result) => result,
        Err(payload) => Err(Signal::from_panic(payload)),
    }
}
