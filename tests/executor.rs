use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::timeout;

use passview::command::Invocation;
use passview::executor::{
    CancellationToken, Executor, MainLoop, ProcessResult, CANCELLED, LAUNCH_FAILURE,
};

type Results = Vec<ProcessResult>;

fn executor(main_loop: &MainLoop<Results>) -> Executor<Results> {
    Executor::new(Handle::current(), main_loop.dispatcher())
}

async fn next(main_loop: &mut MainLoop<Results>, results: &mut Results) {
    timeout(Duration::from_secs(10), main_loop.dispatch_next(results))
        .await
        .expect("no completion within 10s");
}

#[tokio::test]
async fn missing_program_reports_a_launch_failure() {
    let mut main_loop = MainLoop::new();
    let mut results = Vec::new();

    executor(&main_loop).run(
        Invocation::new("/nonexistent/passview-test-binary", vec!["show"]),
        CancellationToken::new(),
        |results: &mut Results, result| results.push(result),
    );
    next(&mut main_loop, &mut results).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].exit_code, LAUNCH_FAILURE);
    assert!(!results[0].stderr.is_empty());
    assert!(!results[0].success());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(main_loop.dispatch_pending(&mut results), 0);
}

#[tokio::test]
async fn captures_output_and_exit_code() {
    let mut main_loop = MainLoop::new();
    let mut results = Vec::new();

    executor(&main_loop).run(
        Invocation::new("sh", vec!["-c", "echo out; echo err >&2; exit 3"]),
        CancellationToken::new(),
        |results: &mut Results, result| results.push(result),
    );
    next(&mut main_loop, &mut results).await;

    assert_eq!(
        results,
        [ProcessResult {
            exit_code: 3,
            stdout: "out\n".to_owned(),
            stderr: "err\n".to_owned(),
        }]
    );
}

#[tokio::test]
async fn invalid_utf8_output_is_replaced() {
    let mut main_loop = MainLoop::new();
    let mut results = Vec::new();

    executor(&main_loop).run(
        Invocation::new("sh", vec!["-c", "printf 'a\\377b'; printf 'c\\376d' >&2"]),
        CancellationToken::new(),
        |results: &mut Results, result| results.push(result),
    );
    next(&mut main_loop, &mut results).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].exit_code, 0);
    assert_eq!(results[0].stdout, "a\u{FFFD}b");
    assert_eq!(results[0].stderr, "c\u{FFFD}d");
}

#[tokio::test]
async fn successful_run_returns_stdout() {
    let mut main_loop = MainLoop::new();
    let mut results = Vec::new();

    executor(&main_loop).run(
        Invocation::new("sh", vec!["-c", "printf 'hunter2\\nuser: me\\n'"]),
        CancellationToken::new(),
        |results: &mut Results, result| results.push(result),
    );
    next(&mut main_loop, &mut results).await;

    let stdout = results.remove(0).into_result("sh").unwrap();
    assert_eq!(stdout, "hunter2\nuser: me\n");
}

#[tokio::test]
async fn cancellation_kills_the_child_and_reports_once() {
    let mut main_loop = MainLoop::new();
    let mut results = Vec::new();
    let token = CancellationToken::new();

    executor(&main_loop).run(
        Invocation::new("sleep", vec!["30"]),
        token.clone(),
        |results: &mut Results, result| results.push(result),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();
    next(&mut main_loop, &mut results).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].exit_code, CANCELLED);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(main_loop.dispatch_pending(&mut results), 0);
}

#[tokio::test]
async fn cancelled_before_start_never_launches() {
    let mut main_loop = MainLoop::new();
    let mut results = Vec::new();
    let token = CancellationToken::new();
    token.cancel();

    executor(&main_loop).run(
        Invocation::new("/nonexistent/passview-test-binary", Vec::<String>::new()),
        token,
        |results: &mut Results, result| results.push(result),
    );
    next(&mut main_loop, &mut results).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].exit_code, CANCELLED);
}

#[tokio::test]
async fn concurrent_runs_each_deliver_one_callback() {
    let mut main_loop = MainLoop::new();
    let mut results = Vec::new();
    let executor = executor(&main_loop);

    for code in 0..4 {
        executor.run(
            Invocation::new("sh", vec!["-c".to_owned(), format!("exit {}", code)]),
            CancellationToken::new(),
            |results: &mut Results, result| results.push(result),
        );
    }
    for _ in 0..4 {
        next(&mut main_loop, &mut results).await;
    }

    let mut codes = results.iter().map(|result| result.exit_code).collect::<Vec<_>>();
    codes.sort();
    assert_eq!(codes, [0, 1, 2, 3]);
}
