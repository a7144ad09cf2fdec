//! End-to-end scenarios: full `Supervisor` -> `Session` ->
//! `command`/`watcher`/`render` round trips against a real `/bin/sh`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::time::Duration;

use term_core::supervisor::CreateOptions;
use term_core::{command, render, watcher, ErrorKind, Supervisor};

fn supervisor() -> Supervisor {
    Supervisor::new("sh")
}

#[tokio::test]
async fn echo_round_trip_then_close_then_not_found() {
    let sup = supervisor();
    let info = sup.create(CreateOptions::default()).await.expect("create");

    let session = sup.get(info.id).await.expect("get");
    let result = command::execute(&session, "echo hello", Duration::from_secs(5), true)
        .await
        .expect("execute");
    let text = String::from_utf8_lossy(&result.output);
    assert!(text.contains("hello"));
    assert!(!text.trim_end().ends_with("$ "));

    sup.close(info.id).await.expect("close");
    let err = sup.get(info.id).await.expect_err("must be gone");
    assert_eq!(err.kind, ErrorKind::SessionNotFound);
}

#[tokio::test]
async fn timeout_then_interrupt_then_recover() {
    let sup = supervisor();
    let info = sup.create(CreateOptions::default()).await.expect("create");
    let session = sup.get(info.id).await.expect("get");

    let started = std::time::Instant::now();
    let err = command::execute(&session, "sleep 2", Duration::from_millis(300), true)
        .await
        .expect_err("must time out");
    assert_eq!(err.kind, ErrorKind::TimeoutError);
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(session.is_active());

    command::interrupt(&session).expect("interrupt");
    let result = command::execute(&session, "echo done", Duration::from_secs(5), true)
        .await
        .expect("execute after interrupt");
    assert!(String::from_utf8_lossy(&result.output).contains("done"));

    sup.close(info.id).await.expect("close");
}

#[tokio::test]
async fn watch_observes_output_from_a_concurrent_command() {
    let sup = supervisor();
    let info = sup.create(CreateOptions::default()).await.expect("create");
    let session = sup.get(info.id).await.expect("get");

    let exec_session = std::sync::Arc::clone(&session);
    let exec = tokio::spawn(async move {
        command::execute(
            &exec_session,
            "printf 'step1\\nREADY\\n'",
            Duration::from_secs(5),
            true,
        )
        .await
    });

    let watch_result = watcher::watch(&session, "READY", Duration::from_secs(5), None)
        .await
        .expect("watch");
    assert!(watch_result.matched);
    assert!(String::from_utf8_lossy(&watch_result.content).contains("READY"));

    exec.await.expect("join").expect("execute");
    sup.close(info.id).await.expect("close");
}

#[tokio::test]
async fn resize_persists_across_get() {
    let sup = supervisor();
    let info = sup.create(CreateOptions::default()).await.expect("create");
    let session = sup.get(info.id).await.expect("get");

    session
        .resize(term_core::Dimensions {
            cols: 132,
            rows: 43,
        })
        .expect("resize");

    let fetched = sup.get(info.id).await.expect("get after resize");
    assert_eq!(fetched.info().dimensions.cols, 132);
    assert_eq!(fetched.info().dimensions.rows, 43);

    sup.close(info.id).await.expect("close");
}

#[tokio::test]
async fn invalid_shell_is_rejected_and_creates_no_session() {
    let sup = supervisor();
    let opts = CreateOptions {
        shell: Some("/usr/bin/python".to_string()),
        ..Default::default()
    };
    let err = sup.create(opts).await.expect_err("must be rejected");
    assert_eq!(err.kind, ErrorKind::InvalidShell);
    assert_eq!(sup.list().await.len(), 0);
}

#[tokio::test]
async fn screenshot_of_a_populated_buffer_has_valid_magic_bytes() {
    let sup = supervisor();
    let info = sup.create(CreateOptions::default()).await.expect("create");
    let session = sup.get(info.id).await.expect("get");

    command::execute(&session, "printf 'line1\\nline2\\n'", Duration::from_secs(5), true)
        .await
        .expect("execute");

    let state = session.snapshot().expect("snapshot");

    let png = render::render(
        &state.content,
        state.cursor,
        state.dimensions,
        &render::RenderOptions::default(),
    )
    .expect("render png");
    assert_eq!(
        png.get(..8),
        Some([0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A].as_slice())
    );

    let jpeg_opts = render::RenderOptions {
        format: term_core::ImageFormat::Jpeg,
        ..render::RenderOptions::default()
    };
    let jpeg = render::render(&state.content, state.cursor, state.dimensions, &jpeg_opts)
        .expect("render jpeg");
    assert_eq!(jpeg.get(..3), Some([0xFF, 0xD8, 0xFF].as_slice()));

    sup.close(info.id).await.expect("close");
}
