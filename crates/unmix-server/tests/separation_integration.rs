//! End-to-end tests driving the full upload → download → cleanup cycle
//! against a stand-in separation tool.
#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use common::TestServer;

#[tokio::test]
async fn test_full_separation_cycle() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.separate("My Song.mp3", b"fake-audio-bytes").await?;
    assert_eq!(resp.status().as_u16(), 200);

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["success"], true);
    let session_id = body["session_id"].as_str().unwrap().to_string();
    let tracks = body["tracks"].as_object().unwrap().clone();
    assert_eq!(tracks.len(), 4);
    assert_eq!(
        tracks["vocals"].as_str().unwrap(),
        format!("/api/download/{session_id}/vocals")
    );

    // One live session, one workspace on disk.
    let health = server.health().await?;
    assert_eq!(health["active_sessions"], 1);
    assert_eq!(server.workspace_dirs().len(), 1);

    // Every returned URL resolves to the uploaded payload.
    for (name, url) in &tracks {
        let resp = server
            .client
            .get(format!("{}{}", server.base_url(), url.as_str().unwrap()))
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.headers()["content-type"], "audio/wav");

        let disposition = resp.headers()["content-disposition"].to_str()?.to_string();
        assert!(
            disposition.contains(&format!("My_Song_{name}.wav")),
            "unexpected disposition: {disposition}"
        );

        let bytes = resp.bytes().await?;
        assert_eq!(&bytes[..], b"fake-audio-bytes");
    }

    // Explicit cleanup removes the session and its workspace.
    let resp = server.cleanup(&session_id).await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["success"], true);
    assert!(server.workspace_dirs().is_empty());

    // A second cleanup reports the session as gone, without error.
    let resp = server.cleanup(&session_id).await?;
    assert_eq!(resp.status().as_u16(), 404);

    // Downloads are gone too.
    let resp = server.download(&session_id, "vocals").await?;
    assert_eq!(resp.status().as_u16(), 404);

    let health = server.health().await?;
    assert_eq!(health["active_sessions"], 0);

    Ok(())
}

#[tokio::test]
async fn test_rejected_upload_leaves_no_trace() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.separate("notes.txt", b"hello").await?;
    assert_eq!(resp.status().as_u16(), 400);

    let body: serde_json::Value = resp.json().await?;
    assert!(body["error"].as_str().unwrap().contains("Invalid file format"));

    // No workspace, no session, no tool run.
    assert!(server.workspace_dirs().is_empty());
    assert!(!server.tool_invoked());
    let health = server.health().await?;
    assert_eq!(health["active_sessions"], 0);

    Ok(())
}

#[tokio::test]
async fn test_discovery_failure_reports_and_cleans_up() -> Result<()> {
    let server = TestServer::start_with(common::SILENT_TOOL, Duration::from_secs(3600)).await?;

    let resp = server.separate("song.wav", b"data").await?;
    assert_eq!(resp.status().as_u16(), 500);

    let body: serde_json::Value = resp.json().await?;
    assert!(body["error"].as_str().unwrap().contains("Output files not found"));

    // The tool ran, but no session was created and the workspace is gone.
    assert!(server.tool_invoked());
    assert!(server.workspace_dirs().is_empty());
    let health = server.health().await?;
    assert_eq!(health["active_sessions"], 0);

    Ok(())
}

#[tokio::test]
async fn test_tool_failure_surfaces_both_streams() -> Result<()> {
    let server = TestServer::start_with(common::FAILING_TOOL, Duration::from_secs(3600)).await?;

    let resp = server.separate("song.flac", b"data").await?;
    assert_eq!(resp.status().as_u16(), 500);

    let body: serde_json::Value = resp.json().await?;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("exit code 2"), "error was: {error}");
    assert!(error.contains("STDOUT: loading model"), "error was: {error}");
    assert!(error.contains("STDERR: separation blew up"), "error was: {error}");

    assert!(server.workspace_dirs().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_concurrent_submissions_do_not_interfere() -> Result<()> {
    let server = Arc::new(TestServer::start().await?);

    let mut handles = Vec::new();
    for i in 0..4 {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            let payload = format!("audio-payload-{i}").into_bytes();
            let resp = server
                .separate(&format!("track_{i}.mp3"), &payload)
                .await
                .unwrap();
            assert_eq!(resp.status().as_u16(), 200);
            let body: serde_json::Value = resp.json().await.unwrap();
            (
                body["session_id"].as_str().unwrap().to_string(),
                payload,
            )
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await?);
    }

    let mut ids: Vec<String> = results.iter().map(|(id, _)| id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4, "session ids must be distinct");
    assert_eq!(server.workspace_dirs().len(), 4);

    // Each session serves back its own payload.
    for (session_id, payload) in &results {
        let resp = server.download(session_id, "vocals").await?;
        assert_eq!(resp.status().as_u16(), 200);
        let bytes = resp.bytes().await?;
        assert_eq!(&bytes[..], &payload[..]);
    }

    Ok(())
}

#[tokio::test]
async fn test_expired_sessions_are_swept_by_the_next_submission() -> Result<()> {
    // With a zero TTL, every session is expired by the time the next
    // submission sweeps.
    let server = TestServer::start_with(common::COPYING_TOOL, Duration::ZERO).await?;

    let resp = server.separate("first.mp3", b"one").await?;
    assert_eq!(resp.status().as_u16(), 200);
    let first: serde_json::Value = resp.json().await?;
    let first_id = first["session_id"].as_str().unwrap().to_string();

    let resp = server.separate("second.mp3", b"two").await?;
    assert_eq!(resp.status().as_u16(), 200);
    let second: serde_json::Value = resp.json().await?;
    let second_id = second["session_id"].as_str().unwrap().to_string();

    // The first session was evicted, workspace included; the second is live.
    let resp = server.download(&first_id, "vocals").await?;
    assert_eq!(resp.status().as_u16(), 404);
    let resp = server.download(&second_id, "vocals").await?;
    assert_eq!(resp.status().as_u16(), 200);

    let health = server.health().await?;
    assert_eq!(health["active_sessions"], 1);
    assert_eq!(server.workspace_dirs().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_unmatched_paths_serve_the_frontend_bundle() -> Result<()> {
    let server = TestServer::start().await?;

    for path in ["/", "/some/client/route"] {
        let resp = server
            .client
            .get(format!("{}{path}", server.base_url()))
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.text().await?, "<html>unmix</html>");
    }

    Ok(())
}
