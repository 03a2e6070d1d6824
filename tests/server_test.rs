//! End-to-end tests of the HTTP surface with mocked transcript and
//! summarization providers.

mod common;

use common::{RAPIDAPI_KEY, SUMMARY_KEY, SUMMARY_PATH, TestApp, VIDEO_ID, VIDEO_URL, chat_completion, long_transcript};
use httpmock::prelude::*;
use serde_json::json;
use tldw::config::{Config, SummaryProviderKind};

#[tokio::test]
async fn test_index_and_health_endpoints() {
    let app = TestApp::spawn().await;

    let index = app.client.get(format!("{}/", app.address)).send().await.unwrap();
    assert!(index.status().is_success());
    assert!(index.headers()["content-type"].to_str().unwrap().starts_with("text/html"));
    assert!(index.text().await.unwrap().contains("TL;DW"));

    let health = app.client.get(format!("{}/health", app.address)).send().await.unwrap();
    assert!(health.status().is_success());
    assert_eq!(health.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_summarize_happy_path() {
    let app = TestApp::spawn().await;

    let transcript_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/transcript")
                .query_param("video_id", VIDEO_ID)
                .query_param("lang", "en")
                .header("x-rapidapi-key", RAPIDAPI_KEY)
                .header("x-rapidapi-host", "youtube-transcriptor.p.rapidapi.com");
            then.status(200).json_body(json!([
                { "text": "[Music] Welcome back to the channel.", "start": 0.0, "dur": 2.1 },
                { "text": "Today we look at how async runtimes schedule tasks", "start": 2.1, "dur": 3.0 },
                { "text": "and why blocking calls hurt throughput. [Applause]", "start": 5.1, "dur": 2.4 }
            ]));
        })
        .await;

    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SUMMARY_PATH)
                .header("authorization", format!("Bearer {SUMMARY_KEY}"))
                .body_contains("llama-3.1-8b-instant")
                .body_contains(
                    "Welcome back to the channel. Today we look at how async runtimes schedule tasks \
                     and why blocking calls hurt throughput.",
                );
            then.status(200)
                .json_body(chat_completion("- Async runtimes schedule tasks\n- Blocking hurts throughput"));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 200, "body: {body}");
    assert_eq!(
        body["summary"],
        "- Async runtimes schedule tasks\n- Blocking hurts throughput"
    );
    assert!(body.get("error").is_none());
    transcript_mock.assert_async().await;
    summary_mock.assert_async().await;
}

#[tokio::test]
async fn test_non_string_url_is_rejected_without_external_calls() {
    let app = TestApp::spawn().await;
    let transcript_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;

    for payload in [json!({ "url": 42 }), json!({}), json!({ "url": "" })] {
        let (status, body) = app.post_summarize(payload).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Please provide a YouTube URL");
    }

    assert_eq!(transcript_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_unrecognized_url_is_rejected() {
    let app = TestApp::spawn().await;
    let transcript_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": "https://vimeo.com/1234" })).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid YouTube URL.");
    assert_eq!(transcript_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_malformed_body_is_unexpected_error() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/summarize", app.address))
        .header("Content-Type", "application/json")
        .body(r#"{"url": "https://youtu.be/abc"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "An unexpected error occurred.");
}

#[tokio::test]
async fn test_missing_summary_credential() {
    let app = TestApp::spawn_with(Config::default(), Some(RAPIDAPI_KEY), None).await;
    let transcript_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "GROQ_API_KEY not configured.");
    assert_eq!(transcript_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_missing_transcript_credential() {
    let app = TestApp::spawn_with(Config::default(), None, Some(SUMMARY_KEY)).await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "RAPIDAPI_KEY not configured.");
}

#[tokio::test]
async fn test_transcript_provider_failure() {
    let app = TestApp::spawn().await;
    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(404).json_body(json!({ "message": "Video has no captions" }));
        })
        .await;
    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.path(SUMMARY_PATH);
            then.status(200).json_body(chat_completion("- unused"));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Could not get transcript. Video may not have captions enabled."
    );
    assert_eq!(summary_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_unrecognized_transcript_shape() {
    let app = TestApp::spawn().await;
    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "captions": "somewhere else" }));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Could not get transcript. Video may not have captions enabled."
    );
}

#[tokio::test]
async fn test_short_transcript_never_reaches_summarizer() {
    let app = TestApp::spawn().await;

    // 50 segments whose text adds up to 40 characters
    let mut segments: Vec<_> = (0..8).map(|_| json!({ "text": "hello" })).collect();
    segments.extend((0..42).map(|_| json!({ "text": "" })));
    assert_eq!(segments.len(), 50);

    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!(segments));
        })
        .await;
    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.path(SUMMARY_PATH);
            then.status(200).json_body(chat_completion("- unused"));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "Transcript too short or empty.");
    assert_eq!(summary_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_summarizer_error_is_reported_generically() {
    let app = TestApp::spawn().await;
    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;
    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.method(POST).path(SUMMARY_PATH);
            then.status(500).body("upstream exploded: model shard 7 unavailable");
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 503);
    assert_eq!(body["error"], "AI summarization failed. Please try again.");
    assert!(!body.to_string().contains("shard"));
    assert!(body.get("summary").is_none());
    summary_mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_summary_result() {
    let app = TestApp::spawn().await;
    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;
    app.mock_server
        .mock_async(|when, then| {
            when.path(SUMMARY_PATH);
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to generate summary.");
}

#[tokio::test]
async fn test_long_transcript_is_truncated_before_summarizing() {
    let mut config = Config::default();
    config.normalize.max_chars = 60;
    config.normalize.ellipsis = true;
    let app = TestApp::spawn_with(config, Some(RAPIDAPI_KEY), Some(SUMMARY_KEY)).await;

    let transcript = "abcdefghij ".repeat(100);
    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcription": transcript }));
        })
        .await;

    let expected = format!("{}...", &"abcdefghij ".repeat(6)[..60]);
    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.path(SUMMARY_PATH).body_contains(format!("{expected}\""));
            then.status(200).json_body(chat_completion("- letters"));
        })
        .await;

    let (status, _) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 200);
    summary_mock.assert_async().await;
}

#[tokio::test]
async fn test_hosted_summarization_prose_is_bulletized() {
    let mut config = Config::default();
    config.summary.provider = SummaryProviderKind::Huggingface;
    let app = TestApp::spawn_with(config, Some(RAPIDAPI_KEY), Some(SUMMARY_KEY)).await;

    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;
    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SUMMARY_PATH)
                .header("authorization", format!("Bearer {SUMMARY_KEY}"))
                .body_contains("\"do_sample\":false");
            then.status(200).json_body(json!([
                { "summary_text": "Async runtimes schedule tasks cooperatively. Blocking calls stall them!" }
            ]));
        })
        .await;

    let (status, body) = app
        .post_summarize(json!({ "url": "https://youtu.be/abc123?si=share" }))
        .await;

    assert_eq!(status, 200, "body: {body}");
    assert_eq!(
        body["summary"],
        "• Async runtimes schedule tasks cooperatively.\n• Blocking calls stall them!"
    );
    summary_mock.assert_async().await;
}

#[tokio::test]
async fn test_blank_url_is_an_invalid_url() {
    let app = TestApp::spawn().await;
    let transcript_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": "   " })).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid YouTube URL.");
    assert_eq!(transcript_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_anthropic_messages_request() {
    let mut config = Config::default();
    config.summary.provider = SummaryProviderKind::Anthropic;
    let app = TestApp::spawn_with(config, Some(RAPIDAPI_KEY), Some(SUMMARY_KEY)).await;

    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;
    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SUMMARY_PATH)
                .header("x-api-key", SUMMARY_KEY)
                .header("anthropic-version", "2023-06-01")
                .body_contains("\"model\":\"claude-sonnet-4-6\"")
                .body_contains("\"system\":");
            then.status(200).json_body(json!({
                "id": "msg_test",
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "text", "text": "- Runtimes schedule tasks\n" },
                    { "type": "text", "text": "- Blocking stalls workers" }
                ],
                "stop_reason": "end_turn"
            }));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 200, "body: {body}");
    assert_eq!(body["summary"], "- Runtimes schedule tasks\n- Blocking stalls workers");
    summary_mock.assert_async().await;
}

#[tokio::test]
async fn test_hosted_instruct_request() {
    let mut config = Config::default();
    config.summary.provider = SummaryProviderKind::HuggingfaceInstruct;
    let app = TestApp::spawn_with(config, Some(RAPIDAPI_KEY), Some(SUMMARY_KEY)).await;

    app.mock_server
        .mock_async(|when, then| {
            when.path("/transcript");
            then.status(200).json_body(json!({ "transcript": long_transcript() }));
        })
        .await;
    let summary_mock = app
        .mock_server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SUMMARY_PATH)
                .header("authorization", format!("Bearer {SUMMARY_KEY}"))
                .body_contains("<s>[INST] ")
                .body_contains("\"return_full_text\":false");
            then.status(200)
                .json_body(json!([{ "generated_text": " * Tasks yield at await points\n * Avoid blocking calls " }]));
        })
        .await;

    let (status, body) = app.post_summarize(json!({ "url": VIDEO_URL })).await;

    assert_eq!(status, 200, "body: {body}");
    assert_eq!(body["summary"], "* Tasks yield at await points\n * Avoid blocking calls");
    summary_mock.assert_async().await;
}
