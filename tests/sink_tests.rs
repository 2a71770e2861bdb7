// HTTP sink wire-format tests against a mock backend

use chrono::Utc;
use karibu::{
    FlushReason, HttpLeadSink, HttpTranscriptSink, LeadPayload, LeadSink, SinkError,
    TranscriptMeta, TranscriptPayload, TranscriptSink, TravelerPreferences, Turn, Visitor,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_lead() -> LeadPayload {
    LeadPayload {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        phone: String::new(),
        country: "Uganda".to_string(),
        package_name: "AI Guided Booking Lead".to_string(),
        package_type: "ai-bot".to_string(),
        duration: "3-4 days".to_string(),
        group_size: "2".to_string(),
        travel_date: String::new(),
        budget: "Under $700".to_string(),
        accommodation_level: String::new(),
        special_requirements: String::new(),
        message: "summary".to_string(),
    }
}

fn sample_transcript(reason: FlushReason) -> TranscriptPayload {
    TranscriptPayload {
        visitor: Some(Visitor {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            consent: true,
            captured_at: Utc::now(),
        }),
        session_start: Utc::now(),
        session_end: Utc::now(),
        history: vec![Turn::user("hello"), Turn::bot("hi there")],
        preferences: TravelerPreferences::new(),
        meta: TranscriptMeta {
            page: "https://example.com/safaris".to_string(),
            user_agent: "integration-test".to_string(),
            timezone_offset: -180,
            reason,
        },
    }
}

#[tokio::test]
async fn test_lead_sink_posts_camel_case_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/submit-booking.php"))
        .and(body_partial_json(serde_json::json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@example.com",
            "packageType": "ai-bot",
            "groupSize": "2",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpLeadSink::new(format!("{}/api/submit-booking.php", server.uri())).unwrap();
    sink.submit(&sample_lead()).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_lead_sink_surfaces_rejection_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("missing phone"))
        .mount(&server)
        .await;

    let sink = HttpLeadSink::new(server.uri()).unwrap();
    let err = sink.submit(&sample_lead()).await.unwrap_err();
    match err {
        SinkError::Rejected { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "missing phone");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lead_sink_connection_error() {
    // Nothing is listening on this port
    let sink = HttpLeadSink::new("http://127.0.0.1:9").unwrap();
    let err = sink.submit(&sample_lead()).await.unwrap_err();
    assert!(matches!(err, SinkError::Connection(_)));
}

#[tokio::test]
async fn test_transcript_sink_sends_api_key_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat-transcript.php"))
        .and(header("X-API-Key", "secret-key"))
        .and(body_partial_json(serde_json::json!({
            "meta": {
                "page": "https://example.com/safaris",
                "userAgent": "integration-test",
                "timezoneOffset": -180,
                "reason": "lead_submitted",
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpTranscriptSink::new(
        format!("{}/api/chat-transcript.php", server.uri()),
        "secret-key",
    )
    .unwrap();
    sink.flush(&sample_transcript(FlushReason::LeadSubmitted))
        .await
        .unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_transcript_sink_carries_history_and_visitor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "visitor": { "email": "jane@example.com", "consent": true },
            "history": [
                { "sender": "user", "message": "hello" },
                { "sender": "bot", "message": "hi there" },
            ],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpTranscriptSink::new(server.uri(), "secret-key").unwrap();
    sink.flush(&sample_transcript(FlushReason::Unload))
        .await
        .unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_transcript_sink_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let sink = HttpTranscriptSink::new(server.uri(), "wrong-key").unwrap();
    let err = sink
        .flush(&sample_transcript(FlushReason::InactivityTimeout))
        .await
        .unwrap_err();
    assert!(matches!(err, SinkError::Rejected { status: 401, .. }));
}
