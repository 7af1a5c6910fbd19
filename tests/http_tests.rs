//! HTTP adapter tests with mocked network responses
//!
//! These tests use wiremock to stand in for the specialist service and the
//! text-generation endpoints and validate:
//! - Request shapes (paths, JSON bodies, bearer auth)
//! - Response decoding into capability payloads
//! - Error mapping for non-2xx and undecodable replies
//! - A full workflow run over HTTP collaborators

use docintel::capabilities::http::HttpCapabilities;
use docintel::capabilities::{
    AnalysisCapability, CitationCapability, ResearchCapability, ResearchRequest,
};
use docintel::llm::{LLMClient, Provider};
use docintel::types::{AppError, ExecutionPattern, ResearchOutput, SearchMode, TaskKind};
use docintel::utils::toml_config::{CapabilitiesConfig, WorkflowSettings};
use docintel::{Capabilities, WorkflowCoordinator};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= Helper Functions =============

const TIMEOUT: Duration = Duration::from_secs(5);

fn research_reply(answer: &str) -> serde_json::Value {
    json!({
        "sources": [{"fileName": "fund_iii.pdf", "page": 4}],
        "answer": answer,
        "enhancedSummary": "summary",
        "keyFacts": ["2% management fee"],
        "informationGaps": [],
        "searchTimeMs": 12
    })
}

fn research_request(query: &str) -> ResearchRequest {
    ResearchRequest {
        query: query.to_string(),
        mode: SearchMode::Semantic,
        file_filter: Some(vec!["fund_iii.pdf".to_string()]),
    }
}

// ============= Specialist Service =============

#[tokio::test]
async fn test_research_request_shape_and_decoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/research"))
        .and(body_json(json!({
            "query": "management fees",
            "mode": "semantic",
            "fileNames": ["fund_iii.pdf"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(research_reply("2% of commitments")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let caps = HttpCapabilities::new(mock_server.uri(), None, TIMEOUT).unwrap();
    let out = caps.research(&research_request("management fees")).await.unwrap();

    assert_eq!(out.answer, "2% of commitments");
    assert_eq!(out.sources.len(), 1);
    assert_eq!(out.enhanced_summary.as_deref(), Some("summary"));
    // Unknown fields pass through
    assert_eq!(out.extra["searchTimeMs"], json!(12));
}

#[tokio::test]
async fn test_file_filter_omitted_when_unset() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/research"))
        .and(body_json(json!({"query": "q", "mode": "hybrid"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(research_reply("a")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let caps = HttpCapabilities::new(mock_server.uri(), None, TIMEOUT).unwrap();
    let request = ResearchRequest {
        query: "q".to_string(),
        mode: SearchMode::Hybrid,
        file_filter: None,
    };
    caps.research(&request).await.unwrap();
}

#[tokio::test]
async fn test_analysis_and_citation_bodies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analysis"))
        .and(body_partial_json(json!({"task": "Compare fees"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "analysisType": "comparison",
            "result": {"delta": 0.5},
            "executiveSummary": "Fund III is cheaper"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/citation"))
        .and(|req: &wiremock::Request| {
            serde_json::from_slice::<serde_json::Value>(&req.body)
                .map(|b| b["analysisResults"].is_array() && b["researchResults"].is_array())
                .unwrap_or(false)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accuracy": 0.75,
            "validations": [{"claim": "2% fee", "supported": true}],
            "unsupported": ["carry is 25%"],
            "report": "3 of 4 supported"
        })))
        .mount(&mock_server)
        .await;

    let caps = HttpCapabilities::new(mock_server.uri(), None, TIMEOUT).unwrap();
    let research = vec![ResearchOutput {
        answer: "2%".to_string(),
        ..Default::default()
    }];

    let analysis = caps.analyze("Compare fees", &research).await.unwrap();
    assert!(analysis.is_completed());
    assert_eq!(analysis.executive_summary, "Fund III is cheaper");

    let citation = caps.validate(&[analysis], &research).await.unwrap();
    assert_eq!(citation.accuracy, 0.75);
    assert_eq!(citation.unsupported, vec!["carry is 25%"]);
}

#[tokio::test]
async fn test_bearer_token_and_custom_paths() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/search"))
        .and(header("authorization", "Bearer service-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(research_reply("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    std::env::set_var("DOCINTEL_HTTP_TEST_TOKEN", "service-token");
    let config = CapabilitiesConfig {
        base_url: format!("{}/", mock_server.uri()),
        api_key_env: Some("DOCINTEL_HTTP_TEST_TOKEN".to_string()),
        research_path: "/v2/search".to_string(),
        ..Default::default()
    };

    let caps = HttpCapabilities::from_config(&config).unwrap();
    let out = caps.research(&research_request("q")).await.unwrap();
    assert_eq!(out.answer, "ok");
}

#[tokio::test]
async fn test_non_success_status_is_capability_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analysis"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model overloaded"))
        .mount(&mock_server)
        .await;

    let caps = HttpCapabilities::new(mock_server.uri(), None, TIMEOUT).unwrap();
    let err = caps.analyze("t", &[]).await.unwrap_err();

    assert!(err.is_capability_failure());
    match err {
        AppError::Capability {
            capability,
            message,
        } => {
            assert_eq!(capability, TaskKind::Analysis);
            assert!(message.contains("503"));
            assert!(message.contains("model overloaded"));
        }
        other => panic!("expected capability error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_reply_is_capability_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/citation"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let caps = HttpCapabilities::new(mock_server.uri(), None, TIMEOUT).unwrap();
    let err = caps.validate(&[], &[]).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Capability {
            capability: TaskKind::Citation,
            ..
        }
    ));
}

// ============= Text Generation =============

fn ollama_chat_reply(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.2",
        "created_at": "2024-06-01T12:00:00Z",
        "message": {"role": "assistant", "content": content, "tool_calls": []},
        "done": true
    })
}

fn openai_completion(choices: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1717243200,
        "model": "gpt-4o-mini",
        "choices": choices
    })
}

#[tokio::test]
async fn test_ollama_chat() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_chat_reply("Hi there")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Provider::Ollama {
        base_url: mock_server.uri(),
        model: "llama3.2".to_string(),
    }
    .create_client(TIMEOUT)
    .unwrap();

    assert_eq!(client.generate("Hello").await.unwrap(), "Hi there");
    assert_eq!(client.model_name(), "llama3.2");
}

#[tokio::test]
async fn test_ollama_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "model 'missing' not found"})),
        )
        .mount(&mock_server)
        .await;

    let client = Provider::Ollama {
        base_url: mock_server.uri(),
        model: "missing".to_string(),
    }
    .create_client(TIMEOUT)
    .unwrap();

    let err = client.generate("Hello").await.unwrap_err();
    assert!(matches!(err, AppError::LLM(ref m) if m.contains("not found")));
}

#[test]
fn test_ollama_rejects_unusable_base_url() {
    let result = Provider::Ollama {
        base_url: "not a url".to_string(),
        model: "llama3.2".to_string(),
    }
    .create_client(TIMEOUT);

    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn test_openai_chat_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_completion(json!([{
            "index": 0,
            "message": {"role": "assistant", "content": "Hi"},
            "finish_reason": "stop"
        }]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Provider::OpenAI {
        api_key: "sk-test".to_string(),
        api_base: format!("{}/v1/", mock_server.uri()),
        model: "gpt-4o-mini".to_string(),
    }
    .create_client(TIMEOUT)
    .unwrap();

    assert_eq!(client.generate("Hello").await.unwrap(), "Hi");
    assert_eq!(client.model_name(), "gpt-4o-mini");
}

#[tokio::test]
async fn test_openai_empty_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_completion(json!([]))))
        .mount(&mock_server)
        .await;

    let client = Provider::OpenAI {
        api_key: "sk-test".to_string(),
        api_base: mock_server.uri(),
        model: "gpt-4o-mini".to_string(),
    }
    .create_client(TIMEOUT)
    .unwrap();

    assert!(matches!(
        client.generate("Hello").await,
        Err(AppError::LLM(ref m)) if m.contains("No response")
    ));
}

// ============= Full Workflow =============

#[tokio::test]
async fn test_parallel_workflow_over_http() {
    let mock_server = MockServer::start().await;

    let plan = json!({
        "research_queries": ["management fee", "carried interest"],
        "analysis_tasks": ["Compare economics"],
        "citation_requirements": ["Fee percentages"],
        "complexity": "moderate"
    });
    mount_chat(
        &mock_server,
        "task decomposition expert",
        &format!("```json\n{}\n```", plan),
    )
    .await;
    mount_chat(
        &mock_server,
        "synthesizing a comprehensive answer",
        "Fees are 2% with 20% carry.",
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/research"))
        .and(body_partial_json(json!({"query": "management fee"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(research_reply("2%")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/research"))
        .and(body_partial_json(json!({"query": "carried interest"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(research_reply("20%")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "analysisType": "comparison",
            "executiveSummary": "standard 2 and 20"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/citation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accuracy": 1.0})))
        .mount(&mock_server)
        .await;

    let llm: Arc<dyn LLMClient> = Arc::from(
        Provider::Ollama {
            base_url: mock_server.uri(),
            model: "llama3.2".to_string(),
        }
        .create_client(TIMEOUT)
        .unwrap(),
    );
    let service = HttpCapabilities::new(mock_server.uri(), None, TIMEOUT).unwrap();
    let coordinator = WorkflowCoordinator::new(
        llm,
        Capabilities::from_service(Arc::new(service)),
        WorkflowSettings::default(),
    );

    let out = coordinator
        .execute("What are the fund economics?", ExecutionPattern::Parallel)
        .await
        .unwrap();

    assert_eq!(out.answer, "Fees are 2% with 20% carry.");
    assert_eq!(out.total_tasks, 4);
    assert_eq!(out.stages.research[0].answer, "2%");
    assert_eq!(out.stages.research[1].answer, "20%");
    assert_eq!(out.stages.citation.accuracy, 1.0);
}

/// Answer `/api/chat` calls whose user message contains `marker`.
async fn mount_chat(server: &MockServer, marker: &str, response: &str) {
    let marker = marker.to_string();
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(move |req: &wiremock::Request| {
            serde_json::from_slice::<serde_json::Value>(&req.body)
                .ok()
                .and_then(|b| {
                    b["messages"]
                        .as_array()
                        .and_then(|messages| messages.last())
                        .and_then(|m| m["content"].as_str())
                        .map(|content| content.contains(&marker))
                })
                .unwrap_or(false)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_chat_reply(response)))
        .mount(server)
        .await;
}
