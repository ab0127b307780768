//! Tests for the provided batch methods of the adapter contract.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tally_core::{
    Adapter, ChatMessage, ChatRequest, ChatResponse, EnrichTransaction, Error, ModelOption,
    ProviderTag, Result, Streamer,
};

/// Answers every request with a canned reply and records prompts.
struct Canned {
    reply: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<ChatRequest>>,
}

impl Canned {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl Adapter for Canned {
    fn name(&self) -> &'static str {
        "Canned"
    }

    fn tag(&self) -> ProviderTag {
        ProviderTag::OpenAI
    }

    fn supports_model(&self, model: &str) -> bool {
        model == "canned-1"
    }

    fn model_options(&self) -> Vec<ModelOption> {
        vec![
            ModelOption::new("canned-1", "Canned One", ProviderTag::OpenAI),
            ModelOption::new("canned-2", "Canned Two", ProviderTag::OpenAI),
        ]
    }

    async fn chat_response(
        &self,
        request: ChatRequest,
        _streamer: Option<Streamer<'_>>,
    ) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.clone());
        Ok(ChatResponse {
            id: "r".into(),
            model: request.model,
            messages: vec![ChatMessage {
                id: "m".into(),
                output_text: self.reply.clone(),
            }],
            function_requests: Vec::new(),
        })
    }
}

fn batch(n: usize) -> Vec<EnrichTransaction> {
    (0..n)
        .map(|i| EnrichTransaction {
            id: format!("tx_{i}"),
            name: format!("Payee {i}"),
            amount: -1.0,
            merchant: None,
        })
        .collect()
}

#[test]
fn default_model_is_first_option() {
    assert_eq!(Canned::new("[]").default_model().as_deref(), Some("canned-1"));
}

#[tokio::test]
async fn too_many_items_makes_no_request() {
    let adapter = Canned::new("[]");
    let err = adapter
        .auto_categorize(&batch(26), &["Food".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TooManyItems { count: 26, .. }));
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn full_batch_proceeds() {
    let adapter = Canned::new(r#"[{"transaction_id": "tx_0", "category_name": "Food"}]"#);
    let result = adapter
        .auto_categorize(&batch(25), &["Food".into()])
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    let prompts = adapter.prompts.lock().unwrap();
    assert_eq!(prompts[0].model, "canned-1");
    assert!(prompts[0].prompt.contains("ID: tx_24"));
}

#[tokio::test]
async fn merchant_detection_reports_malformed_output() {
    let adapter = Canned::new("I could not find any merchants.");
    let err = adapter
        .auto_detect_merchants(&batch(2), &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedProviderOutput {
            provider: "Canned",
            ..
        }
    ));
}
