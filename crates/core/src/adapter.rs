//! The provider adapter contract.

use crate::{
    ChatRequest, ChatResponse, ChatStreamChunk, Error, ModelOption, ProviderTag, Result,
    enrich::{self, AutoCategorization, AutoDetectedMerchant, EnrichTransaction},
};
use compact_str::CompactString;

/// Push-style streaming callback.
///
/// Called synchronously and in order from the task reading the network.
/// Returning an error aborts the stream and fails the whole call.
pub type Streamer<'s> = &'s mut (dyn FnMut(ChatStreamChunk) -> Result<()> + Send);

/// A backend that can serve chat requests for a fixed set of models.
///
/// Implemented once per backend and by the provider enum that dispatches
/// over them. Constructors are inherent: adapters are never built
/// polymorphically.
pub trait Adapter: Send + Sync {
    /// Human-readable adapter name used in errors and logs.
    fn name(&self) -> &'static str;

    /// The backend family this adapter talks to.
    fn tag(&self) -> ProviderTag;

    /// Whether `model` is one of the adapter's models.
    fn supports_model(&self, model: &str) -> bool;

    /// The adapter's selectable models, in table order.
    fn model_options(&self) -> Vec<ModelOption>;

    /// Run one chat turn.
    ///
    /// Without a streamer the backend is called once and the full payload
    /// parsed. With one, the backend is streamed: every text fragment is
    /// pushed as [`ChatStreamChunk::OutputText`], then the assembled
    /// response as [`ChatStreamChunk::Response`]. Any failure fails the
    /// whole call; chunks already delivered stay delivered.
    fn chat_response(
        &self,
        request: ChatRequest,
        streamer: Option<Streamer<'_>>,
    ) -> impl Future<Output = Result<ChatResponse>> + Send;

    /// The model used for the batch helpers: the first table entry.
    fn default_model(&self) -> Option<CompactString> {
        self.model_options()
            .into_iter()
            .next()
            .map(|option| option.id)
    }

    /// Suggest a category for each transaction out of `categories`.
    fn auto_categorize(
        &self,
        transactions: &[EnrichTransaction],
        categories: &[String],
    ) -> impl Future<Output = Result<Vec<AutoCategorization>>> + Send {
        async move {
            enrich::check_batch("auto-categorize", transactions)?;
            let model = batch_model(self)?;
            let prompt = enrich::categorization_prompt(transactions, categories);
            let response = self
                .chat_response(ChatRequest::new(model, prompt), None)
                .await?;
            enrich::parse_categorizations(self.name(), &response.text(), transactions)
        }
    }

    /// Detect the business behind each transaction, preferring `merchants`.
    fn auto_detect_merchants(
        &self,
        transactions: &[EnrichTransaction],
        merchants: &[String],
    ) -> impl Future<Output = Result<Vec<AutoDetectedMerchant>>> + Send {
        async move {
            enrich::check_batch("auto-detect merchants", transactions)?;
            let model = batch_model(self)?;
            let prompt = enrich::merchant_detection_prompt(transactions, merchants);
            let response = self
                .chat_response(ChatRequest::new(model, prompt), None)
                .await?;
            enrich::parse_merchants(self.name(), &response.text(), transactions)
        }
    }
}

fn batch_model<A: Adapter + ?Sized>(adapter: &A) -> Result<CompactString> {
    adapter
        .default_model()
        .ok_or_else(|| Error::Config(format!("{} advertises no models", adapter.name())))
}
