//! Canonical chat protocol for the Tally LLM gateway.
//!
//! Every provider adapter translates to and from the shapes defined here, so
//! callers never branch on which backend served a request:
//! [`ChatRequest`], [`ChatResponse`], [`ChatStreamChunk`], [`ModelOption`],
//! the [`Adapter`] contract and the shared [`Error`] taxonomy.

pub use {
    adapter::{Adapter, Streamer},
    chat::{
        ChatFunction, ChatFunctionRequest, ChatMessage, ChatRequest, ChatResponse, FunctionResult,
        correlation_id,
    },
    enrich::{AutoCategorization, AutoDetectedMerchant, EnrichTransaction, MAX_BATCH},
    error::{Error, Result},
    model::{ModelOption, ProviderTag},
    stream::{ChatStreamChunk, StreamAssembler},
};

mod adapter;
mod chat;
pub mod enrich;
mod error;
mod model;
mod stream;
