//! # study-assistant
//!
//! A question-answering service for a study community. Answers are
//! grounded in a static catalog of projects and FAQs, and off-topic
//! questions are turned away before any search happens.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!                    │   Question   │
//!                    └──────┬───────┘
//!                           │
//!                           ▼
//!                ┌─────────────────────┐   exact match
//!                │ Predefined answers  ├──────────────▶ canned reply
//!                └──────────┬──────────┘
//!                           │
//!                           ▼
//!                ┌─────────────────────┐   not "YES"
//!                │  Relevance gate     ├──────────────▶ rejection
//!                │  (LLM, 10 tokens)   │
//!                └──────────┬──────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!     ┌─────────────────┐       ┌─────────────────┐
//!     │ Project index   │       │   FAQ index     │
//!     │ weighted fuzzy  │       │ weighted fuzzy  │
//!     └────────┬────────┘       └────────┬────────┘
//!              │ score < 0.6             │ score < 0.6 
//!              └────────────┬────────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │ Merge, sort, top 5  │
//!                └──────────┬──────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Answer composer    │
//!                │  (LLM, 3 citations) │
//!                └─────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, data file, and provider
//! - [`models`] - Records, search results, and request/response types
//! - [`store`] - Loading and validating the project/FAQ catalog
//! - [`search::fuzzy`] - Bitap-based approximate matching with weighted fields
//! - [`search::ranking`] - Relevance cutoff, merging, and category routing
//! - [`llm`] - Provider abstraction, error taxonomy, prompts, gate, and composer
//! - [`pipeline`] - The end-to-end question flow
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state with a lazily built search service

pub mod api;
pub mod config;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod state;
pub mod store;
