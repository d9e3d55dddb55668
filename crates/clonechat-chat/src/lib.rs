//! Clone chat: retrieval-augmented answers in a fixed persona.
//!
//! A question is embedded and matched against the local passage index, the
//! best passages are spliced into the persona prompt, and the prompt goes
//! to a hosted chat model as a single turn. No history is kept.

pub mod cohere;
pub mod gateway;
pub mod prompt;
pub mod retriever;
pub mod traits;
pub mod types;

pub use cohere::CohereGenerator;
pub use gateway::ChatGateway;
pub use prompt::PromptTemplate;
pub use retriever::IndexRetriever;
pub use traits::{Generator, Retriever};
pub use types::*;
