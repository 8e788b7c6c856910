//! Conversation routing for the helpdesk bot.
//!
//! Decodes inbound events into typed interactions and resolves each one
//! through a static FAQ lookup, a document-grounded answer from the
//! completion service, or escalation to a human operator.

pub mod catalog;
pub mod completion;
pub mod document;
pub mod error;
pub mod interaction;
pub mod mock;
pub mod replies;
pub mod router;
pub mod synthesizer;
pub mod transport;

pub use catalog::FaqCatalog;
pub use completion::{
    CompletionError, CompletionRequest, CompletionResponse, CompletionService,
};
pub use document::{DocumentCache, DocumentContent, DocumentFetcher};
pub use error::{ChatError, FailureCause};
pub use interaction::{InboundEvent, Interaction, Origin};
pub use router::{Resolution, Router};
pub use synthesizer::{AnswerSynthesizer, Synthesis};
pub use transport::{Button, MessageId, Messenger, OutgoingMessage, TextFormat, TransportError};
