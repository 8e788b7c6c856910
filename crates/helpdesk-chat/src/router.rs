//! Conversation router: central coordinator for one interaction at a time.
//!
//! Holds no per-user state. Every interaction ends with exactly one terminal
//! reply, followed by the menu unless the user is now waiting on a human.

use std::sync::Arc;

use helpdesk_core::{ChatId, EscalationNotice};
use tracing::{error, info, warn};

use crate::catalog::FaqCatalog;
use crate::completion::CompletionService;
use crate::error::{ChatError, FailureCause};
use crate::interaction::{InboundEvent, Interaction};
use crate::replies;
use crate::synthesizer::{AnswerSynthesizer, Synthesis};
use crate::transport::{Messenger, OutgoingMessage};

/// How an interaction was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Greeting and menu shown.
    MenuShown,
    /// A static FAQ answer was shown.
    FaqAnswered { key: String },
    /// The operator chat was notified; the user waits on a human.
    Escalated,
    /// The completion service produced an answer.
    Answered,
    /// A recoverable failure was reported to the user and the menu re-shown.
    Recovered(ChatError),
}

/// Routes interactions to the FAQ catalog, the synthesizer or escalation.
pub struct Router<C> {
    catalog: Arc<FaqCatalog>,
    synthesizer: AnswerSynthesizer<C>,
    operator_chat: ChatId,
    menu_after_answer: bool,
}

impl<C: CompletionService> Router<C> {
    pub fn new(
        catalog: Arc<FaqCatalog>,
        synthesizer: AnswerSynthesizer<C>,
        operator_chat: ChatId,
    ) -> Self {
        Self {
            catalog,
            synthesizer,
            operator_chat,
            menu_after_answer: false,
        }
    }

    /// Also re-show the menu after a synthesized answer.
    pub fn with_menu_after_answer(mut self, enabled: bool) -> Self {
        self.menu_after_answer = enabled;
        self
    }

    pub fn catalog(&self) -> &FaqCatalog {
        &self.catalog
    }

    /// Handle one inbound event.
    ///
    /// Recoverable failures are reported to the user and returned as
    /// [`Resolution::Recovered`]. `Err` means an ordinary reply could not be
    /// delivered to the user.
    pub async fn handle<M: Messenger>(
        &self,
        messenger: &M,
        event: &InboundEvent,
    ) -> Result<Resolution, ChatError> {
        info!(
            user_id = event.user.id,
            chat = %event.chat,
            kind = event.interaction.kind(),
            "Handling interaction"
        );

        match &event.interaction {
            Interaction::Start => {
                info!(
                    user_id = event.user.id,
                    name = %event.user.display_name,
                    "User opened the menu"
                );
                self.show_start(messenger, event).await?;
                Ok(Resolution::MenuShown)
            }
            Interaction::MenuSelected(key) => self.on_menu_selected(messenger, event, key).await,
            Interaction::Unrecognized(payload) => {
                warn!(payload = %payload, "Unrecognized button payload");
                self.topic_not_found(messenger, event, payload).await
            }
            Interaction::EscalationRequested => self.on_escalation(messenger, event).await,
            Interaction::FreeText(text) => self.on_free_text(messenger, event, text).await,
        }
    }

    async fn on_menu_selected<M: Messenger>(
        &self,
        messenger: &M,
        event: &InboundEvent,
        key: &str,
    ) -> Result<Resolution, ChatError> {
        let Some(entry) = self.catalog.lookup(key) else {
            warn!(key = %key, "Menu selected an unknown FAQ topic");
            return self.topic_not_found(messenger, event, key).await;
        };

        self.reply_in_place(messenger, event, replies::faq_answer(entry))
            .await?;
        messenger
            .send(event.chat, replies::follow_up(&self.catalog))
            .await?;
        Ok(Resolution::FaqAnswered {
            key: key.to_string(),
        })
    }

    async fn topic_not_found<M: Messenger>(
        &self,
        messenger: &M,
        event: &InboundEvent,
        key: &str,
    ) -> Result<Resolution, ChatError> {
        self.reply_in_place(
            messenger,
            event,
            OutgoingMessage::plain(replies::TOPIC_NOT_FOUND),
        )
        .await?;
        self.show_start(messenger, event).await?;
        Ok(Resolution::Recovered(ChatError::LookupMiss(key.to_string())))
    }

    async fn on_escalation<M: Messenger>(
        &self,
        messenger: &M,
        event: &InboundEvent,
    ) -> Result<Resolution, ChatError> {
        // The operator notice must go out even if the user cannot be reached.
        if let Err(e) = self
            .reply_in_place(messenger, event, OutgoingMessage::plain(replies::CONNECTING))
            .await
        {
            warn!(user_id = event.user.id, error = %e, "Failed to acknowledge escalation request");
        }

        let notice = EscalationNotice::from_user(&event.user);
        let delivery = messenger
            .send(self.operator_chat, OutgoingMessage::html(notice.render_html()))
            .await;

        match delivery {
            Ok(_) => {
                info!(
                    user_id = notice.user_id,
                    operator_chat = %self.operator_chat,
                    "Escalation notice delivered"
                );
                messenger
                    .send(event.chat, OutgoingMessage::plain(replies::AGENT_NOTIFIED))
                    .await?;
                Ok(Resolution::Escalated)
            }
            Err(e) => {
                error!(
                    user_id = notice.user_id,
                    operator_chat = %self.operator_chat,
                    error = %e,
                    "Failed to deliver escalation notice"
                );
                messenger
                    .send(event.chat, OutgoingMessage::plain(replies::ESCALATION_FAILED))
                    .await?;
                messenger
                    .send(event.chat, replies::follow_up(&self.catalog))
                    .await?;
                Ok(Resolution::Recovered(ChatError::DeliveryFailure(
                    e.to_string(),
                )))
            }
        }
    }

    async fn on_free_text<M: Messenger>(
        &self,
        messenger: &M,
        event: &InboundEvent,
        text: &str,
    ) -> Result<Resolution, ChatError> {
        info!(user_id = event.user.id, question = %text, "Free-text question");

        if self.synthesizer.has_document() {
            messenger
                .send(event.chat, OutgoingMessage::plain(replies::THINKING))
                .await?;
        }

        let (reply, failure) = match self.synthesizer.answer(text).await {
            Synthesis::Answered(answer) => {
                match messenger
                    .send(event.chat, OutgoingMessage::plain(answer))
                    .await
                {
                    Ok(_) => {
                        if self.menu_after_answer {
                            messenger
                                .send(event.chat, replies::follow_up(&self.catalog))
                                .await?;
                        }
                        return Ok(Resolution::Answered);
                    }
                    Err(e) => {
                        error!(
                            user_id = event.user.id,
                            question = %text,
                            error = %e,
                            "Failed to deliver synthesized answer"
                        );
                        (replies::ANSWER_FAILED, ChatError::DeliveryFailure(e.to_string()))
                    }
                }
            }
            Synthesis::NotAvailable => {
                (replies::DOCUMENT_UNAVAILABLE, ChatError::SynthesisUnavailable)
            }
            Synthesis::NotFound => (
                replies::ANSWER_NOT_FOUND,
                ChatError::SynthesisFailure {
                    question: text.to_string(),
                    cause: FailureCause::EmptyResponse,
                },
            ),
            Synthesis::Failed(e) => (
                replies::ANSWER_FAILED,
                ChatError::SynthesisFailure {
                    question: text.to_string(),
                    cause: FailureCause::Call(e.to_string()),
                },
            ),
        };

        messenger
            .send(event.chat, OutgoingMessage::plain(reply))
            .await?;
        self.show_start(messenger, event).await?;
        Ok(Resolution::Recovered(failure))
    }

    async fn show_start<M: Messenger>(
        &self,
        messenger: &M,
        event: &InboundEvent,
    ) -> Result<(), ChatError> {
        messenger
            .send(
                event.chat,
                replies::greeting(&event.user.display_name, &self.catalog),
            )
            .await?;
        Ok(())
    }

    /// Edit the pressed message when there is one, otherwise send anew.
    async fn reply_in_place<M: Messenger>(
        &self,
        messenger: &M,
        event: &InboundEvent,
        message: OutgoingMessage,
    ) -> Result<(), ChatError> {
        if let Some(message_id) = event.source_message() {
            match messenger.edit(event.chat, message_id, message.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(message_id, error = %e, "Edit failed; sending a new message");
                }
            }
        }
        messenger.send(event.chat, message).await?;
        Ok(())
    }
}
