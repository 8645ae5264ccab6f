//! Two-step questionnaire conversation.
//!
//! `/start` sends the questionnaire and marks the chat as awaiting answers.
//! The next message from that chat, whatever it contains, is treated as the
//! submission: it is either rejected with format guidance (chat keeps
//! waiting) or forwarded to the admin (chat goes back to idle).

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    command,
    config::Config,
    domain::{ChatId, Recipient, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{IncomingMessage, Sender},
    },
    Result,
};

/// Every submission must contain each of these substrings somewhere.
pub const REQUIRED_MARKERS: [&str; 5] = ["1.", "2.", "3.", "4.", "5."];

/// Stand-in for senders without a Telegram handle.
pub const NO_USERNAME: &str = "no_username";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingAnswers,
}

/// What `ConversationHandler::handle` did with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Idle chat, not a start command.
    Ignored,
    /// Questionnaire sent; chat now awaits answers.
    Prompted,
    /// Submission failed validation; chat still awaits answers.
    Rejected,
    /// Submission forwarded to the admin; chat is idle.
    Forwarded,
    /// Something failed; chat is idle.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Rejected,
    Forwarded,
}

/// Loose format check: unordered, unanchored substring containment.
pub fn has_all_markers(text: &str) -> bool {
    REQUIRED_MARKERS.iter().all(|m| text.contains(m))
}

/// `"{first} {last}"` with surrounding whitespace trimmed.
pub fn display_name(first_name: &str, last_name: Option<&str>) -> String {
    format!("{first_name} {}", last_name.unwrap_or_default())
        .trim()
        .to_string()
}

/// Sender details as they appear in the admin report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applicant {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
}

impl From<&Sender> for Applicant {
    fn from(sender: &Sender) -> Self {
        Self {
            user_id: sender.id,
            username: sender
                .username
                .clone()
                .unwrap_or_else(|| NO_USERNAME.to_string()),
            display_name: display_name(&sender.first_name, sender.last_name.as_deref()),
        }
    }
}

/// Per-chat conversation state. A chat with no entry is idle.
#[derive(Default)]
pub struct ChatStates {
    inner: Mutex<HashMap<ChatId, ConversationState>>,
}

impl ChatStates {
    pub async fn get(&self, chat_id: ChatId) -> ConversationState {
        self.inner
            .lock()
            .await
            .get(&chat_id)
            .copied()
            .unwrap_or_default()
    }

    /// Remove and return the chat's state, leaving it idle.
    pub async fn take(&self, chat_id: ChatId) -> ConversationState {
        self.inner
            .lock()
            .await
            .remove(&chat_id)
            .unwrap_or_default()
    }

    pub async fn arm(&self, chat_id: ChatId) {
        self.inner
            .lock()
            .await
            .insert(chat_id, ConversationState::AwaitingAnswers);
    }

    pub async fn awaiting_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

pub struct ConversationHandler {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    states: ChatStates,
}

impl ConversationHandler {
    pub fn new(cfg: Arc<Config>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            cfg,
            messenger,
            states: ChatStates::default(),
        }
    }

    pub async fn state(&self, chat_id: ChatId) -> ConversationState {
        self.states.get(chat_id).await
    }

    pub async fn awaiting_count(&self) -> usize {
        self.states.awaiting_count().await
    }

    /// Route one incoming message. Failures are contained here and never
    /// propagate to the update loop.
    pub async fn handle(&self, msg: &IncomingMessage) -> Outcome {
        let chat_id = msg.chat_id;

        match self.states.take(chat_id).await {
            ConversationState::AwaitingAnswers => match self.process_answers(msg).await {
                Ok(AnswerOutcome::Rejected) => Outcome::Rejected,
                Ok(AnswerOutcome::Forwarded) => Outcome::Forwarded,
                Err(e) => {
                    error!("Error: {e}");
                    self.apologize(chat_id).await;
                    Outcome::Failed
                }
            },
            ConversationState::Idle => {
                if !msg.text().is_some_and(command::is_start) {
                    debug!("Ignoring message in idle chat {}", chat_id.0);
                    return Outcome::Ignored;
                }
                match self.handle_start(chat_id).await {
                    Ok(()) => Outcome::Prompted,
                    Err(e) => {
                        error!("Failed to send questionnaire to chat {}: {e}", chat_id.0);
                        Outcome::Failed
                    }
                }
            }
        }
    }

    /// Send the questionnaire and wait for the chat's next message.
    pub async fn handle_start(&self, chat_id: ChatId) -> Result<()> {
        self.messenger
            .send_markdown(&Recipient::Chat(chat_id), &self.cfg.texts.welcome)
            .await?;
        self.states.arm(chat_id).await;
        info!("Questionnaire sent to chat {}", chat_id.0);
        Ok(())
    }

    /// Validate a submission and forward it to the admin.
    ///
    /// A rejected submission re-arms the chat. Errors leave it idle; the
    /// caller owns logging and the apology.
    pub async fn process_answers(&self, msg: &IncomingMessage) -> Result<AnswerOutcome> {
        let texts = &self.cfg.texts;
        let chat = Recipient::Chat(msg.chat_id);
        let answers = msg.text().ok_or(Error::MissingText)?;

        if !has_all_markers(answers) {
            self.messenger
                .send_markdown(&chat, &texts.invalid_format)
                .await?;
            self.states.arm(msg.chat_id).await;
            debug!("Rejected malformed answers from chat {}", msg.chat_id.0);
            return Ok(AnswerOutcome::Rejected);
        }

        let sender = msg.sender.as_ref().ok_or(Error::MissingSender)?;
        let applicant = Applicant::from(sender);
        let report = texts.application_report(
            applicant.user_id,
            &applicant.username,
            &applicant.display_name,
            answers,
        );

        self.messenger
            .send_markdown(&self.cfg.admin_chat, &report)
            .await?;
        self.messenger.send_markdown(&chat, &texts.response).await?;

        info!(
            "Forwarded application from user {} (@{})",
            applicant.user_id, applicant.username
        );
        Ok(AnswerOutcome::Forwarded)
    }

    async fn apologize(&self, chat_id: ChatId) {
        if let Err(e) = self
            .messenger
            .send_text(&Recipient::Chat(chat_id), &self.cfg.texts.error)
            .await
        {
            warn!("Failed to send error notice to chat {}: {e}", chat_id.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, MessageRef};
    use crate::texts::Texts;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    const ADMIN: ChatId = ChatId(-100_500);
    const USER_CHAT: ChatId = ChatId(77);
    const VALID: &str = "1. Designer 2. Freelance advice 3. Prototyping 4. Solo business 5. Alex";

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Mode {
        Markdown,
        Plain,
    }

    #[derive(Default)]
    struct FakeMessenger {
        sends: StdMutex<Vec<(Recipient, Mode, String)>>,
        fail_for: StdMutex<Option<Recipient>>,
    }

    impl FakeMessenger {
        fn sent(&self) -> Vec<(Recipient, Mode, String)> {
            self.sends.lock().unwrap().clone()
        }

        fn fail_sends_to(&self, to: Option<Recipient>) {
            *self.fail_for.lock().unwrap() = to;
        }

        fn record(&self, to: &Recipient, mode: Mode, text: &str) -> Result<MessageRef> {
            if self.fail_for.lock().unwrap().as_ref() == Some(to) {
                return Err(Error::External("telegram error: Bad Request".to_string()));
            }
            let mut sends = self.sends.lock().unwrap();
            sends.push((to.clone(), mode, text.to_string()));
            let chat_id = match to {
                Recipient::Chat(id) => *id,
                Recipient::Channel(_) => ChatId(0),
            };
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(sends.len() as i32),
            })
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_markdown(&self, to: &Recipient, text: &str) -> Result<MessageRef> {
            self.record(to, Mode::Markdown, text)
        }

        async fn send_text(&self, to: &Recipient, text: &str) -> Result<MessageRef> {
            self.record(to, Mode::Plain, text)
        }
    }

    fn setup() -> (ConversationHandler, Arc<FakeMessenger>) {
        let cfg = Arc::new(Config {
            telegram_bot_token: "token".to_string(),
            admin_chat: Recipient::Chat(ADMIN),
            texts: Texts::default(),
        });
        let messenger = Arc::new(FakeMessenger::default());
        let handler = ConversationHandler::new(cfg, messenger.clone());
        (handler, messenger)
    }

    fn sender(username: Option<&str>, first: &str, last: Option<&str>) -> Sender {
        Sender {
            id: UserId(4242),
            username: username.map(str::to_string),
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
        }
    }

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: USER_CHAT,
            sender: Some(sender(Some("alex"), "Alex", Some("Doe"))),
            text: Some(text.to_string()),
        }
    }

    fn to_user(text: &str) -> (Recipient, Mode, String) {
        (Recipient::Chat(USER_CHAT), Mode::Markdown, text.to_string())
    }

    #[test]
    fn marker_check_is_loose() {
        assert!(has_all_markers(VALID));
        assert!(has_all_markers("5. e 4. d 3. c 2. b 1. a"));
        assert!(has_all_markers("11. 2.3.4.5."));
        assert!(!has_all_markers("1. a 2. b 3. c 4. d"));
        assert!(!has_all_markers("I don't want to answer"));
        assert!(!has_all_markers(""));
    }

    #[test]
    fn display_name_derivation() {
        assert_eq!(display_name("A", Some("")), "A");
        assert_eq!(display_name("A", None), "A");
        assert_eq!(display_name("", Some("")), "");
        assert_eq!(display_name("", None), "");
        assert_eq!(display_name("A", Some("B")), "A B");
        assert_eq!(display_name("", Some("B")), "B");
    }

    #[test]
    fn applicant_falls_back_to_placeholder_username() {
        let a = Applicant::from(&sender(None, "Alex", None));
        assert_eq!(a.username, "no_username");
        assert_eq!(a.display_name, "Alex");
        assert_eq!(a.user_id, UserId(4242));

        let b = Applicant::from(&sender(Some("alex"), "Alex", Some("Doe")));
        assert_eq!(b.username, "alex");
        assert_eq!(b.display_name, "Alex Doe");
    }

    #[tokio::test]
    async fn start_sends_welcome_and_arms_chat() {
        let (handler, messenger) = setup();

        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);
        assert_eq!(handler.handle(&message("/start")).await, Outcome::Prompted);

        assert_eq!(messenger.sent(), vec![to_user(&Texts::default().welcome)]);
        assert_eq!(
            handler.state(USER_CHAT).await,
            ConversationState::AwaitingAnswers
        );
    }

    #[tokio::test]
    async fn idle_chat_ignores_plain_text() {
        let (handler, messenger) = setup();

        assert_eq!(handler.handle(&message(VALID)).await, Outcome::Ignored);
        assert!(messenger.sent().is_empty());
        assert_eq!(handler.awaiting_count().await, 0);
    }

    #[tokio::test]
    async fn valid_answers_reach_admin_and_user_is_thanked() {
        let (handler, messenger) = setup();
        let texts = Texts::default();

        handler.handle(&message("/start")).await;
        assert_eq!(handler.handle(&message(VALID)).await, Outcome::Forwarded);

        let sent = messenger.sent();
        assert_eq!(sent.len(), 3);

        let (to, mode, report) = &sent[1];
        assert_eq!(to, &Recipient::Chat(ADMIN));
        assert_eq!(*mode, Mode::Markdown);
        assert_eq!(
            report,
            &texts.application_report(UserId(4242), "alex", "Alex Doe", VALID)
        );
        assert!(report.contains("`4242`"));
        assert!(report.contains(VALID));

        assert_eq!(sent[2], to_user(&texts.response));
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn report_uses_placeholder_without_username() {
        let (handler, messenger) = setup();

        handler.handle(&message("/start")).await;
        let msg = IncomingMessage {
            sender: Some(sender(None, "", None)),
            ..message(VALID)
        };
        assert_eq!(handler.handle(&msg).await, Outcome::Forwarded);

        let report = &messenger.sent()[1].2;
        assert!(report.contains("**Username:** @no_username  \n"));
        assert!(report.contains("**Name:**   \n"));
    }

    #[tokio::test]
    async fn invalid_answers_keep_chat_waiting() {
        let (handler, messenger) = setup();
        let texts = Texts::default();

        handler.handle(&message("/start")).await;
        for _ in 0..3 {
            assert_eq!(
                handler.handle(&message("I don't want to answer")).await,
                Outcome::Rejected
            );
            assert_eq!(
                handler.state(USER_CHAT).await,
                ConversationState::AwaitingAnswers
            );
        }

        let sent = messenger.sent();
        assert_eq!(sent.len(), 4);
        assert!(sent[1..].iter().all(|s| *s == to_user(&texts.invalid_format)));

        // A later valid retry still goes through.
        assert_eq!(handler.handle(&message(VALID)).await, Outcome::Forwarded);
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn start_while_waiting_counts_as_an_answer() {
        let (handler, messenger) = setup();

        handler.handle(&message("/start")).await;
        assert_eq!(handler.handle(&message("/start")).await, Outcome::Rejected);

        assert_eq!(
            messenger.sent().last().unwrap(),
            &to_user(&Texts::default().invalid_format)
        );
    }

    #[tokio::test]
    async fn admin_failure_apologizes_and_resets() {
        let (handler, messenger) = setup();

        handler.handle(&message("/start")).await;
        messenger.fail_sends_to(Some(Recipient::Chat(ADMIN)));
        assert_eq!(handler.handle(&message(VALID)).await, Outcome::Failed);

        let sent = messenger.sent();
        assert_eq!(
            sent.last().unwrap(),
            &(
                Recipient::Chat(USER_CHAT),
                Mode::Plain,
                Texts::default().error
            )
        );
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);

        // Not re-armed: the next message is ignored until /start.
        messenger.fail_sends_to(None);
        assert_eq!(handler.handle(&message(VALID)).await, Outcome::Ignored);
    }

    #[tokio::test]
    async fn message_without_text_fails_and_resets() {
        let (handler, messenger) = setup();

        handler.handle(&message("/start")).await;
        let photo = IncomingMessage {
            text: None,
            ..message("")
        };
        assert_eq!(handler.handle(&photo).await, Outcome::Failed);
        assert_eq!(messenger.sent().last().unwrap().1, Mode::Plain);
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn missing_sender_is_an_error() {
        let (handler, _messenger) = setup();

        let msg = IncomingMessage {
            sender: None,
            ..message(VALID)
        };
        let err = handler.process_answers(&msg).await.unwrap_err();
        assert!(matches!(err, Error::MissingSender));
    }

    #[tokio::test]
    async fn start_trigger_is_exact() {
        let (handler, messenger) = setup();

        for text in ["/START", "/Start", "   /start", "start"] {
            assert_eq!(handler.handle(&message(text)).await, Outcome::Ignored);
        }
        assert!(messenger.sent().is_empty());
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);

        assert_eq!(
            handler.handle(&message("/start@intake_bot ref")).await,
            Outcome::Prompted
        );
    }

    #[tokio::test]
    async fn failed_guidance_send_resets_chat() {
        let (handler, messenger) = setup();

        handler.handle(&message("/start")).await;
        messenger.fail_sends_to(Some(Recipient::Chat(USER_CHAT)));
        assert_eq!(
            handler.handle(&message("no numbers here")).await,
            Outcome::Failed
        );

        assert_eq!(messenger.sent().len(), 1);
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn failed_confirmation_after_report_resets_chat() {
        let (handler, messenger) = setup();

        handler.handle(&message("/start")).await;
        messenger.fail_sends_to(Some(Recipient::Chat(USER_CHAT)));
        assert_eq!(handler.handle(&message(VALID)).await, Outcome::Failed);

        let sent = messenger.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].0, Recipient::Chat(ADMIN));
        assert!(sent[1].2.contains(VALID));
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn failed_welcome_leaves_chat_idle() {
        let (handler, messenger) = setup();

        messenger.fail_sends_to(Some(Recipient::Chat(USER_CHAT)));
        assert_eq!(handler.handle(&message("/start")).await, Outcome::Failed);
        assert_eq!(handler.state(USER_CHAT).await, ConversationState::Idle);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn chats_are_independent() {
        let (handler, messenger) = setup();
        let other = ChatId(78);

        handler.handle(&message("/start")).await;
        let other_msg = IncomingMessage {
            chat_id: other,
            ..message(VALID)
        };
        assert_eq!(handler.handle(&other_msg).await, Outcome::Ignored);
        assert_eq!(
            handler.state(USER_CHAT).await,
            ConversationState::AwaitingAnswers
        );
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn repeated_cycles_send_repeated_reports() {
        let (handler, messenger) = setup();

        for _ in 0..2 {
            handler.handle(&message("/start")).await;
            assert_eq!(handler.handle(&message(VALID)).await, Outcome::Forwarded);
        }

        let reports = messenger
            .sent()
            .into_iter()
            .filter(|(to, _, _)| *to == Recipient::Chat(ADMIN))
            .count();
        assert_eq!(reports, 2);
    }
}
