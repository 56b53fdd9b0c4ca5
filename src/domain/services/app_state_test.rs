use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use serde_json::Value;
use tokio::sync::mpsc;

use super::AppState;
use super::SendPhase;
use super::SendRejection;
use crate::domain::models::Attachment;
use crate::domain::models::Author;
use crate::domain::models::ChatPolicy;
use crate::domain::models::Completion;
use crate::domain::models::CredentialCheck;
use crate::domain::models::CredentialStatus;
use crate::domain::models::Event;
use crate::domain::models::MessageType;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderSelection;
use crate::domain::models::Response;
use crate::domain::models::SceneContextSource;
use crate::domain::services::test_providers::StubProvider;
use crate::domain::services::test_providers::StubReply;
use crate::domain::services::ConversationStore;
use crate::domain::services::Dispatcher;
use crate::infrastructure::scene::StaticSceneContext;

struct BrokenScene {}

#[async_trait]
impl SceneContextSource for BrokenScene {
    #[allow(clippy::implicit_return)]
    async fn snapshot(&self) -> Result<Value> {
        bail!("context file is not valid JSON");
    }
}

struct Harness {
    state: AppState,
    dispatcher: Dispatcher,
    rx: mpsc::UnboundedReceiver<Event>,
    scene: StaticSceneContext,
}

impl Harness {
    fn new() -> Harness {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        return Harness {
            state: AppState::new(ConversationStore::default(), ChatPolicy::default()),
            dispatcher: Dispatcher::new(tx),
            rx,
            scene: StaticSceneContext::new(json!({ "mode": "OBJECT" })),
        };
    }

    fn send(&mut self, text: &str, provider: &Arc<StubProvider>) -> Result<(), SendRejection> {
        self.state.draft = text.to_string();
        let selection = ProviderSelection {
            provider: provider.clone(),
            model: "anthropic/stub".to_string(),
        };
        return self
            .state
            .send_message(|| return Ok(selection), &self.dispatcher);
    }

    async fn next_check(&mut self) -> Result<CredentialCheck> {
        match self.rx.recv().await {
            Some(Event::CredentialChecked(check)) => return Ok(check),
            _ => bail!("Wrong type from recv"),
        }
    }

    async fn next_completion(&mut self) -> Result<Completion> {
        match self.rx.recv().await {
            Some(Event::Completion(completion)) => return Ok(completion),
            _ => bail!("Wrong type from recv"),
        }
    }

    /// Drives one send through validation and dispatch to its completion.
    async fn round_trip(&mut self, text: &str, provider: &Arc<StubProvider>) -> Result<()> {
        self.send(text, provider)?;
        let check = self.next_check().await?;
        self.state
            .handle_credential_check(check, &self.scene, &self.dispatcher)
            .await?;
        assert_eq!(self.state.phase(), SendPhase::AwaitingResponse);

        let completion = self.next_completion().await?;
        self.state.handle_completion(completion);
        return Ok(());
    }

    fn active_messages(&self) -> Vec<crate::domain::models::Message> {
        return self.state.store.active_session().unwrap().messages.clone();
    }
}

mod send_message {
    use super::*;

    #[tokio::test]
    async fn it_rejects_empty_input() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(StubProvider::new(StubReply::Text("Hi".to_string())));

        assert_eq!(harness.send("   \n", &provider), Err(SendRejection::EmptyInput));
        assert_eq!(harness.state.phase(), SendPhase::Idle);
        assert!(harness.rx.try_recv().is_err());
        return Ok(());
    }

    #[tokio::test]
    async fn it_rejects_sends_while_busy() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(StubProvider::new(StubReply::Text("Hi".to_string())));

        harness.send("make a cube", &provider)?;
        assert!(harness.state.is_busy());

        let res = harness.send("make a sphere", &provider);
        assert_eq!(res, Err(SendRejection::Busy));
        assert_eq!(res.unwrap_err().to_string(), "Already processing a request");
        assert_eq!(harness.state.draft, "make a sphere");
        assert!(harness.active_messages().is_empty());

        harness.next_check().await?;
        tokio::task::yield_now().await;
        assert!(harness.rx.try_recv().is_err());
        assert_eq!(provider.validations.load(Ordering::SeqCst), 1);
        assert_eq!(provider.sends.load(Ordering::SeqCst), 0);
        return Ok(());
    }

    #[tokio::test]
    async fn it_rejects_sends_while_awaiting_a_response() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(StubProvider::new(StubReply::Sleep(Duration::from_millis(200))));

        harness.send("make a cube", &provider)?;
        let check = harness.next_check().await?;
        harness
            .state
            .handle_credential_check(check, &harness.scene, &harness.dispatcher)
            .await?;

        assert_eq!(harness.send("again", &provider), Err(SendRejection::Busy));
        assert_eq!(harness.active_messages().len(), 1);

        let completion = harness.next_completion().await?;
        harness.state.handle_completion(completion);
        assert_eq!(provider.sends.load(Ordering::SeqCst), 1);
        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_provider_resolution_failures() -> Result<()> {
        let mut harness = Harness::new();
        harness.state.draft = "make a cube".to_string();

        let res = harness.state.send_message(
            || return Err(anyhow::anyhow!("Anthropic API key not set. Please add it to your config.")),
            &harness.dispatcher,
        );

        assert_eq!(
            res,
            Err(SendRejection::Provider(
                "Anthropic API key not set. Please add it to your config.".to_string()
            ))
        );
        assert!(!harness.state.is_busy());
        assert!(harness.active_messages().is_empty());
        return Ok(());
    }

    #[tokio::test]
    async fn it_leaves_history_alone_when_validation_fails() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(
            StubProvider::new(StubReply::Text("Hi".to_string()))
                .with_credential(CredentialStatus::invalid("Invalid API key format")),
        );

        harness.send("make a cube", &provider)?;
        let check = harness.next_check().await?;
        let res = harness
            .state
            .handle_credential_check(check, &harness.scene, &harness.dispatcher)
            .await;

        assert_eq!(
            res,
            Err(SendRejection::Credential("Invalid API key format".to_string()))
        );
        assert_eq!(harness.state.phase(), SendPhase::Idle);
        assert_eq!(harness.state.draft, "make a cube");
        assert!(harness.active_messages().is_empty());
        assert_eq!(provider.sends.load(Ordering::SeqCst), 0);
        return Ok(());
    }

    #[tokio::test]
    async fn it_records_the_user_message_with_its_attachment() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(StubProvider::new(StubReply::Text("Sure".to_string())));
        harness.state.attachment = Some(Attachment {
            name: "chair.png".to_string(),
            path: "/tmp/chair.png".to_string(),
        });

        harness.round_trip("model this chair", &provider).await?;

        let messages = harness.active_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author, Author::User);
        assert_eq!(messages[0].text, "model this chair");
        assert_eq!(messages[0].attachment.as_ref().unwrap().name, "chair.png");
        assert!(harness.state.draft.is_empty());
        assert!(harness.state.attachment.is_none());
        assert_eq!(harness.state.last_prompt(), Some("model this chair"));
        return Ok(());
    }

    #[tokio::test]
    async fn it_surfaces_scene_context_failures() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(StubProvider::new(StubReply::Text("Hi".to_string())));

        harness.send("make a cube", &provider)?;
        let check = harness.next_check().await?;
        harness
            .state
            .handle_credential_check(check, &BrokenScene {}, &harness.dispatcher)
            .await?;

        assert_eq!(harness.state.phase(), SendPhase::Idle);
        let messages = harness.active_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].message_type(), MessageType::Error);
        insta::assert_snapshot!(messages[1].text, @"Error: InternalError: Failed to read scene context: context file is not valid JSON");
        assert_eq!(provider.sends.load(Ordering::SeqCst), 0);
        return Ok(());
    }
}

mod handle_completion {
    use super::*;

    #[tokio::test]
    async fn it_extracts_code_from_replies() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(StubProvider::new(StubReply::Text(
            "Here you go:\n```python\nbpy.ops.mesh.primitive_cube_add()\n```".to_string(),
        )));

        harness.round_trip("make a cube", &provider).await?;

        let messages = harness.active_messages();
        let reply = messages.last().unwrap();
        assert_eq!(reply.author, Author::Assistant);
        assert!(reply.has_code());
        assert_eq!(reply.code.as_deref(), Some("bpy.ops.mesh.primitive_cube_add()"));
        assert!(!harness.state.is_busy());

        let session = harness.state.store.active_session().unwrap();
        assert_eq!(session.cursor, 1);
        return Ok(());
    }

    #[tokio::test]
    async fn it_records_auth_failures() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(StubProvider::new(StubReply::Fail(ProviderError::Auth(
            "Invalid API key: Authentication failed".to_string(),
        ))));

        harness.round_trip("make a cube", &provider).await?;

        let reply = harness.active_messages().pop().unwrap();
        assert_eq!(reply.message_type(), MessageType::Error);
        assert!(reply.text.contains("Auth"));
        assert!(!harness.state.is_busy());
        return Ok(());
    }

    #[tokio::test]
    async fn it_records_timeouts() -> Result<()> {
        let mut harness = Harness::new();
        let provider = Arc::new(
            StubProvider::new(StubReply::Sleep(Duration::from_secs(30)))
                .with_timeout(Duration::from_millis(50)),
        );

        harness.round_trip("make a cube", &provider).await?;

        let reply = harness.active_messages().pop().unwrap();
        insta::assert_snapshot!(reply.text, @"Error: Timeout: Request to Anthropic API timed out. Please try again.");
        assert!(!harness.state.is_busy());
        return Ok(());
    }

    #[tokio::test]
    async fn it_clears_busy_for_every_outcome() -> Result<()> {
        let replies = vec![
            StubReply::Text("Fine".to_string()),
            StubReply::Fail(ProviderError::Auth("bad key".to_string())),
            StubReply::Fail(ProviderError::Timeout("slow".to_string())),
            StubReply::Fail(ProviderError::MalformedResponse("odd".to_string())),
            StubReply::Fail(ProviderError::Provider {
                status: 500,
                message: "Overloaded".to_string(),
            }),
            StubReply::Fail(ProviderError::Internal("boom".to_string())),
            StubReply::Panic,
        ];

        let mut harness = Harness::new();
        for reply in replies {
            let provider = Arc::new(StubProvider::new(reply));
            harness.round_trip("make a cube", &provider).await?;
            assert_eq!(harness.state.phase(), SendPhase::Idle);
        }

        assert_eq!(harness.active_messages().len(), 14);
        return Ok(());
    }

    #[tokio::test]
    async fn it_ignores_stale_completions() -> Result<()> {
        let mut harness = Harness::new();
        let session_id = harness.state.store.active_session_id();

        harness.state.handle_completion(Completion {
            request_id: 42,
            session_id,
            response: Response::Success {
                text: "late".to_string(),
            },
        });

        assert!(harness.active_messages().is_empty());
        assert!(harness.state.drain_appended().is_empty());
        return Ok(());
    }

    #[tokio::test]
    async fn it_lands_replies_in_the_issuing_session() -> Result<()> {
        let mut harness = Harness::new();
        let first = harness.state.store.active_session_id();
        let provider = Arc::new(StubProvider::new(StubReply::Text("Done".to_string())));

        harness.send("make a cube", &provider)?;
        let check = harness.next_check().await?;
        harness
            .state
            .handle_credential_check(check, &harness.scene, &harness.dispatcher)
            .await?;

        let second = harness.state.store.add_session("Other");
        let completion = harness.next_completion().await?;
        harness.state.handle_completion(completion);

        assert_eq!(harness.state.store.session(&first).unwrap().messages.len(), 2);
        assert!(harness.state.store.session(&second).unwrap().messages.is_empty());

        let appended = harness.state.drain_appended();
        assert_eq!(appended.len(), 2);
        assert!(appended.iter().all(|e| return e.session_id == first));
        return Ok(());
    }

    #[tokio::test]
    async fn it_drops_replies_for_deleted_sessions() -> Result<()> {
        let mut harness = Harness::new();
        let first = harness.state.store.active_session_id();
        let provider = Arc::new(StubProvider::new(StubReply::Text("Done".to_string())));

        harness.send("make a cube", &provider)?;
        let check = harness.next_check().await?;
        harness
            .state
            .handle_credential_check(check, &harness.scene, &harness.dispatcher)
            .await?;

        harness.state.store.add_session("Other");
        harness.state.store.delete_session(&first)?;
        let completion = harness.next_completion().await?;
        harness.state.handle_completion(completion);

        assert!(!harness.state.is_busy());
        assert!(harness.active_messages().is_empty());
        return Ok(());
    }
}
