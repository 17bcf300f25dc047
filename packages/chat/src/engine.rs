// ABOUTME: The per-user turn state machine: naming, gathering, generating, done
// ABOUTME: Turns run under the session lock; diagram failures never fail a turn

use std::sync::Arc;

use drafter_ai::TextGenerator;
use drafter_core::{IdentityResolver, ProjectStore, SpeechSynthesizer, SpeechToText, Utterance};
use drafter_diagrams::Orchestrator;
use tracing::{error, info};

use crate::error::{ChatError, Result};
use crate::prompts;
use crate::session::SessionRegistry;
use crate::types::{ChatReply, ConversationState, Phase};

const DONE_REPLY: &str =
    "Perfect! I've created your project and generated the technical diagrams. You can view them now.";

/// Checks the leading verdict token of a sufficiency assessment. Anything
/// other than SUFFICIENT keeps gathering.
fn is_sufficient(assessment: &str) -> bool {
    assessment
        .split_whitespace()
        .next()
        .map(|token| {
            token
                .trim_end_matches(|c: char| c.is_ascii_punctuation())
                .eq_ignore_ascii_case("sufficient")
        })
        .unwrap_or(false)
}

/// Converts a stream of chat turns into a project description, then triggers
/// project creation and diagram generation. One session per user; each
/// session's turns are mutually exclusive.
pub struct ConversationEngine {
    model: Arc<dyn TextGenerator>,
    orchestrator: Orchestrator,
    projects: Arc<dyn ProjectStore>,
    identity: Arc<dyn IdentityResolver>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    transcriber: Option<Arc<dyn SpeechToText>>,
    sessions: SessionRegistry,
}

impl ConversationEngine {
    pub fn new(
        model: Arc<dyn TextGenerator>,
        orchestrator: Orchestrator,
        projects: Arc<dyn ProjectStore>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            model,
            orchestrator,
            projects,
            identity,
            synthesizer: None,
            transcriber: None,
            sessions: SessionRegistry::new(),
        }
    }

    /// Attaches a speech synthesizer; replies then carry base64 audio.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Attaches a transcriber, enabling `process_voice_message`.
    pub fn with_transcriber(mut self, transcriber: Arc<dyn SpeechToText>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Processes one chat turn for the caller identified by `credential`.
    pub async fn process_message(&self, credential: &str, message: &str) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let user_id = self.identity.resolve(credential)?;
        let session = self.sessions.get_or_create(&user_id);
        let mut state = session.lock().await;
        state.credential = credential.to_string();
        state.history.push(Utterance::user(message));

        let response = match state.phase {
            Phase::Naming => self.naming_turn(&mut state, message).await?,
            Phase::Gathering => self.gathering_turn(&mut state).await?,
            // Reachable only after a failed project creation; re-run from the
            // stored description without another sufficiency check
            Phase::Generating => self.generating_turn(&mut state).await?,
            Phase::Done => DONE_REPLY.to_string(),
        };

        state.history.push(Utterance::assistant(response.as_str()));
        session.touch();

        let requirements_gathered = matches!(state.phase, Phase::Generating | Phase::Done);
        let project_id = state.project.as_ref().map(|p| p.id);
        drop(state);

        let audio = match &self.synthesizer {
            Some(tts) => Some(tts.synthesize(&response).await?),
            None => None,
        };

        Ok(ChatReply {
            response,
            audio,
            requirements_gathered,
            project_id,
        })
    }

    /// Transcribes a voice message and runs it through the text turn path.
    pub async fn process_voice_message(&self, credential: &str, audio: &[u8]) -> Result<ChatReply> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or(ChatError::VoiceUnavailable)?;
        let message = transcriber.transcribe(audio).await?;
        info!(chars = message.len(), "transcribed voice message");
        self.process_message(credential, &message).await
    }

    /// Drops the caller's session so the next turn starts fresh.
    pub fn clear_conversation(&self, credential: &str) -> Result<()> {
        let user_id = self.identity.resolve(credential)?;
        if self.sessions.remove(&user_id) {
            info!(%user_id, "cleared conversation session");
        }
        Ok(())
    }

    async fn naming_turn(&self, state: &mut ConversationState, message: &str) -> Result<String> {
        let name = self
            .model
            .generate(&prompts::name_prompt(message))
            .await?
            .trim()
            .to_string();
        info!(user_id = %state.user_id, project_name = %name, "derived project name");
        state.project_name = Some(name.clone());
        state.phase = Phase::Gathering;

        let reply = self
            .model
            .generate(&prompts::follow_up_prompt(&name, message))
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn gathering_turn(&self, state: &mut ConversationState) -> Result<String> {
        let name = state.project_name.clone().unwrap_or_default();
        let conversation = prompts::render_history(&state.history);

        let assessment = self
            .model
            .generate(&prompts::sufficiency_prompt(&name, &conversation))
            .await?;

        if !is_sufficient(&assessment) {
            let reply = self
                .model
                .generate(&prompts::clarify_prompt(&name, &conversation))
                .await?;
            return Ok(reply.trim().to_string());
        }

        let description = self
            .model
            .generate(&prompts::description_prompt(&name, &conversation))
            .await?
            .trim()
            .to_string();
        info!(user_id = %state.user_id, "requirements sufficient, synthesized project description");
        state.project_description = Some(description);
        state.phase = Phase::Generating;

        self.generating_turn(state).await
    }

    async fn generating_turn(&self, state: &mut ConversationState) -> Result<String> {
        let name = state.project_name.clone().unwrap_or_default();
        let description = state.project_description.clone().unwrap_or_default();

        if state.project.is_none() {
            let project = self
                .projects
                .create_project(&state.credential, &name, &description)
                .await?;
            info!(project_id = project.id, "created project from conversation");
            state.project = Some(project);
        }

        // Diagram generation failure never fails the conversational turn
        if let Some(project) = &state.project {
            match self.orchestrator.infer_optimal_kind(&description).await {
                Ok(kind) => {
                    match self
                        .orchestrator
                        .generate_and_save(project, kind.label(), &description)
                        .await
                    {
                        Ok(diagram) => info!(
                            project_id = project.id,
                            diagram_id = diagram.id,
                            kind = %kind,
                            "generated optimal diagram"
                        ),
                        Err(err) => error!(
                            project_id = project.id,
                            kind = %kind,
                            %err,
                            "diagram generation failed, continuing"
                        ),
                    }
                }
                Err(err) => error!(
                    project_id = project.id,
                    %err,
                    "could not infer diagram kind, continuing"
                ),
            }
        }

        state.phase = Phase::Done;

        let reply = self
            .model
            .generate(&prompts::confirmation_prompt(&name, &description))
            .await?;
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use async_trait::async_trait;
    use drafter_core::{Diagram, DiagramStore, Project, Role, SpeechError, StoreError};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeIdentity;

    impl IdentityResolver for FakeIdentity {
        fn resolve(&self, credential: &str) -> std::result::Result<String, StoreError> {
            Ok(format!("user-{credential}"))
        }
    }

    #[derive(Default)]
    struct FakeProjects {
        created: Mutex<Vec<(String, String)>>,
        failures_remaining: AtomicUsize,
    }

    impl FakeProjects {
        fn failing_once() -> Self {
            let projects = Self::default();
            projects.failures_remaining.store(1, Ordering::SeqCst);
            projects
        }

        fn created_count(&self) -> usize {
            self.created.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProjectStore for FakeProjects {
        async fn create_project(
            &self,
            _credential: &str,
            name: &str,
            description: &str,
        ) -> std::result::Result<Project, StoreError> {
            if self.failures_remaining.load(Ordering::SeqCst) > 0 {
                self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::Database("insert failed".to_string()));
            }
            let mut created = self.created.lock().unwrap();
            created.push((name.to_string(), description.to_string()));
            Ok(Project {
                id: created.len() as i64,
                name: name.to_string(),
                description: description.to_string(),
            })
        }

        async fn get_project(
            &self,
            _id: i64,
        ) -> std::result::Result<Option<Project>, StoreError> {
            Ok(None)
        }
    }

    struct SavingStore;

    #[async_trait]
    impl DiagramStore for SavingStore {
        async fn insert_diagram(
            &self,
            project_id: i64,
            name: &str,
            kind_label: &str,
            content: &str,
        ) -> std::result::Result<Option<Diagram>, StoreError> {
            Ok(Some(Diagram {
                id: 1,
                project_id,
                name: name.to_string(),
                kind_label: kind_label.to_string(),
                content: content.to_string(),
            }))
        }
    }

    struct NoRowStore;

    #[async_trait]
    impl DiagramStore for NoRowStore {
        async fn insert_diagram(
            &self,
            _project_id: i64,
            _name: &str,
            _kind_label: &str,
            _content: &str,
        ) -> std::result::Result<Option<Diagram>, StoreError> {
            Ok(None)
        }
    }

    struct FakeSynthesizer;

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(&self, text: &str) -> std::result::Result<String, SpeechError> {
            Ok(format!("YXVkaW8t{}", text.len()))
        }
    }

    struct FakeTranscriber(&'static str);

    #[async_trait]
    impl SpeechToText for FakeTranscriber {
        async fn transcribe(&self, _audio: &[u8]) -> std::result::Result<String, SpeechError> {
            Ok(self.0.to_string())
        }
    }

    const PAYLOAD: &str =
        r#"{"name": "Task Flow", "diagram": "graph TD\nA[Start] --> B[Add task]"}"#;

    fn engine_with(
        model: Arc<ScriptedModel>,
        projects: Arc<FakeProjects>,
        store: Arc<dyn DiagramStore>,
    ) -> ConversationEngine {
        let orchestrator = Orchestrator::new(model.clone(), store);
        ConversationEngine::new(model, orchestrator, projects, Arc::new(FakeIdentity))
    }

    #[test]
    fn leading_token_decides_sufficiency() {
        assert!(is_sufficient("SUFFICIENT - plenty of detail"));
        assert!(is_sufficient("sufficient."));
        assert!(!is_sufficient("INSUFFICIENT - need more"));
        assert!(!is_sufficient("The detail is sufficient"));
        assert!(!is_sufficient(""));
    }

    #[tokio::test]
    async fn first_utterance_moves_naming_to_gathering() {
        let model = Arc::new(ScriptedModel::from_texts(&[
            "Todo App",
            "Great, Todo App it is! What should it do?",
        ]));
        let projects = Arc::new(FakeProjects::default());
        let engine = engine_with(model.clone(), projects.clone(), Arc::new(SavingStore));

        let reply = engine
            .process_message("token-1", "Build me a todo app")
            .await
            .unwrap();
        assert_eq!(reply.response, "Great, Todo App it is! What should it do?");
        assert!(!reply.requirements_gathered);
        assert_eq!(reply.project_id, None);
        assert_eq!(reply.audio, None);

        let session = engine.sessions().get_or_create("user-token-1");
        let state = session.lock().await;
        assert_eq!(state.phase, Phase::Gathering);
        assert_eq!(state.project_name.as_deref(), Some("Todo App"));
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].role, Role::User);
        assert_eq!(state.history[1].role, Role::Assistant);
        assert_eq!(projects.created_count(), 0);
    }

    #[tokio::test]
    async fn full_flow_creates_exactly_one_project_and_reaches_done() {
        let model = Arc::new(ScriptedModel::from_texts(&[
            // Turn 1: naming
            "Todo App",
            "What should it do?",
            // Turn 2: insufficient
            "INSUFFICIENT - no feature detail yet",
            "Which users does it serve?",
            // Turn 3: sufficient, then the generating step
            "SUFFICIENT - features and users are clear",
            "A todo app with tasks, due dates, and reminders",
            "Flowchart",
            PAYLOAD,
            "VALID",
            "All set, your project and diagram are ready.",
        ]));
        let projects = Arc::new(FakeProjects::default());
        let engine = engine_with(model.clone(), projects.clone(), Arc::new(SavingStore));

        engine.process_message("t", "Build me a todo app").await.unwrap();
        let reply = engine.process_message("t", "It tracks tasks").await.unwrap();
        assert!(!reply.requirements_gathered);

        let reply = engine
            .process_message("t", "Due dates and reminders, please generate")
            .await
            .unwrap();
        assert!(reply.requirements_gathered);
        assert_eq!(reply.project_id, Some(1));
        assert_eq!(reply.response, "All set, your project and diagram are ready.");
        assert_eq!(projects.created_count(), 1);

        // Done turns are canned and cost zero capability calls
        let calls_before = model.call_count();
        let reply = engine.process_message("t", "anything else?").await.unwrap();
        assert_eq!(
            reply.response,
            "Perfect! I've created your project and generated the technical diagrams. You can view them now."
        );
        assert_eq!(model.call_count(), calls_before);
        assert_eq!(projects.created_count(), 1);
    }

    #[tokio::test]
    async fn diagram_failure_does_not_fail_the_turn() {
        let model = Arc::new(ScriptedModel::from_texts(&[
            "Todo App",
            "What should it do?",
            "SUFFICIENT - clear",
            "A todo app",
            "Flowchart",
            PAYLOAD,
            "VALID",
            "Done, diagrams on the way.",
        ]));
        let projects = Arc::new(FakeProjects::default());
        // The diagram store loses the row; persistence failure is swallowed here
        let engine = engine_with(model.clone(), projects.clone(), Arc::new(NoRowStore));

        engine.process_message("t", "Build me a todo app").await.unwrap();
        let reply = engine.process_message("t", "Tasks with due dates").await.unwrap();
        assert!(reply.requirements_gathered);
        assert_eq!(reply.response, "Done, diagrams on the way.");

        let session = engine.sessions().get_or_create("user-t");
        assert_eq!(session.lock().await.phase, Phase::Done);
    }

    #[tokio::test]
    async fn failed_project_creation_fails_the_turn_and_is_retried_next_turn() {
        let model = Arc::new(ScriptedModel::from_texts(&[
            "Todo App",
            "What should it do?",
            "SUFFICIENT - clear",
            "A todo app",
            // Turn 3 re-runs the generating step directly
            "Flowchart",
            PAYLOAD,
            "VALID",
            "Project created, diagram generated.",
        ]));
        let projects = Arc::new(FakeProjects::failing_once());
        let engine = engine_with(model.clone(), projects.clone(), Arc::new(SavingStore));

        engine.process_message("t", "Build me a todo app").await.unwrap();
        let err = engine.process_message("t", "Tasks with due dates").await.unwrap_err();
        assert!(matches!(err, ChatError::Store(_)));

        let session = engine.sessions().get_or_create("user-t");
        {
            let state = session.lock().await;
            assert_eq!(state.phase, Phase::Generating);
            assert_eq!(state.project_description.as_deref(), Some("A todo app"));
            assert!(state.project.is_none());
        }

        let reply = engine.process_message("t", "try again").await.unwrap();
        assert_eq!(reply.response, "Project created, diagram generated.");
        assert_eq!(reply.project_id, Some(1));
        assert_eq!(projects.created_count(), 1);
        assert_eq!(session.lock().await.phase, Phase::Done);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_work() {
        let model = Arc::new(ScriptedModel::from_texts(&[]));
        let engine = engine_with(
            model.clone(),
            Arc::new(FakeProjects::default()),
            Arc::new(SavingStore),
        );

        let err = engine.process_message("t", "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(model.call_count(), 0);
        assert!(engine.sessions().is_empty());
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_user_keep_history_intact() {
        let model = Arc::new(ScriptedModel::from_texts(&[
            "Todo App",
            "What should it do?",
            // Two gathering turns, serialized by the session lock
            "INSUFFICIENT - more please",
            "Go on",
            "INSUFFICIENT - more please",
            "Go on",
        ]));
        let engine = Arc::new(engine_with(
            model.clone(),
            Arc::new(FakeProjects::default()),
            Arc::new(SavingStore),
        ));

        engine.process_message("t", "Build me a todo app").await.unwrap();

        let a = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.process_message("t", "alpha detail").await })
        };
        let b = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.process_message("t", "beta detail").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let session = engine.sessions().get_or_create("user-t");
        let state = session.lock().await;
        assert_eq!(state.history.len(), 6);
        let count = |text: &str| {
            state
                .history
                .iter()
                .filter(|u| u.role == Role::User && u.content == text)
                .count()
        };
        assert_eq!(count("alpha detail"), 1);
        assert_eq!(count("beta detail"), 1);
    }

    #[tokio::test]
    async fn voice_turn_transcribes_and_replies_with_audio() {
        let model = Arc::new(ScriptedModel::from_texts(&[
            "Todo App",
            "What should it do?",
        ]));
        let orchestrator = Orchestrator::new(model.clone(), Arc::new(SavingStore));
        let engine = ConversationEngine::new(
            model,
            orchestrator,
            Arc::new(FakeProjects::default()),
            Arc::new(FakeIdentity),
        )
        .with_synthesizer(Arc::new(FakeSynthesizer))
        .with_transcriber(Arc::new(FakeTranscriber("Build me a todo app")));

        let reply = engine.process_voice_message("t", b"pcm-bytes").await.unwrap();
        assert_eq!(reply.response, "What should it do?");
        assert!(reply.audio.is_some());

        let session = engine.sessions().get_or_create("user-t");
        let state = session.lock().await;
        assert_eq!(state.history[0].content, "Build me a todo app");
    }

    #[tokio::test]
    async fn voice_turn_without_a_transcriber_is_rejected() {
        let model = Arc::new(ScriptedModel::from_texts(&[]));
        let engine = engine_with(
            model,
            Arc::new(FakeProjects::default()),
            Arc::new(SavingStore),
        );

        let err = engine.process_voice_message("t", b"pcm").await.unwrap_err();
        assert!(matches!(err, ChatError::VoiceUnavailable));
    }

    #[tokio::test]
    async fn clear_conversation_starts_the_next_turn_fresh() {
        let model = Arc::new(ScriptedModel::from_texts(&[
            "Todo App",
            "What should it do?",
            "Notes App",
            "Tell me about the notes",
        ]));
        let engine = engine_with(
            model,
            Arc::new(FakeProjects::default()),
            Arc::new(SavingStore),
        );

        engine.process_message("t", "Build me a todo app").await.unwrap();
        engine.clear_conversation("t").unwrap();
        assert!(engine.sessions().is_empty());

        let reply = engine.process_message("t", "Build me a notes app").await.unwrap();
        assert_eq!(reply.response, "Tell me about the notes");
        let session = engine.sessions().get_or_create("user-t");
        let state = session.lock().await;
        assert_eq!(state.project_name.as_deref(), Some("Notes App"));
        assert_eq!(state.history.len(), 2);
    }
}
