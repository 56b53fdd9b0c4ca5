#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::path;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use serde_json::json;
use tokio::io;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::domain::models::Attachment;
use crate::domain::models::Author;
use crate::domain::models::Event;
use crate::domain::models::ExecutorBox;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderSelection;
use crate::domain::models::SceneContextBox;
use crate::domain::models::SlashCommand;
use crate::domain::services::events::EventsService;
use crate::domain::services::export_transcript;
use crate::domain::services::AppState;
use crate::domain::services::Dispatcher;
use crate::domain::services::StoreFile;
use crate::infrastructure::executors::clipboard::ClipboardExecutor;
use crate::infrastructure::executors::ExecutorManager;
use crate::infrastructure::providers::ProviderManager;
use crate::infrastructure::scene::FileSceneContext;
use crate::infrastructure::scene::StaticSceneContext;

/// Lines of code shown before asking to run it.
const PREVIEW_LINES: usize = 10;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
/new (/n) [NAME?] - Starts a new chat session.
/sessions (/s) - Lists chat sessions.
/switch (/sw) [NUMBER] - Switches to the chat session at NUMBER from /sessions.
/rename [NAME] - Renames the current chat session.
/delete [NUMBER?] - Deletes a chat session, the current one when NUMBER is omitted.
/clear - Removes every message from the current chat session, after asking to confirm.
/models (/ml) - Lists the models of the configured provider.
/attach (/a) [PATH?] - References a file in your next message. Without PATH the attachment is removed.
/run (/r) [CODE_NUMBER?] - Runs extracted code with the configured executor. Defaults to the latest code.
/copy (/c) [CODE_NUMBER?] - Copies extracted code to the clipboard. Defaults to the latest code.
/export [PATH] - Writes the current chat session to a text file.
/up, /down - Moves through the messages of the current chat session.
/retry - Sends your last prompt again.
/help (/h) - Provides this help menu.
/quit /exit (/q) - Exit Meshchat.
"#;

    return text.trim().to_string();
}

pub type Resolver = Box<dyn Fn(&Config) -> Result<ProviderSelection> + Send + Sync>;

/// Work held back until the user answers y/N.
enum Staged {
    Code(String),
    Clear(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The terminal front end. Owns the application state and turns events into
/// printed lines, which are buffered until the loop flushes them.
pub struct App {
    config: Config,
    state: AppState,
    dispatcher: Dispatcher,
    resolve: Resolver,
    scene: SceneContextBox,
    executor: ExecutorBox,
    clipboard: ClipboardExecutor,
    store_file: StoreFile,
    staged: Option<Staged>,
    quitting: bool,
    output: Vec<String>,
}

impl App {
    pub fn new(
        config: Config,
        state: AppState,
        dispatcher: Dispatcher,
        store_file: StoreFile,
        scene: SceneContextBox,
        executor: ExecutorBox,
    ) -> App {
        return App {
            config,
            state,
            dispatcher,
            resolve: Box::new(ProviderManager::select),
            scene,
            executor,
            clipboard: ClipboardExecutor::default(),
            store_file,
            staged: None,
            quitting: false,
            output: vec![],
        };
    }

    #[cfg(test)]
    pub fn with_resolver(mut self, resolve: Resolver) -> App {
        self.resolve = resolve;
        return self;
    }

    pub fn drain_output(&mut self) -> Vec<String> {
        return self.output.drain(..).collect();
    }

    pub async fn handle_event(&mut self, event: Event) -> Flow {
        let is_tick = event == Event::UITick();
        let mut flow = Flow::Continue;

        match event {
            Event::Input(line) => {
                flow = self.handle_input(&line).await;
            }
            Event::InputClosed() => {
                self.quitting = true;
            }
            Event::CredentialChecked(check) => {
                if let Err(rejection) = self
                    .state
                    .handle_credential_check(check, self.scene.as_ref(), &self.dispatcher)
                    .await
                {
                    self.error(&rejection.to_string());
                }
            }
            Event::Completion(completion) => {
                self.state.handle_completion(completion);
            }
            Event::UITick() => {}
        }

        self.render_appended();
        if !is_tick {
            self.save().await;
        }

        if flow == Flow::Quit || (self.quitting && !self.state.is_busy()) {
            return Flow::Quit;
        }

        return Flow::Continue;
    }

    fn greet(&mut self, provider: ProviderName) {
        let settings = self.config.provider_settings(provider);
        let model = if settings.model.is_empty() {
            "default model".to_string()
        } else {
            settings.model
        };

        self.print(&format!(
            "Meshchat {} using {} ({model}). Type /help for commands.",
            env!("CARGO_PKG_VERSION"),
            provider.label()
        ));

        if let Some(session) = self.state.store.active_session() {
            let text = format!(
                "Chat: {} ({} messages)",
                session.name,
                session.messages.len()
            );
            self.status(&text);
        }
    }

    async fn handle_input(&mut self, line: &str) -> Flow {
        if let Some(staged) = self.staged.take() {
            let answer = line.trim().to_lowercase();
            let confirmed = answer == "y" || answer == "yes";
            match staged {
                Staged::Code(code) if confirmed => self.run_code(&code).await,
                Staged::Clear(id) if confirmed => {
                    if let Err(err) = self.clear_session(&id) {
                        self.error(&err.to_string());
                    }
                }
                Staged::Code(_) => self.info("Execution cancelled."),
                Staged::Clear(_) => self.info("Clear cancelled."),
            }
            return Flow::Continue;
        }

        if let Some(command) = SlashCommand::parse(line) {
            match self.handle_command(command).await {
                Ok(flow) => return flow,
                Err(err) => {
                    self.error(&err.to_string());
                    return Flow::Continue;
                }
            }
        }

        if line.trim_start().starts_with('/') {
            self.error(&format!(
                "Unknown command or missing argument: {}. Type /help for commands.",
                line.trim()
            ));
            return Flow::Continue;
        }

        self.send(line);
        return Flow::Continue;
    }

    /// Sends `prompt` as the draft. A rejected send puts the previous draft
    /// back, as it may still belong to a send awaiting validation.
    fn send(&mut self, prompt: &str) {
        let previous = std::mem::replace(&mut self.state.draft, prompt.to_string());

        let config = &self.config;
        let resolve = &self.resolve;
        match self
            .state
            .send_message(|| return resolve(config), &self.dispatcher)
        {
            Ok(()) => self.status("Thinking..."),
            Err(rejection) => {
                self.state.draft = previous;
                self.error(&rejection.to_string());
            }
        }
    }

    async fn handle_command(&mut self, command: SlashCommand) -> Result<Flow> {
        if command.is_quit() {
            if self.state.is_busy() {
                self.quitting = true;
                self.status("Waiting for the pending response before quitting...");
                return Ok(Flow::Continue);
            }
            return Ok(Flow::Quit);
        }

        if command.is_help() {
            self.print(&help_text());
        }

        if command.is_new_session() {
            let id = self.state.store.add_session(&command.rest());
            let name = self.session_name(&id);
            self.info(&format!("Started {name}."));
        }

        if command.is_list_sessions() {
            self.list_sessions();
        }

        if command.is_switch_session() {
            let id = self.session_id_at(command.index())?;
            self.state.store.select_session(&id)?;
            let name = self.session_name(&id);
            self.info(&format!("Switched to {name}."));
            self.print_session();
        }

        if command.is_rename_session() {
            let id = self.state.store.active_session_id();
            self.state.store.rename_session(&id, &command.rest())?;
            let name = self.session_name(&id);
            self.info(&format!("Renamed chat to {name}."));
        }

        if command.is_delete_session() {
            let id = if command.args.is_empty() {
                self.state.store.active_session_id()
            } else {
                self.session_id_at(command.index())?
            };
            let name = self.session_name(&id);
            self.state.store.delete_session(&id)?;

            let active_id = self.state.store.active_session_id();
            let active_name = self.session_name(&active_id);
            self.info(&format!("Deleted {name}. Now in {active_name}."));
        }

        if command.is_clear() {
            let id = self.state.store.active_session_id();
            let count = self
                .state
                .store
                .session(&id)
                .map(|e| return e.messages.len())
                .unwrap_or_default();
            let name = self.session_name(&id);
            self.print(&format!(
                "Remove all {count} messages from {name}? [y/N]"
            ));
            self.staged = Some(Staged::Clear(id));
        }

        if command.is_model_list() {
            self.list_models()?;
        }

        if command.is_attach() {
            self.attach(&command.rest())?;
        }

        if command.is_run_code() {
            let code = self.find_code(&command)?;
            if self.state.policy.confirm_execution {
                self.stage_code(code);
            } else {
                self.run_code(&code).await;
            }
        }

        if command.is_copy_code() {
            let code = self.find_code(&command)?;
            self.clipboard.copy(&code)?;
            self.info("Copied code to clipboard.");
        }

        if command.is_export() {
            let file = path::PathBuf::from(command.rest());
            let session = self
                .state
                .store
                .active_session()
                .ok_or_else(|| return anyhow!("No active chat session"))?;
            export_transcript(&file, session, self.state.policy.show_timestamps).await?;
            self.info(&format!("Exported chat to {}.", file.display()));
        }

        if command.is_scroll_up() || command.is_scroll_down() {
            let id = self.state.store.active_session_id();
            if let Some(session) = self.state.store.session_mut(&id) {
                if command.is_scroll_up() {
                    session.up();
                } else {
                    session.down();
                }
            }
            self.print_cursor(&id);
        }

        if command.is_retry() {
            match self.state.last_prompt() {
                Some(prompt) => {
                    let prompt = prompt.to_string();
                    self.send(&prompt);
                }
                None => bail!("Nothing to retry yet."),
            }
        }

        return Ok(Flow::Continue);
    }

    fn session_name(&self, id: &str) -> String {
        return self
            .state
            .store
            .session(id)
            .map(|e| return e.name.to_string())
            .unwrap_or_default();
    }

    fn session_id_at(&self, index: Option<usize>) -> Result<String> {
        if let Some(session) = index.and_then(|idx| return self.state.store.sessions().get(idx)) {
            return Ok(session.id.to_string());
        }

        bail!("No chat session at that position. Use /sessions to list them.");
    }

    fn list_sessions(&mut self) {
        let active = self.state.store.active_index();
        let lines = self
            .state
            .store
            .sessions()
            .iter()
            .enumerate()
            .map(|(idx, session)| {
                let marker = if idx == active { "*" } else { "-" };
                return format!(
                    "{marker} ({}) {} - {} messages, created {}",
                    idx + 1,
                    session.name,
                    session.messages.len(),
                    session.created_at
                );
            })
            .collect::<Vec<String>>();

        self.print(&lines.join("\n"));
    }

    fn list_models(&mut self) -> Result<()> {
        let name = self.config.provider()?;
        let settings = self.config.provider_settings(name);
        let selected = settings.model.to_string();
        let provider = ProviderManager::get(name, settings);

        let lines = provider
            .list_models()
            .iter()
            .enumerate()
            .map(|(idx, model)| {
                let is_selected = model.id == selected || (selected.is_empty() && idx == 0);
                let marker = if is_selected { "*" } else { "-" };
                return format!(
                    "{marker} ({}) {} ({})",
                    idx + 1,
                    model.id,
                    model.display_name
                );
            })
            .collect::<Vec<String>>();

        self.print(&format!("{}:\n{}", name.label(), lines.join("\n")));
        return Ok(());
    }

    fn attach(&mut self, file: &str) -> Result<()> {
        if file.is_empty() {
            self.state.attachment = None;
            self.info("Attachment removed.");
            return Ok(());
        }

        let file_path = path::PathBuf::from(file);
        if !file_path.is_file() {
            bail!(format!("No file found at {file}"));
        }

        let name = file_path
            .file_name()
            .map(|e| return e.to_string_lossy().to_string())
            .unwrap_or_else(|| return file.to_string());

        self.info(&format!("Attached {name} to your next message."));
        self.state.attachment = Some(Attachment {
            name,
            path: file.to_string(),
        });
        return Ok(());
    }

    /// Extracted code in the current chat session, picked by 1-based number
    /// or the latest when no number is given.
    fn find_code(&self, command: &SlashCommand) -> Result<String> {
        let blocks = self
            .state
            .store
            .active_session()
            .map(|session| {
                return session
                    .messages
                    .iter()
                    .filter_map(|e| return e.code.clone())
                    .collect::<Vec<String>>();
            })
            .unwrap_or_default();

        if blocks.is_empty() {
            bail!("No code found in this chat yet.");
        }

        if command.args.is_empty() {
            if let Some(code) = blocks.last() {
                return Ok(code.to_string());
            }
        }

        if let Some(code) = command.index().and_then(|idx| return blocks.get(idx)) {
            return Ok(code.to_string());
        }

        bail!(format!(
            "No code numbered {}. This chat has {} code blocks.",
            command.rest(),
            blocks.len()
        ));
    }

    fn stage_code(&mut self, code: String) {
        let lines = code.lines().collect::<Vec<&str>>();
        let mut preview = lines
            .iter()
            .take(PREVIEW_LINES)
            .map(|line| return format!("  {line}"))
            .collect::<Vec<String>>()
            .join("\n");
        if lines.len() > PREVIEW_LINES {
            preview = format!(
                "{preview}\n  ... ({} more lines)",
                lines.len() - PREVIEW_LINES
            );
        }

        self.print(&preview);
        self.print(&format!(
            "Run this code with the {} executor? [y/N]",
            self.executor.name()
        ));
        self.staged = Some(Staged::Code(code));
    }

    fn clear_session(&mut self, id: &str) -> Result<()> {
        self.state.store.clear(id)?;
        let name = self.session_name(id);
        self.info(&format!("Cleared {name}."));
        return Ok(());
    }

    async fn run_code(&mut self, code: &str) {
        match self.executor.execute(code).await {
            Ok(output) => {
                self.info("Code executed successfully.");
                if !output.trim().is_empty() {
                    self.print(output.trim_end());
                }
            }
            Err(err) => {
                tracing::error!(executor = %self.executor.name(), error = ?err, "Failed to execute code");
                self.error(&err.to_string());
            }
        }
    }

    fn print_session(&mut self) {
        let session = match self.state.store.active_session() {
            Some(session) => session,
            None => return,
        };

        let rendered = session
            .messages
            .iter()
            .enumerate()
            .map(|(idx, message)| return self.render_message(&session.id, message, idx))
            .collect::<Vec<String>>();

        self.output.extend(rendered);
    }

    fn print_cursor(&mut self, session_id: &str) {
        let session = match self.state.store.session(session_id) {
            Some(session) => session,
            None => return,
        };

        let message = match session.messages.get(session.cursor) {
            Some(message) => message,
            None => {
                self.info("This chat has no messages yet.");
                return;
            }
        };

        let rendered = format!(
            "({}/{}) {}",
            session.cursor + 1,
            session.messages.len(),
            self.render_message(session_id, message, session.cursor)
        );
        self.output.push(rendered);
    }

    fn render_appended(&mut self) {
        let appended = self.state.drain_appended();
        for (pos, entry) in appended.iter().enumerate() {
            // Later entries for the same session sit after this one.
            let later = appended[pos + 1..]
                .iter()
                .filter(|e| return e.session_id == entry.session_id)
                .count();
            let index = self
                .state
                .store
                .session(&entry.session_id)
                .map(|e| return e.messages.len().saturating_sub(later + 1))
                .unwrap_or_default();

            let rendered = self.render_message(&entry.session_id, &entry.message, index);
            self.output.push(rendered);
        }
    }

    /// 1-based number of the code block held by the message at `index`.
    fn code_number(&self, session_id: &str, index: usize) -> usize {
        let count = self
            .state
            .store
            .session(session_id)
            .map(|session| {
                return session
                    .messages
                    .iter()
                    .take(index + 1)
                    .filter(|e| return e.has_code())
                    .count();
            })
            .unwrap_or_default();

        return count.max(1);
    }

    fn render_message(&self, session_id: &str, message: &Message, index: usize) -> String {
        let author = message.author.to_string();
        let mut header = match (message.author, message.message_type()) {
            (Author::User, _) => author
                .if_supports_color(Stream::Stdout, |e| return e.cyan())
                .to_string(),
            (Author::Assistant, MessageType::Error) => author
                .if_supports_color(Stream::Stdout, |e| return e.red())
                .to_string(),
            (Author::Assistant, MessageType::Normal) => author
                .if_supports_color(Stream::Stdout, |e| return e.green())
                .to_string(),
        };

        if self.state.policy.show_timestamps {
            let timestamp = format!("[{}]", message.timestamp);
            header = format!(
                "{} {header}",
                timestamp.if_supports_color(Stream::Stdout, |e| return e.dimmed())
            );
        }

        let active_id = self.state.store.active_session().map(|e| return e.id.as_str());
        if active_id != Some(session_id) {
            let notice = format!("(in {})", self.session_name(session_id));
            header = format!(
                "{header} {}",
                notice.if_supports_color(Stream::Stdout, |e| return e.dimmed())
            );
        }

        let mut lines = vec![format!("{header}:"), message.text.trim_end().to_string()];

        if let Some(attachment) = &message.attachment {
            let text = format!("Attachment: {} ({})", attachment.name, attachment.path);
            lines.push(
                text.if_supports_color(Stream::Stdout, |e| return e.dimmed())
                    .to_string(),
            );
        }

        if message.has_code() {
            let number = self.code_number(session_id, index);

            let hint = format!("Code ({number}) extracted. Use /run {number} to execute it or /copy {number} to copy it.");
            lines.push(
                hint.if_supports_color(Stream::Stdout, |e| return e.yellow())
                    .to_string(),
            );
        }

        return lines.join("\n");
    }

    async fn save(&mut self) {
        if let Err(err) = self.store_file.save(&self.state.store).await {
            tracing::error!(
                path = %self.store_file.path().display(),
                error = ?err,
                "Failed to save chat sessions"
            );
            self.error(&format!("Failed to save chat sessions: {err}"));
        }
    }

    fn print(&mut self, text: &str) {
        self.output.push(text.to_string());
    }

    fn info(&mut self, text: &str) {
        self.output.push(
            text.if_supports_color(Stream::Stdout, |e| return e.blue())
                .to_string(),
        );
    }

    fn status(&mut self, text: &str) {
        self.output.push(
            text.if_supports_color(Stream::Stdout, |e| return e.dimmed())
                .to_string(),
        );
    }

    fn error(&mut self, text: &str) {
        let text = format!("Error: {text}");
        self.output.push(
            text.if_supports_color(Stream::Stdout, |e| return e.red())
                .to_string(),
        );
    }

    fn flush(&mut self) {
        for line in self.drain_output() {
            println!("{line}");
        }
    }
}

pub async fn start(config: Config) -> Result<()> {
    let policy = config.chat_policy()?;
    let provider = config.provider()?;

    let executor = ExecutorManager::get(config.executor()?, &config)?;
    executor.health_check().await?;

    let store_file = StoreFile::new(config.store_path());
    let store = store_file.load(policy.max_message_count).await?;
    let scene: SceneContextBox = match config.context_path() {
        Some(path) => Box::new(FileSceneContext::new(Some(path))),
        None => Box::new(StaticSceneContext::new(json!({}))),
    };

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let mut app = App::new(
        config,
        AppState::new(store, policy),
        Dispatcher::new(tx),
        store_file,
        scene,
        executor,
    );
    app.greet(provider);
    app.flush();

    let mut events = EventsService::new(BufReader::new(io::stdin()), rx);
    loop {
        let event = events.next().await?;
        let flow = app.handle_event(event).await;
        app.flush();

        if flow == Flow::Quit {
            break;
        }
    }

    return Ok(());
}
