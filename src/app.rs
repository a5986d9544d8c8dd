use std::path::PathBuf;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::state::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Models,
    Chat,
    Input,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Input => FocusPane::Models,
            FocusPane::Models => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Input,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub focus: FocusPane,
    pub session: Session,

    // Prompt input
    pub input: String,
    pub input_cursor: usize, // in chars, not bytes

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // inner size, updated during render
    pub chat_width: u16,
    pub chat_rows: u16, // wrapped content height, measured during render
    pub follow_chat: bool, // keep the newest turn in view

    // Model sidebar
    pub model_list_state: ListState,

    // In-flight question
    pub query_task: Option<JoinHandle<Result<String>>>,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    /// Last failure, shown until dismissed or the next prompt goes out.
    pub error_notice: Option<String>,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub models_area: Option<Rect>,

    /// Where a newly picked model is remembered; `None` keeps choices in memory only.
    pub config_path: Option<PathBuf>,
}

impl App {
    pub fn new(session: Session, config_path: Option<PathBuf>) -> Self {
        let mut model_list_state = ListState::default();
        model_list_state.select(session.selected_index());

        Self {
            should_quit: false,
            focus: FocusPane::Input,
            session,

            input: String::new(),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_rows: 0,
            follow_chat: true,

            model_list_state,

            query_task: None,
            animation_frame: 0,

            error_notice: None,

            chat_area: None,
            models_area: None,

            config_path,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.query_task.is_some()
    }

    /// Prompt input is accepted only with a model to ask and nothing in flight.
    pub fn accepts_prompt(&self) -> bool {
        self.session.has_models() && !self.is_processing()
    }

    /// Records the user turn and starts the question on a background task.
    pub fn submit_prompt(&mut self) {
        if !self.accepts_prompt() {
            return;
        }
        let prompt = std::mem::take(&mut self.input);
        self.input_cursor = 0;

        match self.session.begin_turn(&prompt) {
            Some(question) => {
                debug!(
                    model = question.model(),
                    chars = question.prompt().chars().count(),
                    "question submitted"
                );
                self.error_notice = None;
                self.query_task = Some(tokio::spawn(question.run()));
                self.scroll_to_bottom();
            }
            None => {
                self.input_cursor = prompt.chars().count();
                self.input = prompt;
            }
        }
    }

    /// Collects the answer if the background task is done; never waits.
    pub async fn poll_query(&mut self) {
        if self.query_task.as_ref().is_some_and(|t| t.is_finished()) {
            self.finish_query().await;
        }
    }

    /// Waits for the in-flight question and records its outcome.
    pub async fn finish_query(&mut self) {
        let Some(task) = self.query_task.take() else {
            return;
        };
        let answer = task.await.unwrap_or_else(|e| Err(Error::Task(e)));
        if let Err(e) = self.session.finish_turn(answer) {
            self.error_notice = Some(e.to_string());
        }
        self.animation_frame = 0;
        self.scroll_to_bottom();
    }

    pub fn dismiss_notice(&mut self) {
        self.error_notice = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_processing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.session.conversation().all()
    }

    // Chat scrolling
    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_chat = self.chat_scroll == max;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_chat = self.chat_scroll == self.max_scroll();
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.visible_height() / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.visible_height() / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_chat = self.max_scroll() == 0;
    }

    /// Jumps to the newest turn and keeps following it as content grows.
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_chat = true;
    }

    /// Records how many rows the chat takes once wrapped to the pane width.
    /// Called by the renderer before it draws, so the scroll offset it uses is
    /// always within the content just measured.
    pub fn set_chat_rows(&mut self, rows: usize) {
        self.chat_rows = rows.min(u16::MAX as usize) as u16;
        let max = self.max_scroll();
        self.chat_scroll = if self.follow_chat {
            max
        } else {
            self.chat_scroll.min(max)
        };
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    fn max_scroll(&self) -> u16 {
        self.chat_rows.saturating_sub(self.visible_height())
    }

    // Model sidebar
    pub fn models_nav_down(&mut self) {
        let len = self.session.registry().len();
        if len > 0 {
            let i = self.model_list_state.selected().unwrap_or(0);
            self.model_list_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn models_nav_up(&mut self) {
        if !self.session.has_models() {
            return;
        }
        let i = self.model_list_state.selected().unwrap_or(0);
        self.model_list_state.select(Some(i.saturating_sub(1)));
    }

    /// Makes the highlighted model the one later prompts go to. Turns already
    /// in the conversation are left as they are.
    pub fn select_highlighted_model(&mut self) {
        let Some(index) = self.model_list_state.selected() else {
            return;
        };
        if self.session.selected_index() == Some(index) {
            return;
        }
        let Some(name) = self.session.select_model(index).map(str::to_string) else {
            return;
        };
        if let Some(path) = &self.config_path {
            if let Err(e) = Config::save_default_model_to(path, &name) {
                warn!(error = %e, "could not remember selected model");
            }
        }
    }
}
