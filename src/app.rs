use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::error;

use crate::api::ChatError;

/// Fixed reply shown for any failed exchange. The underlying error is
/// logged, never rendered.
pub const ERROR_REPLY: &str = "Sorry, something went wrong. Please try again.";

/// Placeholder line shown while a request is in flight.
pub const THINKING_TEXT: &str = "Generating a response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline,
}

pub struct App {
    pub should_quit: bool,

    // Transcript (append-only)
    pub messages: Vec<Message>,

    // Input state
    pub input: String,
    pub cursor: usize, // char index into input

    // One submission at a time; `sending` guards begin_send regardless of
    // what the UI affordance shows.
    pub sending: bool,
    pub pending: Option<JoinHandle<Result<String, ChatError>>>,

    // Transcript scroll state
    pub scroll: u16,
    pub chat_height: u16, // inner size of the transcript pane, set on render
    pub chat_width: u16,

    // Animation state for the thinking placeholder (0-2 ellipsis frames)
    pub animation_frame: u8,

    // Startup health probe, advisory only
    pub health_probe: Option<JoinHandle<Result<bool, ChatError>>>,
    pub backend: BackendStatus,

    // Send affordance area for mouse hit-testing (updated during render)
    pub send_area: Option<Rect>,

    pub base_url: String,
}

impl App {
    pub fn new(base_url: &str) -> Self {
        Self {
            should_quit: false,
            messages: Vec::new(),
            input: String::new(),
            cursor: 0,
            sending: false,
            pending: None,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            health_probe: None,
            backend: BackendStatus::Checking,
            send_area: None,
            base_url: base_url.to_string(),
        }
    }

    /// Start one submission: trim, validate, append the user message and
    /// clear the input. Returns the text to dispatch, or None when the input
    /// is empty/whitespace or a request is already in flight. The actual
    /// dispatch happens in the event handler so this stays synchronous.
    pub fn begin_send(&mut self, raw: &str) -> Option<String> {
        let message = raw.trim();
        if message.is_empty() || self.sending {
            return None;
        }

        self.messages.push(Message {
            role: Role::User,
            text: message.to_string(),
        });

        self.input.clear();
        self.cursor = 0;
        self.sending = true;
        self.scroll_to_bottom();

        Some(message.to_string())
    }

    /// Settle the in-flight submission. Runs on every exit path of the
    /// exchange: success appends the reply verbatim, any failure appends the
    /// fixed apology and logs the detail.
    pub fn finish_send(&mut self, result: Result<String, ChatError>) {
        let text = match result {
            Ok(reply) => reply,
            Err(err) => {
                error!(error = %err, "chat request failed");
                ERROR_REPLY.to_string()
            }
        };

        self.messages.push(Message {
            role: Role::Agent,
            text,
        });

        self.sending = false;
        self.scroll_to_bottom();
    }

    pub fn settle_health(&mut self, result: Result<bool, ChatError>) {
        self.backend = match result {
            Ok(true) => BackendStatus::Online,
            Ok(false) => BackendStatus::Offline,
            Err(err) => {
                tracing::warn!(error = %err, "health probe failed");
                BackendStatus::Offline
            }
        };
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.sending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max_scroll = self
            .transcript_line_count()
            .saturating_sub(self.chat_height);
        if self.scroll < max_scroll {
            self.scroll += 1;
        }
    }

    pub fn scroll_page_up(&mut self) {
        let page = self.chat_height.max(1);
        self.scroll = self.scroll.saturating_sub(page);
    }

    pub fn scroll_page_down(&mut self) {
        let page = self.chat_height.max(1);
        let max_scroll = self
            .transcript_line_count()
            .saturating_sub(self.chat_height);
        self.scroll = (self.scroll + page).min(max_scroll);
    }

    /// Scroll so the newest message (or the thinking placeholder) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.transcript_line_count();
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.scroll = total_lines - visible_height;
        } else {
            self.scroll = 0;
        }
    }

    /// Number of lines the transcript occupies at the current pane width,
    /// mirroring how the renderer lays messages out: a label line, the
    /// wrapped content lines, and a blank line per message.
    fn transcript_line_count(&self) -> u16 {
        // Default to a sane width before the first render has run.
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            total_lines += 1; // Label line ("You:" or "JARVIS:")
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 content
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count.saturating_sub(1) / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.sending {
            total_lines += 2; // "JARVIS:" + thinking line
        }

        total_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn test_app() -> App {
        App::new("http://localhost:8000")
    }

    fn malformed_error() -> ChatError {
        serde_json::from_str::<crate::api::ChatResponse>("{}")
            .unwrap_err()
            .into()
    }

    #[test]
    fn test_begin_send_ignores_empty_input() {
        let mut app = test_app();
        assert_eq!(app.begin_send(""), None);
        assert!(app.messages.is_empty());
        assert!(!app.sending);
    }

    #[test]
    fn test_begin_send_ignores_whitespace_input() {
        let mut app = test_app();
        assert_eq!(app.begin_send("   \t  "), None);
        assert!(app.messages.is_empty());
        assert!(!app.sending);
    }

    #[test]
    fn test_begin_send_trims_and_appends_user_message() {
        let mut app = test_app();
        app.input = "  hello  ".to_string();
        app.cursor = 9;

        let dispatched = app.begin_send(&app.input.clone());

        assert_eq!(dispatched.as_deref(), Some("hello"));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, Role::User);
        assert_eq!(app.messages[0].text, "hello");
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.sending);
    }

    #[test]
    fn test_begin_send_rejected_while_sending() {
        let mut app = test_app();
        app.begin_send("first").unwrap();
        assert_eq!(app.begin_send("second"), None);
        assert_eq!(app.messages.len(), 1);
        assert!(app.sending);
    }

    #[test]
    fn test_finish_send_success_appends_reply_verbatim() {
        let mut app = test_app();
        app.begin_send("hello").unwrap();

        app.finish_send(Ok("hi".to_string()));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].role, Role::Agent);
        assert_eq!(app.messages[1].text, "hi");
        assert!(!app.sending);
    }

    #[test]
    fn test_finish_send_http_failure_uses_fixed_reply() {
        let mut app = test_app();
        app.begin_send("hello").unwrap();

        app.finish_send(Err(ChatError::Http(StatusCode::INTERNAL_SERVER_ERROR)));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].role, Role::Agent);
        assert_eq!(app.messages[1].text, ERROR_REPLY);
        assert!(!app.sending);
    }

    #[test]
    fn test_finish_send_malformed_failure_uses_fixed_reply() {
        let mut app = test_app();
        app.begin_send("hello").unwrap();

        app.finish_send(Err(malformed_error()));

        assert_eq!(app.messages[1].text, ERROR_REPLY);
        assert!(!app.sending);
    }

    #[test]
    fn test_send_reenabled_exactly_once_per_submission() {
        let mut app = test_app();
        app.begin_send("hello").unwrap();
        assert!(app.sending);
        app.finish_send(Err(ChatError::Http(StatusCode::BAD_GATEWAY)));
        assert!(!app.sending);

        // A fresh submission is accepted after settle, failure included.
        assert!(app.begin_send("again").is_some());
        assert!(app.sending);
    }

    #[test]
    fn test_two_exchanges_stay_in_chronological_order() {
        let mut app = test_app();

        app.begin_send("hello").unwrap();
        app.finish_send(Ok("first reply".to_string()));
        app.begin_send("hello").unwrap();
        app.finish_send(Ok("second reply".to_string()));

        let roles: Vec<Role> = app.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Agent, Role::User, Role::Agent]);
        assert_eq!(app.messages[1].text, "first reply");
        assert_eq!(app.messages[3].text, "second reply");
    }

    #[test]
    fn test_tick_animation_only_advances_while_sending() {
        let mut app = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.begin_send("hello").unwrap();
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0); // wraps after 3 frames
    }

    #[test]
    fn test_scroll_to_bottom_accounts_for_placeholder() {
        let mut app = test_app();
        app.chat_height = 4;
        app.chat_width = 10;

        for _ in 0..3 {
            app.messages.push(Message {
                role: Role::User,
                text: "0123456789".to_string(),
            });
        }
        app.sending = true;
        app.scroll_to_bottom();

        // 3 messages x (label + 1 content + blank) + 2 placeholder lines
        assert_eq!(app.scroll, 11 - 4);
    }

    #[test]
    fn test_settle_health_maps_errors_to_offline() {
        let mut app = test_app();
        assert_eq!(app.backend, BackendStatus::Checking);

        app.settle_health(Err(ChatError::Http(StatusCode::NOT_FOUND)));
        assert_eq!(app.backend, BackendStatus::Offline);

        app.settle_health(Ok(true));
        assert_eq!(app.backend, BackendStatus::Online);
    }
}
