use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::error;
use chatline_core::{ChatController, ChatError, Message, Sender};

pub struct App {
    pub should_quit: bool,
    pub controller: ChatController,
    /// Shown in the header
    pub endpoint_label: String,

    // In-flight request, polled on every tick
    pub query_task: Option<JoinHandle<Result<String, ChatError>>>,

    // Transcript view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(controller: ChatController) -> Self {
        let endpoint_label = controller.transport().describe();
        Self {
            should_quit: false,
            controller,
            endpoint_label,
            query_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            chat_area: None,
            send_area: None,
        }
    }

    /// Start an exchange with the current input and send it in the background
    pub fn submit(&mut self) {
        if self.query_task.is_some() {
            return;
        }
        let Some(text) = self.controller.begin() else {
            return;
        };

        let transport = self.controller.transport();
        self.query_task = Some(tokio::spawn(async move { transport.send(&text).await }));
        self.animation_frame = 0;
    }

    /// Settle the exchange once its request task has finished
    pub async fn poll_query(&mut self) {
        let finished = self
            .query_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.query_task.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!(error = %join_err, "request task did not complete");
                    Err(ChatError::Other(format!("request was interrupted ({join_err})")))
                }
            };
            self.controller.settle(outcome);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.view().indicator_visible {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.controller.unfollow();
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
        if self.chat_scroll >= max_scroll {
            self.controller.follow();
        }
    }

    pub fn page_height(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    /// Pin the view to the newest message if the controller asks for it
    pub fn sync_scroll(&mut self) {
        if self.controller.view().follow_latest {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.total_chat_lines().saturating_sub(visible_height)
    }

    /// Rendered line count of the transcript, including the thinking indicator
    pub fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.controller.transcript().iter() {
            total_lines = total_lines.saturating_add(message_lines(msg, wrap_width));
        }

        if self.controller.view().indicator_visible {
            total_lines = total_lines.saturating_add(2); // "Remote:" + "Thinking..."
        }
        total_lines
    }
}

pub fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You:",
        Sender::Remote => "Remote:",
    }
}

fn message_lines(msg: &Message, wrap_width: usize) -> u16 {
    let mut lines: u16 = 1; // sender label
    for line in msg.text().lines() {
        // Use character count, not byte length, for proper UTF-8 handling
        let char_count = line.chars().count();
        let wrapped = if char_count == 0 { 1 } else { char_count.div_ceil(wrap_width) };
        lines = lines.saturating_add(u16::try_from(wrapped).unwrap_or(u16::MAX));
    }
    if msg.text().is_empty() {
        lines = lines.saturating_add(1);
    }
    lines.saturating_add(1) // blank line after message
}
