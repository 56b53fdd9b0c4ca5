/// Chat behaviour read from configuration. The core only ever reads these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatPolicy {
    /// Messages kept per session, oldest evicted first. 0 keeps everything.
    pub max_message_count: usize,
    pub auto_scroll: bool,
    pub show_timestamps: bool,
    pub confirm_execution: bool,
}

impl Default for ChatPolicy {
    fn default() -> ChatPolicy {
        return ChatPolicy {
            max_message_count: 20,
            auto_scroll: true,
            show_timestamps: true,
            confirm_execution: true,
        };
    }
}
