pub const START_COMMAND: &str = "/start";
pub const STOP_COMMAND: &str = "/stop";

/// What an inbound text means to the quiz protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Stop,
    /// Anything else is a candidate answer, passed through verbatim.
    Answer(&'a str),
}

impl<'a> Command<'a> {
    /// Commands only match the full message text exactly.
    #[must_use]
    pub fn parse(text: &'a str) -> Self {
        match text {
            START_COMMAND => Self::Start,
            STOP_COMMAND => Self::Stop,
            other => Self::Answer(other),
        }
    }
}
