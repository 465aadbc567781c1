use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Transient failure; the screen keeps its last good data.
    Error,
    /// The account was switched into confirmed-UTXO mode.
    ConfirmedModeEnabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Toast-style notices waiting to be shown.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    pending: VecDeque<Notice>,
}

impl NoticeBoard {
    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.pending.push_back(Notice {
            kind,
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Error, message);
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
