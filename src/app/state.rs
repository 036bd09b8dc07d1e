// SPDX-License-Identifier: GPL-3.0-only

//! Capture flow state machine
//!
//! ```text
//! Capturing ──take photo──▶ Previewing ──upload ok──▶ Submitted
//!     ▲                         │
//!     └─────────retry───────────┘
//! ```
//!
//! Submitted is terminal for the session.

use crate::errors::FlowError;
use crate::pipelines::photo::CapturedFrame;
use std::fmt;

/// Which view the booth shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    /// Live camera, waiting for the take-photo action
    #[default]
    Capturing,
    /// Still preview with the comment box
    Previewing,
    /// Thank-you screen
    Submitted,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Submitted)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Capturing => write!(f, "capturing"),
            FlowState::Previewing => write!(f, "previewing"),
            FlowState::Submitted => write!(f, "submitted"),
        }
    }
}

/// User or system actions that change the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    TakePhoto,
    EditComment,
    Send,
    Retry,
    CompleteUpload,
}

impl FlowAction {
    /// The only state in which the action is allowed
    pub fn allowed_in(&self) -> FlowState {
        match self {
            FlowAction::TakePhoto => FlowState::Capturing,
            FlowAction::EditComment
            | FlowAction::Send
            | FlowAction::Retry
            | FlowAction::CompleteUpload => FlowState::Previewing,
        }
    }
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowAction::TakePhoto => write!(f, "take a photo"),
            FlowAction::EditComment => write!(f, "edit the comment"),
            FlowAction::Send => write!(f, "send"),
            FlowAction::Retry => write!(f, "retry"),
            FlowAction::CompleteUpload => write!(f, "complete an upload"),
        }
    }
}

/// Flow state plus the data that only exists while previewing
#[derive(Debug, Clone, Default)]
pub struct Flow {
    state: FlowState,
    capture: Option<CapturedFrame>,
    comment: String,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn capture(&self) -> Option<&CapturedFrame> {
        self.capture.as_ref()
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Check that `action` is allowed right now
    pub fn ensure(&self, action: FlowAction) -> Result<(), FlowError> {
        if action.allowed_in() == self.state {
            Ok(())
        } else {
            Err(FlowError {
                state: self.state,
                action,
            })
        }
    }

    /// Capturing → Previewing
    pub fn show_preview(&mut self, capture: CapturedFrame) -> Result<(), FlowError> {
        self.ensure(FlowAction::TakePhoto)?;
        self.capture = Some(capture);
        self.comment.clear();
        self.state = FlowState::Previewing;
        Ok(())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<(), FlowError> {
        self.ensure(FlowAction::EditComment)?;
        self.comment = comment.into();
        Ok(())
    }

    pub fn push_comment_char(&mut self, c: char) -> Result<(), FlowError> {
        self.ensure(FlowAction::EditComment)?;
        self.comment.push(c);
        Ok(())
    }

    pub fn pop_comment_char(&mut self) -> Result<(), FlowError> {
        self.ensure(FlowAction::EditComment)?;
        self.comment.pop();
        Ok(())
    }

    /// Previewing → Submitted, dropping the capture and comment
    pub fn mark_submitted(&mut self) -> Result<(), FlowError> {
        self.ensure(FlowAction::CompleteUpload)?;
        self.capture = None;
        self.comment.clear();
        self.state = FlowState::Submitted;
        Ok(())
    }

    /// Previewing → Capturing, discarding the capture and comment
    pub fn reset(&mut self) -> Result<(), FlowError> {
        self.ensure(FlowAction::Retry)?;
        self.capture = None;
        self.comment.clear();
        self.state = FlowState::Capturing;
        Ok(())
    }
}
