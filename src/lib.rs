//! RichPad - a styled-text editing engine.
//!
//! The crate holds the document model, undo history, find/replace and file
//! formats of a small word processor. A front end drives it by sending
//! [`Message`]s to [`EditorState::dispatch`].

pub mod app;

pub use app::{AppError, AppSettings, Document, EditorState, Message, Outcome, StatusBar};
