//! Modal confirm/prompt dialog contracts and adapters.

use std::{cell::RefCell, collections::VecDeque, future::Future, pin::Pin, rc::Rc};

/// Owned boxed future used by [`DialogService`]; answers outlive the asking borrow so that
/// close hooks can hold them.
pub type DialogFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// Host service for blocking user decisions.
pub trait DialogService {
    /// Asks a yes/no question. Resolves `true` when the user accepts.
    fn confirm(&self, title: &str, message: &str) -> DialogFuture<bool>;

    /// Asks for a line of text. Resolves `None` when the user cancels.
    fn prompt(&self, title: &str, default_value: &str) -> DialogFuture<Option<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Dialog service for hosts without a user; confirmations decline and prompts cancel.
pub struct NoopDialogService;

impl DialogService for NoopDialogService {
    fn confirm(&self, _title: &str, _message: &str) -> DialogFuture<bool> {
        Box::pin(async { false })
    }

    fn prompt(&self, _title: &str, _default_value: &str) -> DialogFuture<Option<String>> {
        Box::pin(async { None })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Queued answer consumed by [`ScriptedDialogService`].
pub enum DialogAnswer {
    /// Answer to the next confirmation.
    Confirm(bool),
    /// Answer to the next prompt.
    Prompt(Option<String>),
}

#[derive(Debug, Clone, Default)]
/// Dialog service answering from a queue; unanswered confirmations accept and unanswered prompts
/// echo the default value. Every question asked is recorded.
pub struct ScriptedDialogService {
    answers: Rc<RefCell<VecDeque<DialogAnswer>>>,
    asked: Rc<RefCell<Vec<String>>>,
}

impl ScriptedDialogService {
    /// Queues an answer.
    pub fn push(&self, answer: DialogAnswer) {
        self.answers.borrow_mut().push_back(answer);
    }

    /// Returns every dialog shown so far: `title: message` for confirmations, the title for
    /// prompts.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn next_answer(&self) -> Option<DialogAnswer> {
        self.answers.borrow_mut().pop_front()
    }
}

impl DialogService for ScriptedDialogService {
    fn confirm(&self, title: &str, message: &str) -> DialogFuture<bool> {
        self.asked.borrow_mut().push(format!("{title}: {message}"));
        let answer = match self.next_answer() {
            Some(DialogAnswer::Confirm(value)) => value,
            _ => true,
        };
        Box::pin(async move { answer })
    }

    fn prompt(&self, title: &str, default_value: &str) -> DialogFuture<Option<String>> {
        self.asked.borrow_mut().push(title.to_string());
        let answer = match self.next_answer() {
            Some(DialogAnswer::Prompt(value)) => value,
            _ => Some(default_value.to_string()),
        };
        Box::pin(async move { answer })
    }
}
