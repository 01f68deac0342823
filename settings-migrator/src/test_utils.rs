//! Test utilities for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::primitives::form::{FormError, FormPresenter, FormRequest};

/// Form presenter that replays canned replies in order and records every request.
///
/// Once the script runs out, further forms are treated as dismissed.
pub struct ScriptedFormPresenter {
    replies: Mutex<VecDeque<Result<String, FormError>>>,
    requests: Mutex<Vec<FormRequest>>,
}

impl ScriptedFormPresenter {
    /// Creates a presenter that answers with `replies`, one per form
    pub fn new(replies: Vec<Result<String, FormError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<FormRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FormPresenter for ScriptedFormPresenter {
    async fn open_form(&self, request: FormRequest) -> Result<String, FormError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FormError::Cancelled))
    }
}

/// Form presenter whose single form stays open until the test answers it.
///
/// Dropping the returned sender without answering dismisses the form.
pub struct PendingFormPresenter {
    reply: Mutex<Option<oneshot::Receiver<Result<String, FormError>>>>,
}

impl PendingFormPresenter {
    /// Creates the presenter and the handle used to answer its form
    pub fn new() -> (Self, oneshot::Sender<Result<String, FormError>>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                reply: Mutex::new(Some(receiver)),
            },
            sender,
        )
    }
}

#[async_trait::async_trait]
impl FormPresenter for PendingFormPresenter {
    async fn open_form(&self, _request: FormRequest) -> Result<String, FormError> {
        let receiver = self.reply.lock().unwrap().take();
        match receiver {
            Some(receiver) => receiver.await.unwrap_or(Err(FormError::Cancelled)),
            None => Err(FormError::Cancelled),
        }
    }
}
