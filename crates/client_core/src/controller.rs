use std::time::Duration;

use shared::protocol::EmailStatus;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    error::{FormLocked, SubmissionError},
    transport::{RegistrationTransport, SubmissionReceipt},
    types::{FormField, RegistrationForm, ValidationErrors},
};

/// How long `Saving` stays on screen before switching to `Sending`.
pub const SAVING_PHASE: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Saving,
    Sending,
    Success,
}

impl SubmissionStatus {
    pub fn is_in_flight(self) -> bool {
        matches!(self, SubmissionStatus::Saving | SubmissionStatus::Sending)
    }

    pub fn button_label(self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "Submit Request",
            SubmissionStatus::Saving => "Saving details...",
            SubmissionStatus::Sending => "Sending confirmation...",
            SubmissionStatus::Success => "Request Sent!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    StatusChanged(SubmissionStatus),
    Notice(Notice),
}

/// Inputs that move an in-flight submission forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionInput {
    MinimumDisplayElapsed,
    Settled(Result<SubmissionReceipt, SubmissionError>),
}

/// Copy for the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessView {
    pub first_name: String,
    pub greeting: String,
    pub detail: String,
}

impl SuccessView {
    pub fn new(form: &RegistrationForm, email: &EmailStatus) -> Self {
        let first_name = form
            .full_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        let detail = match email {
            EmailStatus::Sent => format!("We've sent a confirmation email to {}.", form.email),
            EmailStatus::Failed { .. } => format!(
                "Your registration is saved, but we couldn't send a confirmation email to {}.",
                form.email
            ),
            EmailStatus::Unknown => "Your registration is saved. You will receive a confirmation if email delivery is available.".to_string(),
        };
        Self {
            greeting: format!("Thanks for reaching out, {first_name}."),
            first_name,
            detail,
        }
    }
}

/// Owns one registration form and its submission lifecycle.
///
/// `Idle -> Saving -> (Sending) -> Success`, with failures returning to
/// `Idle`. The saving/sending switch is driven by
/// [`SubmissionInput::MinimumDisplayElapsed`] and completion by
/// [`SubmissionInput::Settled`]; neither depends on the other arriving first.
pub struct SubmissionController {
    form: RegistrationForm,
    errors: ValidationErrors,
    status: SubmissionStatus,
    email_status: EmailStatus,
    saving_phase: Duration,
    events: broadcast::Sender<ControllerEvent>,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::with_saving_phase(SAVING_PHASE)
    }

    pub fn with_saving_phase(saving_phase: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            form: RegistrationForm::default(),
            errors: ValidationErrors::default(),
            status: SubmissionStatus::Idle,
            email_status: EmailStatus::Unknown,
            saving_phase,
            events,
        }
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn email_status(&self) -> &EmailStatus {
        &self.email_status
    }

    pub fn is_editable(&self) -> bool {
        self.status == SubmissionStatus::Idle
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Edits one field and clears its validation error.
    pub fn set_field(
        &mut self,
        field: FormField,
        value: impl Into<String>,
    ) -> Result<(), FormLocked> {
        if !self.is_editable() {
            return Err(FormLocked(self.status));
        }
        self.form.set(field, value);
        self.errors.clear_field(field);
        Ok(())
    }

    /// Validates the form and, if it passes, enters `Saving`.
    ///
    /// Returns the payload to send, or `None` when nothing should be sent.
    pub fn begin_submit(&mut self) -> Option<shared::protocol::RegistrationRequest> {
        if self.status != SubmissionStatus::Idle {
            return None;
        }

        self.errors = self.form.validate();
        if !self.errors.is_empty() {
            self.notify(Notice::error("Please fix the errors in the form."));
            return None;
        }

        self.transition(SubmissionStatus::Saving);
        Some(self.form.to_request())
    }

    pub fn apply(&mut self, input: SubmissionInput) {
        match input {
            SubmissionInput::MinimumDisplayElapsed => {
                if self.status == SubmissionStatus::Saving {
                    self.transition(SubmissionStatus::Sending);
                }
            }
            SubmissionInput::Settled(_) if !self.status.is_in_flight() => {
                debug!(status = ?self.status, "ignoring settlement outside an in-flight submission");
            }
            SubmissionInput::Settled(Ok(receipt)) => {
                self.email_status = receipt.email;
                self.transition(SubmissionStatus::Success);
                self.notify(Notice::success("Registration saved to database."));
                match &self.email_status {
                    EmailStatus::Sent => {
                        self.notify(Notice::success("Confirmation email sent to your address."))
                    }
                    EmailStatus::Failed { error } => {
                        let detail = error
                            .as_deref()
                            .filter(|e| !e.trim().is_empty())
                            .unwrap_or("Failed to send confirmation email.");
                        self.notify(Notice::error(format!(
                            "Confirmation email not sent: {detail}"
                        )));
                    }
                    EmailStatus::Unknown => {}
                }
            }
            SubmissionInput::Settled(Err(err)) => {
                debug!(error = %err, "submission failed");
                self.transition(SubmissionStatus::Idle);
                self.notify(Notice::error(err.user_message()));
            }
        }
    }

    /// Runs a full submission against `transport`.
    ///
    /// The timer and the call run concurrently on this task. Settlement wins
    /// ties, and returning drops the timer so it cannot fire afterwards.
    pub async fn submit<T>(&mut self, transport: &T) -> SubmissionStatus
    where
        T: RegistrationTransport + ?Sized,
    {
        let Some(request) = self.begin_submit() else {
            return self.status;
        };

        let call = transport.submit(&request);
        tokio::pin!(call);
        let timer = tokio::time::sleep(self.saving_phase);
        tokio::pin!(timer);
        let mut timer_armed = true;

        loop {
            tokio::select! {
                biased;
                settled = &mut call => {
                    self.apply(SubmissionInput::Settled(settled));
                    break;
                }
                () = &mut timer, if timer_armed => {
                    timer_armed = false;
                    self.apply(SubmissionInput::MinimumDisplayElapsed);
                }
            }
        }

        self.status
    }

    /// Leaves `Success` for a fresh, empty form.
    pub fn reset(&mut self) -> bool {
        if self.status != SubmissionStatus::Success {
            return false;
        }
        self.form = RegistrationForm::default();
        self.errors = ValidationErrors::default();
        self.email_status = EmailStatus::Unknown;
        self.transition(SubmissionStatus::Idle);
        true
    }

    pub fn success_view(&self) -> Option<SuccessView> {
        (self.status == SubmissionStatus::Success)
            .then(|| SuccessView::new(&self.form, &self.email_status))
    }

    fn transition(&mut self, next: SubmissionStatus) {
        if self.status == next {
            return;
        }
        debug!(from = ?self.status, to = ?next, "submission status changed");
        self.status = next;
        let _ = self.events.send(ControllerEvent::StatusChanged(next));
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(ControllerEvent::Notice(notice));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
