//! Client side of event registration: form state, validation and the
//! submission lifecycle, independent of any particular UI.

pub mod controller;
pub mod error;
pub mod transport;
pub mod types;

pub use controller::{
    ControllerEvent, Notice, NoticeLevel, SubmissionController, SubmissionInput, SubmissionStatus,
    SuccessView, SAVING_PHASE,
};
pub use error::{FormLocked, SubmissionError};
pub use transport::{HttpRegistrationClient, RegistrationTransport, SubmissionReceipt};
pub use types::{FormField, RegistrationForm, ValidationErrors};
