use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use mailer::{confirmation_email, Mailer};
use shared::{error::ApiException, protocol::EmailStatus, protocol::RegistrationRequest};
use storage::{NewRegistration, RegistrationRecord, RegistrationStore};
use tokio::time::timeout;
use tracing::{error, info};

pub const DEFAULT_MAIL_FROM: &str = "Mocha Event <onboarding@resend.dev>";

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn RegistrationStore>,
    pub mailer: Arc<dyn Mailer>,
    pub mail_from: String,
    pub write_timeout: Duration,
    pub notify_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub record: RegistrationRecord,
    pub email: EmailStatus,
}

/// Persist one registration, then try to confirm it by email.
///
/// Only the write decides the result. The email step runs after a successful
/// write and whatever it does is folded into `RegistrationOutcome::email`.
pub async fn register(
    ctx: &ApiContext,
    request: RegistrationRequest,
) -> Result<RegistrationOutcome, ApiException> {
    let registration = required_fields(request).ok_or_else(ApiException::missing_fields)?;

    let record = match timeout(ctx.write_timeout, ctx.store.insert_registration(&registration))
        .await
    {
        Ok(Ok(record)) => record,
        Ok(Err(error)) => {
            error!(%error, "registration write failed");
            return Err(ApiException::internal());
        }
        Err(_) => {
            error!(
                timeout_ms = ctx.write_timeout.as_millis() as u64,
                "registration write timed out"
            );
            return Err(ApiException::internal());
        }
    };
    info!(registration_id = %record.id, "registration saved");

    let email = send_confirmation(ctx, &record).await;
    Ok(RegistrationOutcome { record, email })
}

async fn send_confirmation(ctx: &ApiContext, record: &RegistrationRecord) -> EmailStatus {
    let message = confirmation_email(
        &ctx.mail_from,
        &record.full_name,
        &record.email,
        &record.interest,
    );
    let send = AssertUnwindSafe(ctx.mailer.send(&message)).catch_unwind();

    match timeout(ctx.notify_timeout, send).await {
        Ok(Ok(Ok(delivery))) => {
            info!(
                registration_id = %record.id,
                delivery_id = %delivery.0,
                "confirmation email sent"
            );
            EmailStatus::Sent
        }
        Ok(Ok(Err(err))) => {
            error!(registration_id = %record.id, error = %err, "confirmation email failed");
            EmailStatus::Failed {
                error: Some(err.to_string()),
            }
        }
        Ok(Err(_panic)) => {
            error!(registration_id = %record.id, "confirmation email sender panicked");
            EmailStatus::Failed {
                error: Some("email sender crashed".to_string()),
            }
        }
        Err(_) => {
            let timeout_ms = ctx.notify_timeout.as_millis() as u64;
            error!(
                registration_id = %record.id,
                timeout_ms,
                "confirmation email timed out"
            );
            EmailStatus::Failed {
                error: Some(format!("email delivery timed out after {timeout_ms}ms")),
            }
        }
    }
}

/// Returns `None` when any required field is absent or blank.
fn required_fields(request: RegistrationRequest) -> Option<NewRegistration> {
    fn present(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    Some(NewRegistration {
        full_name: present(request.full_name)?,
        whatsapp_number: present(request.whatsapp_number)?,
        email: present(request.email)?,
        interest: present(request.interest)?,
        message: present(request.message),
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
