use shared::domain::Interest;

use crate::OutboundEmail;

pub const CONFIRMATION_SUBJECT: &str = "Mocha Event - Registration Confirmed";

pub fn confirmation_email(from: &str, full_name: &str, email: &str, interest: &str) -> OutboundEmail {
    let name = escape_html(full_name);
    let interest = escape_html(Interest::label_for_code(interest));
    let address = escape_html(email);

    let html = format!(
        r#"
<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 8px;">
    <h2 style="color: #1C1C1C;">Registration Confirmed</h2>
    <p>Hi <strong>{name}</strong>,</p>
    <p>Thank you for registering for the <strong>Mocha Mono Vol. 2</strong> event. We have successfully received your details.</p>

    <div style="background-color: #f9fafb; padding: 15px; border-radius: 6px; margin: 20px 0;">
        <p style="margin: 5px 0; font-size: 14px; color: #555;"><strong>Interest:</strong> {interest}</p>
        <p style="margin: 5px 0; font-size: 14px; color: #555;"><strong>Email:</strong> {address}</p>
    </div>

    <p>We will review your request and get back to you shortly with further details.</p>

    <p style="margin-top: 30px; font-size: 12px; color: #999;">
        Mocha by Scale Media<br>
        Kolkata, West Bengal
    </p>
</div>
"#
    );

    OutboundEmail {
        from: from.to_string(),
        to: email.to_string(),
        subject: CONFIRMATION_SUBJECT.to_string(),
        html,
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_names_registrant_and_interest_label() {
        let email = confirmation_email(
            "Mocha Event <onboarding@resend.dev>",
            "Asha Roy",
            "asha@example.com",
            "vip_table",
        );
        assert_eq!(email.to, "asha@example.com");
        assert_eq!(email.subject, CONFIRMATION_SUBJECT);
        assert!(email.html.contains("Hi <strong>Asha Roy</strong>"));
        assert!(email.html.contains("VIP Table Reservation"));
        assert!(email.html.contains("asha@example.com"));
    }

    #[test]
    fn user_supplied_values_are_escaped() {
        let email = confirmation_email(
            "events@example.com",
            "<script>alert('x')</script>",
            "a@b.co",
            "walk_in & more",
        );
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(email.html.contains("walk_in &amp; more"));
    }
}
