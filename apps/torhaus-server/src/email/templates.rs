//! Email templates for invite delivery.

use chrono::{DateTime, Utc};

/// Content for invite emails.
pub struct InviteEmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl InviteEmailContent {
    /// Build invite email content around the personal reservation link.
    pub fn new(link: &str, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            subject: "Ihre Einladung zur Reservierungsanfrage".to_string(),
            text: Self::text_template(link, expires_at),
            html: Self::html_template(link, expires_at),
        }
    }

    fn expiry_line(expires_at: Option<DateTime<Utc>>) -> String {
        match expires_at {
            Some(exp) => format!("Der Link ist gültig bis {}.", exp.format("%d.%m.%Y")),
            None => "Der Link ist unbegrenzt gültig.".to_string(),
        }
    }

    fn text_template(link: &str, expires_at: Option<DateTime<Utc>>) -> String {
        format!(
            r#"Guten Tag,

über den folgenden persönlichen Link können Sie Ihre Reservierungsanfrage stellen:

{}

{}

Bitte geben Sie den Link nicht weiter; er ist nur für Sie bestimmt.

--
Ihr Torhaus-Team"#,
            link,
            Self::expiry_line(expires_at)
        )
    }

    fn html_template(link: &str, expires_at: Option<DateTime<Utc>>) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background: #f5f5f5; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 40px 20px; }}
        .card {{ background: white; border-radius: 8px; padding: 40px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        h1 {{ color: #1a1a1a; margin-top: 0; font-size: 24px; }}
        .button {{ display: inline-block; padding: 14px 28px; background: #1d4ed8; color: #fff; border-radius: 8px; text-decoration: none; font-weight: bold; }}
        .expires {{ color: #666; font-size: 14px; }}
        .footer {{ margin-top: 32px; padding-top: 20px; border-top: 1px solid #eee; color: #888; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="card">
            <h1>Ihre Einladung</h1>
            <p>Über Ihren persönlichen Link können Sie Ihre Reservierungsanfrage stellen:</p>
            <p><a class="button" href="{link}">Reservierungsanfrage stellen</a></p>
            <p class="expires">{expiry}</p>
            <div class="footer">
                <p>Bitte geben Sie den Link nicht weiter; er ist nur für Sie bestimmt.</p>
                <p>Ihr Torhaus-Team</p>
            </div>
        </div>
    </div>
</body>
</html>"#,
            link = link,
            expiry = Self::expiry_line(expires_at)
        )
    }
}
