use reqwest::Client;
use serde_json::json;
use tracing::{error, info};

use crate::dto::application_dto::ApplicationDraft;
use crate::error::{Error, Result};

/// Outbound mail. When a relay URL is configured, messages are POSTed to
/// it as `{ from?, to, subject, html }`; without one the service runs in
/// log-only mode so submissions keep working in environments with no mail
/// credentials.
#[derive(Clone)]
pub struct MailService {
    client: Client,
    relay_url: Option<String>,
    from: Option<String>,
}

impl MailService {
    pub fn new(relay_url: Option<String>, from: Option<String>, client: Client) -> Self {
        let relay_url = relay_url.filter(|url| !url.trim().is_empty());

        if let Some(ref url) = relay_url {
            info!("Mail relay enabled: {}", url);
        } else {
            info!("Mail relay disabled (MAIL_RELAY_URL not set), emails will be logged only");
        }

        Self {
            client,
            relay_url,
            from,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.relay_url.is_some()
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let Some(ref relay_url) = self.relay_url else {
            info!(to = %to, subject = %subject, "mail relay disabled, logging email");
            return Ok(());
        };

        let response = self
            .client
            .post(relay_url)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "Mail relay returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Sends the applicant confirmation and the HR notification for a
    /// fresh submission. Failures are logged and swallowed; a submission
    /// response never depends on mail delivery.
    pub async fn notify_submission(&self, draft: &ApplicationDraft, hr_email: &str) {
        if let Err(err) = self
            .send(
                &draft.email,
                "تأكيد استلام طلب التوظيف",
                &confirmation_email(draft),
            )
            .await
        {
            error!(error = %err, to = %draft.email, "failed to send confirmation email");
        }

        if let Err(err) = self
            .send(hr_email, "طلب توظيف جديد", &hr_notification_email(draft))
            .await
        {
            error!(error = %err, to = %hr_email, "failed to send HR notification email");
        }
    }
}

fn unspecified(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("غير محدد")
}

pub fn confirmation_email(draft: &ApplicationDraft) -> String {
    format!(
        r#"<!DOCTYPE html>
<html dir="rtl" lang="ar">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>تأكيد استلام طلب التوظيف</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; direction: rtl; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #f8f9fa; padding: 20px; text-align: center; border-radius: 8px; }}
        .content {{ padding: 20px 0; }}
        .footer {{ background-color: #f8f9fa; padding: 15px; text-align: center; border-radius: 8px; margin-top: 20px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>تأكيد استلام طلب التوظيف</h1>
        </div>
        <div class="content">
            <p>عزيزي/عزيزتي {first_name} {last_name}،</p>
            <p>شكراً لك على تقديم طلب التوظيف للمنصب: <strong>{position}</strong></p>
            <p>لقد تم استلام طلبك بنجاح وسيقوم فريقنا بمراجعته خلال الأيام القادمة.</p>
            <h3>تفاصيل الطلب:</h3>
            <ul>
                <li><strong>المنصب:</strong> {position}</li>
                <li><strong>القسم:</strong> {department}</li>
                <li><strong>تاريخ التقديم:</strong> {submitted_on}</li>
            </ul>
            <p>سنتواصل معك قريباً بخصوص الخطوات التالية في عملية التوظيف.</p>
            <p>مع أطيب التحيات،<br>فريق الموارد البشرية</p>
        </div>
        <div class="footer">
            <p>هذا بريد إلكتروني تلقائي، يرجى عدم الرد عليه.</p>
        </div>
    </div>
</body>
</html>"#,
        first_name = draft.first_name,
        last_name = draft.last_name,
        position = draft.position,
        department = unspecified(&draft.department),
        submitted_on = chrono::Utc::now().format("%Y-%m-%d"),
    )
}

pub fn hr_notification_email(draft: &ApplicationDraft) -> String {
    format!(
        r#"<!DOCTYPE html>
<html dir="rtl" lang="ar">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>طلب توظيف جديد</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; direction: rtl; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #e3f2fd; padding: 20px; text-align: center; border-radius: 8px; }}
        .content {{ padding: 20px 0; }}
        .info-box {{ background-color: #f5f5f5; padding: 15px; border-radius: 8px; margin: 10px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>طلب توظيف جديد</h1>
        </div>
        <div class="content">
            <p>تم استلام طلب توظيف جديد:</p>
            <div class="info-box">
                <h3>معلومات المتقدم:</h3>
                <p><strong>الاسم:</strong> {first_name} {last_name}</p>
                <p><strong>البريد الإلكتروني:</strong> {email}</p>
                <p><strong>الهاتف:</strong> {phone}</p>
                <p><strong>الجنسية:</strong> {nationality}</p>
            </div>
            <div class="info-box">
                <h3>معلومات المنصب:</h3>
                <p><strong>المنصب:</strong> {position}</p>
                <p><strong>القسم:</strong> {department}</p>
                <p><strong>نوع التوظيف:</strong> {employment_type}</p>
                <p><strong>توقعات الراتب:</strong> {salary_expectation}</p>
            </div>
            <p>يرجى مراجعة الطلب في نظام إدارة الطلبات.</p>
        </div>
    </div>
</body>
</html>"#,
        first_name = draft.first_name,
        last_name = draft.last_name,
        email = draft.email,
        phone = draft.phone,
        nationality = draft.nationality,
        position = draft.position,
        department = unspecified(&draft.department),
        employment_type = unspecified(&draft.employment_type),
        salary_expectation = unspecified(&draft.salary_expectation),
    )
}
