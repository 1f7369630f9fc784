//! Payment-reminder email dispatch through the remote email function

use serde::Serialize;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::functions::FunctionsClient;
use crate::models::Roommate;

/// Payload accepted by the email function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub from: String,
}

/// The user a reminder is sent on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    /// Where the sender accepts payment, shown to a roommate who owes them
    pub payment_id: Option<String>,
}

/// Sends email by invoking the configured function. Fire and forget: a
/// successful call means the function accepted the message, nothing more.
#[derive(Clone)]
pub struct Mailer {
    functions: FunctionsClient,
    function_name: String,
    from: String,
}

impl Mailer {
    pub fn new(functions: FunctionsClient, options: &ClientOptions) -> Self {
        Self {
            functions,
            function_name: options.email_function.clone(),
            from: options.email_from.clone(),
        }
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        let response = self.functions.invoke(&self.function_name, message).await?;
        log::info!(
            "Email function {} accepted message for {} recipient(s) (status {})",
            self.function_name,
            message.to.len(),
            response.status
        );
        Ok(())
    }

    /// Build the reminder `sender` sends to `roommate`
    pub fn payment_reminder(&self, roommate: &Roommate, sender: &Sender) -> EmailMessage {
        EmailMessage {
            to: vec![roommate.email.clone()],
            subject: format!("Payment reminder from {}", sender.name),
            html: render_reminder_html(roommate, sender),
            from: self.from.clone(),
        }
    }
}

/// Two decimals, sign dropped; the wording carries the direction.
pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", amount.abs())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_reminder_html(roommate: &Roommate, sender: &Sender) -> String {
    let name = escape_html(&roommate.name);
    let sender_name = escape_html(&sender.name);
    let amount = format_amount(roommate.balance);

    let balance_line = if roommate.balance > 0.0 {
        let pay_to = match &sender.payment_id {
            Some(handle) => format!(
                "<p>You can pay {} at <strong>{}</strong>.</p>",
                sender_name,
                escape_html(handle)
            ),
            None => String::new(),
        };
        format!(
            "<p>You currently owe <strong>{}</strong> <strong>{}</strong>.</p>{}",
            sender_name, amount, pay_to
        )
    } else if roommate.balance < 0.0 {
        format!(
            "<p><strong>{}</strong> currently owes you <strong>{}</strong>.</p>",
            sender_name, amount
        )
    } else {
        "<p>Your balance is settled.</p>".to_string()
    };

    format!(
        "<div style=\"font-family: sans-serif\">\
         <h2>Hi {},</h2>\
         <p>This is a friendly reminder from {} about your shared household expenses.</p>\
         {}\
         <p>Thanks!</p>\
         </div>",
        name, sender_name, balance_line
    )
}
