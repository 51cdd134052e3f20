//! Transactional email: templates and the send-and-log wrapper.
//!
//! Delivery never fails a request. A message that cannot be rendered or
//! sent is logged at `warn` and dropped.

use std::sync::Arc;

use handlebars::Handlebars;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::mailer::{EmailError, EmailMessage, Mailer};
use crate::database::models::{Order, OrderWithItems, PricePlan, Tenant, Ticket};

pub const ORDER_CONFIRMATION: &str = "order_confirmation";
pub const ORDER_STATUS: &str = "order_status";
pub const TICKET_OPENED: &str = "ticket_opened";
pub const TICKET_REPLY: &str = "ticket_reply";
pub const SUBSCRIPTION_ACTIVATED: &str = "subscription_activated";
pub const TENANT_WELCOME: &str = "tenant_welcome";

const LAYOUT_OPEN: &str = r#"<!doctype html><html><body style="font-family:sans-serif;color:#222">"#;
const LAYOUT_CLOSE: &str = r#"<p style="color:#888;font-size:12px">{{store_name}}</p></body></html>"#;

const TEMPLATES: &[(&str, &str)] = &[
    (
        ORDER_CONFIRMATION,
        r#"<h1>Thanks for your order, {{customer_name}}!</h1>
<p>Order <strong>{{order_number}}</strong> has been received.</p>
<table>
{{#each items}}<tr><td>{{name}}</td><td>&times; {{quantity}}</td><td>{{line_total}}</td></tr>
{{/each}}</table>
<p>Total: <strong>{{total}}</strong></p>"#,
    ),
    (
        ORDER_STATUS,
        r#"<h1>Order {{order_number}} update</h1>
<p>Hi {{customer_name}}, your order is now <strong>{{status}}</strong>.</p>"#,
    ),
    (
        TICKET_OPENED,
        r#"<h1>New support ticket</h1>
<p><strong>{{subject}}</strong> from {{requester_name}} &lt;{{requester_email}}&gt;</p>
<blockquote>{{message}}</blockquote>"#,
    ),
    (
        TICKET_REPLY,
        r#"<h1>Re: {{subject}}</h1>
<p>{{author_name}} replied:</p>
<blockquote>{{message}}</blockquote>
<p>Status: {{status}}</p>"#,
    ),
    (
        SUBSCRIPTION_ACTIVATED,
        r#"<h1>Your {{plan_name}} plan is active</h1>
<p>{{tenant_name}} is subscribed until <strong>{{expire_date}}</strong>{{#if trial}} (trial){{/if}}.</p>"#,
    ),
    (
        TENANT_WELCOME,
        r#"<h1>Welcome to StoreFlow, {{tenant_name}}</h1>
<p>Your store is ready at <a href="{{store_url}}">{{store_url}}</a>.</p>
<p>Sign in as <strong>{{admin_email}}</strong>.</p>"#,
    ),
];

/// Builds the registry with every template wrapped in the shared layout
pub fn registry() -> Result<Handlebars<'static>, EmailError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);
    for (name, body) in TEMPLATES {
        let source = format!("{}{}{}", LAYOUT_OPEN, body, LAYOUT_CLOSE);
        handlebars
            .register_template_string(name, source)
            .map_err(|e| EmailError::Template(e.to_string()))?;
    }
    Ok(handlebars)
}

#[derive(Clone)]
pub struct Emails {
    mailer: Arc<dyn Mailer>,
    templates: Arc<Handlebars<'static>>,
}

impl Emails {
    pub fn new(mailer: Arc<dyn Mailer>) -> Result<Self, EmailError> {
        Ok(Self {
            mailer,
            templates: Arc::new(registry()?),
        })
    }

    pub fn render(&self, template: &str, data: &Value) -> Result<String, EmailError> {
        self.templates
            .render(template, data)
            .map_err(|e| EmailError::Template(e.to_string()))
    }

    /// Render and send; failures are logged, never returned
    pub async fn deliver(&self, to: &str, subject: String, template: &str, data: Value) {
        let html = match self.render(template, &data) {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to render {} email: {}", template, e);
                return;
            }
        };
        let message = EmailMessage {
            to: to.to_string(),
            subject,
            html,
        };
        match self.mailer.send(message).await {
            Ok(()) => debug!("Sent {} email to {}", template, to),
            Err(e) => warn!("Failed to send {} email to {}: {}", template, to, e),
        }
    }

    pub async fn order_confirmation(&self, store_name: &str, order: &OrderWithItems) {
        let items: Vec<Value> = order
            .items
            .iter()
            .map(|i| json!({ "name": i.name, "quantity": i.quantity, "line_total": i.line_total.to_string() }))
            .collect();
        let data = json!({
            "store_name": store_name,
            "customer_name": order.order.customer_name,
            "order_number": order.order.order_number,
            "items": items,
            "total": order.order.total.to_string(),
        });
        let subject = format!("{}: order {} confirmed", store_name, order.order.order_number);
        self.deliver(&order.order.customer_email, subject, ORDER_CONFIRMATION, data)
            .await;
    }

    pub async fn order_status(&self, store_name: &str, order: &Order) {
        let data = json!({
            "store_name": store_name,
            "customer_name": order.customer_name,
            "order_number": order.order_number,
            "status": order.status.as_str(),
        });
        let subject = format!("{}: order {} is {}", store_name, order.order_number, order.status);
        self.deliver(&order.customer_email, subject, ORDER_STATUS, data).await;
    }

    pub async fn ticket_opened(&self, to: &str, store_name: &str, ticket: &Ticket, message: &str) {
        let data = json!({
            "store_name": store_name,
            "subject": ticket.subject,
            "requester_name": ticket.requester_name,
            "requester_email": ticket.requester_email,
            "message": message,
        });
        let subject = format!("New ticket: {}", ticket.subject);
        self.deliver(to, subject, TICKET_OPENED, data).await;
    }

    pub async fn ticket_reply(&self, store_name: &str, ticket: &Ticket, author_name: &str, message: &str) {
        let data = json!({
            "store_name": store_name,
            "subject": ticket.subject,
            "author_name": author_name,
            "message": message,
            "status": ticket.status.as_str(),
        });
        let subject = format!("Re: {}", ticket.subject);
        self.deliver(&ticket.requester_email, subject, TICKET_REPLY, data).await;
    }

    pub async fn subscription_activated(&self, tenant: &Tenant, plan: &PricePlan, trial: bool) {
        let expire_date = tenant
            .expire_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let data = json!({
            "store_name": "StoreFlow",
            "tenant_name": tenant.name,
            "plan_name": plan.name,
            "expire_date": expire_date,
            "trial": trial,
        });
        let subject = format!("{} plan activated", plan.name);
        self.deliver(&tenant.contact_email, subject, SUBSCRIPTION_ACTIVATED, data)
            .await;
    }

    pub async fn tenant_welcome(&self, tenant: &Tenant, admin_email: &str, store_url: &str) {
        let data = json!({
            "store_name": "StoreFlow",
            "tenant_name": tenant.name,
            "admin_email": admin_email,
            "store_url": store_url,
        });
        self.deliver(&tenant.contact_email, "Welcome to StoreFlow".to_string(), TENANT_WELCOME, data)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mailer::OutboxMailer;

    #[test]
    fn every_template_registers() {
        let registry = registry().unwrap();
        for (name, _) in TEMPLATES {
            assert!(registry.has_template(name), "{name} missing");
        }
    }

    #[test]
    fn values_are_html_escaped() {
        let emails = Emails::new(Arc::new(OutboxMailer::default())).unwrap();
        let html = emails
            .render(
                ORDER_STATUS,
                &json!({ "customer_name": "<script>x</script>", "order_number": "ORD-1", "status": "shipped" }),
            )
            .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn deliver_sends_through_mailer() {
        let outbox = Arc::new(OutboxMailer::default());
        let emails = Emails::new(outbox.clone()).unwrap();
        emails
            .deliver(
                "c@d.test",
                "Hello".into(),
                TICKET_REPLY,
                json!({ "subject": "Help", "author_name": "Sam", "message": "On it", "status": "in_progress" }),
            )
            .await;

        let sent = outbox.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "c@d.test");
        assert!(sent[0].html.contains("Sam replied"));
    }
}
