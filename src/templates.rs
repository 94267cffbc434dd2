use handlebars::Handlebars;
use serde_json::json;
use std::sync::Arc;

use crate::error::NotifyError;
use crate::models::TriggerKind;

pub type Hbs = Arc<Handlebars<'static>>;

// Subject lines are plain text, so no HTML escaping.
const ALERT_SUBJECT: &str = "ALERT: {{{label}}} ({{{symbol}}})";

const ALERT_BODY: &str = r#"<h1>{{symbol}} has crossed your threshold!</h1>
<p>{{label}}. Current price: <b>{{price}} USD</b></p>
<p style="color:#888;font-size:12px">This alert has now been consumed and will not fire again.</p>"#;

pub fn build_handlebars() -> Hbs {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);

    hb.register_template_string("email/alert_subject", ALERT_SUBJECT)
        .expect("template email/alert_subject");
    hb.register_template_string("email/alert_body", ALERT_BODY)
        .expect("template email/alert_body");

    Arc::new(hb)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

pub fn render_alert(hbs: &Hbs, trigger: TriggerKind, symbol: &str, price: f64) -> Result<Message, NotifyError> {
    let ctx = json!({
        "label": trigger.label(),
        "symbol": symbol,
        "price": format_price(price),
    });

    Ok(Message {
        subject: hbs.render("email/alert_subject", &ctx)?,
        body: hbs.render("email/alert_body", &ctx)?,
    })
}

fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("{price:.2}")
    } else {
        let s = format!("{price:.8}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
